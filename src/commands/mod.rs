// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

pub mod electricity;
pub mod exporter;
pub mod fx;
pub mod investments;
pub mod properties;
pub mod recurring;
pub mod reports;
pub mod settings;
pub mod transactions;

use crate::fx::{Currency, snapshot_rate};
use crate::store::{DateRange, Store};
use crate::utils::{parse_date, parse_decimal};
use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::ArgMatches;
use rust_decimal::Decimal;

pub(crate) fn required<'a>(m: &'a ArgMatches, id: &str) -> Result<&'a str> {
    m.get_one::<String>(id)
        .map(String::as_str)
        .with_context(|| format!("Missing required argument '{}'", id))
}

pub(crate) fn optional<'a>(m: &'a ArgMatches, id: &str) -> Option<&'a str> {
    m.get_one::<String>(id).map(String::as_str)
}

pub(crate) fn opt_date(m: &ArgMatches, id: &str) -> Result<Option<NaiveDate>> {
    optional(m, id).map(parse_date).transpose()
}

pub(crate) fn opt_decimal(m: &ArgMatches, id: &str) -> Result<Option<Decimal>> {
    optional(m, id).map(parse_decimal).transpose()
}

pub(crate) fn id_arg(m: &ArgMatches) -> Result<i64> {
    m.get_one::<i64>("id").copied().context("Missing record id")
}

pub(crate) fn date_range(m: &ArgMatches) -> Result<DateRange> {
    Ok(DateRange::new(opt_date(m, "from")?, opt_date(m, "to")?))
}

pub(crate) fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Normalised currency code; only the supported set is accepted.
pub(crate) fn currency_code(s: &str) -> Result<String> {
    Ok(s.parse::<Currency>()?.code().to_string())
}

/// `--currency` when given, otherwise the user's default currency.
pub(crate) fn currency_or_default(store: &mut Store, user: &str, m: &ArgMatches) -> Result<String> {
    match optional(m, "currency") {
        Some(c) => currency_code(c),
        None => store.default_currency(user),
    }
}

/// `--rate` when given, otherwise the table rate from `currency` into the
/// user's default currency (`None` when they match).
pub(crate) fn rate_snapshot(
    store: &mut Store,
    user: &str,
    m: &ArgMatches,
    currency: &str,
) -> Result<Option<Decimal>> {
    if let Some(rate) = opt_decimal(m, "rate")? {
        return Ok(Some(rate));
    }
    let default_ccy = store.default_currency(user)?;
    Ok(snapshot_rate(currency, &default_ccy))
}

pub(crate) fn opt_cell<T: ToString>(v: Option<T>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}
