// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{currency_code, opt_decimal, required};
use crate::fx::{
    Chained, Currency, LiveRates, RateProvider, TableRates, convert_with, resolve_rate,
};
use crate::utils::{fmt_money, parse_decimal, pretty_table};
use anyhow::Result;
use tracing::warn;

pub fn handle(m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("table", _)) => table(),
        Some(("rate", sub)) => {
            let from = currency_code(required(sub, "from")?)?;
            let to = currency_code(required(sub, "to")?)?;
            println!("1 {} = {} {}", from, resolve_rate(&from, &to), to);
        }
        Some(("convert", sub)) => convert_amount(sub)?,
        _ => {}
    }
    Ok(())
}

fn table() {
    let mut headers = vec!["From"];
    headers.extend(Currency::ALL.iter().map(|c| c.code()));
    let rows = Currency::ALL
        .iter()
        .map(|from| {
            let mut row = vec![from.code().to_string()];
            row.extend(
                Currency::ALL
                    .iter()
                    .map(|to| resolve_rate(from.code(), to.code()).to_string()),
            );
            row
        })
        .collect();
    println!("{}", pretty_table(&headers, rows));
}

fn convert_amount(sub: &clap::ArgMatches) -> Result<()> {
    let amount = parse_decimal(required(sub, "amount")?)?;
    let from = currency_code(required(sub, "from")?)?;
    let to = currency_code(required(sub, "to")?)?;
    let snapshot = opt_decimal(sub, "rate")?;

    let live = if sub.get_flag("live") {
        let quotes: Vec<&str> = Currency::ALL.iter().map(|c| c.code()).collect();
        match LiveRates::fetch(&from, &quotes) {
            Ok(rates) => Some(rates),
            Err(e) => {
                warn!(error = %e, "live rates unavailable, using the built-in table");
                None
            }
        }
    } else {
        None
    };
    let provider: Box<dyn RateProvider> = match live {
        Some(primary) => Box::new(Chained {
            primary,
            secondary: TableRates,
        }),
        None => Box::new(TableRates),
    };

    let out = convert_with(provider.as_ref(), amount, &from, &to, snapshot);
    println!("{} = {}", fmt_money(&amount, &from), fmt_money(&out, &to));
    Ok(())
}
