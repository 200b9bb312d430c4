// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Currency conversion.
//!
//! Rates are directional multipliers: `1 from = rate to`. A missing pair never
//! fails a conversion; it resolves to `1` and logs a warning.

use crate::error::LedgerError;
use crate::utils::http_client;
use anyhow::{Context, Result};
use once_cell::sync::Lazy;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Currency {
    Usd,
    Eur,
    Gbp,
    Huf,
}

impl Currency {
    pub const ALL: [Currency; 4] = [Currency::Usd, Currency::Eur, Currency::Gbp, Currency::Huf];

    pub fn code(self) -> &'static str {
        match self {
            Currency::Usd => "USD",
            Currency::Eur => "EUR",
            Currency::Gbp => "GBP",
            Currency::Huf => "HUF",
        }
    }
}

impl fmt::Display for Currency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Currency {
    type Err = LedgerError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim();
        Currency::ALL
            .into_iter()
            .find(|c| c.code().eq_ignore_ascii_case(code))
            .ok_or_else(|| LedgerError::UnsupportedCurrency(s.to_string()))
    }
}

/// Source of exchange rates. Returns `None` when the pair is unknown; the
/// fallback policy lives in [`resolve_rate_with`], not in providers.
pub trait RateProvider {
    fn rate(&self, from: &str, to: &str) -> Option<Decimal>;
}

static TABLE: Lazy<HashMap<&'static str, HashMap<&'static str, Decimal>>> = Lazy::new(|| {
    let rows: [(&str, [(&str, Decimal); 3]); 4] = [
        (
            "USD",
            [
                ("EUR", Decimal::new(85, 2)),
                ("GBP", Decimal::new(73, 2)),
                ("HUF", Decimal::new(300, 0)),
            ],
        ),
        (
            "EUR",
            [
                ("USD", Decimal::new(118, 2)),
                ("GBP", Decimal::new(86, 2)),
                ("HUF", Decimal::new(350, 0)),
            ],
        ),
        (
            "GBP",
            [
                ("USD", Decimal::new(137, 2)),
                ("EUR", Decimal::new(116, 2)),
                ("HUF", Decimal::new(410, 0)),
            ],
        ),
        (
            "HUF",
            [
                ("USD", Decimal::new(33, 4)),
                ("EUR", Decimal::new(29, 4)),
                ("GBP", Decimal::new(24, 4)),
            ],
        ),
    ];
    rows.into_iter()
        .map(|(from, quotes)| (from, quotes.into_iter().collect()))
        .collect()
});

/// The built-in static table covering USD, EUR, GBP and HUF.
#[derive(Debug, Default, Clone, Copy)]
pub struct TableRates;

impl RateProvider for TableRates {
    fn rate(&self, from: &str, to: &str) -> Option<Decimal> {
        let from = from.trim().to_ascii_uppercase();
        let to = to.trim().to_ascii_uppercase();
        TABLE
            .get(from.as_str())
            .and_then(|quotes| quotes.get(to.as_str()))
            .copied()
    }
}

/// Latest rates for one base currency, fetched once and looked up in memory.
#[derive(Debug, Clone)]
pub struct LiveRates {
    base: String,
    rates: HashMap<String, Decimal>,
}

#[derive(Debug, Deserialize)]
struct LatestResponse {
    base: String,
    rates: HashMap<String, f64>,
}

impl LiveRates {
    pub fn from_rates(base: &str, rates: HashMap<String, Decimal>) -> Self {
        Self {
            base: base.to_ascii_uppercase(),
            rates: rates
                .into_iter()
                .map(|(k, v)| (k.to_ascii_uppercase(), v))
                .collect(),
        }
    }

    /// Fetch the latest ECB reference rates via Frankfurter.
    pub fn fetch(base: &str, quotes: &[&str]) -> Result<Self> {
        let base = base.to_ascii_uppercase();
        let to_param = quotes
            .iter()
            .map(|q| q.to_ascii_uppercase())
            .filter(|q| q != &base)
            .collect::<Vec<_>>()
            .join(",");
        let url = format!("https://api.frankfurter.dev/v1/latest?base={base}&symbols={to_param}");
        let client = http_client()?;
        let resp = client
            .get(&url)
            .send()
            .with_context(|| format!("Fetching rates from {}", url))?
            .error_for_status()?;
        let body: LatestResponse = resp.json()?;
        let mut rates = HashMap::with_capacity(body.rates.len());
        for (quote, rate) in body.rates {
            let d = rate
                .to_string()
                .parse::<Decimal>()
                .with_context(|| format!("Invalid rate '{}' for {}/{}", rate, body.base, quote))?;
            rates.insert(quote, d);
        }
        debug!(base = %body.base, count = rates.len(), "fetched live rates");
        Ok(Self::from_rates(&body.base, rates))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    fn quote(&self, ccy: &str) -> Option<Decimal> {
        if ccy == self.base {
            Some(Decimal::ONE)
        } else {
            self.rates.get(ccy).copied()
        }
    }
}

impl RateProvider for LiveRates {
    fn rate(&self, from: &str, to: &str) -> Option<Decimal> {
        let from = from.trim().to_ascii_uppercase();
        let to = to.trim().to_ascii_uppercase();
        let from_q = self.quote(&from)?;
        let to_q = self.quote(&to)?;
        if from_q.is_zero() {
            return None;
        }
        // Cross through the base: 1 from = (to_q / from_q) to.
        Some(to_q / from_q)
    }
}

/// Ask `primary` first, then `secondary`.
#[derive(Debug, Clone)]
pub struct Chained<A, B> {
    pub primary: A,
    pub secondary: B,
}

impl<A: RateProvider, B: RateProvider> RateProvider for Chained<A, B> {
    fn rate(&self, from: &str, to: &str) -> Option<Decimal> {
        self.primary
            .rate(from, to)
            .or_else(|| self.secondary.rate(from, to))
    }
}

fn same_currency(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Rate from `from` into `to` using the static table.
pub fn resolve_rate(from: &str, to: &str) -> Decimal {
    resolve_rate_with(&TableRates, from, to)
}

pub fn resolve_rate_with<P: RateProvider + ?Sized>(provider: &P, from: &str, to: &str) -> Decimal {
    if same_currency(from, to) {
        return Decimal::ONE;
    }
    match provider.rate(from, to) {
        Some(r) => r,
        None => {
            warn!(from, to, "no exchange rate for pair, using 1.0");
            Decimal::ONE
        }
    }
}

/// Rate to store alongside a new record so later conversions do not drift
/// with the table. `None` when the record is already in the target currency.
pub fn snapshot_rate(record_currency: &str, default_currency: &str) -> Option<Decimal> {
    (!same_currency(record_currency, default_currency))
        .then(|| resolve_rate(record_currency, default_currency))
}

/// Convert `amount` using the snapshot rate when one was recorded, otherwise
/// the static table. No rounding is applied. A product beyond the `Decimal`
/// range saturates instead of failing.
pub fn convert(amount: Decimal, from: &str, to: &str, snapshot: Option<Decimal>) -> Decimal {
    convert_with(&TableRates, amount, from, to, snapshot)
}

pub fn convert_with<P: RateProvider + ?Sized>(
    provider: &P,
    amount: Decimal,
    from: &str,
    to: &str,
    snapshot: Option<Decimal>,
) -> Decimal {
    if same_currency(from, to) {
        return amount;
    }
    let rate = snapshot.unwrap_or_else(|| resolve_rate_with(provider, from, to));
    match amount.checked_mul(rate) {
        Some(v) => v,
        None => {
            warn!(%amount, %rate, from, to, "converted amount out of range, saturating");
            amount.saturating_mul(rate)
        }
    }
}
