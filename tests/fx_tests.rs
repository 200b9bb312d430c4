// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pennyledger::fx::{
    Chained, Currency, LiveRates, RateProvider, TableRates, convert, convert_with, resolve_rate,
    resolve_rate_with, snapshot_rate,
};
use rust_decimal::Decimal;
use std::collections::HashMap;

struct Empty;

impl RateProvider for Empty {
    fn rate(&self, _from: &str, _to: &str) -> Option<Decimal> {
        panic!("provider must not be consulted");
    }
}

#[test]
fn same_currency_is_identity_whatever_the_snapshot() {
    let amount = Decimal::new(12345, 2);
    for c in Currency::ALL {
        assert_eq!(convert(amount, c.code(), c.code(), None), amount);
        assert_eq!(
            convert(amount, c.code(), c.code(), Some(Decimal::new(7, 0))),
            amount
        );
    }
}

#[test]
fn same_currency_rate_skips_the_provider() {
    assert_eq!(resolve_rate_with(&Empty, "USD", "USD"), Decimal::ONE);
    assert_eq!(resolve_rate_with(&Empty, "eur", "EUR"), Decimal::ONE);
}

#[test]
fn table_conversion_multiplies_by_the_rate() {
    let amount = Decimal::new(250, 0);
    for from in Currency::ALL {
        for to in Currency::ALL {
            if from == to {
                continue;
            }
            let r = TableRates.rate(from.code(), to.code()).unwrap();
            assert_eq!(convert(amount, from.code(), to.code(), None), amount * r);
        }
    }
    assert_eq!(
        convert(Decimal::new(100, 0), "USD", "HUF", None),
        Decimal::new(30000, 0)
    );
}

#[test]
fn snapshot_takes_precedence_over_table() {
    let amount = Decimal::new(10, 0);
    let snap = Decimal::new(2, 0);
    assert_ne!(resolve_rate("EUR", "USD"), snap);
    assert_eq!(convert(amount, "EUR", "USD", Some(snap)), Decimal::new(20, 0));
}

#[test]
fn unknown_pair_resolves_to_one() {
    assert_eq!(resolve_rate("USD", "JPY"), Decimal::ONE);
    assert_eq!(resolve_rate("XXX", "YYY"), Decimal::ONE);
    assert_eq!(
        convert(Decimal::new(42, 0), "JPY", "USD", None),
        Decimal::new(42, 0)
    );
}

#[test]
fn snapshot_rate_targets_default_currency() {
    assert_eq!(snapshot_rate("EUR", "USD"), Some(Decimal::new(118, 2)));
    assert_eq!(snapshot_rate("usd", "USD"), None);
}

#[test]
fn live_rates_fall_back_to_table_for_missing_quotes() {
    let mut rates = HashMap::new();
    rates.insert("EUR".to_string(), Decimal::new(92, 2));
    let chain = Chained {
        primary: LiveRates::from_rates("USD", rates),
        secondary: TableRates,
    };
    assert_eq!(
        convert_with(&chain, Decimal::new(100, 0), "USD", "EUR", None),
        Decimal::new(92, 0)
    );
    assert_eq!(
        convert_with(&chain, Decimal::new(1, 0), "USD", "GBP", None),
        Decimal::new(73, 2)
    );
}

#[test]
fn out_of_range_conversion_saturates() {
    let big = Decimal::MAX / Decimal::from(100);
    assert_eq!(convert(big, "USD", "HUF", None), Decimal::MAX);
    assert_eq!(convert(big, "EUR", "USD", Some(Decimal::new(1000, 0))), Decimal::MAX);
    assert_eq!(convert(big, "HUF", "USD", None), big * Decimal::new(33, 4));
}
