// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pennyledger::models::{DateFormat, NewElectricityBill, NewTransaction, TransactionKind};
use pennyledger::store::Store;
use pennyledger::{cli, commands::reports};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn seeded() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    store.save_preferences("u", "EUR", DateFormat::Iso).unwrap();
    for (title, amount, kind, ccy, rate, date) in [
        ("Salary", 2000, TransactionKind::Income, "EUR", None, d(2024, 2, 1)),
        ("Books", 50, TransactionKind::Expense, "USD", Some(Decimal::new(9, 1)), d(2024, 1, 20)),
    ] {
        store
            .insert_transaction(
                "u",
                &NewTransaction {
                    title: title.into(),
                    description: None,
                    amount: Decimal::from(amount),
                    category: title.into(),
                    kind,
                    currency: ccy.into(),
                    exchange_rate: rate,
                    transaction_date: date,
                },
            )
            .unwrap();
    }
    store
        .insert_bill(
            "u",
            &NewElectricityBill {
                bill_date: d(2024, 2, 5),
                reading_date: d(2024, 2, 5),
                day_reading: Decimal::from(500),
                night_reading: Decimal::ZERO,
                previous_day_reading: Some(Decimal::from(400)),
                previous_night_reading: None,
                amount_paid: Decimal::from(35),
                currency: "EUR".into(),
                exchange_rate: None,
                day_rate: None,
                night_rate: None,
                standing_charge: None,
                notes: None,
            },
        )
        .unwrap();
    store
}

fn summary(store: &mut Store, args: &[&str]) -> pennyledger::aggregate::Summary {
    let mut argv = vec!["pennyledger", "report", "summary"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, report_m) = matches.subcommand().unwrap();
    let (_, sub) = report_m.subcommand().unwrap();
    reports::cash_summary(store, "u", sub).unwrap()
}

#[test]
fn summary_uses_default_currency_and_includes_bills() {
    let mut store = seeded();
    let s = summary(&mut store, &[]);
    assert_eq!(s.currency, "EUR");
    assert_eq!(s.total_income, Decimal::from(2000));
    // 50 USD at the stored 0.9 snapshot plus the 35 EUR bill.
    assert_eq!(s.total_expenses, Decimal::from(80));
    let labels: Vec<_> = s.months.iter().map(|m| m.label.as_str()).collect();
    assert_eq!(labels, vec!["2024-01", "2024-02"]);
    assert!(s.categories.iter().any(|c| c.category == "Electricity"));
}

#[test]
fn other_target_currency_ignores_default_snapshots() {
    let mut store = seeded();
    let s = summary(&mut store, &["--currency", "USD", "--from", "2024-01-01", "--to", "2024-01-31"]);
    assert_eq!(s.currency, "USD");
    assert_eq!(s.total_income, Decimal::ZERO);
    assert_eq!(s.total_expenses, Decimal::from(50));
}
