// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use pennyledger::models::TransactionKind;
use pennyledger::store::Store;
use pennyledger::{cli, commands::transactions};
use rust_decimal::Decimal;

fn run(store: &mut Store, args: &[&str]) {
    let mut argv = vec!["pennyledger"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (name, sub) = matches.subcommand().expect("subcommand");
    assert_eq!(name, "tx");
    transactions::handle(store, "alice", sub).unwrap();
}

fn setup() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    for day in 1..=3 {
        run(
            &mut store,
            &[
                "tx", "add", "--title", "Coffee", "--amount", "10", "--type", "expense",
                "--category", "Food", "--date", &format!("2025-01-0{}", day),
            ],
        );
    }
    store
}

fn list(store: &mut Store, args: &[&str]) -> Vec<pennyledger::models::Transaction> {
    let mut argv = vec!["pennyledger", "tx", "list"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, tx_m) = matches.subcommand().unwrap();
    let (_, list_m) = tx_m.subcommand().unwrap();
    transactions::query(store, "alice", list_m).unwrap()
}

#[test]
fn list_limit_respected() {
    let mut store = setup();
    let rows = list(&mut store, &["--limit", "2"]);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].transaction_date.to_string(), "2025-01-03");
}

#[test]
fn list_filters_by_range_and_type() {
    let mut store = setup();
    run(
        &mut store,
        &[
            "tx", "add", "--title", "Salary", "--amount", "1000", "--type", "income",
            "--category", "Work", "--date", "2025-01-02",
        ],
    );
    let rows = list(&mut store, &["--from", "2025-01-02", "--to", "2025-01-02"]);
    assert_eq!(rows.len(), 2);
    let incomes = list(&mut store, &["--type", "income"]);
    assert_eq!(incomes.len(), 1);
    assert_eq!(incomes[0].kind, TransactionKind::Income);
}

#[test]
fn add_in_foreign_currency_snapshots_rate() {
    let mut store = Store::open_in_memory().unwrap();
    run(
        &mut store,
        &[
            "tx", "add", "--title", "Croissant", "--amount", "4.50", "--type", "expense",
            "--category", "Food", "--currency", "eur", "--date", "2025-02-01",
        ],
    );
    run(
        &mut store,
        &[
            "tx", "add", "--title", "Tea", "--amount", "3", "--type", "expense",
            "--category", "Food", "--currency", "GBP", "--rate", "1.25", "--date", "2025-02-02",
        ],
    );
    let rows = list(&mut store, &[]);
    assert_eq!(rows[0].currency, "GBP");
    assert_eq!(rows[0].exchange_rate, Some(Decimal::new(125, 2)));
    assert_eq!(rows[1].currency, "EUR");
    assert_eq!(rows[1].exchange_rate, Some(Decimal::new(118, 2)));
}

#[test]
fn edit_keeps_unspecified_fields() {
    let mut store = setup();
    let id = list(&mut store, &["--limit", "1"])[0].id;
    run(
        &mut store,
        &["tx", "edit", &id.to_string(), "--amount", "12.5", "--title", "Latte"],
    );
    let t = store.get_transaction("alice", id).unwrap();
    assert_eq!(t.title, "Latte");
    assert_eq!(t.amount, Decimal::new(125, 1));
    assert_eq!(t.category, "Food");
    assert_eq!(t.kind, TransactionKind::Expense);
}

#[test]
fn negative_amount_is_rejected() {
    let mut store = Store::open_in_memory().unwrap();
    let matches = cli::build_cli().get_matches_from([
        "pennyledger", "tx", "add", "--title", "Refund", "--amount=-5", "--type", "income",
        "--category", "Misc",
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    assert!(transactions::handle(&mut store, "alice", sub).is_err());
    assert!(list(&mut store, &[]).is_empty());
}
