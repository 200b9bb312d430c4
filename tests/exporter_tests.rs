// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pennyledger::models::{NewTransaction, TransactionKind};
use pennyledger::store::Store;
use pennyledger::{cli, commands::exporter};
use rust_decimal::Decimal;
use serde_json::json;
use tempfile::tempdir;

fn seeded() -> Store {
    let mut store = Store::open_in_memory().unwrap();
    let base = NewTransaction {
        title: "Corner Shop".into(),
        description: Some("Weekly run".into()),
        amount: Decimal::new(1234, 2),
        category: "Groceries".into(),
        kind: TransactionKind::Expense,
        currency: "EUR".into(),
        exchange_rate: Some(Decimal::new(118, 2)),
        transaction_date: NaiveDate::from_ymd_opt(2025, 1, 2).unwrap(),
    };
    store.insert_transaction("alice", &base).unwrap();
    store
        .insert_transaction(
            "alice",
            &NewTransaction {
                title: "Salary".into(),
                description: None,
                amount: Decimal::new(3000, 0),
                category: "Work".into(),
                kind: TransactionKind::Income,
                currency: "USD".into(),
                exchange_rate: None,
                transaction_date: NaiveDate::from_ymd_opt(2025, 1, 31).unwrap(),
            },
        )
        .unwrap();
    // Another user's rows never leak into an export.
    store.insert_transaction("bob", &base).unwrap();
    store
}

fn export(store: &mut Store, args: &[&str]) {
    let mut argv = vec!["pennyledger", "export", "transactions"];
    argv.extend_from_slice(args);
    let matches = cli::build_cli().get_matches_from(argv);
    let (_, sub) = matches.subcommand().unwrap();
    exporter::handle(store, "alice", sub).unwrap();
}

#[test]
fn export_transactions_streams_pretty_json() {
    let mut store = seeded();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.json");
    let out_str = out_path.to_string_lossy().to_string();

    export(&mut store, &["--format", "json", "--out", &out_str]);

    let body = std::fs::read_to_string(&out_path).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&body).unwrap();
    let items = parsed.as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(
        items[0],
        json!({
            "id": 1,
            "date": "2025-01-02",
            "title": "Corner Shop",
            "type": "expense",
            "category": "Groceries",
            "amount": "12.34",
            "currency": "EUR",
            "exchange_rate": "1.18",
            "description": "Weekly run",
        })
    );
    assert_eq!(items[1]["title"], "Salary");
    assert_eq!(items[1]["exchange_rate"], serde_json::Value::Null);
}

#[test]
fn export_csv_respects_date_range() {
    let mut store = seeded();
    let dir = tempdir().unwrap();
    let out_path = dir.path().join("export.csv");
    let out_str = out_path.to_string_lossy().to_string();

    export(&mut store, &["--out", &out_str, "--from", "2025-01-15"]);

    let mut rdr = csv::Reader::from_path(&out_path).unwrap();
    let headers = rdr.headers().unwrap().clone();
    assert_eq!(&headers[1], "date");
    let records: Vec<csv::StringRecord> = rdr.records().map(|r| r.unwrap()).collect();
    assert_eq!(records.len(), 1);
    assert_eq!(&records[0][2], "Salary");
    assert_eq!(&records[0][3], "income");
    assert_eq!(&records[0][7], "");
}

#[test]
fn unknown_format_is_an_error() {
    let mut store = seeded();
    let dir = tempdir().unwrap();
    let out_str = dir.path().join("x.xml").to_string_lossy().to_string();
    let matches = cli::build_cli().get_matches_from([
        "pennyledger", "export", "transactions", "--format", "xml", "--out", &out_str,
    ]);
    let (_, sub) = matches.subcommand().unwrap();
    assert!(exporter::handle(&mut store, "alice", sub).is_err());
}
