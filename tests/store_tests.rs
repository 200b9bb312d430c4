// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pennyledger::aggregate::summarize;
use pennyledger::error::LedgerError;
use pennyledger::models::{
    DateFormat, InvestmentType, NewElectricityBill, NewInvestment, NewPropertyAddress,
    NewTransaction, TransactionKind,
};
use pennyledger::store::{DateRange, Store, TransactionFilter};
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn tx(title: &str, amount: i64, kind: TransactionKind, ccy: &str, rate: Option<Decimal>) -> NewTransaction {
    NewTransaction {
        title: title.into(),
        description: None,
        amount: Decimal::from(amount),
        category: "General".into(),
        kind,
        currency: ccy.into(),
        exchange_rate: rate,
        transaction_date: d(2024, 5, 10),
    }
}

fn all(store: &mut Store, user: &str) -> Vec<pennyledger::models::Transaction> {
    store
        .list_transactions(user, &TransactionFilter::default())
        .unwrap()
}

fn not_found(err: &anyhow::Error) -> bool {
    matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::NotFound { .. })
    )
}

#[test]
fn summary_of_mixed_currency_transactions() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .insert_transaction("u", &tx("Pay", 100, TransactionKind::Income, "USD", None))
        .unwrap();
    store
        .insert_transaction("u", &tx("Food", 40, TransactionKind::Expense, "USD", None))
        .unwrap();
    store
        .insert_transaction(
            "u",
            &tx("Museum", 10, TransactionKind::Expense, "EUR", Some(Decimal::new(85, 2))),
        )
        .unwrap();

    let s = summarize(&all(&mut store, "u"), "USD");
    assert_eq!(s.total_income, Decimal::new(100, 0));
    assert_eq!(s.total_expenses, Decimal::new(485, 1));
    assert_eq!(s.net, Decimal::new(515, 1));
}

#[test]
fn deleting_removes_from_totals_and_second_delete_is_not_found() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .insert_transaction("u", &tx("Pay", 100, TransactionKind::Income, "USD", None))
        .unwrap();
    let food = store
        .insert_transaction("u", &tx("Food", 40, TransactionKind::Expense, "USD", None))
        .unwrap();
    assert_eq!(summarize(&all(&mut store, "u"), "USD").net, Decimal::new(60, 0));

    store.delete_transaction("u", food.id).unwrap();
    assert_eq!(summarize(&all(&mut store, "u"), "USD").net, Decimal::new(100, 0));

    let err = store.delete_transaction("u", food.id).unwrap_err();
    assert!(not_found(&err));
}

#[test]
fn records_are_scoped_to_their_user() {
    let mut store = Store::open_in_memory().unwrap();
    let mine = store
        .insert_transaction("alice", &tx("Pay", 100, TransactionKind::Income, "USD", None))
        .unwrap();
    assert!(all(&mut store, "bob").is_empty());
    assert!(not_found(&store.get_transaction("bob", mine.id).unwrap_err()));
    assert!(not_found(&store.delete_transaction("bob", mine.id).unwrap_err()));
    assert_eq!(all(&mut store, "alice").len(), 1);
}

#[test]
fn writes_invalidate_cached_lists() {
    let mut store = Store::open_in_memory().unwrap();
    assert!(all(&mut store, "u").is_empty());
    assert!(all(&mut store, "u").is_empty());
    assert_eq!(store.cache().stats().hits, 1);

    let t = store
        .insert_transaction("u", &tx("Pay", 5, TransactionKind::Income, "USD", None))
        .unwrap();
    assert_eq!(all(&mut store, "u").len(), 1);

    let mut edit = tx("Pay", 7, TransactionKind::Income, "USD", None);
    edit.category = "Salary".into();
    store.update_transaction("u", t.id, &edit).unwrap();
    let rows = all(&mut store, "u");
    assert_eq!(rows[0].amount, Decimal::new(7, 0));
    assert_eq!(rows[0].category, "Salary");
}

#[test]
fn negative_amount_is_rejected_by_store() {
    let mut store = Store::open_in_memory().unwrap();
    let mut bad = tx("Oops", 1, TransactionKind::Expense, "USD", None);
    bad.amount = Decimal::new(-1, 0);
    let err = store.insert_transaction("u", &bad).unwrap_err();
    assert!(matches!(
        err.downcast_ref::<LedgerError>(),
        Some(LedgerError::Negative { field: "amount", .. })
    ));
}

#[test]
fn preferences_default_until_saved() {
    let mut store = Store::open_in_memory().unwrap();
    let p = store.preferences("u").unwrap();
    assert_eq!(p.id, None);
    assert_eq!(p.default_currency, "USD");
    assert_eq!(p.date_format, DateFormat::MonthDayYear);

    let saved = store.save_preferences("u", "huf", DateFormat::Iso).unwrap();
    assert!(saved.id.is_some());
    assert_eq!(store.default_currency("u").unwrap(), "HUF");

    let again = store.save_preferences("u", "EUR", DateFormat::Iso).unwrap();
    assert_eq!(again.id, saved.id);
    assert_eq!(store.preferences("other").unwrap().default_currency, "USD");
}

#[test]
fn changing_default_currency_rebases_snapshots() {
    let mut store = Store::open_in_memory().unwrap();
    store
        .insert_transaction(
            "u",
            &tx("Tea", 10, TransactionKind::Expense, "GBP", Some(Decimal::new(137, 2))),
        )
        .unwrap();
    store
        .insert_transaction(
            "u",
            &tx("Cafe", 10, TransactionKind::Expense, "EUR", Some(Decimal::new(118, 2))),
        )
        .unwrap();
    store
        .insert_transaction("v", &tx("Tea", 10, TransactionKind::Expense, "GBP", Some(Decimal::new(137, 2))))
        .unwrap();
    assert_eq!(summarize(&all(&mut store, "u"), "USD").total_expenses, Decimal::new(255, 1));

    store.save_preferences("u", "EUR", DateFormat::Iso).unwrap();
    let rows = all(&mut store, "u");
    let rate_of = |ccy: &str| rows.iter().find(|t| t.currency == ccy).unwrap().exchange_rate;
    assert_eq!(rate_of("GBP"), Some(Decimal::new(116, 2)));
    assert_eq!(rate_of("EUR"), None);
    // 10 GBP at 1.16 plus 10 EUR.
    assert_eq!(summarize(&rows, "EUR").total_expenses, Decimal::new(216, 1));

    assert_eq!(all(&mut store, "v")[0].exchange_rate, Some(Decimal::new(137, 2)));

    // Saving the same default again leaves snapshots alone.
    store.save_preferences("u", "eur", DateFormat::MonthDayYear).unwrap();
    assert_eq!(all(&mut store, "u").iter().filter(|t| t.exchange_rate.is_some()).count(), 1);
}

fn property(street: &str, current: bool) -> NewPropertyAddress {
    NewPropertyAddress {
        street: street.into(),
        city: "Budapest".into(),
        postal_code: None,
        country: "HU".into(),
        nickname: None,
        is_current: current,
        move_in_date: d(2023, 1, 1),
        move_out_date: None,
        has_day_night_meter: true,
    }
}

#[test]
fn only_one_current_property_per_user() {
    let mut store = Store::open_in_memory().unwrap();
    let a = store.insert_property("u", &property("Andrassy 1", true)).unwrap();
    let b = store.insert_property("u", &property("Vaci 2", true)).unwrap();
    store.insert_property("v", &property("Other 3", true)).unwrap();

    let current: Vec<_> = store
        .list_properties("u")
        .unwrap()
        .into_iter()
        .filter(|p| p.is_current)
        .collect();
    assert_eq!(current.len(), 1);
    assert_eq!(current[0].id, b.id);

    store.set_current_property("u", a.id).unwrap();
    assert_eq!(store.current_property("u").unwrap().unwrap().id, a.id);
    assert!(store.current_property("v").unwrap().is_some());
}

fn bill(date: NaiveDate, day: i64, prev_day: Option<i64>, paid: i64) -> NewElectricityBill {
    NewElectricityBill {
        bill_date: date,
        reading_date: date,
        day_reading: Decimal::from(day),
        night_reading: Decimal::ZERO,
        previous_day_reading: prev_day.map(Decimal::from),
        previous_night_reading: None,
        amount_paid: Decimal::from(paid),
        currency: "HUF".into(),
        exchange_rate: None,
        day_rate: None,
        night_rate: None,
        standing_charge: None,
        notes: None,
    }
}

#[test]
fn consumption_history_window_is_oldest_first() {
    let mut store = Store::open_in_memory().unwrap();
    store.insert_bill("u", &bill(d(2023, 1, 15), 1000, None, 9000)).unwrap();
    store.insert_bill("u", &bill(d(2023, 11, 15), 1200, Some(1000), 9500)).unwrap();
    store.insert_bill("u", &bill(d(2024, 1, 15), 1350, Some(1200), 9900)).unwrap();

    let history = store.consumption_history("u", 3).unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].bill_date, d(2023, 11, 15));
    assert_eq!(history[0].day_usage, Some(Decimal::from(200)));
    assert_eq!(history[1].total_usage, Some(Decimal::from(150)));

    assert_eq!(store.latest_bill("u").unwrap().unwrap().bill_date, d(2024, 1, 15));
    assert!(store.consumption_history("nobody", 12).unwrap().is_empty());

    let newest_only = store.consumption_history("u", 0).unwrap();
    assert_eq!(newest_only.len(), 1);
    assert_eq!(newest_only[0].bill_date, d(2024, 1, 15));
}

#[test]
fn investment_price_update_and_range() {
    let mut store = Store::open_in_memory().unwrap();
    let new = NewInvestment {
        symbol: "vwce".into(),
        name: "FTSE All-World".into(),
        investment_type: InvestmentType::Etf,
        quantity: Decimal::from(10),
        purchase_price: Decimal::from(100),
        current_price: Decimal::from(100),
        currency: "EUR".into(),
        exchange_rate: None,
        purchase_date: d(2024, 3, 1),
    };
    let inv = store.insert_investment("u", &new).unwrap();
    assert_eq!(inv.symbol, "VWCE");

    assert_eq!(store.set_current_price("u", "VWCE", Decimal::from(120)).unwrap(), 1);
    let listed = store
        .list_investments("u", &DateRange::new(Some(d(2024, 1, 1)), None))
        .unwrap();
    assert_eq!(listed[0].gain_loss(), Decimal::from(200));

    let later = store
        .list_investments("u", &DateRange::new(Some(d(2024, 6, 1)), None))
        .unwrap();
    assert!(later.is_empty());

    store.delete_investment("u", inv.id).unwrap();
    assert!(not_found(&store.delete_investment("u", inv.id).unwrap_err()));
}

#[test]
fn file_store_persists_across_reopen() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.sqlite");
    {
        let mut store = Store::open_at(&path).unwrap();
        store
            .insert_transaction("u", &tx("Pay", 100, TransactionKind::Income, "USD", None))
            .unwrap();
        store.save_preferences("u", "GBP", DateFormat::DayMonthYear).unwrap();
    }
    let mut store = Store::open_at(&path).unwrap();
    assert_eq!(all(&mut store, "u").len(), 1);
    assert_eq!(store.preferences("u").unwrap().date_format, DateFormat::DayMonthYear);
}
