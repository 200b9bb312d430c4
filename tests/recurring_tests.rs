// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use chrono::NaiveDate;
use pennyledger::models::{
    Frequency, InvestmentType, NewRecurringInvestment, NewRecurringTransaction, Schedule,
    TransactionKind,
};
use pennyledger::recurrence::{MonthOverflow, next_occurrence, next_occurrence_with, occurrences_until};
use pennyledger::store::Store;
use rust_decimal::Decimal;

fn d(y: i32, m: u32, day: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, day).unwrap()
}

fn rent(schedule: Schedule, currency: &str) -> NewRecurringTransaction {
    NewRecurringTransaction {
        title: "Rent".into(),
        description: None,
        amount: Decimal::from(900),
        category: "Housing".into(),
        kind: TransactionKind::Expense,
        currency: currency.into(),
        exchange_rate: None,
        schedule,
    }
}

#[test]
fn jan_31_monthly_rolls_into_march() {
    assert_eq!(next_occurrence(d(2024, 1, 31), Frequency::Monthly), d(2024, 3, 2));
    assert_eq!(
        next_occurrence_with(d(2024, 1, 31), Frequency::Monthly, MonthOverflow::Clamp),
        d(2024, 2, 29)
    );
    assert_eq!(next_occurrence(d(2024, 2, 29), Frequency::Yearly), d(2025, 3, 1));
    assert_eq!(next_occurrence(d(2024, 12, 30), Frequency::Weekly), d(2025, 1, 6));
}

#[test]
fn occurrences_walk_calendar_units() {
    let dates: Vec<_> = occurrences_until(d(2024, 1, 31), Frequency::Monthly, d(2024, 5, 1)).collect();
    assert_eq!(dates, vec![d(2024, 1, 31), d(2024, 3, 2), d(2024, 4, 2)]);
}

#[test]
fn run_generates_every_due_occurrence_once() {
    let mut store = Store::open_in_memory().unwrap();
    let t = store
        .insert_recurring_transaction(
            "u",
            &rent(Schedule::starting(Frequency::Monthly, d(2024, 1, 31), None), "EUR"),
        )
        .unwrap();

    let run = store.run_recurring("u", d(2024, 4, 15)).unwrap();
    let dates: Vec<_> = run.transactions.iter().map(|t| t.transaction_date).collect();
    assert_eq!(dates, vec![d(2024, 1, 31), d(2024, 3, 2), d(2024, 4, 2)]);
    // Snapshot into the default currency (USD) at generation time.
    assert!(run
        .transactions
        .iter()
        .all(|t| t.exchange_rate == Some(Decimal::new(118, 2))));
    assert_eq!(run.deactivated, 0);

    let template = store.get_recurring_transaction("u", t.id).unwrap();
    assert_eq!(template.schedule.next_occurrence, d(2024, 5, 2));
    assert!(template.schedule.is_active);

    let again = store.run_recurring("u", d(2024, 4, 15)).unwrap();
    assert!(again.transactions.is_empty());
    assert!(store.due_recurring_transactions("u", d(2024, 4, 15)).unwrap().is_empty());
}

#[test]
fn template_past_end_date_is_deactivated() {
    let mut store = Store::open_in_memory().unwrap();
    let schedule = Schedule::starting(Frequency::Weekly, d(2024, 6, 3), Some(d(2024, 6, 17)));
    let t = store
        .insert_recurring_transaction("u", &rent(schedule, "USD"))
        .unwrap();

    let run = store.run_recurring("u", d(2024, 12, 31)).unwrap();
    assert_eq!(run.transactions.len(), 3);
    assert!(run.transactions.iter().all(|t| t.exchange_rate.is_none()));
    assert_eq!(run.deactivated, 1);
    assert!(!store.get_recurring_transaction("u", t.id).unwrap().schedule.is_active);
}

#[test]
fn paused_templates_are_skipped() {
    let mut store = Store::open_in_memory().unwrap();
    let t = store
        .insert_recurring_transaction(
            "u",
            &rent(Schedule::starting(Frequency::Daily, d(2024, 1, 1), None), "USD"),
        )
        .unwrap();
    store.set_recurring_active("u", t.id, false, false).unwrap();
    assert!(store.run_recurring("u", d(2024, 1, 5)).unwrap().transactions.is_empty());

    store.set_recurring_active("u", t.id, false, true).unwrap();
    assert_eq!(store.run_recurring("u", d(2024, 1, 5)).unwrap().transactions.len(), 5);
}

#[test]
fn recurring_investments_become_holdings() {
    let mut store = Store::open_in_memory().unwrap();
    let plan = NewRecurringInvestment {
        symbol: "btc".into(),
        name: "Bitcoin".into(),
        investment_type: InvestmentType::Crypto,
        quantity: Decimal::new(1, 2),
        purchase_price: Decimal::from(60000),
        currency: "USD".into(),
        exchange_rate: None,
        schedule: Schedule::starting(Frequency::Monthly, d(2024, 1, 1), None),
    };
    let t = store.insert_recurring_investment("u", &plan).unwrap();

    let run = store.run_recurring("u", d(2024, 3, 1)).unwrap();
    assert_eq!(run.investments.len(), 3);
    assert!(run.investments.iter().all(|i| i.symbol == "BTC"));
    assert_eq!(run.investments[0].current_price, Decimal::from(60000));

    store.delete_recurring("u", t.id, true).unwrap();
    assert!(store.list_recurring_investments("u").unwrap().is_empty());
    assert!(store.delete_recurring("u", t.id, true).is_err());
}
