// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{currency_or_default, id_arg, opt_date, opt_decimal, optional, required, today};
use crate::models::{Frequency, NewRecurringInvestment, NewRecurringTransaction, Schedule};
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_non_negative, pretty_table};
use anyhow::Result;
use serde::Serialize;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add-tx", sub)) => add_transaction(store, user, sub)?,
        Some(("add-invest", sub)) => add_investment(store, user, sub)?,
        Some(("list", sub)) => list(store, user, sub)?,
        Some(("run", sub)) => run(store, user, sub)?,
        Some(("pause", sub)) => set_active(store, user, sub, false)?,
        Some(("resume", sub)) => set_active(store, user, sub, true)?,
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            store.delete_recurring(user, id, sub.get_flag("investment"))?;
            println!("Deleted recurring template #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn schedule(sub: &clap::ArgMatches) -> Result<Schedule> {
    let frequency: Frequency = required(sub, "frequency")?.parse()?;
    let start = parse_date(required(sub, "start")?)?;
    Ok(Schedule::starting(frequency, start, opt_date(sub, "end")?))
}

fn add_transaction(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewRecurringTransaction {
        title: required(sub, "title")?.to_string(),
        description: optional(sub, "description").map(str::to_string),
        amount: parse_non_negative("amount", required(sub, "amount")?)?,
        category: required(sub, "category")?.to_string(),
        kind: required(sub, "type")?.parse()?,
        currency: currency_or_default(store, user, sub)?,
        exchange_rate: opt_decimal(sub, "rate")?,
        schedule: schedule(sub)?,
    };
    let t = store.insert_recurring_transaction(user, &new)?;
    println!(
        "Scheduled '{}' {} from {} (#{})",
        t.title, t.schedule.frequency, t.schedule.start_date, t.id
    );
    Ok(())
}

fn add_investment(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewRecurringInvestment {
        symbol: required(sub, "symbol")?.to_string(),
        name: required(sub, "name")?.to_string(),
        investment_type: required(sub, "type")?.parse()?,
        quantity: parse_non_negative("quantity", required(sub, "quantity")?)?,
        purchase_price: parse_non_negative("purchase_price", required(sub, "purchase_price")?)?,
        currency: currency_or_default(store, user, sub)?,
        exchange_rate: opt_decimal(sub, "rate")?,
        schedule: schedule(sub)?,
    };
    let t = store.insert_recurring_investment(user, &new)?;
    println!(
        "Scheduled {} x {} {} from {} (#{})",
        t.quantity, t.symbol, t.schedule.frequency, t.schedule.start_date, t.id
    );
    Ok(())
}

#[derive(Serialize)]
struct TemplateRow {
    id: i64,
    kind: &'static str,
    label: String,
    amount: String,
    frequency: String,
    next_occurrence: String,
    end_date: Option<String>,
    active: bool,
}

fn list(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let date_format = store.preferences(user)?.date_format;
    let mut data = Vec::new();
    for t in store.list_recurring_transactions(user)? {
        data.push(TemplateRow {
            id: t.id,
            kind: "transaction",
            label: format!("{} ({})", t.title, t.kind),
            amount: fmt_money(&t.amount, &t.currency),
            frequency: t.schedule.frequency.to_string(),
            next_occurrence: date_format.format(t.schedule.next_occurrence),
            end_date: t.schedule.end_date.map(|d| date_format.format(d)),
            active: t.schedule.is_active,
        });
    }
    for t in store.list_recurring_investments(user)? {
        data.push(TemplateRow {
            id: t.id,
            kind: "investment",
            label: format!("{} x {}", t.quantity, t.symbol),
            amount: fmt_money(&(t.quantity * t.purchase_price), &t.currency),
            frequency: t.schedule.frequency.to_string(),
            next_occurrence: date_format.format(t.schedule.next_occurrence),
            end_date: t.schedule.end_date.map(|d| date_format.format(d)),
            active: t.schedule.is_active,
        });
    }
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let rows = data
        .into_iter()
        .map(|r| {
            vec![
                r.id.to_string(),
                r.kind.to_string(),
                r.label,
                r.amount,
                r.frequency,
                r.next_occurrence,
                r.end_date.unwrap_or_default(),
                if r.active { "yes" } else { "no" }.to_string(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Kind", "What", "Amount", "Every", "Next", "Ends", "Active"],
            rows
        )
    );
    Ok(())
}

fn run(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let as_of = opt_date(sub, "as_of")?.unwrap_or_else(today);
    let result = store.run_recurring(user, as_of)?;
    println!(
        "Generated {} transaction(s) and {} investment(s) up to {}",
        result.transactions.len(),
        result.investments.len(),
        as_of
    );
    if result.deactivated > 0 {
        println!("{} template(s) reached their end date", result.deactivated);
    }
    Ok(())
}

fn set_active(store: &mut Store, user: &str, sub: &clap::ArgMatches, active: bool) -> Result<()> {
    let id = id_arg(sub)?;
    store.set_recurring_active(user, id, sub.get_flag("investment"), active)?;
    println!(
        "Recurring template #{} {}",
        id,
        if active { "resumed" } else { "paused" }
    );
    Ok(())
}
