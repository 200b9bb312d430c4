// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{
    currency_code, currency_or_default, date_range, id_arg, opt_cell, opt_date, opt_decimal,
    optional, rate_snapshot, required,
};
use crate::fx::snapshot_rate;
use crate::models::NewElectricityBill;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_date, parse_non_negative, pretty_table};
use anyhow::Result;
use rust_decimal::Decimal;
use tracing::debug;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, user, sub)?,
        Some(("list", sub)) => list(store, user, sub)?,
        Some(("edit", sub)) => edit(store, user, sub)?,
        Some(("history", sub)) => history(store, user, sub)?,
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            store.delete_bill(user, id)?;
            println!("Deleted bill #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn opt_non_negative(sub: &clap::ArgMatches, id: &'static str) -> Result<Option<Decimal>> {
    optional(sub, id)
        .map(|v| parse_non_negative(id, v))
        .transpose()
}

fn add(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let bill_date = parse_date(required(sub, "bill_date")?)?;
    let currency = currency_or_default(store, user, sub)?;
    let exchange_rate = rate_snapshot(store, user, sub, &currency)?;

    // Missing previous readings carry over from the latest bill.
    let latest = store.latest_bill(user)?;
    let previous_day_reading = match opt_non_negative(sub, "prev_day")? {
        Some(v) => Some(v),
        None => latest.as_ref().map(|b| b.day_reading),
    };
    let previous_night_reading = match opt_non_negative(sub, "prev_night")? {
        Some(v) => Some(v),
        None => latest.as_ref().map(|b| b.night_reading),
    };
    if let Some(b) = &latest {
        debug!(from_bill = b.id, "previous readings defaulted from latest bill");
    }

    let new = NewElectricityBill {
        bill_date,
        reading_date: opt_date(sub, "reading_date")?.unwrap_or(bill_date),
        day_reading: parse_non_negative("day_reading", required(sub, "day_reading")?)?,
        night_reading: parse_non_negative("night_reading", required(sub, "night_reading")?)?,
        previous_day_reading,
        previous_night_reading,
        amount_paid: parse_non_negative("amount_paid", required(sub, "amount")?)?,
        currency,
        exchange_rate,
        day_rate: opt_non_negative(sub, "day_rate")?,
        night_rate: opt_non_negative(sub, "night_rate")?,
        standing_charge: opt_non_negative(sub, "standing_charge")?,
        notes: optional(sub, "notes").map(str::to_string),
    };
    let bill = store.insert_bill(user, &new)?;
    println!(
        "Recorded bill #{} for {}: {} used, {} paid",
        bill.id,
        bill.bill_date,
        opt_cell(bill.total_usage()),
        fmt_money(&bill.amount_paid, &bill.currency)
    );
    Ok(())
}

fn list(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = store.list_bills(user, &date_range(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let date_format = store.preferences(user)?.date_format;
    let rows = data
        .iter()
        .map(|b| {
            vec![
                b.id.to_string(),
                date_format.format(b.bill_date),
                b.day_reading.to_string(),
                b.night_reading.to_string(),
                opt_cell(b.day_usage()),
                opt_cell(b.night_usage()),
                fmt_money(&b.amount_paid, &b.currency),
                b.estimated_cost()
                    .map(|c| fmt_money(&c, &b.currency))
                    .unwrap_or_default(),
                b.notes.clone().unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Day", "Night", "Day Use", "Night Use", "Paid", "Estimated", "Notes"],
            rows
        )
    );
    Ok(())
}

fn edit(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub)?;
    let current = store.get_bill(user, id)?;
    let currency = match optional(sub, "currency") {
        Some(c) => currency_code(c)?,
        None => current.currency.clone(),
    };
    let exchange_rate = match opt_decimal(sub, "rate")? {
        Some(rate) => Some(rate),
        None if currency != current.currency => {
            let default_ccy = store.default_currency(user)?;
            snapshot_rate(&currency, &default_ccy)
        }
        None => current.exchange_rate,
    };
    let new = NewElectricityBill {
        bill_date: opt_date(sub, "bill_date")?.unwrap_or(current.bill_date),
        reading_date: opt_date(sub, "reading_date")?.unwrap_or(current.reading_date),
        day_reading: opt_non_negative(sub, "day_reading")?.unwrap_or(current.day_reading),
        night_reading: opt_non_negative(sub, "night_reading")?.unwrap_or(current.night_reading),
        previous_day_reading: opt_non_negative(sub, "prev_day")?.or(current.previous_day_reading),
        previous_night_reading: opt_non_negative(sub, "prev_night")?
            .or(current.previous_night_reading),
        amount_paid: opt_non_negative(sub, "amount")?.unwrap_or(current.amount_paid),
        currency,
        exchange_rate,
        day_rate: opt_non_negative(sub, "day_rate")?.or(current.day_rate),
        night_rate: opt_non_negative(sub, "night_rate")?.or(current.night_rate),
        standing_charge: opt_non_negative(sub, "standing_charge")?.or(current.standing_charge),
        notes: optional(sub, "notes").map(str::to_string).or(current.notes),
    };
    let bill = store.update_bill(user, id, &new)?;
    println!("Updated bill #{} ({})", bill.id, bill.bill_date);
    Ok(())
}

fn history(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let months = sub.get_one::<u32>("months").copied().unwrap_or(12);
    let points = store.consumption_history(user, months)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &points)? {
        return Ok(());
    }
    if points.is_empty() {
        println!("No bills recorded yet.");
        return Ok(());
    }
    let date_format = store.preferences(user)?.date_format;
    let rows = points
        .iter()
        .map(|p| {
            vec![
                date_format.format(p.bill_date),
                opt_cell(p.day_usage),
                opt_cell(p.night_usage),
                opt_cell(p.total_usage),
                fmt_money(&p.amount_paid, &p.currency),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Bill Date", "Day", "Night", "Total", "Paid"], rows)
    );
    Ok(())
}
