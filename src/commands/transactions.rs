// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{
    currency_code, currency_or_default, date_range, id_arg, opt_date, opt_decimal, optional,
    rate_snapshot, required, today,
};
use crate::fx::snapshot_rate;
use crate::models::{NewTransaction, Transaction, TransactionKind};
use crate::store::{Store, TransactionFilter};
use crate::utils::{fmt_money, maybe_print_json, parse_non_negative, pretty_table};
use anyhow::Result;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, user, sub)?,
        Some(("list", sub)) => list(store, user, sub)?,
        Some(("edit", sub)) => edit(store, user, sub)?,
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            store.delete_transaction(user, id)?;
            println!("Deleted transaction #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let currency = currency_or_default(store, user, sub)?;
    let exchange_rate = rate_snapshot(store, user, sub, &currency)?;
    let new = NewTransaction {
        title: required(sub, "title")?.to_string(),
        description: optional(sub, "description").map(str::to_string),
        amount: parse_non_negative("amount", required(sub, "amount")?)?,
        category: required(sub, "category")?.to_string(),
        kind: required(sub, "type")?.parse()?,
        currency,
        exchange_rate,
        transaction_date: opt_date(sub, "date")?.unwrap_or_else(today),
    };
    let tx = store.insert_transaction(user, &new)?;
    println!(
        "Recorded {} {} '{}' on {} (#{})",
        tx.kind,
        fmt_money(&tx.amount, &tx.currency),
        tx.title,
        tx.transaction_date,
        tx.id
    );
    Ok(())
}

/// Transactions matching the `list` flags, newest first.
pub fn query(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<Vec<Transaction>> {
    let filter = TransactionFilter {
        range: date_range(sub)?,
        kind: optional(sub, "type")
            .map(str::parse::<TransactionKind>)
            .transpose()?,
        category: optional(sub, "category").map(str::to_string),
        limit: sub.get_one::<usize>("limit").copied(),
    };
    store.list_transactions(user, &filter)
}

fn list(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = query(store, user, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let date_format = store.preferences(user)?.date_format;
    let rows = data
        .iter()
        .map(|t| {
            vec![
                t.id.to_string(),
                date_format.format(t.transaction_date),
                t.title.clone(),
                t.kind.to_string(),
                t.category.clone(),
                fmt_money(&t.amount, &t.currency),
                t.exchange_rate.map(|r| r.to_string()).unwrap_or_default(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Date", "Title", "Type", "Category", "Amount", "Rate"],
            rows
        )
    );
    Ok(())
}

fn edit(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub)?;
    let current = store.get_transaction(user, id)?;
    let currency = match optional(sub, "currency") {
        Some(c) => currency_code(c)?,
        None => current.currency.clone(),
    };
    // A new currency needs a new snapshot unless one was supplied.
    let exchange_rate = match opt_decimal(sub, "rate")? {
        Some(rate) => Some(rate),
        None if currency != current.currency => {
            let default_ccy = store.default_currency(user)?;
            snapshot_rate(&currency, &default_ccy)
        }
        None => current.exchange_rate,
    };
    let new = NewTransaction {
        title: optional(sub, "title").map_or(current.title, str::to_string),
        description: optional(sub, "description")
            .map(str::to_string)
            .or(current.description),
        amount: match optional(sub, "amount") {
            Some(a) => parse_non_negative("amount", a)?,
            None => current.amount,
        },
        category: optional(sub, "category").map_or(current.category, str::to_string),
        kind: match optional(sub, "type") {
            Some(k) => k.parse()?,
            None => current.kind,
        },
        currency,
        exchange_rate,
        transaction_date: opt_date(sub, "date")?.unwrap_or(current.transaction_date),
    };
    let tx = store.update_transaction(user, id, &new)?;
    println!("Updated transaction #{} '{}'", tx.id, tx.title);
    Ok(())
}
