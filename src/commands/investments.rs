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
use crate::models::NewInvestment;
use crate::store::Store;
use crate::utils::{fmt_money, maybe_print_json, parse_non_negative, pretty_table};
use anyhow::{Result, bail};
use rust_decimal::Decimal;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, user, sub)?,
        Some(("list", sub)) => list(store, user, sub)?,
        Some(("edit", sub)) => edit(store, user, sub)?,
        Some(("price", sub)) => {
            let symbol = required(sub, "symbol")?;
            let price = parse_non_negative("current_price", required(sub, "price")?)?;
            let n = store.set_current_price(user, symbol, price)?;
            if n == 0 {
                bail!("No holdings of '{}'", symbol);
            }
            println!("Updated {} holding(s) of {} to {}", n, symbol.to_uppercase(), price);
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            store.delete_investment(user, id)?;
            println!("Deleted investment #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let currency = currency_or_default(store, user, sub)?;
    let exchange_rate = rate_snapshot(store, user, sub, &currency)?;
    let purchase_price = parse_non_negative("purchase_price", required(sub, "purchase_price")?)?;
    let current_price = match optional(sub, "current_price") {
        Some(p) => parse_non_negative("current_price", p)?,
        None => purchase_price,
    };
    let new = NewInvestment {
        symbol: required(sub, "symbol")?.to_string(),
        name: required(sub, "name")?.to_string(),
        investment_type: required(sub, "type")?.parse()?,
        quantity: parse_non_negative("quantity", required(sub, "quantity")?)?,
        purchase_price,
        current_price,
        currency,
        exchange_rate,
        purchase_date: opt_date(sub, "date")?.unwrap_or_else(today),
    };
    let inv = store.insert_investment(user, &new)?;
    println!(
        "Added {} x {} at {} (#{})",
        inv.quantity,
        inv.symbol,
        fmt_money(&inv.purchase_price, &inv.currency),
        inv.id
    );
    Ok(())
}

fn list(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = store.list_investments(user, &date_range(sub)?)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let date_format = store.preferences(user)?.date_format;
    let rows = data
        .iter()
        .map(|i| {
            vec![
                i.id.to_string(),
                i.symbol.clone(),
                i.name.clone(),
                i.investment_type.to_string(),
                i.quantity.to_string(),
                fmt_money(&i.value(), &i.currency),
                fmt_money(&i.gain_loss(), &i.currency),
                i.gain_loss_pct()
                    .map(|p| format!("{:.2}%", p.round_dp(2)))
                    .unwrap_or_default(),
                date_format.format(i.purchase_date),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Symbol", "Name", "Type", "Qty", "Value", "Gain/Loss", "%", "Purchased"],
            rows
        )
    );
    Ok(())
}

fn edit(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let id = id_arg(sub)?;
    let current = store.get_investment(user, id)?;
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
    let decimal_or = |id: &'static str, fallback: Decimal| -> Result<Decimal> {
        match optional(sub, id) {
            Some(v) => parse_non_negative(id, v),
            None => Ok(fallback),
        }
    };
    let new = NewInvestment {
        quantity: decimal_or("quantity", current.quantity)?,
        purchase_price: decimal_or("purchase_price", current.purchase_price)?,
        current_price: decimal_or("current_price", current.current_price)?,
        symbol: optional(sub, "symbol").map_or(current.symbol, str::to_string),
        name: optional(sub, "name").map_or(current.name, str::to_string),
        investment_type: match optional(sub, "type") {
            Some(t) => t.parse()?,
            None => current.investment_type,
        },
        currency,
        exchange_rate,
        purchase_date: opt_date(sub, "date")?.unwrap_or(current.purchase_date),
    };
    let inv = store.update_investment(user, id, &new)?;
    println!("Updated investment #{} ({})", inv.id, inv.symbol);
    Ok(())
}
