// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{date_range, required};
use crate::store::{Store, TransactionFilter};
use anyhow::{Context, Result, bail};
use serde_json::json;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("transactions", sub)) => export_transactions(store, user, sub),
        _ => Ok(()),
    }
}

fn export_transactions(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let fmt = required(sub, "format")?.to_lowercase();
    let out = required(sub, "out")?;
    let filter = TransactionFilter {
        range: date_range(sub)?,
        ..TransactionFilter::default()
    };
    let mut txs = store.list_transactions(user, &filter)?;
    // Oldest first in files.
    txs.reverse();

    match fmt.as_str() {
        "csv" => {
            let mut wtr = csv::Writer::from_path(out)
                .with_context(|| format!("Create export file {}", out))?;
            wtr.write_record([
                "id",
                "date",
                "title",
                "type",
                "category",
                "amount",
                "currency",
                "exchange_rate",
                "description",
            ])?;
            for t in &txs {
                wtr.write_record([
                    t.id.to_string(),
                    t.transaction_date.to_string(),
                    t.title.clone(),
                    t.kind.to_string(),
                    t.category.clone(),
                    t.amount.to_string(),
                    t.currency.clone(),
                    t.exchange_rate.map(|r| r.to_string()).unwrap_or_default(),
                    t.description.clone().unwrap_or_default(),
                ])?;
            }
            wtr.flush()?;
        }
        "json" => {
            let items: Vec<_> = txs
                .iter()
                .map(|t| {
                    json!({
                        "id": t.id,
                        "date": t.transaction_date.to_string(),
                        "title": t.title,
                        "type": t.kind.as_str(),
                        "category": t.category,
                        "amount": t.amount.to_string(),
                        "currency": t.currency,
                        "exchange_rate": t.exchange_rate.map(|r| r.to_string()),
                        "description": t.description,
                    })
                })
                .collect();
            std::fs::write(out, serde_json::to_string_pretty(&items)?)
                .with_context(|| format!("Write export file {}", out))?;
        }
        other => bail!("Unknown format: {} (use csv|json)", other),
    }
    println!("Exported {} transaction(s) to {}", txs.len(), out);
    Ok(())
}
