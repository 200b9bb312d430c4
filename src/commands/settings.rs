// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{currency_code, optional};
use crate::models::DateFormat;
use crate::store::Store;
use crate::utils::pretty_table;
use anyhow::Result;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("set", sub)) => {
            let current = store.preferences(user)?;
            let currency = match optional(sub, "currency") {
                Some(c) => currency_code(c)?,
                None => current.default_currency,
            };
            let date_format = match optional(sub, "date_format") {
                Some(f) => f.parse::<DateFormat>()?,
                None => current.date_format,
            };
            let saved = store.save_preferences(user, &currency, date_format)?;
            println!(
                "Preferences saved: {} / {}",
                saved.default_currency, saved.date_format
            );
        }
        _ => show(store, user)?,
    }
    Ok(())
}

fn show(store: &mut Store, user: &str) -> Result<()> {
    let p = store.preferences(user)?;
    let rows = vec![
        vec!["User".to_string(), p.user_id.clone()],
        vec!["Default currency".to_string(), p.default_currency.clone()],
        vec!["Date format".to_string(), p.date_format.to_string()],
        vec![
            "Saved".to_string(),
            if p.id.is_some() { "yes" } else { "no (defaults)" }.to_string(),
        ],
    ];
    println!("{}", pretty_table(&["Setting", "Value"], rows));
    Ok(())
}
