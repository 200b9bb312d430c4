// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{id_arg, opt_date, optional, required};
use crate::models::NewPropertyAddress;
use crate::store::Store;
use crate::utils::{maybe_print_json, parse_date, pretty_table};
use anyhow::Result;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("add", sub)) => add(store, user, sub)?,
        Some(("list", sub)) => list(store, user, sub)?,
        Some(("set-current", sub)) => {
            let p = store.set_current_property(user, id_arg(sub)?)?;
            println!("Current address is now '{}'", p.label());
        }
        Some(("rm", sub)) => {
            let id = id_arg(sub)?;
            store.delete_property(user, id)?;
            println!("Deleted property #{}", id);
        }
        _ => {}
    }
    Ok(())
}

fn add(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let new = NewPropertyAddress {
        street: required(sub, "street")?.to_string(),
        city: required(sub, "city")?.to_string(),
        postal_code: optional(sub, "postal_code").map(str::to_string),
        country: required(sub, "country")?.to_string(),
        nickname: optional(sub, "nickname").map(str::to_string),
        is_current: sub.get_flag("current"),
        move_in_date: parse_date(required(sub, "move_in")?)?,
        move_out_date: opt_date(sub, "move_out")?,
        has_day_night_meter: sub.get_flag("day_night"),
    };
    let p = store.insert_property(user, &new)?;
    println!("Added property #{} '{}'", p.id, p.label());
    Ok(())
}

fn list(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let data = store.list_properties(user)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &data)? {
        return Ok(());
    }
    let date_format = store.preferences(user)?.date_format;
    let rows = data
        .iter()
        .map(|p| {
            vec![
                p.id.to_string(),
                if p.is_current { "*".into() } else { String::new() },
                p.label(),
                format!("{}, {}", p.street, p.city),
                p.country.clone(),
                date_format.format(p.move_in_date),
                p.move_out_date
                    .map(|d| date_format.format(d))
                    .unwrap_or_default(),
                if p.has_day_night_meter { "day/night" } else { "single" }.into(),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(
            &["ID", "Current", "Name", "Address", "Country", "Moved In", "Moved Out", "Meter"],
            rows
        )
    );
    Ok(())
}
