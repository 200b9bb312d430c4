// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use pennyledger::{cli, commands, db, store::Store};

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "pennyledger=warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = cli::build_cli();
    let matches = cli.get_matches();

    // Pure rate lookups never touch the database.
    if let Some(("fx", sub)) = matches.subcommand() {
        return commands::fx::handle(sub);
    }

    let mut store = Store::open()?;
    let user = matches
        .get_one::<String>("user")
        .map(String::as_str)
        .unwrap_or("local");
    tracing::debug!(user, "store opened");

    match matches.subcommand() {
        Some(("init", _)) => {
            println!("Database initialized at {}", db::db_path()?.display());
        }
        Some(("prefs", sub)) => commands::settings::handle(&mut store, user, sub)?,
        Some(("tx", sub)) => commands::transactions::handle(&mut store, user, sub)?,
        Some(("invest", sub)) => commands::investments::handle(&mut store, user, sub)?,
        Some(("bill", sub)) => commands::electricity::handle(&mut store, user, sub)?,
        Some(("property", sub)) => commands::properties::handle(&mut store, user, sub)?,
        Some(("recurring", sub)) => commands::recurring::handle(&mut store, user, sub)?,
        Some(("report", sub)) => commands::reports::handle(&mut store, user, sub)?,
        Some(("export", sub)) => commands::exporter::handle(&mut store, user, sub)?,
        _ => {
            cli::build_cli().print_help()?;
            println!();
        }
    }
    Ok(())
}
