// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use anyhow::{Context, Result};
use directories::ProjectDirs;
use once_cell::sync::Lazy;
use rusqlite::Connection;
use std::fs;
use std::path::PathBuf;

static APP: Lazy<(&str, &str, &str)> =
    Lazy::new(|| ("com.alphavelocity", "Pennyledger", "pennyledger"));

/// Overrides the platform data directory when set.
pub const DB_ENV: &str = "PENNYLEDGER_DB";

pub fn db_path() -> Result<PathBuf> {
    if let Some(p) = std::env::var_os(DB_ENV).filter(|p| !p.is_empty()) {
        return Ok(PathBuf::from(p));
    }
    let proj = ProjectDirs::from(APP.0, APP.1, APP.2)
        .context("Could not determine platform-specific data dir")?;
    let data_dir = proj.data_dir();
    fs::create_dir_all(data_dir).context("Failed to create data dir")?;
    Ok(data_dir.join("pennyledger.sqlite"))
}

pub fn open_at(path: &std::path::Path) -> Result<Connection> {
    let conn =
        Connection::open(path).with_context(|| format!("Open DB at {}", path.display()))?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn open_in_memory() -> Result<Connection> {
    let conn = Connection::open_in_memory().context("Open in-memory DB")?;
    init_schema(&conn)?;
    Ok(conn)
}

pub fn init_schema(conn: &Connection) -> Result<()> {
    conn.execute_batch(
        r#"
    PRAGMA foreign_keys = ON;

    CREATE TABLE IF NOT EXISTS user_preferences(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL UNIQUE,
        default_currency TEXT NOT NULL DEFAULT 'USD',
        date_format TEXT NOT NULL DEFAULT 'MM/dd/yyyy'
    );

    CREATE TABLE IF NOT EXISTS transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        amount TEXT NOT NULL, -- non-negative, sign lives in type
        category TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        currency TEXT NOT NULL,
        exchange_rate TEXT,
        transaction_date TEXT NOT NULL,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_transactions_user_date ON transactions(user_id, transaction_date);

    CREATE TABLE IF NOT EXISTS investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        quantity TEXT NOT NULL,
        purchase_price TEXT NOT NULL,
        current_price TEXT NOT NULL,
        currency TEXT NOT NULL,
        exchange_rate TEXT,
        purchase_date TEXT NOT NULL
    );
    CREATE INDEX IF NOT EXISTS idx_investments_user ON investments(user_id, purchase_date);

    CREATE TABLE IF NOT EXISTS electricity_bills(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        bill_date TEXT NOT NULL,
        reading_date TEXT NOT NULL,
        day_reading TEXT NOT NULL,
        night_reading TEXT NOT NULL,
        previous_day_reading TEXT,
        previous_night_reading TEXT,
        amount_paid TEXT NOT NULL,
        currency TEXT NOT NULL,
        exchange_rate TEXT,
        day_rate TEXT,
        night_rate TEXT,
        standing_charge TEXT,
        notes TEXT
    );
    CREATE INDEX IF NOT EXISTS idx_bills_user_date ON electricity_bills(user_id, bill_date);

    CREATE TABLE IF NOT EXISTS property_addresses(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        street TEXT NOT NULL,
        city TEXT NOT NULL,
        postal_code TEXT,
        country TEXT NOT NULL,
        nickname TEXT,
        is_current INTEGER NOT NULL DEFAULT 0,
        move_in_date TEXT NOT NULL,
        move_out_date TEXT,
        has_day_night_meter INTEGER NOT NULL DEFAULT 0
    );

    CREATE TABLE IF NOT EXISTS recurring_transactions(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        title TEXT NOT NULL,
        description TEXT,
        amount TEXT NOT NULL,
        category TEXT NOT NULL,
        type TEXT NOT NULL CHECK(type IN ('income','expense')),
        currency TEXT NOT NULL,
        exchange_rate TEXT,
        frequency TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        next_occurrence TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );

    CREATE TABLE IF NOT EXISTS recurring_investments(
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id TEXT NOT NULL,
        symbol TEXT NOT NULL,
        name TEXT NOT NULL,
        type TEXT NOT NULL,
        quantity TEXT NOT NULL,
        purchase_price TEXT NOT NULL,
        currency TEXT NOT NULL,
        exchange_rate TEXT,
        frequency TEXT NOT NULL,
        start_date TEXT NOT NULL,
        end_date TEXT,
        next_occurrence TEXT NOT NULL,
        is_active INTEGER NOT NULL DEFAULT 1
    );
    "#,
    )?;
    Ok(())
}
