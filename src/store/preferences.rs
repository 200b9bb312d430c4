// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, Entity, Store};
use crate::fx::{Currency, snapshot_rate};
use crate::models::{DateFormat, UserPreferences};
use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};
use tracing::{debug, info};

/// Tables whose `exchange_rate` is a snapshot into the default currency.
const SNAPSHOT_TABLES: [(&str, Entity); 3] = [
    ("transactions", Entity::Transactions),
    ("investments", Entity::Investments),
    ("electricity_bills", Entity::ElectricityBills),
];

/// Templates only carry a rate when one was pinned.
const TEMPLATE_TABLES: [(&str, Entity); 2] = [
    ("recurring_transactions", Entity::RecurringTransactions),
    ("recurring_investments", Entity::RecurringInvestments),
];

fn load(conn: &Connection, user_id: &str) -> Result<UserPreferences> {
    let row: Option<(i64, String, String)> = conn
        .query_row(
            "SELECT id, default_currency, date_format FROM user_preferences WHERE user_id=?1",
            params![user_id],
            |r| Ok((r.get(0)?, r.get(1)?, r.get(2)?)),
        )
        .optional()?;
    match row {
        Some((id, default_currency, date_format)) => Ok(UserPreferences {
            id: Some(id),
            user_id: user_id.to_string(),
            default_currency,
            date_format: date_format
                .parse()
                .with_context(|| format!("Stored preferences for '{}'", user_id))?,
        }),
        None => {
            debug!(user = user_id, "no saved preferences, using defaults");
            Ok(UserPreferences::default_for(user_id))
        }
    }
}

/// Point every stored snapshot at `default_currency`, taking table rates.
/// Rows already in that currency lose their snapshot. Returns rows touched.
fn rebase_snapshots(conn: &Connection, user_id: &str, default_currency: &str) -> Result<usize> {
    let mut changed = 0;
    for ccy in Currency::ALL {
        let rate = snapshot_rate(ccy.code(), default_currency).map(|r| r.to_string());
        for (table, _) in SNAPSHOT_TABLES {
            changed += conn.execute(
                &format!("UPDATE {table} SET exchange_rate=?1 WHERE user_id=?2 AND currency=?3"),
                params![rate, user_id, ccy.code()],
            )?;
        }
        for (table, _) in TEMPLATE_TABLES {
            changed += conn.execute(
                &format!(
                    "UPDATE {table} SET exchange_rate=?1
                     WHERE user_id=?2 AND currency=?3 AND exchange_rate IS NOT NULL"
                ),
                params![rate, user_id, ccy.code()],
            )?;
        }
    }
    Ok(changed)
}

impl Store {
    /// Saved preferences, or the defaults (USD, MM/dd/yyyy) when none exist yet.
    pub fn preferences(&mut self, user_id: &str) -> Result<UserPreferences> {
        let key = CacheKey::new(Entity::UserPreferences, user_id, "");
        self.cached(key, |conn| load(conn, user_id))
    }

    pub fn default_currency(&mut self, user_id: &str) -> Result<String> {
        Ok(self.preferences(user_id)?.default_currency)
    }

    /// Create the row on first save, update it afterwards. Changing the
    /// default currency re-snapshots every stored rate into the new one.
    pub fn save_preferences(
        &mut self,
        user_id: &str,
        default_currency: &str,
        date_format: DateFormat,
    ) -> Result<UserPreferences> {
        let default_currency = default_currency.trim().to_uppercase();
        let previous = load(&self.conn, user_id)?.default_currency;
        let sql_tx = self.conn.transaction()?;
        sql_tx.execute(
            "INSERT INTO user_preferences(user_id, default_currency, date_format) VALUES (?1, ?2, ?3)
             ON CONFLICT(user_id) DO UPDATE SET default_currency=excluded.default_currency,
                                                date_format=excluded.date_format",
            params![user_id, default_currency, date_format.as_str()],
        )?;
        let rebased = previous != default_currency;
        if rebased {
            let rows = rebase_snapshots(&sql_tx, user_id, &default_currency)?;
            info!(user = user_id, from = %previous, to = %default_currency, rows, "rebased rate snapshots");
        }
        sql_tx.commit()?;
        self.invalidate(Entity::UserPreferences, user_id);
        if rebased {
            for (_, entity) in SNAPSHOT_TABLES.into_iter().chain(TEMPLATE_TABLES) {
                self.invalidate(entity, user_id);
            }
        }
        self.preferences(user_id)
    }
}
