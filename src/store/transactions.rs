// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, DateRange, Entity, Store, now_stamp, params_refs, timestamp_column};
use crate::error::LedgerError;
use crate::models::{NewTransaction, Transaction, TransactionKind};
use crate::utils::{date_column, decimal_column, opt_decimal_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TransactionFilter {
    pub range: DateRange,
    pub kind: Option<TransactionKind>,
    pub category: Option<String>,
    pub limit: Option<usize>,
}

const COLUMNS: &str = "id, user_id, title, description, amount, category, type, currency, \
                       exchange_rate, transaction_date, created_at, updated_at";

struct RawTransaction {
    id: i64,
    user_id: String,
    title: String,
    description: Option<String>,
    amount: String,
    category: String,
    kind: String,
    currency: String,
    exchange_rate: Option<String>,
    transaction_date: String,
    created_at: String,
    updated_at: String,
}

impl RawTransaction {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            title: r.get(2)?,
            description: r.get(3)?,
            amount: r.get(4)?,
            category: r.get(5)?,
            kind: r.get(6)?,
            currency: r.get(7)?,
            exchange_rate: r.get(8)?,
            transaction_date: r.get(9)?,
            created_at: r.get(10)?,
            updated_at: r.get(11)?,
        })
    }

    fn into_model(self) -> Result<Transaction> {
        Ok(Transaction {
            amount: decimal_column(&self.amount, "transaction amount")?,
            kind: self.kind.parse()?,
            exchange_rate: opt_decimal_column(self.exchange_rate, "exchange rate")?,
            transaction_date: date_column(&self.transaction_date, "transaction date")?,
            created_at: timestamp_column(&self.created_at, "created_at")?,
            updated_at: timestamp_column(&self.updated_at, "updated_at")?,
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            category: self.category,
            currency: self.currency,
        })
    }
}

pub(crate) fn insert_row(conn: &Connection, user_id: &str, tx: &NewTransaction) -> Result<i64> {
    tx.validate()?;
    let now = now_stamp().to_rfc3339();
    conn.execute(
        "INSERT INTO transactions(user_id, title, description, amount, category, type, currency,
                                  exchange_rate, transaction_date, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?10)",
        params![
            user_id,
            tx.title.trim(),
            tx.description,
            tx.amount.to_string(),
            tx.category.trim(),
            tx.kind.as_str(),
            tx.currency.to_uppercase(),
            tx.exchange_rate.map(|r| r.to_string()),
            tx.transaction_date.to_string(),
            now,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn fetch_one(conn: &Connection, user_id: &str, id: i64) -> Result<Transaction> {
    let raw = conn
        .query_row(
            &format!("SELECT {COLUMNS} FROM transactions WHERE id=?1 AND user_id=?2"),
            params![id, user_id],
            RawTransaction::from_row,
        )
        .optional()?;
    match raw {
        Some(raw) => raw.into_model(),
        None => Err(LedgerError::NotFound {
            entity: "transaction",
            id,
            user_id: user_id.to_string(),
        }
        .into()),
    }
}

fn query(conn: &Connection, user_id: &str, filter: &TransactionFilter) -> Result<Vec<Transaction>> {
    let mut sql = format!("SELECT {COLUMNS} FROM transactions WHERE user_id=?");
    let mut params_vec: Vec<String> = vec![user_id.to_string()];

    filter.range.push_sql("transaction_date", &mut sql, &mut params_vec);
    if let Some(kind) = filter.kind {
        sql.push_str(" AND type=?");
        params_vec.push(kind.as_str().into());
    }
    if let Some(cat) = &filter.category {
        sql.push_str(" AND category=?");
        params_vec.push(cat.clone());
    }
    sql.push_str(" ORDER BY transaction_date DESC, id DESC");
    if let Some(limit) = filter.limit {
        sql.push_str(" LIMIT ?");
        params_vec.push(limit.to_string());
    }

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(params_refs(&params_vec)),
        RawTransaction::from_row,
    )?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

impl Store {
    pub fn insert_transaction(&mut self, user_id: &str, tx: &NewTransaction) -> Result<Transaction> {
        let id = insert_row(&self.conn, user_id, tx)?;
        self.invalidate(Entity::Transactions, user_id);
        debug!(id, user = user_id, "transaction inserted");
        fetch_one(&self.conn, user_id, id)
    }

    pub fn get_transaction(&self, user_id: &str, id: i64) -> Result<Transaction> {
        fetch_one(&self.conn, user_id, id)
    }

    pub fn list_transactions(
        &mut self,
        user_id: &str,
        filter: &TransactionFilter,
    ) -> Result<Vec<Transaction>> {
        let key = CacheKey::new(Entity::Transactions, user_id, Self::filter_key(filter)?);
        self.cached(key, |conn| query(conn, user_id, filter))
    }

    pub fn update_transaction(
        &mut self,
        user_id: &str,
        id: i64,
        tx: &NewTransaction,
    ) -> Result<Transaction> {
        tx.validate()?;
        let changed = self.conn.execute(
            "UPDATE transactions SET title=?1, description=?2, amount=?3, category=?4, type=?5,
                    currency=?6, exchange_rate=?7, transaction_date=?8, updated_at=?9
             WHERE id=?10 AND user_id=?11",
            params![
                tx.title.trim(),
                tx.description,
                tx.amount.to_string(),
                tx.category.trim(),
                tx.kind.as_str(),
                tx.currency.to_uppercase(),
                tx.exchange_rate.map(|r| r.to_string()),
                tx.transaction_date.to_string(),
                now_stamp().to_rfc3339(),
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(LedgerError::NotFound {
                entity: "transaction",
                id,
                user_id: user_id.to_string(),
            }
            .into());
        }
        self.invalidate(Entity::Transactions, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    /// Deleting a row that does not exist (or belongs to another user) is a
    /// `NotFound` error.
    pub fn delete_transaction(&mut self, user_id: &str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM transactions WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(LedgerError::NotFound {
                entity: "transaction",
                id,
                user_id: user_id.to_string(),
            }
            .into());
        }
        self.invalidate(Entity::Transactions, user_id);
        debug!(id, user = user_id, "transaction deleted");
        Ok(())
    }
}
