// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Record storage. Every read and write is scoped to one `user_id`; list reads
//! go through [`QueryCache`] and every write invalidates the touched entity.

pub mod cache;
pub mod electricity;
pub mod investments;
pub mod preferences;
pub mod properties;
pub mod recurring;
pub mod transactions;

pub use cache::{CacheKey, CacheStats, Cacheable, CachedRows, Entity, QueryCache};
pub use electricity::ConsumptionPoint;
pub use recurring::RecurringRun;
pub use transactions::TransactionFilter;

use crate::db;
use anyhow::{Context, Result};
use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::Connection;
use serde::Serialize;
use std::path::Path;

/// Inclusive date bounds; either side may be open.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn new(from: Option<NaiveDate>, to: Option<NaiveDate>) -> Self {
        Self { from, to }
    }

    /// Append `AND column >= ? / <= ?` clauses for the bounds that are set.
    pub(crate) fn push_sql(&self, column: &str, sql: &mut String, params: &mut Vec<String>) {
        if let Some(from) = self.from {
            sql.push_str(&format!(" AND {}>=?", column));
            params.push(from.to_string());
        }
        if let Some(to) = self.to {
            sql.push_str(&format!(" AND {}<=?", column));
            params.push(to.to_string());
        }
    }
}

pub struct Store {
    conn: Connection,
    cache: QueryCache,
}

impl Store {
    pub fn open() -> Result<Self> {
        let path = db::db_path()?;
        Self::open_at(&path)
    }

    pub fn open_at(path: &Path) -> Result<Self> {
        Ok(Self {
            conn: db::open_at(path)?,
            cache: QueryCache::new(),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Ok(Self {
            conn: db::open_in_memory()?,
            cache: QueryCache::new(),
        })
    }

    pub fn conn(&self) -> &Connection {
        &self.conn
    }

    pub fn cache(&self) -> &QueryCache {
        &self.cache
    }

    fn filter_key<F: Serialize>(filter: &F) -> Result<String> {
        serde_json::to_string(filter).context("Serialize query filter")
    }

    /// Serve `key` from the cache, or run `load` and remember the result.
    fn cached<T, F>(&mut self, key: CacheKey, load: F) -> Result<T>
    where
        T: Cacheable,
        F: FnOnce(&Connection) -> Result<T>,
    {
        if let Some(v) = self.cache.get::<T>(&key) {
            return Ok(v);
        }
        let v = load(&self.conn)?;
        self.cache.put(key, v.clone());
        Ok(v)
    }

    fn invalidate(&mut self, entity: Entity, user_id: &str) {
        self.cache.invalidate(entity, user_id);
    }
}

pub(crate) fn now_stamp() -> DateTime<Utc> {
    Utc::now()
}

pub(crate) fn timestamp_column(s: &str, what: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(s)
        .map(|d| d.with_timezone(&Utc))
        .with_context(|| format!("Invalid stored {} '{}'", what, s))
}

pub(crate) fn params_refs(params: &[String]) -> Vec<&dyn rusqlite::ToSql> {
    params.iter().map(|s| s as &dyn rusqlite::ToSql).collect()
}
