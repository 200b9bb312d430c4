// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, DateRange, Entity, Store, params_refs};
use crate::error::LedgerError;
use crate::models::{Investment, NewInvestment};
use crate::utils::{date_column, decimal_column, opt_decimal_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;

const COLUMNS: &str = "id, user_id, symbol, name, type, quantity, purchase_price, current_price, \
                       currency, exchange_rate, purchase_date";

struct RawInvestment {
    id: i64,
    user_id: String,
    symbol: String,
    name: String,
    investment_type: String,
    quantity: String,
    purchase_price: String,
    current_price: String,
    currency: String,
    exchange_rate: Option<String>,
    purchase_date: String,
}

impl RawInvestment {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            symbol: r.get(2)?,
            name: r.get(3)?,
            investment_type: r.get(4)?,
            quantity: r.get(5)?,
            purchase_price: r.get(6)?,
            current_price: r.get(7)?,
            currency: r.get(8)?,
            exchange_rate: r.get(9)?,
            purchase_date: r.get(10)?,
        })
    }

    fn into_model(self) -> Result<Investment> {
        let symbol = self.symbol.clone();
        let what = |field: &str| format!("{} for {}", field, symbol);
        Ok(Investment {
            investment_type: self.investment_type.parse()?,
            quantity: decimal_column(&self.quantity, &what("quantity"))?,
            purchase_price: decimal_column(&self.purchase_price, &what("purchase price"))?,
            current_price: decimal_column(&self.current_price, &what("current price"))?,
            exchange_rate: opt_decimal_column(self.exchange_rate, &what("exchange rate"))?,
            purchase_date: date_column(&self.purchase_date, &what("purchase date"))?,
            id: self.id,
            user_id: self.user_id,
            symbol: self.symbol,
            name: self.name,
            currency: self.currency,
        })
    }
}

fn not_found(user_id: &str, id: i64) -> anyhow::Error {
    LedgerError::NotFound {
        entity: "investment",
        id,
        user_id: user_id.to_string(),
    }
    .into()
}

pub(crate) fn insert_row(conn: &Connection, user_id: &str, inv: &NewInvestment) -> Result<i64> {
    inv.validate()?;
    conn.execute(
        "INSERT INTO investments(user_id, symbol, name, type, quantity, purchase_price,
                                 current_price, currency, exchange_rate, purchase_date)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            user_id,
            inv.symbol.trim().to_uppercase(),
            inv.name.trim(),
            inv.investment_type.as_str(),
            inv.quantity.to_string(),
            inv.purchase_price.to_string(),
            inv.current_price.to_string(),
            inv.currency.to_uppercase(),
            inv.exchange_rate.map(|r| r.to_string()),
            inv.purchase_date.to_string(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

fn fetch_one(conn: &Connection, user_id: &str, id: i64) -> Result<Investment> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM investments WHERE id=?1 AND user_id=?2"),
        params![id, user_id],
        RawInvestment::from_row,
    )
    .optional()?
    .ok_or_else(|| not_found(user_id, id))?
    .into_model()
}

fn query(conn: &Connection, user_id: &str, range: &DateRange) -> Result<Vec<Investment>> {
    let mut sql = format!("SELECT {COLUMNS} FROM investments WHERE user_id=?");
    let mut params_vec: Vec<String> = vec![user_id.to_string()];
    range.push_sql("purchase_date", &mut sql, &mut params_vec);
    sql.push_str(" ORDER BY purchase_date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(params_refs(&params_vec)),
        RawInvestment::from_row,
    )?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

impl Store {
    pub fn insert_investment(&mut self, user_id: &str, inv: &NewInvestment) -> Result<Investment> {
        let id = insert_row(&self.conn, user_id, inv)?;
        self.invalidate(Entity::Investments, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn get_investment(&self, user_id: &str, id: i64) -> Result<Investment> {
        fetch_one(&self.conn, user_id, id)
    }

    pub fn list_investments(&mut self, user_id: &str, range: &DateRange) -> Result<Vec<Investment>> {
        let key = CacheKey::new(Entity::Investments, user_id, Self::filter_key(range)?);
        self.cached(key, |conn| query(conn, user_id, range))
    }

    pub fn update_investment(
        &mut self,
        user_id: &str,
        id: i64,
        inv: &NewInvestment,
    ) -> Result<Investment> {
        inv.validate()?;
        let changed = self.conn.execute(
            "UPDATE investments SET symbol=?1, name=?2, type=?3, quantity=?4, purchase_price=?5,
                    current_price=?6, currency=?7, exchange_rate=?8, purchase_date=?9
             WHERE id=?10 AND user_id=?11",
            params![
                inv.symbol.trim().to_uppercase(),
                inv.name.trim(),
                inv.investment_type.as_str(),
                inv.quantity.to_string(),
                inv.purchase_price.to_string(),
                inv.current_price.to_string(),
                inv.currency.to_uppercase(),
                inv.exchange_rate.map(|r| r.to_string()),
                inv.purchase_date.to_string(),
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        self.invalidate(Entity::Investments, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    /// Set `current_price` on every holding of `symbol`; returns rows touched.
    pub fn set_current_price(&mut self, user_id: &str, symbol: &str, price: Decimal) -> Result<usize> {
        if price.is_sign_negative() && !price.is_zero() {
            return Err(LedgerError::Negative {
                field: "current_price",
                value: price.to_string(),
            }
            .into());
        }
        let changed = self.conn.execute(
            "UPDATE investments SET current_price=?1 WHERE user_id=?2 AND symbol=?3",
            params![price.to_string(), user_id, symbol.trim().to_uppercase()],
        )?;
        if changed > 0 {
            self.invalidate(Entity::Investments, user_id);
        }
        Ok(changed)
    }

    pub fn delete_investment(&mut self, user_id: &str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM investments WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        self.invalidate(Entity::Investments, user_id);
        Ok(())
    }
}
