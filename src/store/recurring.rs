// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, Entity, Store, investments, transactions};
use crate::error::LedgerError;
use crate::fx::snapshot_rate;
use crate::models::{
    Frequency, Investment, NewInvestment, NewRecurringInvestment, NewRecurringTransaction,
    NewTransaction, RecurringInvestment, RecurringTransaction, Schedule, Transaction,
};
use crate::recurrence::next_occurrence;
use crate::utils::{date_column, decimal_column, opt_date_column, opt_decimal_column};
use anyhow::Result;
use chrono::NaiveDate;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde::Serialize;
use tracing::{info, warn};

const TX_TABLE: &str = "recurring_transactions";
const INV_TABLE: &str = "recurring_investments";

const TX_COLUMNS: &str = "id, user_id, title, description, amount, category, type, currency, \
                          exchange_rate, frequency, start_date, end_date, next_occurrence, is_active";
const INV_COLUMNS: &str = "id, user_id, symbol, name, type, quantity, purchase_price, currency, \
                           exchange_rate, frequency, start_date, end_date, next_occurrence, is_active";

/// What one pass of [`Store::run_recurring`] produced.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RecurringRun {
    pub transactions: Vec<Transaction>,
    pub investments: Vec<Investment>,
    pub deactivated: usize,
}

struct RawSchedule {
    frequency: String,
    start_date: String,
    end_date: Option<String>,
    next_occurrence: String,
    is_active: bool,
}

impl RawSchedule {
    fn from_row(r: &Row<'_>, first: usize) -> rusqlite::Result<Self> {
        Ok(Self {
            frequency: r.get(first)?,
            start_date: r.get(first + 1)?,
            end_date: r.get(first + 2)?,
            next_occurrence: r.get(first + 3)?,
            is_active: r.get(first + 4)?,
        })
    }

    fn into_schedule(self) -> Result<Schedule> {
        Ok(Schedule {
            frequency: Frequency::parse_lenient(&self.frequency),
            start_date: date_column(&self.start_date, "start date")?,
            end_date: opt_date_column(self.end_date, "end date")?,
            next_occurrence: date_column(&self.next_occurrence, "next occurrence")?,
            is_active: self.is_active,
        })
    }
}

struct RawRecurringTransaction {
    id: i64,
    user_id: String,
    title: String,
    description: Option<String>,
    amount: String,
    category: String,
    kind: String,
    currency: String,
    exchange_rate: Option<String>,
    schedule: RawSchedule,
}

impl RawRecurringTransaction {
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
            schedule: RawSchedule::from_row(r, 9)?,
        })
    }

    fn into_model(self) -> Result<RecurringTransaction> {
        Ok(RecurringTransaction {
            amount: decimal_column(&self.amount, "recurring amount")?,
            kind: self.kind.parse()?,
            exchange_rate: opt_decimal_column(self.exchange_rate, "exchange rate")?,
            schedule: self.schedule.into_schedule()?,
            id: self.id,
            user_id: self.user_id,
            title: self.title,
            description: self.description,
            category: self.category,
            currency: self.currency,
        })
    }
}

struct RawRecurringInvestment {
    id: i64,
    user_id: String,
    symbol: String,
    name: String,
    investment_type: String,
    quantity: String,
    purchase_price: String,
    currency: String,
    exchange_rate: Option<String>,
    schedule: RawSchedule,
}

impl RawRecurringInvestment {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            symbol: r.get(2)?,
            name: r.get(3)?,
            investment_type: r.get(4)?,
            quantity: r.get(5)?,
            purchase_price: r.get(6)?,
            currency: r.get(7)?,
            exchange_rate: r.get(8)?,
            schedule: RawSchedule::from_row(r, 9)?,
        })
    }

    fn into_model(self) -> Result<RecurringInvestment> {
        Ok(RecurringInvestment {
            investment_type: self.investment_type.parse()?,
            quantity: decimal_column(&self.quantity, "recurring quantity")?,
            purchase_price: decimal_column(&self.purchase_price, "recurring purchase price")?,
            exchange_rate: opt_decimal_column(self.exchange_rate, "exchange rate")?,
            schedule: self.schedule.into_schedule()?,
            id: self.id,
            user_id: self.user_id,
            symbol: self.symbol,
            name: self.name,
            currency: self.currency,
        })
    }
}

fn not_found(entity: &'static str, user_id: &str, id: i64) -> anyhow::Error {
    LedgerError::NotFound {
        entity,
        id,
        user_id: user_id.to_string(),
    }
    .into()
}

fn query_transactions(conn: &Connection, user_id: &str) -> Result<Vec<RecurringTransaction>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {TX_COLUMNS} FROM {TX_TABLE} WHERE user_id=?1 ORDER BY next_occurrence, id"
    ))?;
    let rows = stmt.query_map(params![user_id], RawRecurringTransaction::from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

fn query_investments(conn: &Connection, user_id: &str) -> Result<Vec<RecurringInvestment>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {INV_COLUMNS} FROM {INV_TABLE} WHERE user_id=?1 ORDER BY next_occurrence, id"
    ))?;
    let rows = stmt.query_map(params![user_id], RawRecurringInvestment::from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

fn save_schedule(conn: &Connection, table: &str, id: i64, s: &Schedule) -> Result<()> {
    conn.execute(
        &format!("UPDATE {table} SET next_occurrence=?1, is_active=?2 WHERE id=?3"),
        params![s.next_occurrence.to_string(), s.is_active, id],
    )?;
    Ok(())
}

/// Walk `schedule` forward through every occurrence due by `as_of`, calling
/// `emit` for each date. Deactivates the schedule once it passes its end date
/// or reaches the end of the calendar.
fn advance(
    schedule: &mut Schedule,
    as_of: NaiveDate,
    mut emit: impl FnMut(NaiveDate) -> Result<()>,
) -> Result<bool> {
    while schedule.is_due(as_of) {
        emit(schedule.next_occurrence)?;
        let next = next_occurrence(schedule.next_occurrence, schedule.frequency);
        if next <= schedule.next_occurrence {
            warn!(date = %next, "schedule cannot advance further, deactivating");
            schedule.is_active = false;
            return Ok(true);
        }
        schedule.next_occurrence = next;
    }
    let expired = schedule
        .end_date
        .is_some_and(|end| schedule.next_occurrence > end);
    if expired && schedule.is_active {
        schedule.is_active = false;
        return Ok(true);
    }
    Ok(false)
}

impl Store {
    pub fn insert_recurring_transaction(
        &mut self,
        user_id: &str,
        t: &NewRecurringTransaction,
    ) -> Result<RecurringTransaction> {
        t.validate()?;
        let s = &t.schedule;
        self.conn.execute(
            &format!(
                "INSERT INTO {TX_TABLE}(user_id, title, description, amount, category, type, currency,
                        exchange_rate, frequency, start_date, end_date, next_occurrence, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                user_id,
                t.title.trim(),
                t.description,
                t.amount.to_string(),
                t.category.trim(),
                t.kind.as_str(),
                t.currency.to_uppercase(),
                t.exchange_rate.map(|r| r.to_string()),
                s.frequency.as_str(),
                s.start_date.to_string(),
                s.end_date.map(|d| d.to_string()),
                s.next_occurrence.to_string(),
                s.is_active,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.invalidate(Entity::RecurringTransactions, user_id);
        self.get_recurring_transaction(user_id, id)
    }

    pub fn get_recurring_transaction(&self, user_id: &str, id: i64) -> Result<RecurringTransaction> {
        self.conn
            .query_row(
                &format!("SELECT {TX_COLUMNS} FROM {TX_TABLE} WHERE id=?1 AND user_id=?2"),
                params![id, user_id],
                RawRecurringTransaction::from_row,
            )
            .optional()?
            .ok_or_else(|| not_found("recurring transaction", user_id, id))?
            .into_model()
    }

    pub fn list_recurring_transactions(&mut self, user_id: &str) -> Result<Vec<RecurringTransaction>> {
        let key = CacheKey::new(Entity::RecurringTransactions, user_id, "");
        self.cached(key, |conn| query_transactions(conn, user_id))
    }

    pub fn insert_recurring_investment(
        &mut self,
        user_id: &str,
        t: &NewRecurringInvestment,
    ) -> Result<RecurringInvestment> {
        t.validate()?;
        let s = &t.schedule;
        self.conn.execute(
            &format!(
                "INSERT INTO {INV_TABLE}(user_id, symbol, name, type, quantity, purchase_price, currency,
                        exchange_rate, frequency, start_date, end_date, next_occurrence, is_active)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13)"
            ),
            params![
                user_id,
                t.symbol.trim().to_uppercase(),
                t.name.trim(),
                t.investment_type.as_str(),
                t.quantity.to_string(),
                t.purchase_price.to_string(),
                t.currency.to_uppercase(),
                t.exchange_rate.map(|r| r.to_string()),
                s.frequency.as_str(),
                s.start_date.to_string(),
                s.end_date.map(|d| d.to_string()),
                s.next_occurrence.to_string(),
                s.is_active,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.invalidate(Entity::RecurringInvestments, user_id);
        self.get_recurring_investment(user_id, id)
    }

    pub fn get_recurring_investment(&self, user_id: &str, id: i64) -> Result<RecurringInvestment> {
        self.conn
            .query_row(
                &format!("SELECT {INV_COLUMNS} FROM {INV_TABLE} WHERE id=?1 AND user_id=?2"),
                params![id, user_id],
                RawRecurringInvestment::from_row,
            )
            .optional()?
            .ok_or_else(|| not_found("recurring investment", user_id, id))?
            .into_model()
    }

    pub fn list_recurring_investments(&mut self, user_id: &str) -> Result<Vec<RecurringInvestment>> {
        let key = CacheKey::new(Entity::RecurringInvestments, user_id, "");
        self.cached(key, |conn| query_investments(conn, user_id))
    }

    pub fn due_recurring_transactions(
        &mut self,
        user_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<RecurringTransaction>> {
        Ok(self
            .list_recurring_transactions(user_id)?
            .into_iter()
            .filter(|t| t.schedule.is_due(as_of))
            .collect())
    }

    pub fn due_recurring_investments(
        &mut self,
        user_id: &str,
        as_of: NaiveDate,
    ) -> Result<Vec<RecurringInvestment>> {
        Ok(self
            .list_recurring_investments(user_id)?
            .into_iter()
            .filter(|t| t.schedule.is_due(as_of))
            .collect())
    }

    /// Pause or resume a template. `investment` selects the table.
    pub fn set_recurring_active(
        &mut self,
        user_id: &str,
        id: i64,
        investment: bool,
        active: bool,
    ) -> Result<()> {
        let (table, entity, label) = if investment {
            (INV_TABLE, Entity::RecurringInvestments, "recurring investment")
        } else {
            (TX_TABLE, Entity::RecurringTransactions, "recurring transaction")
        };
        let changed = self.conn.execute(
            &format!("UPDATE {table} SET is_active=?1 WHERE id=?2 AND user_id=?3"),
            params![active, id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(label, user_id, id));
        }
        self.invalidate(entity, user_id);
        Ok(())
    }

    pub fn delete_recurring(&mut self, user_id: &str, id: i64, investment: bool) -> Result<()> {
        let (table, entity, label) = if investment {
            (INV_TABLE, Entity::RecurringInvestments, "recurring investment")
        } else {
            (TX_TABLE, Entity::RecurringTransactions, "recurring transaction")
        };
        let changed = self.conn.execute(
            &format!("DELETE FROM {table} WHERE id=?1 AND user_id=?2"),
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(label, user_id, id));
        }
        self.invalidate(entity, user_id);
        Ok(())
    }

    /// Materialise every occurrence due on or before `as_of` and move each
    /// template's `next_occurrence` past it. All writes share one SQL transaction.
    pub fn run_recurring(&mut self, user_id: &str, as_of: NaiveDate) -> Result<RecurringRun> {
        let default_ccy = self.default_currency(user_id)?;
        let tx_templates = query_transactions(&self.conn, user_id)?;
        let inv_templates = query_investments(&self.conn, user_id)?;

        let mut tx_ids = Vec::new();
        let mut inv_ids = Vec::new();
        let mut deactivated = 0;

        let sql_tx = self.conn.transaction()?;
        for t in tx_templates.iter().filter(|t| t.schedule.is_due(as_of)) {
            let rate = t
                .exchange_rate
                .or_else(|| snapshot_rate(&t.currency, &default_ccy));
            let mut schedule = t.schedule.clone();
            let expired = advance(&mut schedule, as_of, |date| {
                let new = NewTransaction {
                    title: t.title.clone(),
                    description: t.description.clone(),
                    amount: t.amount,
                    category: t.category.clone(),
                    kind: t.kind,
                    currency: t.currency.clone(),
                    exchange_rate: rate,
                    transaction_date: date,
                };
                tx_ids.push(transactions::insert_row(&sql_tx, user_id, &new)?);
                Ok(())
            })?;
            deactivated += usize::from(expired);
            save_schedule(&sql_tx, TX_TABLE, t.id, &schedule)?;
        }
        for t in inv_templates.iter().filter(|t| t.schedule.is_due(as_of)) {
            let rate = t
                .exchange_rate
                .or_else(|| snapshot_rate(&t.currency, &default_ccy));
            let mut schedule = t.schedule.clone();
            let expired = advance(&mut schedule, as_of, |date| {
                let new = NewInvestment {
                    symbol: t.symbol.clone(),
                    name: t.name.clone(),
                    investment_type: t.investment_type,
                    quantity: t.quantity,
                    purchase_price: t.purchase_price,
                    current_price: t.purchase_price,
                    currency: t.currency.clone(),
                    exchange_rate: rate,
                    purchase_date: date,
                };
                inv_ids.push(investments::insert_row(&sql_tx, user_id, &new)?);
                Ok(())
            })?;
            deactivated += usize::from(expired);
            save_schedule(&sql_tx, INV_TABLE, t.id, &schedule)?;
        }
        sql_tx.commit()?;

        for entity in [
            Entity::Transactions,
            Entity::Investments,
            Entity::RecurringTransactions,
            Entity::RecurringInvestments,
        ] {
            self.invalidate(entity, user_id);
        }
        info!(
            user = user_id,
            %as_of,
            transactions = tx_ids.len(),
            investments = inv_ids.len(),
            deactivated,
            "recurring templates processed"
        );

        let mut run = RecurringRun {
            deactivated,
            ..RecurringRun::default()
        };
        for id in tx_ids {
            run.transactions.push(self.get_transaction(user_id, id)?);
        }
        for id in inv_ids {
            run.investments.push(self.get_investment(user_id, id)?);
        }
        Ok(run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn advance_stops_at_end_of_calendar() {
        let mut schedule = Schedule::starting(Frequency::Daily, NaiveDate::MAX, None);
        let mut emitted = Vec::new();
        let deactivated = advance(&mut schedule, NaiveDate::MAX, |d| {
            emitted.push(d);
            Ok(())
        })
        .unwrap();
        assert_eq!(emitted, vec![NaiveDate::MAX]);
        assert!(deactivated);
        assert!(!schedule.is_active);
    }

    #[test]
    fn advance_moves_past_as_of() {
        let start = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let as_of = NaiveDate::from_ymd_opt(2024, 1, 20).unwrap();
        let mut schedule = Schedule::starting(Frequency::Weekly, start, None);
        let mut count = 0;
        let deactivated = advance(&mut schedule, as_of, |_| {
            count += 1;
            Ok(())
        })
        .unwrap();
        assert_eq!(count, 3);
        assert!(!deactivated);
        assert_eq!(schedule.next_occurrence, NaiveDate::from_ymd_opt(2024, 1, 22).unwrap());
    }
}
