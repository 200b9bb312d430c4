// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, DateRange, Entity, Store, params_refs};
use crate::error::LedgerError;
use crate::models::{ElectricityBill, NewElectricityBill};
use crate::utils::{date_column, decimal_column, opt_decimal_column};
use anyhow::Result;
use chrono::{Months, NaiveDate};
use rusqlite::{Connection, OptionalExtension, Row, params};
use rust_decimal::Decimal;
use serde::Serialize;

const COLUMNS: &str = "id, user_id, bill_date, reading_date, day_reading, night_reading, \
                       previous_day_reading, previous_night_reading, amount_paid, currency, \
                       exchange_rate, day_rate, night_rate, standing_charge, notes";

/// One bill's usage, as shown in consumption history charts.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumptionPoint {
    pub bill_date: NaiveDate,
    pub day_usage: Option<Decimal>,
    pub night_usage: Option<Decimal>,
    pub total_usage: Option<Decimal>,
    pub amount_paid: Decimal,
    pub currency: String,
}

struct RawBill {
    id: i64,
    user_id: String,
    bill_date: String,
    reading_date: String,
    day_reading: String,
    night_reading: String,
    previous_day_reading: Option<String>,
    previous_night_reading: Option<String>,
    amount_paid: String,
    currency: String,
    exchange_rate: Option<String>,
    day_rate: Option<String>,
    night_rate: Option<String>,
    standing_charge: Option<String>,
    notes: Option<String>,
}

impl RawBill {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            bill_date: r.get(2)?,
            reading_date: r.get(3)?,
            day_reading: r.get(4)?,
            night_reading: r.get(5)?,
            previous_day_reading: r.get(6)?,
            previous_night_reading: r.get(7)?,
            amount_paid: r.get(8)?,
            currency: r.get(9)?,
            exchange_rate: r.get(10)?,
            day_rate: r.get(11)?,
            night_rate: r.get(12)?,
            standing_charge: r.get(13)?,
            notes: r.get(14)?,
        })
    }

    fn into_model(self) -> Result<ElectricityBill> {
        Ok(ElectricityBill {
            bill_date: date_column(&self.bill_date, "bill date")?,
            reading_date: date_column(&self.reading_date, "reading date")?,
            day_reading: decimal_column(&self.day_reading, "day reading")?,
            night_reading: decimal_column(&self.night_reading, "night reading")?,
            previous_day_reading: opt_decimal_column(self.previous_day_reading, "previous day reading")?,
            previous_night_reading: opt_decimal_column(
                self.previous_night_reading,
                "previous night reading",
            )?,
            amount_paid: decimal_column(&self.amount_paid, "amount paid")?,
            exchange_rate: opt_decimal_column(self.exchange_rate, "exchange rate")?,
            day_rate: opt_decimal_column(self.day_rate, "day rate")?,
            night_rate: opt_decimal_column(self.night_rate, "night rate")?,
            standing_charge: opt_decimal_column(self.standing_charge, "standing charge")?,
            id: self.id,
            user_id: self.user_id,
            currency: self.currency,
            notes: self.notes,
        })
    }
}

fn not_found(user_id: &str, id: i64) -> anyhow::Error {
    LedgerError::NotFound {
        entity: "electricity bill",
        id,
        user_id: user_id.to_string(),
    }
    .into()
}

fn opt_text(d: Option<Decimal>) -> Option<String> {
    d.map(|v| v.to_string())
}

fn fetch_one(conn: &Connection, user_id: &str, id: i64) -> Result<ElectricityBill> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM electricity_bills WHERE id=?1 AND user_id=?2"),
        params![id, user_id],
        RawBill::from_row,
    )
    .optional()?
    .ok_or_else(|| not_found(user_id, id))?
    .into_model()
}

fn query(conn: &Connection, user_id: &str, range: &DateRange) -> Result<Vec<ElectricityBill>> {
    let mut sql = format!("SELECT {COLUMNS} FROM electricity_bills WHERE user_id=?");
    let mut params_vec: Vec<String> = vec![user_id.to_string()];
    range.push_sql("bill_date", &mut sql, &mut params_vec);
    sql.push_str(" ORDER BY bill_date DESC, id DESC");

    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(
        rusqlite::params_from_iter(params_refs(&params_vec)),
        RawBill::from_row,
    )?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

impl Store {
    pub fn insert_bill(&mut self, user_id: &str, bill: &NewElectricityBill) -> Result<ElectricityBill> {
        bill.validate()?;
        self.conn.execute(
            "INSERT INTO electricity_bills(user_id, bill_date, reading_date, day_reading, night_reading,
                    previous_day_reading, previous_night_reading, amount_paid, currency, exchange_rate,
                    day_rate, night_rate, standing_charge, notes)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            params![
                user_id,
                bill.bill_date.to_string(),
                bill.reading_date.to_string(),
                bill.day_reading.to_string(),
                bill.night_reading.to_string(),
                opt_text(bill.previous_day_reading),
                opt_text(bill.previous_night_reading),
                bill.amount_paid.to_string(),
                bill.currency.to_uppercase(),
                opt_text(bill.exchange_rate),
                opt_text(bill.day_rate),
                opt_text(bill.night_rate),
                opt_text(bill.standing_charge),
                bill.notes,
            ],
        )?;
        let id = self.conn.last_insert_rowid();
        self.invalidate(Entity::ElectricityBills, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn get_bill(&self, user_id: &str, id: i64) -> Result<ElectricityBill> {
        fetch_one(&self.conn, user_id, id)
    }

    /// Newest bill by `bill_date`, used to pre-fill previous readings.
    pub fn latest_bill(&self, user_id: &str) -> Result<Option<ElectricityBill>> {
        let raw = self
            .conn
            .query_row(
                &format!(
                    "SELECT {COLUMNS} FROM electricity_bills WHERE user_id=?1
                     ORDER BY bill_date DESC, id DESC LIMIT 1"
                ),
                params![user_id],
                RawBill::from_row,
            )
            .optional()?;
        raw.map(RawBill::into_model).transpose()
    }

    pub fn list_bills(&mut self, user_id: &str, range: &DateRange) -> Result<Vec<ElectricityBill>> {
        let key = CacheKey::new(Entity::ElectricityBills, user_id, Self::filter_key(range)?);
        self.cached(key, |conn| query(conn, user_id, range))
    }

    pub fn update_bill(
        &mut self,
        user_id: &str,
        id: i64,
        bill: &NewElectricityBill,
    ) -> Result<ElectricityBill> {
        bill.validate()?;
        let changed = self.conn.execute(
            "UPDATE electricity_bills SET bill_date=?1, reading_date=?2, day_reading=?3,
                    night_reading=?4, previous_day_reading=?5, previous_night_reading=?6,
                    amount_paid=?7, currency=?8, exchange_rate=?9, day_rate=?10, night_rate=?11,
                    standing_charge=?12, notes=?13
             WHERE id=?14 AND user_id=?15",
            params![
                bill.bill_date.to_string(),
                bill.reading_date.to_string(),
                bill.day_reading.to_string(),
                bill.night_reading.to_string(),
                opt_text(bill.previous_day_reading),
                opt_text(bill.previous_night_reading),
                bill.amount_paid.to_string(),
                bill.currency.to_uppercase(),
                opt_text(bill.exchange_rate),
                opt_text(bill.day_rate),
                opt_text(bill.night_rate),
                opt_text(bill.standing_charge),
                bill.notes,
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        self.invalidate(Entity::ElectricityBills, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn delete_bill(&mut self, user_id: &str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM electricity_bills WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        self.invalidate(Entity::ElectricityBills, user_id);
        Ok(())
    }

    /// Usage for bills dated within `months` months of the newest bill,
    /// oldest first. The window always spans at least one month, so the
    /// newest bill is always included.
    pub fn consumption_history(&mut self, user_id: &str, months: u32) -> Result<Vec<ConsumptionPoint>> {
        let Some(latest) = self.latest_bill(user_id)? else {
            return Ok(Vec::new());
        };
        let from = latest
            .bill_date
            .checked_sub_months(Months::new(months.max(1)))
            .and_then(|d| d.succ_opt());
        let range = DateRange::new(from, Some(latest.bill_date));
        let mut bills = self.list_bills(user_id, &range)?;
        bills.reverse();
        Ok(bills
            .into_iter()
            .map(|b| ConsumptionPoint {
                bill_date: b.bill_date,
                day_usage: b.day_usage(),
                night_usage: b.night_usage(),
                total_usage: b.total_usage(),
                amount_paid: b.amount_paid,
                currency: b.currency,
            })
            .collect())
    }
}
