// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{CacheKey, Entity, Store};
use crate::error::LedgerError;
use crate::models::{NewPropertyAddress, PropertyAddress};
use crate::utils::{date_column, opt_date_column};
use anyhow::Result;
use rusqlite::{Connection, OptionalExtension, Row, params};

const COLUMNS: &str = "id, user_id, street, city, postal_code, country, nickname, is_current, \
                       move_in_date, move_out_date, has_day_night_meter";

struct RawProperty {
    id: i64,
    user_id: String,
    street: String,
    city: String,
    postal_code: Option<String>,
    country: String,
    nickname: Option<String>,
    is_current: bool,
    move_in_date: String,
    move_out_date: Option<String>,
    has_day_night_meter: bool,
}

impl RawProperty {
    fn from_row(r: &Row<'_>) -> rusqlite::Result<Self> {
        Ok(Self {
            id: r.get(0)?,
            user_id: r.get(1)?,
            street: r.get(2)?,
            city: r.get(3)?,
            postal_code: r.get(4)?,
            country: r.get(5)?,
            nickname: r.get(6)?,
            is_current: r.get(7)?,
            move_in_date: r.get(8)?,
            move_out_date: r.get(9)?,
            has_day_night_meter: r.get(10)?,
        })
    }

    fn into_model(self) -> Result<PropertyAddress> {
        Ok(PropertyAddress {
            move_in_date: date_column(&self.move_in_date, "move-in date")?,
            move_out_date: opt_date_column(self.move_out_date, "move-out date")?,
            id: self.id,
            user_id: self.user_id,
            street: self.street,
            city: self.city,
            postal_code: self.postal_code,
            country: self.country,
            nickname: self.nickname,
            is_current: self.is_current,
            has_day_night_meter: self.has_day_night_meter,
        })
    }
}

fn not_found(user_id: &str, id: i64) -> anyhow::Error {
    LedgerError::NotFound {
        entity: "property address",
        id,
        user_id: user_id.to_string(),
    }
    .into()
}

fn fetch_one(conn: &Connection, user_id: &str, id: i64) -> Result<PropertyAddress> {
    conn.query_row(
        &format!("SELECT {COLUMNS} FROM property_addresses WHERE id=?1 AND user_id=?2"),
        params![id, user_id],
        RawProperty::from_row,
    )
    .optional()?
    .ok_or_else(|| not_found(user_id, id))?
    .into_model()
}

fn query(conn: &Connection, user_id: &str) -> Result<Vec<PropertyAddress>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {COLUMNS} FROM property_addresses WHERE user_id=?1
         ORDER BY is_current DESC, move_in_date DESC, id DESC"
    ))?;
    let rows = stmt.query_map(params![user_id], RawProperty::from_row)?;
    let mut data = Vec::new();
    for row in rows {
        data.push(row?.into_model()?);
    }
    Ok(data)
}

fn clear_current(conn: &Connection, user_id: &str, keep: i64) -> Result<()> {
    conn.execute(
        "UPDATE property_addresses SET is_current=0 WHERE user_id=?1 AND id<>?2",
        params![user_id, keep],
    )?;
    Ok(())
}

impl Store {
    /// Insert an address. When it is marked current, every other address of
    /// the user is cleared in the same transaction.
    pub fn insert_property(&mut self, user_id: &str, p: &NewPropertyAddress) -> Result<PropertyAddress> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO property_addresses(user_id, street, city, postal_code, country, nickname,
                    is_current, move_in_date, move_out_date, has_day_night_meter)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
            params![
                user_id,
                p.street.trim(),
                p.city.trim(),
                p.postal_code,
                p.country.trim(),
                p.nickname,
                p.is_current,
                p.move_in_date.to_string(),
                p.move_out_date.map(|d| d.to_string()),
                p.has_day_night_meter,
            ],
        )?;
        let id = tx.last_insert_rowid();
        if p.is_current {
            clear_current(&tx, user_id, id)?;
        }
        tx.commit()?;
        self.invalidate(Entity::PropertyAddresses, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn get_property(&self, user_id: &str, id: i64) -> Result<PropertyAddress> {
        fetch_one(&self.conn, user_id, id)
    }

    pub fn list_properties(&mut self, user_id: &str) -> Result<Vec<PropertyAddress>> {
        let key = CacheKey::new(Entity::PropertyAddresses, user_id, "");
        self.cached(key, |conn| query(conn, user_id))
    }

    pub fn current_property(&mut self, user_id: &str) -> Result<Option<PropertyAddress>> {
        Ok(self
            .list_properties(user_id)?
            .into_iter()
            .find(|p| p.is_current))
    }

    pub fn update_property(
        &mut self,
        user_id: &str,
        id: i64,
        p: &NewPropertyAddress,
    ) -> Result<PropertyAddress> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE property_addresses SET street=?1, city=?2, postal_code=?3, country=?4,
                    nickname=?5, is_current=?6, move_in_date=?7, move_out_date=?8,
                    has_day_night_meter=?9
             WHERE id=?10 AND user_id=?11",
            params![
                p.street.trim(),
                p.city.trim(),
                p.postal_code,
                p.country.trim(),
                p.nickname,
                p.is_current,
                p.move_in_date.to_string(),
                p.move_out_date.map(|d| d.to_string()),
                p.has_day_night_meter,
                id,
                user_id,
            ],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        if p.is_current {
            clear_current(&tx, user_id, id)?;
        }
        tx.commit()?;
        self.invalidate(Entity::PropertyAddresses, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn set_current_property(&mut self, user_id: &str, id: i64) -> Result<PropertyAddress> {
        let tx = self.conn.transaction()?;
        let changed = tx.execute(
            "UPDATE property_addresses SET is_current=1 WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        clear_current(&tx, user_id, id)?;
        tx.commit()?;
        self.invalidate(Entity::PropertyAddresses, user_id);
        fetch_one(&self.conn, user_id, id)
    }

    pub fn delete_property(&mut self, user_id: &str, id: i64) -> Result<()> {
        let changed = self.conn.execute(
            "DELETE FROM property_addresses WHERE id=?1 AND user_id=?2",
            params![id, user_id],
        )?;
        if changed == 0 {
            return Err(not_found(user_id, id));
        }
        self.invalidate(Entity::PropertyAddresses, user_id);
        Ok(())
    }
}
