// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use crate::error::LedgerError;
use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

// Stored string form <-> enum variant, shared by every column-backed enum.
macro_rules! string_enum {
    ($name:ident, $kind:literal, { $($variant:ident => $s:literal),+ $(,)? }) => {
        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(&self) -> &'static str {
                match self {
                    $($name::$variant => $s),+
                }
            }
        }

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl std::str::FromStr for $name {
            type Err = LedgerError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let t = s.trim();
                $(
                    if t.eq_ignore_ascii_case($s) {
                        return Ok($name::$variant);
                    }
                )+
                Err(LedgerError::UnknownVariant {
                    kind: $kind,
                    value: s.to_string(),
                })
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    Income,
    Expense,
}

string_enum!(TransactionKind, "transaction type", {
    Income => "income",
    Expense => "expense",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvestmentType {
    Stock,
    Bond,
    Crypto,
    Etf,
    MutualFund,
    RealEstate,
    Commodity,
    P2pLending,
    Other,
}

string_enum!(InvestmentType, "investment type", {
    Stock => "stock",
    Bond => "bond",
    Crypto => "crypto",
    Etf => "etf",
    MutualFund => "mutual_fund",
    RealEstate => "real_estate",
    Commodity => "commodity",
    P2pLending => "p2p_lending",
    Other => "other",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Frequency {
    Daily,
    Weekly,
    Monthly,
    Yearly,
}

string_enum!(Frequency, "frequency", {
    Daily => "daily",
    Weekly => "weekly",
    Monthly => "monthly",
    Yearly => "yearly",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum DateFormat {
    #[default]
    #[serde(rename = "MM/dd/yyyy")]
    MonthDayYear,
    #[serde(rename = "dd/MM/yyyy")]
    DayMonthYear,
    #[serde(rename = "yyyy-MM-dd")]
    Iso,
}

string_enum!(DateFormat, "date format", {
    MonthDayYear => "MM/dd/yyyy",
    DayMonthYear => "dd/MM/yyyy",
    Iso => "yyyy-MM-dd",
});

impl DateFormat {
    pub fn format(&self, date: NaiveDate) -> String {
        let pattern = match self {
            DateFormat::MonthDayYear => "%m/%d/%Y",
            DateFormat::DayMonthYear => "%d/%m/%Y",
            DateFormat::Iso => "%Y-%m-%d",
        };
        date.format(pattern).to_string()
    }
}

fn ensure_non_negative(field: &'static str, value: Decimal) -> Result<(), LedgerError> {
    if value.is_sign_negative() && !value.is_zero() {
        return Err(LedgerError::Negative {
            field,
            value: value.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    /// Always non-negative; direction comes from `kind`.
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub currency: String,
    /// Rate into the user's default currency captured at creation.
    pub exchange_rate: Option<Decimal>,
    pub transaction_date: NaiveDate,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Transaction {
    /// Amount with the sign implied by `kind`.
    pub fn signed_amount(&self) -> Decimal {
        match self.kind {
            TransactionKind::Income => self.amount,
            TransactionKind::Expense => -self.amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTransaction {
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub transaction_date: NaiveDate,
}

impl NewTransaction {
    pub fn validate(&self) -> Result<(), LedgerError> {
        ensure_non_negative("amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Investment {
    pub id: i64,
    pub user_id: String,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub purchase_date: NaiveDate,
}

impl Investment {
    pub fn value(&self) -> Decimal {
        self.quantity.saturating_mul(self.current_price)
    }

    pub fn cost(&self) -> Decimal {
        self.quantity.saturating_mul(self.purchase_price)
    }

    pub fn gain_loss(&self) -> Decimal {
        self.value().saturating_sub(self.cost())
    }

    /// Gain as a percentage of cost; `None` for a zero-cost holding.
    pub fn gain_loss_pct(&self) -> Option<Decimal> {
        self.gain_loss()
            .checked_div(self.cost())
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewInvestment {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub current_price: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub purchase_date: NaiveDate,
}

impl NewInvestment {
    pub fn validate(&self) -> Result<(), LedgerError> {
        ensure_non_negative("quantity", self.quantity)?;
        ensure_non_negative("purchase_price", self.purchase_price)?;
        ensure_non_negative("current_price", self.current_price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ElectricityBill {
    pub id: i64,
    pub user_id: String,
    pub bill_date: NaiveDate,
    pub reading_date: NaiveDate,
    pub day_reading: Decimal,
    pub night_reading: Decimal,
    pub previous_day_reading: Option<Decimal>,
    pub previous_night_reading: Option<Decimal>,
    pub amount_paid: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub day_rate: Option<Decimal>,
    pub night_rate: Option<Decimal>,
    pub standing_charge: Option<Decimal>,
    pub notes: Option<String>,
}

impl ElectricityBill {
    pub fn day_usage(&self) -> Option<Decimal> {
        self.previous_day_reading.map(|p| self.day_reading - p)
    }

    pub fn night_usage(&self) -> Option<Decimal> {
        self.previous_night_reading.map(|p| self.night_reading - p)
    }

    /// Sum of the channels that have a previous reading.
    pub fn total_usage(&self) -> Option<Decimal> {
        match (self.day_usage(), self.night_usage()) {
            (None, None) => None,
            (day, night) => Some(day.unwrap_or_default().saturating_add(night.unwrap_or_default())),
        }
    }

    /// Cost implied by usage and tariff, independent of `amount_paid`.
    pub fn estimated_cost(&self) -> Option<Decimal> {
        let parts = [
            self.day_usage().zip(self.day_rate).map(|(u, r)| u * r),
            self.night_usage().zip(self.night_rate).map(|(u, r)| u * r),
            self.standing_charge,
        ];
        parts
            .into_iter()
            .flatten()
            .reduce(|acc, part| acc + part)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewElectricityBill {
    pub bill_date: NaiveDate,
    pub reading_date: NaiveDate,
    pub day_reading: Decimal,
    pub night_reading: Decimal,
    pub previous_day_reading: Option<Decimal>,
    pub previous_night_reading: Option<Decimal>,
    pub amount_paid: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    pub day_rate: Option<Decimal>,
    pub night_rate: Option<Decimal>,
    pub standing_charge: Option<Decimal>,
    pub notes: Option<String>,
}

impl NewElectricityBill {
    pub fn validate(&self) -> Result<(), LedgerError> {
        ensure_non_negative("day_reading", self.day_reading)?;
        ensure_non_negative("night_reading", self.night_reading)?;
        ensure_non_negative("amount_paid", self.amount_paid)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyAddress {
    pub id: i64,
    pub user_id: String,
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: String,
    pub nickname: Option<String>,
    pub is_current: bool,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub has_day_night_meter: bool,
}

impl PropertyAddress {
    pub fn label(&self) -> String {
        match &self.nickname {
            Some(n) => n.clone(),
            None => format!("{}, {}", self.street, self.city),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewPropertyAddress {
    pub street: String,
    pub city: String,
    pub postal_code: Option<String>,
    pub country: String,
    pub nickname: Option<String>,
    pub is_current: bool,
    pub move_in_date: NaiveDate,
    pub move_out_date: Option<NaiveDate>,
    pub has_day_night_meter: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserPreferences {
    /// `None` until the preferences are first saved.
    pub id: Option<i64>,
    pub user_id: String,
    pub default_currency: String,
    pub date_format: DateFormat,
}

impl UserPreferences {
    pub const DEFAULT_CURRENCY: &'static str = "USD";

    pub fn default_for(user_id: &str) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            default_currency: Self::DEFAULT_CURRENCY.to_string(),
            date_format: DateFormat::default(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Schedule {
    pub frequency: Frequency,
    pub start_date: NaiveDate,
    pub end_date: Option<NaiveDate>,
    pub next_occurrence: NaiveDate,
    pub is_active: bool,
}

impl Schedule {
    /// A fresh schedule whose first occurrence is its start date.
    pub fn starting(frequency: Frequency, start_date: NaiveDate, end_date: Option<NaiveDate>) -> Self {
        Self {
            frequency,
            start_date,
            end_date,
            next_occurrence: start_date,
            is_active: true,
        }
    }

    pub fn is_due(&self, as_of: NaiveDate) -> bool {
        self.is_active
            && self.next_occurrence <= as_of
            && self.end_date.is_none_or(|end| self.next_occurrence <= end)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringTransaction {
    pub id: i64,
    pub user_id: String,
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    #[serde(flatten)]
    pub schedule: Schedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecurringTransaction {
    pub title: String,
    pub description: Option<String>,
    pub amount: Decimal,
    pub category: String,
    #[serde(rename = "type")]
    pub kind: TransactionKind,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl NewRecurringTransaction {
    pub fn validate(&self) -> Result<(), LedgerError> {
        ensure_non_negative("amount", self.amount)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecurringInvestment {
    pub id: i64,
    pub user_id: String,
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    #[serde(flatten)]
    pub schedule: Schedule,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewRecurringInvestment {
    pub symbol: String,
    pub name: String,
    #[serde(rename = "type")]
    pub investment_type: InvestmentType,
    pub quantity: Decimal,
    pub purchase_price: Decimal,
    pub currency: String,
    pub exchange_rate: Option<Decimal>,
    #[serde(flatten)]
    pub schedule: Schedule,
}

impl NewRecurringInvestment {
    pub fn validate(&self) -> Result<(), LedgerError> {
        ensure_non_negative("quantity", self.quantity)?;
        ensure_non_negative("purchase_price", self.purchase_price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn bill() -> ElectricityBill {
        ElectricityBill {
            id: 1,
            user_id: "u".into(),
            bill_date: d(2024, 2, 1),
            reading_date: d(2024, 1, 31),
            day_reading: Decimal::new(1500, 0),
            night_reading: Decimal::new(800, 0),
            previous_day_reading: Some(Decimal::new(1300, 0)),
            previous_night_reading: None,
            amount_paid: Decimal::new(60, 0),
            currency: "GBP".into(),
            exchange_rate: None,
            day_rate: Some(Decimal::new(25, 2)),
            night_rate: Some(Decimal::new(10, 2)),
            standing_charge: Some(Decimal::new(5, 0)),
            notes: None,
        }
    }

    #[test]
    fn bill_usage_uses_available_channels() {
        let mut b = bill();
        assert_eq!(b.day_usage(), Some(Decimal::new(200, 0)));
        assert_eq!(b.night_usage(), None);
        assert_eq!(b.total_usage(), Some(Decimal::new(200, 0)));
        // 200 * 0.25 + standing 5
        assert_eq!(b.estimated_cost(), Some(Decimal::new(55, 0)));

        b.previous_night_reading = Some(Decimal::new(700, 0));
        assert_eq!(b.total_usage(), Some(Decimal::new(300, 0)));
        assert_eq!(b.estimated_cost(), Some(Decimal::new(65, 0)));

        b.previous_day_reading = None;
        b.previous_night_reading = None;
        assert_eq!(b.total_usage(), None);
    }

    #[test]
    fn investment_gain_in_native_currency() {
        let inv = Investment {
            id: 1,
            user_id: "u".into(),
            symbol: "BTC".into(),
            name: "Bitcoin".into(),
            investment_type: InvestmentType::Crypto,
            quantity: Decimal::new(5, 1),
            purchase_price: Decimal::new(40000, 0),
            current_price: Decimal::new(50000, 0),
            currency: "USD".into(),
            exchange_rate: None,
            purchase_date: d(2023, 5, 1),
        };
        assert_eq!(inv.value(), Decimal::new(25000, 0));
        assert_eq!(inv.cost(), Decimal::new(20000, 0));
        assert_eq!(inv.gain_loss(), Decimal::new(5000, 0));
        assert_eq!(inv.gain_loss_pct(), Some(Decimal::new(25, 0)));
    }

    #[test]
    fn string_enums_round_trip_stored_values() {
        assert_eq!("p2p_lending".parse::<InvestmentType>().unwrap(), InvestmentType::P2pLending);
        assert_eq!(InvestmentType::MutualFund.as_str(), "mutual_fund");
        assert_eq!("Expense".parse::<TransactionKind>().unwrap(), TransactionKind::Expense);
        assert!("transfer".parse::<TransactionKind>().is_err());
    }

    #[test]
    fn date_format_patterns() {
        let date = d(2024, 7, 4);
        assert_eq!(DateFormat::default().format(date), "07/04/2024");
        assert_eq!(DateFormat::DayMonthYear.format(date), "04/07/2024");
        assert_eq!(DateFormat::Iso.format(date), "2024-07-04");
        assert_eq!(
            serde_json::to_string(&DateFormat::MonthDayYear).unwrap(),
            "\"MM/dd/yyyy\""
        );
    }

    #[test]
    fn schedule_due_respects_end_date_and_activity() {
        let mut s = Schedule::starting(Frequency::Monthly, d(2024, 1, 15), Some(d(2024, 3, 1)));
        assert!(s.is_due(d(2024, 1, 15)));
        assert!(!s.is_due(d(2024, 1, 14)));
        s.next_occurrence = d(2024, 3, 15);
        assert!(!s.is_due(d(2024, 4, 1)));
        s.next_occurrence = d(2024, 2, 15);
        s.is_active = false;
        assert!(!s.is_due(d(2024, 4, 1)));
    }
}
