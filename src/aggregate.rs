// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Dashboard figures. Every record is converted into the target currency
//! first and then folded into buckets. Buckets keep the order in which their
//! key was first seen.

use crate::fx::{RateProvider, TableRates, convert_with};
use crate::models::{ElectricityBill, Investment, InvestmentType, Transaction, TransactionKind};
use crate::utils::month_label;
use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::Serialize;
use std::collections::HashMap;

/// Anything that can be summed into income/expense totals.
pub trait FinancialRecord {
    fn amount(&self) -> Decimal;
    fn currency(&self) -> &str;
    fn snapshot_rate(&self) -> Option<Decimal>;
    fn date(&self) -> NaiveDate;
    fn category(&self) -> &str;
    fn kind(&self) -> TransactionKind;
}

impl<T: FinancialRecord + ?Sized> FinancialRecord for &T {
    fn amount(&self) -> Decimal {
        (**self).amount()
    }
    fn currency(&self) -> &str {
        (**self).currency()
    }
    fn snapshot_rate(&self) -> Option<Decimal> {
        (**self).snapshot_rate()
    }
    fn date(&self) -> NaiveDate {
        (**self).date()
    }
    fn category(&self) -> &str {
        (**self).category()
    }
    fn kind(&self) -> TransactionKind {
        (**self).kind()
    }
}

impl FinancialRecord for Transaction {
    fn amount(&self) -> Decimal {
        self.amount
    }
    fn currency(&self) -> &str {
        &self.currency
    }
    fn snapshot_rate(&self) -> Option<Decimal> {
        self.exchange_rate
    }
    fn date(&self) -> NaiveDate {
        self.transaction_date
    }
    fn category(&self) -> &str {
        &self.category
    }
    fn kind(&self) -> TransactionKind {
        self.kind
    }
}

impl FinancialRecord for ElectricityBill {
    fn amount(&self) -> Decimal {
        self.amount_paid
    }
    fn currency(&self) -> &str {
        &self.currency
    }
    fn snapshot_rate(&self) -> Option<Decimal> {
        self.exchange_rate
    }
    fn date(&self) -> NaiveDate {
        self.bill_date
    }
    fn category(&self) -> &str {
        "Electricity"
    }
    fn kind(&self) -> TransactionKind {
        TransactionKind::Expense
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthBucket {
    pub label: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryBucket {
    pub category: String,
    pub income: Decimal,
    pub expenses: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Summary {
    pub currency: String,
    pub total_income: Decimal,
    pub total_expenses: Decimal,
    pub net: Decimal,
    pub months: Vec<MonthBucket>,
    pub categories: Vec<CategoryBucket>,
}

/// Keyed accumulator that remembers first-seen order.
struct Buckets<T> {
    items: Vec<T>,
    index: HashMap<String, usize>,
}

impl<T> Buckets<T> {
    fn new() -> Self {
        Self {
            items: Vec::new(),
            index: HashMap::new(),
        }
    }

    fn entry(&mut self, key: &str, make: impl FnOnce() -> T) -> &mut T {
        let idx = match self.index.get(key) {
            Some(&idx) => idx,
            None => {
                let idx = self.items.len();
                self.items.push(make());
                self.index.insert(key.to_string(), idx);
                idx
            }
        };
        &mut self.items[idx]
    }

    fn into_vec(self) -> Vec<T> {
        self.items
    }
}

/// Running totals saturate at the `Decimal` bounds.
fn add(acc: &mut Decimal, value: Decimal) {
    *acc = acc.saturating_add(value);
}

pub fn summarize<R: FinancialRecord>(records: &[R], target: &str) -> Summary {
    summarize_with(&TableRates, records, target)
}

pub fn summarize_with<P, R>(provider: &P, records: &[R], target: &str) -> Summary
where
    P: RateProvider + ?Sized,
    R: FinancialRecord,
{
    let mut total_income = Decimal::ZERO;
    let mut total_expenses = Decimal::ZERO;
    let mut months: Buckets<MonthBucket> = Buckets::new();
    let mut categories: Buckets<CategoryBucket> = Buckets::new();

    for r in records {
        let value = convert_with(provider, r.amount(), r.currency(), target, r.snapshot_rate());
        let label = month_label(r.date());
        let month = months.entry(&label, || MonthBucket {
            label: label.clone(),
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
        });
        match r.kind() {
            TransactionKind::Income => add(&mut month.income, value),
            TransactionKind::Expense => add(&mut month.expenses, value),
        }
        let category = categories.entry(r.category(), || CategoryBucket {
            category: r.category().to_string(),
            income: Decimal::ZERO,
            expenses: Decimal::ZERO,
        });
        match r.kind() {
            TransactionKind::Income => {
                add(&mut category.income, value);
                add(&mut total_income, value);
            }
            TransactionKind::Expense => {
                add(&mut category.expenses, value);
                add(&mut total_expenses, value);
            }
        }
    }

    Summary {
        currency: target.to_string(),
        total_income,
        total_expenses,
        net: total_income.saturating_sub(total_expenses),
        months: months.into_vec(),
        categories: categories.into_vec(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HoldingValue {
    pub symbol: String,
    pub name: String,
    pub investment_type: InvestmentType,
    pub value: Decimal,
    pub cost: Decimal,
    pub gain_loss: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AllocationBucket {
    pub investment_type: InvestmentType,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PortfolioSummary {
    pub currency: String,
    pub total_value: Decimal,
    pub total_cost: Decimal,
    pub gain_loss: Decimal,
    pub gain_loss_pct: Option<Decimal>,
    pub holdings: Vec<HoldingValue>,
    pub allocations: Vec<AllocationBucket>,
}

pub fn portfolio_summary(investments: &[Investment], target: &str) -> PortfolioSummary {
    portfolio_summary_with(&TableRates, investments, target)
}

pub fn portfolio_summary_with<P: RateProvider + ?Sized>(
    provider: &P,
    investments: &[Investment],
    target: &str,
) -> PortfolioSummary {
    let mut total_value = Decimal::ZERO;
    let mut total_cost = Decimal::ZERO;
    let mut holdings = Vec::with_capacity(investments.len());
    let mut allocations: Buckets<AllocationBucket> = Buckets::new();

    for inv in investments {
        let conv = |v: Decimal| convert_with(provider, v, &inv.currency, target, inv.exchange_rate);
        let value = conv(inv.value());
        let cost = conv(inv.cost());
        add(&mut total_value, value);
        add(&mut total_cost, cost);
        let bucket = allocations.entry(inv.investment_type.as_str(), || AllocationBucket {
            investment_type: inv.investment_type,
            value: Decimal::ZERO,
        });
        add(&mut bucket.value, value);
        holdings.push(HoldingValue {
            symbol: inv.symbol.clone(),
            name: inv.name.clone(),
            investment_type: inv.investment_type,
            value,
            cost,
            gain_loss: value.saturating_sub(cost),
        });
    }

    let gain_loss = total_value.saturating_sub(total_cost);
    PortfolioSummary {
        currency: target.to_string(),
        total_value,
        total_cost,
        gain_loss,
        gain_loss_pct: gain_loss
            .checked_div(total_cost)
            .and_then(|r| r.checked_mul(Decimal::ONE_HUNDRED)),
        holdings,
        allocations: allocations.into_vec(),
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElectricitySummary {
    pub currency: String,
    pub bill_count: usize,
    pub total_paid: Decimal,
    pub average_paid: Option<Decimal>,
    pub day_usage: Decimal,
    pub night_usage: Decimal,
    pub total_usage: Decimal,
}

pub fn electricity_summary(bills: &[ElectricityBill], target: &str) -> ElectricitySummary {
    electricity_summary_with(&TableRates, bills, target)
}

pub fn electricity_summary_with<P: RateProvider + ?Sized>(
    provider: &P,
    bills: &[ElectricityBill],
    target: &str,
) -> ElectricitySummary {
    let mut total_paid = Decimal::ZERO;
    let mut day_usage = Decimal::ZERO;
    let mut night_usage = Decimal::ZERO;
    for b in bills {
        let paid = convert_with(provider, b.amount_paid, &b.currency, target, b.exchange_rate);
        add(&mut total_paid, paid);
        add(&mut day_usage, b.day_usage().unwrap_or_default());
        add(&mut night_usage, b.night_usage().unwrap_or_default());
    }
    let bill_count = bills.len();
    ElectricitySummary {
        currency: target.to_string(),
        bill_count,
        total_paid,
        average_paid: (bill_count > 0).then(|| total_paid / Decimal::from(bill_count)),
        day_usage,
        night_usage,
        total_usage: day_usage.saturating_add(night_usage),
    }
}
