// Copyright (c) AlphaVelocity.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

use super::{currency_code, date_range, optional};
use crate::aggregate::{
    FinancialRecord, Summary, electricity_summary, portfolio_summary, summarize,
};
use crate::store::{Store, TransactionFilter};
use crate::utils::{fmt_money, maybe_print_json, pretty_table};
use anyhow::Result;

pub fn handle(store: &mut Store, user: &str, m: &clap::ArgMatches) -> Result<()> {
    match m.subcommand() {
        Some(("summary", sub)) => summary(store, user, sub)?,
        Some(("monthly", sub)) => monthly(store, user, sub)?,
        Some(("categories", sub)) => categories(store, user, sub)?,
        Some(("portfolio", sub)) => portfolio(store, user, sub)?,
        Some(("electricity", sub)) => electricity(store, user, sub)?,
        _ => {}
    }
    Ok(())
}

/// Target currency and whether stored snapshots still apply. Snapshots are
/// rates into the default currency, so any other target uses the table.
fn target(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<(String, bool)> {
    let default_ccy = store.default_currency(user)?;
    match optional(sub, "currency") {
        Some(c) => {
            let code = currency_code(c)?;
            let keep = code == default_ccy;
            Ok((code, keep))
        }
        None => Ok((default_ccy, true)),
    }
}

/// Transactions plus electricity bills folded into one summary, oldest
/// record first so month buckets come out in calendar order.
pub fn cash_summary(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<Summary> {
    let (ccy, keep_snapshots) = target(store, user, sub)?;
    let range = date_range(sub)?;
    let filter = TransactionFilter {
        range,
        ..TransactionFilter::default()
    };
    let mut txs = store.list_transactions(user, &filter)?;
    let mut bills = store.list_bills(user, &range)?;
    if !keep_snapshots {
        txs.iter_mut().for_each(|t| t.exchange_rate = None);
        bills.iter_mut().for_each(|b| b.exchange_rate = None);
    }
    let mut records: Vec<&dyn FinancialRecord> = txs
        .iter()
        .map(|t| t as &dyn FinancialRecord)
        .chain(bills.iter().map(|b| b as &dyn FinancialRecord))
        .collect();
    records.sort_by_key(|r| r.date());
    Ok(summarize(&records, &ccy))
}

fn summary(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let s = cash_summary(store, user, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Income".to_string(), fmt_money(&s.total_income, &s.currency)],
        vec!["Expenses".to_string(), fmt_money(&s.total_expenses, &s.currency)],
        vec!["Net".to_string(), fmt_money(&s.net, &s.currency)],
    ];
    println!("{}", pretty_table(&["", "Total"], rows));
    Ok(())
}

fn monthly(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let s = cash_summary(store, user, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s.months)? {
        return Ok(());
    }
    let rows = s
        .months
        .iter()
        .map(|m| {
            vec![
                m.label.clone(),
                fmt_money(&m.income, &s.currency),
                fmt_money(&m.expenses, &s.currency),
                fmt_money(&(m.income - m.expenses), &s.currency),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Month", "Income", "Expenses", "Net"], rows)
    );
    Ok(())
}

fn categories(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let s = cash_summary(store, user, sub)?;
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &s.categories)? {
        return Ok(());
    }
    let rows = s
        .categories
        .iter()
        .map(|c| {
            vec![
                c.category.clone(),
                fmt_money(&c.income, &s.currency),
                fmt_money(&c.expenses, &s.currency),
            ]
        })
        .collect();
    println!(
        "{}",
        pretty_table(&["Category", "Income", "Expenses"], rows)
    );
    Ok(())
}

fn portfolio(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let (ccy, keep_snapshots) = target(store, user, sub)?;
    let mut holdings = store.list_investments(user, &Default::default())?;
    if !keep_snapshots {
        holdings.iter_mut().for_each(|i| i.exchange_rate = None);
    }
    let p = portfolio_summary(&holdings, &ccy);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &p)? {
        return Ok(());
    }
    let mut rows: Vec<Vec<String>> = p
        .holdings
        .iter()
        .map(|h| {
            vec![
                h.symbol.clone(),
                h.investment_type.to_string(),
                fmt_money(&h.cost, &p.currency),
                fmt_money(&h.value, &p.currency),
                fmt_money(&h.gain_loss, &p.currency),
            ]
        })
        .collect();
    rows.push(vec![
        "TOTAL".into(),
        String::new(),
        fmt_money(&p.total_cost, &p.currency),
        fmt_money(&p.total_value, &p.currency),
        format!(
            "{}{}",
            fmt_money(&p.gain_loss, &p.currency),
            p.gain_loss_pct
                .map(|pct| format!(" ({:.2}%)", pct.round_dp(2)))
                .unwrap_or_default()
        ),
    ]);
    println!(
        "{}",
        pretty_table(&["Symbol", "Type", "Cost", "Value", "Gain/Loss"], rows)
    );
    let alloc = p
        .allocations
        .iter()
        .map(|a| vec![a.investment_type.to_string(), fmt_money(&a.value, &p.currency)])
        .collect();
    println!("{}", pretty_table(&["Allocation", "Value"], alloc));
    Ok(())
}

fn electricity(store: &mut Store, user: &str, sub: &clap::ArgMatches) -> Result<()> {
    let (ccy, keep_snapshots) = target(store, user, sub)?;
    let mut bills = store.list_bills(user, &date_range(sub)?)?;
    if !keep_snapshots {
        bills.iter_mut().for_each(|b| b.exchange_rate = None);
    }
    let e = electricity_summary(&bills, &ccy);
    if maybe_print_json(sub.get_flag("json"), sub.get_flag("jsonl"), &e)? {
        return Ok(());
    }
    let rows = vec![
        vec!["Bills".to_string(), e.bill_count.to_string()],
        vec!["Total paid".to_string(), fmt_money(&e.total_paid, &e.currency)],
        vec![
            "Average bill".to_string(),
            e.average_paid
                .map(|a| fmt_money(&a, &e.currency))
                .unwrap_or_default(),
        ],
        vec!["Day usage".to_string(), e.day_usage.to_string()],
        vec!["Night usage".to_string(), e.night_usage.to_string()],
        vec!["Total usage".to_string(), e.total_usage.to_string()],
    ];
    println!("{}", pretty_table(&["Electricity", ""], rows));
    Ok(())
}
