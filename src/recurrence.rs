// Copyright (c) 2025 Soumyadip Sarkar.
// All rights reserved.
//
// This source code is licensed under the license found in the
// LICENSE file in the root directory of this source tree.

//! Calendar arithmetic for recurring templates.
//!
//! Adding a month or a year can land on a day the target month does not have
//! (Jan 31 + 1 month). [`MonthOverflow`] names what happens then.

use crate::models::Frequency;
use chrono::{Datelike, Days, Months, NaiveDate};
use tracing::warn;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MonthOverflow {
    /// Surplus days spill into the next month: 2024-01-31 + 1 month = 2024-03-02.
    #[default]
    Roll,
    /// Stop at the last day of the target month: 2024-01-31 + 1 month = 2024-02-29.
    Clamp,
}

impl Frequency {
    /// Parse a stored frequency, treating anything unrecognised as monthly.
    pub fn parse_lenient(s: &str) -> Frequency {
        s.parse().unwrap_or_else(|_| {
            warn!(value = s, "unknown frequency, treating as monthly");
            Frequency::Monthly
        })
    }
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    let (ny, nm) = if month == 12 { (year + 1, 1) } else { (year, month + 1) };
    NaiveDate::from_ymd_opt(ny, nm, 1)
        .and_then(|d| d.pred_opt())
        .map(|d| d.day())
        .unwrap_or(28)
}

fn add_months_rolling(date: NaiveDate, months: u32) -> Option<NaiveDate> {
    let index = date.year() * 12 + date.month0() as i32 + months as i32;
    let year = index.div_euclid(12);
    let month = index.rem_euclid(12) as u32 + 1;
    let last = days_in_month(year, month);
    if date.day() <= last {
        return NaiveDate::from_ymd_opt(year, month, date.day());
    }
    let surplus = (date.day() - last) as u64;
    NaiveDate::from_ymd_opt(year, month, last)?.checked_add_days(Days::new(surplus))
}

pub fn add_months(date: NaiveDate, months: u32, policy: MonthOverflow) -> Option<NaiveDate> {
    match policy {
        MonthOverflow::Roll => add_months_rolling(date, months),
        MonthOverflow::Clamp => date.checked_add_months(Months::new(months)),
    }
}

/// One calendar unit after `date`, rolling month overflow forward.
pub fn next_occurrence(date: NaiveDate, frequency: Frequency) -> NaiveDate {
    next_occurrence_with(date, frequency, MonthOverflow::Roll)
}

pub fn next_occurrence_with(date: NaiveDate, frequency: Frequency, policy: MonthOverflow) -> NaiveDate {
    let next = match frequency {
        Frequency::Daily => date.checked_add_days(Days::new(1)),
        Frequency::Weekly => date.checked_add_days(Days::new(7)),
        Frequency::Monthly => add_months(date, 1, policy),
        Frequency::Yearly => add_months(date, 12, policy),
    };
    next.unwrap_or(NaiveDate::MAX)
}

/// Successive occurrences starting at `start` (inclusive) up to `until` (inclusive).
pub fn occurrences_until(
    start: NaiveDate,
    frequency: Frequency,
    until: NaiveDate,
) -> impl Iterator<Item = NaiveDate> {
    std::iter::successors(Some(start), move |d| {
        let n = next_occurrence(*d, frequency);
        (n > *d).then_some(n)
    })
    .take_while(move |d| *d <= until)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn month_end_rolls_into_following_month() {
        assert_eq!(next_occurrence(d(2024, 1, 31), Frequency::Monthly), d(2024, 3, 2));
        assert_eq!(next_occurrence(d(2023, 1, 31), Frequency::Monthly), d(2023, 3, 3));
        assert_eq!(next_occurrence(d(2024, 3, 31), Frequency::Monthly), d(2024, 5, 1));
    }

    #[test]
    fn clamp_policy_stops_at_month_end() {
        assert_eq!(
            next_occurrence_with(d(2024, 1, 31), Frequency::Monthly, MonthOverflow::Clamp),
            d(2024, 2, 29)
        );
        assert_eq!(
            next_occurrence_with(d(2024, 2, 29), Frequency::Yearly, MonthOverflow::Clamp),
            d(2025, 2, 28)
        );
    }

    #[test]
    fn leap_day_yearly_rolls_to_march() {
        assert_eq!(next_occurrence(d(2024, 2, 29), Frequency::Yearly), d(2025, 3, 1));
    }

    #[test]
    fn december_wraps_year() {
        assert_eq!(next_occurrence(d(2024, 12, 15), Frequency::Monthly), d(2025, 1, 15));
        assert_eq!(next_occurrence(d(2024, 12, 31), Frequency::Daily), d(2025, 1, 1));
        assert_eq!(next_occurrence(d(2024, 12, 28), Frequency::Weekly), d(2025, 1, 4));
    }

    #[test]
    fn unknown_frequency_defaults_to_monthly() {
        assert_eq!(Frequency::parse_lenient("fortnightly"), Frequency::Monthly);
        assert_eq!(Frequency::parse_lenient("Weekly"), Frequency::Weekly);
    }

    #[test]
    fn days_in_month_handles_leap_years() {
        assert_eq!(days_in_month(2024, 2), 29);
        assert_eq!(days_in_month(2100, 2), 28);
        assert_eq!(days_in_month(2024, 12), 31);
    }

    #[test]
    fn occurrences_until_is_inclusive() {
        let dates: Vec<_> = occurrences_until(d(2024, 1, 1), Frequency::Weekly, d(2024, 1, 15)).collect();
        assert_eq!(dates, vec![d(2024, 1, 1), d(2024, 1, 8), d(2024, 1, 15)]);
    }
}
