use crate::error::{ReconciliationError, Result};
use chrono::{Datelike, Days, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Division with an explicit fallback for a zero denominator. Every margin and
/// rate in the crate goes through this so persisted statements never carry
/// NaN or infinity.
pub fn safe_div(numerator: f64, denominator: f64, fallback: f64) -> f64 {
    if denominator.abs() < f64::EPSILON {
        fallback
    } else {
        numerator / denominator
    }
}

pub fn last_day_of_month(year: i32, month: u32) -> NaiveDate {
    let next_month = if month == 12 { 1 } else { month + 1 };
    let next_year = if month == 12 { year + 1 } else { year };

    NaiveDate::from_ymd_opt(next_year, next_month, 1)
        .unwrap()
        .checked_sub_days(Days::new(1))
        .unwrap()
}

/// First and last calendar day of a month.
pub fn month_bounds(year: i32, month: u32) -> (NaiveDate, NaiveDate) {
    (
        NaiveDate::from_ymd_opt(year, month, 1).unwrap(),
        last_day_of_month(year, month),
    )
}

pub fn in_month(date: NaiveDate, year: i32, month: u32) -> bool {
    date.year() == year && date.month() == month
}

pub fn months_between(start: NaiveDate, end: NaiveDate) -> i32 {
    let year_diff = end.year() - start.year();
    let month_diff = end.month() as i32 - start.month() as i32;
    year_diff * 12 + month_diff
}

pub fn validate_month(year: i32, month: u32) -> Result<()> {
    if !(1..=12).contains(&month) {
        return Err(ReconciliationError::InvalidPeriod { year, month });
    }
    Ok(())
}

/// Natural key of one analysis period. Ordering is chronological, so keys can
/// drive range scans over a `BTreeMap` store directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct PeriodKey {
    pub year: i32,
    pub month: u32,
}

impl PeriodKey {
    pub fn new(year: i32, month: u32) -> Result<Self> {
        validate_month(year, month)?;
        Ok(Self { year, month })
    }

    /// Parses a period string in the format "YYYY-MM".
    pub fn parse(period: &str) -> Result<Self> {
        let date_str = format!("{}-01", period.trim());
        let date = NaiveDate::parse_from_str(&date_str, "%Y-%m-%d").map_err(|_| {
            ReconciliationError::DateError(format!(
                "Invalid period format: {}. Expected YYYY-MM",
                period
            ))
        })?;
        Ok(Self {
            year: date.year(),
            month: date.month(),
        })
    }

    pub fn next(self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }

    pub fn bounds(self) -> (NaiveDate, NaiveDate) {
        month_bounds(self.year, self.month)
    }
}

impl fmt::Display for PeriodKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_safe_div() {
        assert_eq!(safe_div(10.0, 2.0, 0.0), 5.0);
        assert_eq!(safe_div(10.0, 0.0, 0.0), 0.0);
        assert_eq!(safe_div(-3.0, 0.0, 1.0), 1.0);
        assert!(safe_div(1.0, 0.0, 0.0).is_finite());
    }

    #[test]
    fn test_last_day_of_month() {
        assert_eq!(
            last_day_of_month(2025, 2),
            NaiveDate::from_ymd_opt(2025, 2, 28).unwrap()
        );
        assert_eq!(
            last_day_of_month(2024, 2),
            NaiveDate::from_ymd_opt(2024, 2, 29).unwrap()
        );
        assert_eq!(
            last_day_of_month(2025, 12),
            NaiveDate::from_ymd_opt(2025, 12, 31).unwrap()
        );
    }

    #[test]
    fn test_month_bounds() {
        let (start, end) = month_bounds(2025, 9);
        assert_eq!(start, NaiveDate::from_ymd_opt(2025, 9, 1).unwrap());
        assert_eq!(end, NaiveDate::from_ymd_opt(2025, 9, 30).unwrap());
    }

    #[test]
    fn test_in_month() {
        let date = NaiveDate::from_ymd_opt(2025, 9, 15).unwrap();
        assert!(in_month(date, 2025, 9));
        assert!(!in_month(date, 2025, 10));
        assert!(!in_month(date, 2024, 9));
    }

    #[test]
    fn test_months_between() {
        let start = NaiveDate::from_ymd_opt(2025, 1, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2025, 12, 31).unwrap();
        assert_eq!(months_between(start, end), 11);

        let end = NaiveDate::from_ymd_opt(2026, 2, 1).unwrap();
        assert_eq!(months_between(start, end), 13);
    }

    #[test]
    fn test_period_key_parse_and_display() {
        let key = PeriodKey::parse("2025-09").unwrap();
        assert_eq!(key, PeriodKey::new(2025, 9).unwrap());
        assert_eq!(key.to_string(), "2025-09");

        assert!(PeriodKey::parse("september").is_err());
        assert!(PeriodKey::new(2025, 13).is_err());
        assert!(PeriodKey::new(2025, 0).is_err());
    }

    #[test]
    fn test_period_key_ordering_and_next() {
        let a = PeriodKey::new(2024, 12).unwrap();
        let b = PeriodKey::new(2025, 1).unwrap();
        assert!(a < b);
        assert_eq!(a.next(), b);
        assert_eq!(b.next(), PeriodKey::new(2025, 2).unwrap());
    }
}
