//! Common types used across the ledger

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Inclusive calendar date range
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Result<Self, &'static str> {
        crate::validation::validate_date_range(start, end)?;
        Ok(Self { start, end })
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        self.start <= date && date <= self.end
    }
}

/// Inclusive range of numeric lot numbers
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct LotNumberRange {
    pub from: i64,
    pub to: i64,
}

impl LotNumberRange {
    pub fn new(from: i64, to: i64) -> Result<Self, &'static str> {
        if from > to {
            return Err("Lot range start must not be after its end");
        }
        Ok(Self { from, to })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_date_range_contains_bounds() {
        let d = |day| NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        let range = DateRange::new(d(1), d(31)).unwrap();
        assert!(range.contains(d(1)));
        assert!(range.contains(d(31)));
        assert!(!range.contains(NaiveDate::from_ymd_opt(2024, 4, 1).unwrap()));
    }

    #[test]
    fn test_reversed_ranges_rejected() {
        let a = NaiveDate::from_ymd_opt(2024, 3, 2).unwrap();
        let b = NaiveDate::from_ymd_opt(2024, 3, 1).unwrap();
        assert!(DateRange::new(a, b).is_err());
        assert!(LotNumberRange::new(200, 100).is_err());
        assert!(LotNumberRange::new(100, 100).is_ok());
    }
}
