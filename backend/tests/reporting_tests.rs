//! Reporting tests
//!
//! Tests for lot-number range selection including:
//! - Non-numeric lot numbers are skipped, never an error
//! - Results sorted ascending by numeric value
//! - Inclusive bounds

use proptest::prelude::*;
use shared::{numeric_lot_number, select_lot_range, DateRange, LotNumberRange};

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn test_lot_range_scenario() {
        let lots = vec![
            "101".to_string(),
            "150".to_string(),
            "A-1".to_string(),
            "250".to_string(),
        ];
        let selected = select_lot_range(lots, 100, 200, |l| l.as_str());
        assert_eq!(selected, vec!["101".to_string(), "150".to_string()]);
    }

    #[test]
    fn test_sorted_numerically_not_lexically() {
        let lots = vec!["20", "100", "3", "0099"];
        let selected = select_lot_range(lots, 0, 1_000, |l| *l);
        assert_eq!(selected, vec!["3", "20", "0099", "100"]);
    }

    #[test]
    fn test_malformed_lot_numbers_skipped() {
        let lots = vec!["12a", "", " ", "1.5", "15", "+16"];
        let selected = select_lot_range(lots, 0, 100, |l| *l);
        assert_eq!(selected, vec!["15"]);
    }

    #[test]
    fn test_range_types_validate_order() {
        assert!(LotNumberRange::new(200, 100).is_err());

        let start = NaiveDate::from_ymd_opt(2024, 5, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 4, 1).unwrap();
        assert!(DateRange::new(start, end).is_err());
        assert!(DateRange::new(end, start).is_ok());
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn lot_number_strategy() -> impl Strategy<Value = String> {
    prop_oneof![
        (0u32..1_000).prop_map(|n| n.to_string()),
        "[A-Z]-[0-9]{1,3}",
        "[0-9]{1,3}[a-z]",
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Every selected lot is numeric, within range, and in ascending order
    #[test]
    fn prop_range_selection_is_sorted_and_bounded(
        lots in prop::collection::vec(lot_number_strategy(), 0..50),
        from in 0i64..500,
        span in 0i64..500,
    ) {
        let to = from + span;
        let selected = select_lot_range(lots.clone(), from, to, |l| l.as_str());

        let values: Vec<i64> = selected
            .iter()
            .map(|l| numeric_lot_number(l).unwrap())
            .collect();
        prop_assert!(values.windows(2).all(|w| w[0] <= w[1]));
        prop_assert!(values.iter().all(|v| (from..=to).contains(v)));

        let expected = lots
            .iter()
            .filter_map(|l| numeric_lot_number(l))
            .filter(|v| (from..=to).contains(v))
            .count();
        prop_assert_eq!(selected.len(), expected);
    }
}
