//! Lot registration tests
//!
//! Tests for registration input handling including:
//! - Required fields and defaults
//! - Quantity derivation from dimensions
//! - Duplicate resubmission classification

use chrono::NaiveDate;
use lot_ledger_backend::error::AppError;
use lot_ledger_backend::services::registration::RegisterLotInput;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    classify_resubmission, LotDimensions, ProcessingFlags, Resubmission, QUANTITY_SCALE,
};
use std::str::FromStr;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 4, 15).unwrap()
}

fn input(name: &str, quantity: Option<&str>) -> RegisterLotInput {
    RegisterLotInput {
        sku: "TAB-001".to_string(),
        name: name.to_string(),
        unit: None,
        lot_number: "101".to_string(),
        quantity: quantity.map(dec),
        dimensions: LotDimensions::default(),
        production_date: None,
        quality: None,
        processing: ProcessingFlags::default(),
        notes: None,
    }
}

fn validation_field(err: AppError) -> String {
    match err {
        AppError::Validation { field, .. } => field,
        other => panic!("expected validation error, got {:?}", other),
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    #[test]
    fn test_explicit_quantity_and_defaults() {
        let lot = input("Tablas", Some("300")).normalize(today()).unwrap();

        assert_eq!(lot.quantity, dec("300"));
        assert_eq!(lot.unit.as_deref(), Some("m3"));
        assert_eq!(lot.production_date, today());
        assert_eq!(lot.lot_number, "101");
    }

    #[test]
    fn test_fields_are_trimmed() {
        let mut raw = input(" Tablas ", Some("1"));
        raw.sku = "  TAB-001 ".to_string();
        raw.lot_number = " 101 ".to_string();
        raw.notes = Some("   ".to_string());

        let lot = raw.normalize(today()).unwrap();
        assert_eq!(lot.sku, "TAB-001");
        assert_eq!(lot.product_name, "Tablas");
        assert_eq!(lot.lot_number, "101");
        assert_eq!(lot.notes, None);
    }

    #[test]
    fn test_missing_required_fields() {
        let mut raw = input("Tablas", Some("1"));
        raw.sku = " ".to_string();
        assert_eq!(validation_field(raw.normalize(today()).unwrap_err()), "sku");

        let raw = input("", Some("1"));
        assert_eq!(validation_field(raw.normalize(today()).unwrap_err()), "name");

        let mut raw = input("Tablas", Some("1"));
        raw.lot_number = String::new();
        assert_eq!(validation_field(raw.normalize(today()).unwrap_err()), "lot_number");
    }

    #[test]
    fn test_negative_quantity_rejected() {
        let err = input("Tablas", Some("-1")).normalize(today()).unwrap_err();
        assert_eq!(validation_field(err), "quantity");
    }

    #[test]
    fn test_quantity_beyond_four_places_rejected() {
        let err = input("Tablas", Some("0.33335")).normalize(today()).unwrap_err();
        assert_eq!(validation_field(err), "quantity");
        assert!(input("Tablas", Some("0.3333")).normalize(today()).is_ok());
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        let mut raw = input("Tablas", None);
        raw.dimensions = LotDimensions {
            length: Some(dec("100000000000000000000")),
            width: Some(dec("100000000000000000000")),
            thickness: Some(dec("1")),
            piece_count: Some(1),
        };
        assert_eq!(validation_field(raw.normalize(today()).unwrap_err()), "quantity");
    }

    #[test]
    fn test_zero_quantity_allowed() {
        let lot = input("Vigas", Some("0")).normalize(today()).unwrap();
        assert_eq!(lot.quantity, Decimal::ZERO);
        assert_eq!(lot.unit, None);
    }

    #[test]
    fn test_volume_derived_from_dimensions() {
        let mut raw = input("Tablas", None);
        raw.dimensions = LotDimensions {
            length: Some(dec("2.5")),
            width: Some(dec("0.2")),
            thickness: Some(dec("0.05")),
            piece_count: Some(10),
        };

        let lot = raw.normalize(today()).unwrap();
        assert_eq!(lot.quantity, dec("0.25"));
        assert_eq!(lot.unit.as_deref(), Some("m3"));
    }

    #[test]
    fn test_area_derived_from_dimensions() {
        let mut raw = input("Machihembrado", None);
        raw.dimensions = LotDimensions {
            length: Some(dec("3")),
            width: Some(dec("0.1")),
            thickness: None,
            piece_count: Some(20),
        };

        let lot = raw.normalize(today()).unwrap();
        assert_eq!(lot.quantity, dec("6"));
        assert_eq!(lot.unit.as_deref(), Some("m2"));
    }

    #[test]
    fn test_derivation_needs_pieces() {
        let mut raw = input("Tablones", None);
        raw.dimensions = LotDimensions {
            length: Some(dec("3")),
            width: Some(dec("0.2")),
            thickness: Some(dec("0.05")),
            piece_count: Some(0),
        };
        assert_eq!(validation_field(raw.normalize(today()).unwrap_err()), "piece_count");
    }

    #[test]
    fn test_unknown_type_needs_quantity() {
        let err = input("Vigas", None).normalize(today()).unwrap_err();
        assert_eq!(validation_field(err), "quantity");
    }

    #[test]
    fn test_explicit_unit_wins() {
        let mut raw = input("Tablas", Some("12"));
        raw.unit = Some("pulgadas".to_string());
        let lot = raw.normalize(today()).unwrap();
        assert_eq!(lot.unit.as_deref(), Some("pulgadas"));
    }

    #[test]
    fn test_deserializes_flat_request() {
        let raw: RegisterLotInput = serde_json::from_value(serde_json::json!({
            "sku": "MAC-010",
            "name": "Machihembrado",
            "lot_number": "207",
            "length": "3",
            "width": "0.1",
            "piece_count": 20,
            "dried": true
        }))
        .unwrap();

        assert_eq!(raw.dimensions.piece_count, Some(20));
        assert!(raw.processing.dried);
        assert!(!raw.processing.planed);
        assert_eq!(raw.normalize(today()).unwrap().quantity, dec("6"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Resubmitting the same SKU with a quantity within 0.01 is a duplicate
    #[test]
    fn prop_small_differences_are_duplicates(
        base in 0i64..10_000_000,
        offset in -100i64..=100i64,
    ) {
        let existing = Decimal::new(base, 2);
        let submitted = existing + Decimal::new(offset, 4);
        prop_assert_eq!(
            classify_resubmission("TAB-001", existing, "TAB-001", submitted),
            Resubmission::Duplicate
        );
    }

    /// Larger quantity differences are conflicts
    #[test]
    fn prop_material_differences_conflict(
        base in 0i64..10_000_000,
        offset in 2i64..10_000,
        negative in any::<bool>(),
    ) {
        let existing = Decimal::new(base, 2);
        let delta = Decimal::new(offset, 2);
        let submitted = if negative { existing - delta } else { existing + delta };
        prop_assert_eq!(
            classify_resubmission("TAB-001", existing, "TAB-001", submitted),
            Resubmission::Conflict
        );
    }

    /// A different SKU always conflicts, whatever the quantity
    #[test]
    fn prop_other_sku_conflicts(quantity in 0i64..1_000_000) {
        let q = Decimal::new(quantity, 2);
        prop_assert_eq!(
            classify_resubmission("TAB-001", q, "TAB-002", q),
            Resubmission::Conflict
        );
    }

    /// Derived volume equals the product of the dimensions
    #[test]
    fn prop_volume_derivation(
        length in 1i64..1_000,
        width in 1i64..1_000,
        thickness in 1i64..1_000,
        pieces in 1i32..500,
    ) {
        let mut raw = input("Paletas", None);
        raw.dimensions = LotDimensions {
            length: Some(Decimal::new(length, 2)),
            width: Some(Decimal::new(width, 3)),
            thickness: Some(Decimal::new(thickness, 3)),
            piece_count: Some(pieces),
        };

        let expected = (Decimal::new(length, 2)
            * Decimal::new(width, 3)
            * Decimal::new(thickness, 3)
            * Decimal::from(pieces))
            .round_dp(QUANTITY_SCALE);

        match raw.normalize(today()) {
            Ok(lot) => {
                prop_assert_eq!(lot.quantity, expected);
                prop_assert!(lot.quantity.scale() <= QUANTITY_SCALE);
            }
            Err(err) => {
                prop_assert!(expected.is_zero());
                prop_assert_eq!(validation_field(err), "quantity");
            }
        }
    }
}
