//! Stock ledger tests
//!
//! Exercises the pure ledger rules the stock engine applies under a row
//! lock:
//! - Non-negativity of lot quantity
//! - Movement sum equals live quantity
//! - Status transitions (exhausted, retired, recovered)
//! - Quantities limited to four decimal places
//! - Serialized concurrent dispatches never overdraw

use chrono::NaiveDate;
use proptest::prelude::*;
use rust_decimal::Decimal;
use shared::{
    check_dispatch, check_recovery, plan_movement, plan_retirement, LedgerError, LotStatus,
    MovementType, StockSnapshot,
};
use std::str::FromStr;
use std::sync::{Arc, Barrier, Mutex};
use std::thread;

// Helper to create Decimal from string
fn dec(s: &str) -> Decimal {
    Decimal::from_str(s).unwrap()
}

fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}

/// In-memory lot that applies movements the way the stock engine does
#[derive(Debug, Clone)]
struct SimLot {
    snapshot: StockSnapshot,
    production_date: NaiveDate,
    movements: Vec<(MovementType, Decimal)>,
}

impl SimLot {
    fn new(production_date: NaiveDate) -> Self {
        Self {
            snapshot: StockSnapshot {
                quantity: Decimal::ZERO,
                status: LotStatus::Available,
            },
            production_date,
            movements: Vec::new(),
        }
    }

    fn apply(&mut self, delta: Decimal, kind: MovementType) -> Result<(), LedgerError> {
        let plan = plan_movement(self.snapshot, delta, kind)?;
        self.snapshot = StockSnapshot {
            quantity: plan.new_quantity,
            status: plan.new_status,
        };
        self.movements.push((kind, plan.change));
        Ok(())
    }

    fn dispatch(&mut self, quantity: Decimal, on: NaiveDate) -> Result<(), LedgerError> {
        check_dispatch(self.snapshot.quantity, self.production_date, quantity, on)?;
        self.apply(-quantity, MovementType::Out)
    }

    fn retire(&mut self, reason: &str) -> Result<(), LedgerError> {
        let plan = plan_retirement(self.snapshot, reason)?;
        if let Some(delta) = plan.compensating_delta {
            self.apply(delta, MovementType::Adjustment)?;
        }
        self.snapshot.status = LotStatus::Retired;
        Ok(())
    }

    fn recover(&mut self, note: &str) -> Result<(), LedgerError> {
        check_recovery(self.snapshot.status, note)?;
        self.snapshot.status = LotStatus::Available;
        Ok(())
    }

    fn movement_sum(&self) -> Decimal {
        self.movements.iter().map(|(_, change)| *change).sum()
    }
}

// ============================================================================
// Unit Tests
// ============================================================================

#[cfg(test)]
mod unit_tests {
    use super::*;

    /// Register 300, dispatch 120 then 180, then fail to dispatch 1
    #[test]
    fn test_register_and_dispatch_scenario() {
        let produced = date(2024, 3, 1);
        let mut lot = SimLot::new(produced);

        lot.apply(dec("300"), MovementType::In).unwrap();
        assert_eq!(lot.movements, vec![(MovementType::In, dec("300"))]);

        lot.dispatch(dec("120"), date(2024, 3, 5)).unwrap();
        assert_eq!(lot.snapshot.quantity, dec("180"));
        assert_eq!(lot.snapshot.status, LotStatus::Available);
        assert_eq!(lot.movements[1], (MovementType::Out, dec("-120")));

        lot.dispatch(dec("180"), date(2024, 3, 6)).unwrap();
        assert_eq!(lot.snapshot.quantity, Decimal::ZERO);
        assert_eq!(lot.snapshot.status, LotStatus::Exhausted);

        let err = lot.dispatch(dec("1"), date(2024, 3, 7)).unwrap_err();
        assert_eq!(
            err,
            LedgerError::InsufficientStock {
                available: Decimal::ZERO,
                requested: dec("1"),
            }
        );
        assert_eq!(lot.movements.len(), 3);
        assert_eq!(lot.movement_sum(), lot.snapshot.quantity);
    }

    /// A dispatch dated before production fails whatever the stock
    #[test]
    fn test_chronology_guard() {
        let mut lot = SimLot::new(date(2024, 3, 10));
        lot.apply(dec("50"), MovementType::In).unwrap();

        let err = lot.dispatch(dec("10"), date(2024, 3, 9)).unwrap_err();
        assert!(matches!(err, LedgerError::Chronology { .. }));

        let err = lot.dispatch(dec("500"), date(2024, 3, 9)).unwrap_err();
        assert!(matches!(err, LedgerError::Chronology { .. }));
        assert_eq!(lot.snapshot.quantity, dec("50"));
    }

    /// Retiring zeroes stock with an adjustment, recovery keeps quantity
    #[test]
    fn test_retire_then_recover() {
        let mut lot = SimLot::new(date(2024, 1, 1));
        lot.apply(dec("42.5"), MovementType::In).unwrap();

        lot.retire("fungal stain").unwrap();
        assert_eq!(lot.snapshot.status, LotStatus::Retired);
        assert_eq!(lot.snapshot.quantity, Decimal::ZERO);
        assert_eq!(
            lot.movements.last(),
            Some(&(MovementType::Adjustment, dec("-42.5")))
        );

        assert!(matches!(
            lot.retire("again"),
            Err(LedgerError::InvalidTransition { .. })
        ));

        lot.recover("stain was superficial").unwrap();
        assert_eq!(lot.snapshot.status, LotStatus::Available);
        assert_eq!(lot.snapshot.quantity, Decimal::ZERO);
        assert_eq!(lot.movement_sum(), Decimal::ZERO);

        assert!(matches!(
            lot.recover("twice"),
            Err(LedgerError::InvalidTransition { .. })
        ));
    }

    /// Retiring an empty lot records no movement
    #[test]
    fn test_retire_exhausted_lot() {
        let mut lot = SimLot::new(date(2024, 1, 1));
        lot.apply(dec("10"), MovementType::In).unwrap();
        lot.dispatch(dec("10"), date(2024, 1, 2)).unwrap();
        let before = lot.movements.len();

        lot.retire("end of season").unwrap();
        assert_eq!(lot.movements.len(), before);
        assert_eq!(lot.snapshot.status, LotStatus::Retired);
    }

    /// Positive stock on a retired lot makes it available again
    #[test]
    fn test_positive_adjustment_reactivates() {
        let plan = plan_movement(
            StockSnapshot {
                quantity: Decimal::ZERO,
                status: LotStatus::Retired,
            },
            dec("5"),
            MovementType::Adjustment,
        )
        .unwrap();
        assert_eq!(plan.new_status, LotStatus::Available);
    }

    /// Two dispatches of 6 against 10 units: exactly one succeeds
    #[test]
    fn test_concurrent_dispatches_do_not_overdraw() {
        let mut lot = SimLot::new(date(2024, 2, 1));
        lot.apply(dec("10"), MovementType::In).unwrap();

        // The mutex plays the role of the lot row lock
        let lot = Arc::new(Mutex::new(lot));
        let barrier = Arc::new(Barrier::new(2));

        let handles: Vec<_> = (0..2)
            .map(|_| {
                let lot = Arc::clone(&lot);
                let barrier = Arc::clone(&barrier);
                thread::spawn(move || {
                    barrier.wait();
                    let mut guard = lot.lock().unwrap();
                    guard.dispatch(dec("6"), date(2024, 2, 2))
                })
            })
            .collect();

        let results: Vec<_> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        let successes = results.iter().filter(|r| r.is_ok()).count();
        let shortfalls = results
            .iter()
            .filter(|r| matches!(r, Err(LedgerError::InsufficientStock { .. })))
            .count();

        assert_eq!(successes, 1);
        assert_eq!(shortfalls, 1);

        let lot = lot.lock().unwrap();
        assert_eq!(lot.snapshot.quantity, dec("4"));
        assert_eq!(lot.movement_sum(), dec("4"));
    }
}

// ============================================================================
// Property-Based Tests
// ============================================================================

fn movement_type_strategy() -> impl Strategy<Value = MovementType> {
    prop_oneof![
        Just(MovementType::In),
        Just(MovementType::Out),
        Just(MovementType::Adjustment),
    ]
}

fn delta_strategy() -> impl Strategy<Value = Decimal> {
    (-50_000i64..50_000i64).prop_map(|cents| Decimal::new(cents, 2))
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    /// Quantity never goes negative and always equals the movement sum;
    /// rejected movements leave no trace.
    #[test]
    fn prop_quantity_matches_movements(
        ops in prop::collection::vec((delta_strategy(), movement_type_strategy()), 1..60)
    ) {
        let mut lot = SimLot::new(date(2024, 1, 1));

        for (delta, kind) in ops {
            let before = lot.clone();
            match lot.apply(delta, kind) {
                Ok(()) => {
                    prop_assert!(lot.snapshot.quantity >= Decimal::ZERO);
                    prop_assert_eq!(lot.movements.len(), before.movements.len() + 1);
                }
                Err(_) => {
                    prop_assert_eq!(lot.snapshot, before.snapshot);
                    prop_assert_eq!(lot.movements.len(), before.movements.len());
                }
            }
            prop_assert_eq!(lot.movement_sum(), lot.snapshot.quantity);
        }
    }

    /// Dispatches finer than the stored four decimal places are refused
    /// before they can touch the lot
    #[test]
    fn prop_excess_precision_dispatch_rejected(
        stock in 1i64..1_000_000,
        requested in 1i64..100_000_000,
    ) {
        let requested = Decimal::new(requested, 5);
        prop_assume!(requested.normalize().scale() > 4);

        let mut lot = SimLot::new(date(2024, 1, 1));
        lot.apply(Decimal::new(stock, 4), MovementType::In).unwrap();
        let before = lot.clone();

        let rejected = matches!(
            lot.dispatch(requested, date(2024, 1, 2)),
            Err(LedgerError::Invalid { field: "quantity", .. })
        );
        prop_assert!(rejected);
        prop_assert_eq!(lot.snapshot, before.snapshot);
        prop_assert_eq!(lot.movement_sum(), lot.snapshot.quantity);
    }

    /// Status is AVAILABLE exactly when there is stock
    #[test]
    fn prop_status_follows_quantity(
        ops in prop::collection::vec((delta_strategy(), movement_type_strategy()), 1..40)
    ) {
        let mut lot = SimLot::new(date(2024, 1, 1));
        for (delta, kind) in ops {
            if lot.apply(delta, kind).is_ok() {
                let expected = if lot.snapshot.quantity > Decimal::ZERO {
                    LotStatus::Available
                } else {
                    LotStatus::Exhausted
                };
                prop_assert_eq!(lot.snapshot.status, expected);
            }
        }
    }

    /// A dispatch either succeeds fully or is rejected for insufficient stock
    #[test]
    fn prop_dispatch_is_all_or_nothing(
        stock in 0i64..1_000,
        requested in 1i64..1_500,
    ) {
        let mut lot = SimLot::new(date(2024, 1, 1));
        if stock > 0 {
            lot.apply(Decimal::from(stock), MovementType::In).unwrap();
        }
        let before = lot.clone();

        match lot.dispatch(Decimal::from(requested), date(2024, 1, 2)) {
            Ok(()) => {
                prop_assert!(requested <= stock);
                prop_assert_eq!(lot.snapshot.quantity, Decimal::from(stock - requested));
            }
            Err(LedgerError::InsufficientStock { available, requested: r }) => {
                prop_assert!(requested > stock);
                prop_assert_eq!(available, Decimal::from(stock));
                prop_assert_eq!(r, Decimal::from(requested));
                prop_assert_eq!(lot.movements.len(), before.movements.len());
            }
            Err(other) => prop_assert!(false, "unexpected error {:?}", other),
        }
    }

    /// Retirement always leaves zero stock and a consistent ledger
    #[test]
    fn prop_retirement_zeroes_stock(stock in 0i64..10_000) {
        let mut lot = SimLot::new(date(2024, 1, 1));
        if stock > 0 {
            lot.apply(Decimal::new(stock, 1), MovementType::In).unwrap();
        }
        lot.retire("inventory count mismatch").unwrap();

        prop_assert_eq!(lot.snapshot.status, LotStatus::Retired);
        prop_assert_eq!(lot.snapshot.quantity, Decimal::ZERO);
        prop_assert_eq!(lot.movement_sum(), Decimal::ZERO);
    }
}
