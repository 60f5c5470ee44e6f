//! Stock arithmetic and lot lifecycle rules
//!
//! Every function here is pure: the backend loads the locked lot row,
//! asks this module what the outcome of an operation is, and only then
//! writes. Keeping the decisions here lets them be tested without a
//! database.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use thiserror::Error;

use crate::models::{LotStatus, MovementType};

/// Largest quantity difference still treated as the same registration
pub const DUPLICATE_QUANTITY_TOLERANCE: Decimal = Decimal::from_parts(1, 0, 0, false, 2);

/// Decimal places a stored quantity keeps; matches the NUMERIC columns
pub const QUANTITY_SCALE: u32 = 4;

/// Reject quantities the store would have to round.
///
/// Trailing zeros are ignored, so `1.50000` is accepted.
pub fn check_quantity_scale(field: &'static str, quantity: Decimal) -> Result<(), LedgerError> {
    if quantity.normalize().scale() > QUANTITY_SCALE {
        return Err(LedgerError::invalid(
            field,
            format!("{field} allows at most {QUANTITY_SCALE} decimal places"),
        ));
    }
    Ok(())
}

/// Rule violations detected before anything is written
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LedgerError {
    #[error("{field}: {message}")]
    Invalid { field: &'static str, message: String },

    #[error("insufficient stock: requested {requested}, available {available}")]
    InsufficientStock { available: Decimal, requested: Decimal },

    #[error("dispatch date {dispatch_date} is before production date {production_date}")]
    Chronology {
        production_date: NaiveDate,
        dispatch_date: NaiveDate,
    },

    #[error("cannot {action} a lot that is {status}")]
    InvalidTransition {
        status: LotStatus,
        action: &'static str,
    },
}

impl LedgerError {
    pub fn invalid(field: &'static str, message: impl Into<String>) -> Self {
        LedgerError::Invalid {
            field,
            message: message.into(),
        }
    }
}

/// Quantity and status of a lot as read under its row lock
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StockSnapshot {
    pub quantity: Decimal,
    pub status: LotStatus,
}

/// Outcome of applying one movement to a snapshot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MovementPlan {
    pub change: Decimal,
    pub new_quantity: Decimal,
    pub new_status: LotStatus,
}

/// Decide the effect of a signed `delta` of the given type.
///
/// Rejects a zero delta or one whose sign contradicts the movement type,
/// and any change that would leave the lot below zero.
pub fn plan_movement(
    current: StockSnapshot,
    delta: Decimal,
    movement_type: MovementType,
) -> Result<MovementPlan, LedgerError> {
    if delta.is_zero() {
        return Err(LedgerError::invalid("delta", "movement quantity cannot be zero"));
    }
    check_quantity_scale("delta", delta)?;
    if !movement_type.accepts(delta) {
        let expected = match movement_type {
            MovementType::In => "positive",
            _ => "negative",
        };
        return Err(LedgerError::invalid(
            "delta",
            format!("{movement_type} movements must be {expected}"),
        ));
    }

    let new_quantity = current.quantity + delta;
    if new_quantity < Decimal::ZERO {
        return Err(LedgerError::InsufficientStock {
            available: current.quantity,
            requested: -delta,
        });
    }

    Ok(MovementPlan {
        change: delta,
        new_quantity,
        new_status: current.status.after_quantity_change(new_quantity),
    })
}

/// Validate a shipment request against the locked lot.
///
/// The chronology guard runs first so a predated dispatch is always
/// reported as such, whatever the stock level.
pub fn check_dispatch(
    available: Decimal,
    production_date: NaiveDate,
    requested: Decimal,
    dispatch_date: NaiveDate,
) -> Result<(), LedgerError> {
    if requested <= Decimal::ZERO {
        return Err(LedgerError::invalid(
            "quantity",
            "dispatch quantity must be greater than zero",
        ));
    }
    check_quantity_scale("quantity", requested)?;
    if dispatch_date < production_date {
        return Err(LedgerError::Chronology {
            production_date,
            dispatch_date,
        });
    }
    if requested > available {
        return Err(LedgerError::InsufficientStock {
            available,
            requested,
        });
    }
    Ok(())
}

/// What retiring a lot involves
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RetirementPlan {
    /// Negative adjustment that zeroes the stock, if there is any stock
    pub compensating_delta: Option<Decimal>,
    pub reason: String,
}

pub fn plan_retirement(current: StockSnapshot, reason: &str) -> Result<RetirementPlan, LedgerError> {
    let reason = reason.trim();
    if reason.is_empty() {
        return Err(LedgerError::invalid("reason", "a retirement reason is required"));
    }
    if current.status == LotStatus::Retired {
        return Err(LedgerError::InvalidTransition {
            status: current.status,
            action: "retire",
        });
    }

    let compensating_delta = (current.quantity > Decimal::ZERO).then(|| -current.quantity);
    Ok(RetirementPlan {
        compensating_delta,
        reason: reason.to_string(),
    })
}

/// Only retired lots can be recovered, and the recovery must be explained.
pub fn check_recovery(status: LotStatus, note: &str) -> Result<(), LedgerError> {
    if status != LotStatus::Retired {
        return Err(LedgerError::InvalidTransition {
            status,
            action: "recover",
        });
    }
    if note.trim().is_empty() {
        return Err(LedgerError::invalid("note", "a recovery note is required"));
    }
    Ok(())
}

/// Notes after appending a dated recovery entry.
pub fn recovery_notes(existing: Option<&str>, note: &str, on: NaiveDate) -> String {
    let entry = format!("[recovered {on}] {}", note.trim());
    match existing.map(str::trim).filter(|s| !s.is_empty()) {
        Some(previous) => format!("{previous}\n{entry}"),
        None => entry,
    }
}

pub fn production_reference(lot_number: &str) -> String {
    format!("production: lot {lot_number}")
}

pub fn retirement_reference(reason: &str) -> String {
    format!("manual retirement: {}", reason.trim())
}

/// How a registration relates to an active lot with the same number
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resubmission {
    /// Same SKU and quantity: a repeated submission of the same lot
    Duplicate,
    /// Different SKU or quantity: a genuine conflict
    Conflict,
}

pub fn classify_resubmission(
    existing_sku: &str,
    existing_quantity: Decimal,
    sku: &str,
    quantity: Decimal,
) -> Resubmission {
    let same_sku = existing_sku.trim() == sku.trim();
    let same_quantity = (existing_quantity - quantity).abs() <= DUPLICATE_QUANTITY_TOLERANCE;
    if same_sku && same_quantity {
        Resubmission::Duplicate
    } else {
        Resubmission::Conflict
    }
}
