//! Validation utilities for lot ledger input

use chrono::NaiveDate;
use rust_decimal::Decimal;

pub const MAX_LOT_NUMBER_LEN: usize = 32;
pub const MAX_SKU_LEN: usize = 64;
pub const MAX_TRANSPORT_GUIDE_LEN: usize = 64;

// ============================================================================
// Ledger Validations
// ============================================================================

/// Validate lot number: non-empty after trimming, bounded length
pub fn validate_lot_number(lot_number: &str) -> Result<(), &'static str> {
    let trimmed = lot_number.trim();
    if trimmed.is_empty() {
        return Err("Lot number is required");
    }
    if trimmed.chars().count() > MAX_LOT_NUMBER_LEN {
        return Err("Lot number must be at most 32 characters");
    }
    Ok(())
}

/// Validate SKU: non-empty, no inner whitespace
pub fn validate_sku(sku: &str) -> Result<(), &'static str> {
    let trimmed = sku.trim();
    if trimmed.is_empty() {
        return Err("SKU is required");
    }
    if trimmed.chars().count() > MAX_SKU_LEN {
        return Err("SKU must be at most 64 characters");
    }
    if trimmed.chars().any(char::is_whitespace) {
        return Err("SKU cannot contain whitespace");
    }
    Ok(())
}

/// Validate transport guide ("guía de despacho") reference
pub fn validate_transport_guide(guide: &str) -> Result<(), &'static str> {
    let trimmed = guide.trim();
    if trimmed.is_empty() {
        return Err("Transport guide is required");
    }
    if trimmed.chars().count() > MAX_TRANSPORT_GUIDE_LEN {
        return Err("Transport guide must be at most 64 characters");
    }
    Ok(())
}

/// Validate a free-text reason (retirement, adjustment, recovery)
pub fn validate_reason(reason: &str) -> Result<(), &'static str> {
    if reason.trim().is_empty() {
        return Err("A reason is required");
    }
    Ok(())
}

/// Validate an explicitly supplied lot quantity
pub fn validate_quantity(quantity: Decimal) -> Result<(), &'static str> {
    if quantity < Decimal::ZERO {
        return Err("Quantity cannot be negative");
    }
    if quantity.normalize().scale() > crate::ledger::QUANTITY_SCALE {
        return Err("Quantity allows at most 4 decimal places");
    }
    Ok(())
}

/// Validate a date range is not reversed
pub fn validate_date_range(start: NaiveDate, end: NaiveDate) -> Result<(), &'static str> {
    if start > end {
        return Err("Start date must not be after end date");
    }
    Ok(())
}

// ============================================================================
// General Validations
// ============================================================================

/// Validate email format (basic check)
pub fn validate_email(email: &str) -> Result<(), &'static str> {
    if email.contains('@') && email.contains('.') && email.len() >= 5 {
        Ok(())
    } else {
        Err("Invalid email format")
    }
}

/// Validate password strength
pub fn validate_password(password: &str) -> Result<(), &'static str> {
    if password.len() < 8 {
        return Err("Password must be at least 8 characters");
    }
    Ok(())
}
