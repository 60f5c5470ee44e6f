//! Lot models: the physical production batch that carries stock

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::ProductType;

/// Lifecycle status of a lot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "lot_status", rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LotStatus {
    /// Has (or may receive) stock and can be dispatched from
    Available,
    /// Reached zero through normal outbound movements
    Exhausted,
    /// Administratively withdrawn ("baja"), kept for audit
    Retired,
}

impl LotStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            LotStatus::Available => "available",
            LotStatus::Exhausted => "exhausted",
            LotStatus::Retired => "retired",
        }
    }

    /// Active lots take part in lot-number uniqueness and default listings.
    pub fn is_active(&self) -> bool {
        !matches!(self, LotStatus::Retired)
    }

    /// Status a lot ends up in once its quantity becomes `new_quantity`.
    pub fn after_quantity_change(self, new_quantity: Decimal) -> LotStatus {
        if new_quantity > Decimal::ZERO {
            LotStatus::Available
        } else if self == LotStatus::Retired {
            LotStatus::Retired
        } else {
            LotStatus::Exhausted
        }
    }
}

impl std::fmt::Display for LotStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Measured dimensions of the pieces in a lot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LotDimensions {
    /// Length in meters
    pub length: Option<Decimal>,
    /// Width in meters
    pub width: Option<Decimal>,
    /// Thickness in meters
    pub thickness: Option<Decimal>,
    pub piece_count: Option<i32>,
}

/// Processing the wood went through before it was stored
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProcessingFlags {
    pub dried: bool,
    pub planed: bool,
    pub impregnated: bool,
}

/// A lot joined with its product, as shown in listings and exports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct LotView {
    pub id: Uuid,
    pub product_id: Uuid,
    pub sku: String,
    pub product_name: String,
    pub unit: Option<String>,
    /// Human-assigned lot number, usually numeric
    pub lot_number: String,
    /// Quantity registered at production time; never changes
    pub initial_quantity: Decimal,
    /// Live stock, only ever written by the stock engine
    pub quantity: Decimal,
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub thickness: Option<Decimal>,
    pub piece_count: Option<i32>,
    pub production_date: NaiveDate,
    pub quality: Option<String>,
    pub dried: bool,
    pub planed: bool,
    pub impregnated: bool,
    pub notes: Option<String>,
    pub status: LotStatus,
    pub retirement_reason: Option<String>,
    pub created_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Remaining pieces expressed in shipping packages ("bultos");
    /// absent when the lot has no piece count
    #[cfg_attr(feature = "sqlx", sqlx(skip))]
    #[serde(default)]
    pub packages_available: Option<Decimal>,
}

impl LotView {
    /// Pieces still in stock, pro rata to the remaining quantity.
    pub fn pieces_available(&self) -> Option<Decimal> {
        let pieces = Decimal::from(self.piece_count?);
        if self.initial_quantity <= Decimal::ZERO {
            return None;
        }
        pieces
            .checked_mul(self.quantity)?
            .checked_div(self.initial_quantity)
    }

    /// Fill in the package equivalent of the remaining pieces.
    pub fn with_packages(mut self) -> Self {
        let product_type = ProductType::from_name(&self.product_name);
        self.packages_available = self
            .pieces_available()
            .map(|pieces| product_type.packages_for(pieces));
        self
    }

    pub fn dimensions(&self) -> LotDimensions {
        LotDimensions {
            length: self.length,
            width: self.width,
            thickness: self.thickness,
            piece_count: self.piece_count,
        }
    }
}

/// Numeric value of a lot number, or `None` for non-numeric lot numbers.
///
/// Only plain ASCII digits (surrounding whitespace ignored) are numeric;
/// values such as `"A-1"` or `"-3"` are not.
pub fn numeric_lot_number(lot_number: &str) -> Option<i64> {
    let trimmed = lot_number.trim();
    if trimmed.is_empty() || !trimmed.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    trimmed.parse().ok()
}

/// Keep the items whose lot number falls in `[from, to]`, sorted ascending
/// by numeric value. Non-numeric lot numbers are skipped.
pub fn select_lot_range<T, F>(items: Vec<T>, from: i64, to: i64, lot_number: F) -> Vec<T>
where
    F: Fn(&T) -> &str,
{
    let mut keyed: Vec<(i64, T)> = items
        .into_iter()
        .filter_map(|item| numeric_lot_number(lot_number(&item)).map(|n| (n, item)))
        .filter(|(n, _)| (from..=to).contains(n))
        .collect();
    keyed.sort_by_key(|(n, _)| *n);
    keyed.into_iter().map(|(_, item)| item).collect()
}
