//! Product catalog and predefined measures

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::LotDimensions;
use crate::ledger::{LedgerError, QUANTITY_SCALE};

/// A catalog product identified by its SKU
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Product {
    pub id: Uuid,
    pub sku: String,
    pub name: String,
    pub unit: Option<String>,
    pub quality: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// A named set of dimensions offered at registration time for a product type
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct PredefinedMeasure {
    pub id: Uuid,
    /// Insertion order; measures are listed by it
    pub seq: i64,
    pub product_type: String,
    pub name: String,
    pub length: Decimal,
    pub width: Decimal,
    pub thickness: Option<Decimal>,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Product families with their own measurement rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProductType {
    /// "Tablas", measured in cubic meters
    Boards,
    /// "Tablones", measured in cubic meters
    Planks,
    /// "Paletas", measured in cubic meters
    Pallets,
    /// "Machihembrado", measured in square meters
    TongueAndGroove,
    /// Anything else; quantity must be given explicitly
    Other,
}

impl ProductType {
    /// Classify a product by its catalog name (case and surrounding
    /// whitespace are ignored).
    pub fn from_name(name: &str) -> Self {
        match name.trim().to_lowercase().as_str() {
            "tablas" => ProductType::Boards,
            "tablones" => ProductType::Planks,
            "paletas" => ProductType::Pallets,
            "machihembrado" => ProductType::TongueAndGroove,
            _ => ProductType::Other,
        }
    }

    pub fn catalog_name(&self) -> Option<&'static str> {
        match self {
            ProductType::Boards => Some("Tablas"),
            ProductType::Planks => Some("Tablones"),
            ProductType::Pallets => Some("Paletas"),
            ProductType::TongueAndGroove => Some("Machihembrado"),
            ProductType::Other => None,
        }
    }

    pub fn default_unit(&self) -> Option<&'static str> {
        match self {
            ProductType::Boards | ProductType::Planks | ProductType::Pallets => Some("m3"),
            ProductType::TongueAndGroove => Some("m2"),
            ProductType::Other => None,
        }
    }

    /// Pieces that make up one shipping package
    pub fn pieces_per_package(&self) -> u32 {
        match self {
            ProductType::Boards => 30,
            ProductType::Planks => 20,
            ProductType::Pallets => 10,
            ProductType::TongueAndGroove => 5,
            ProductType::Other => 1,
        }
    }

    /// Package count for a number of pieces, rounded to two decimals.
    pub fn packages_for(&self, pieces: Decimal) -> Decimal {
        (pieces / Decimal::from(self.pieces_per_package())).round_dp(2)
    }

    /// Derive the stock quantity of a lot from its dimensions.
    ///
    /// Volume products multiply length, width, thickness and piece count;
    /// tongue-and-groove ignores thickness and yields an area.
    pub fn derive_quantity(&self, dims: &LotDimensions) -> Result<Decimal, LedgerError> {
        if *self == ProductType::Other {
            return Err(LedgerError::invalid(
                "quantity",
                "quantity is required for products without a measurement rule",
            ));
        }

        let pieces = dims
            .piece_count
            .filter(|p| *p > 0)
            .ok_or_else(|| LedgerError::invalid("piece_count", "piece count must be positive"))?;
        let length = positive("length", dims.length)?;
        let width = positive("width", dims.width)?;
        let area = length
            .checked_mul(width)
            .and_then(|a| a.checked_mul(Decimal::from(pieces)))
            .ok_or_else(out_of_range)?;

        let quantity = match self {
            ProductType::TongueAndGroove => area,
            _ => area
                .checked_mul(positive("thickness", dims.thickness)?)
                .ok_or_else(out_of_range)?,
        }
        .round_dp(QUANTITY_SCALE);

        if quantity.is_zero() {
            return Err(LedgerError::invalid(
                "quantity",
                "dimensions are too small to yield a quantity",
            ));
        }
        Ok(quantity)
    }
}

fn out_of_range() -> LedgerError {
    LedgerError::invalid("quantity", "dimensions are too large")
}

fn positive(field: &'static str, value: Option<Decimal>) -> Result<Decimal, LedgerError> {
    match value {
        Some(v) if v > Decimal::ZERO => Ok(v),
        _ => Err(LedgerError::invalid(field, format!("{field} must be positive"))),
    }
}
