//! Stock movements: the append-only audit trail of every quantity change

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of stock movement
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(type_name = "movement_type", rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MovementType {
    /// Production entry, positive
    In,
    /// Dispatch, negative
    Out,
    /// Manual correction or retirement compensation, either sign
    Adjustment,
}

impl MovementType {
    /// Whether a change of `delta` is allowed for this movement type.
    pub fn accepts(&self, delta: Decimal) -> bool {
        match self {
            MovementType::In => delta > Decimal::ZERO,
            MovementType::Out => delta < Decimal::ZERO,
            MovementType::Adjustment => !delta.is_zero(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementType::In => "in",
            MovementType::Out => "out",
            MovementType::Adjustment => "adjustment",
        }
    }
}

impl std::fmt::Display for MovementType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One recorded stock change
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Movement {
    pub id: Uuid,
    /// Global commit order
    pub seq: i64,
    pub lot_id: Uuid,
    pub product_sku: String,
    /// Signed change applied to the lot quantity
    pub change_quantity: Decimal,
    pub movement_type: MovementType,
    /// Free text: transport guide, retirement reason, production marker
    pub reference: Option<String>,
    pub performed_by: Option<Uuid>,
    pub occurred_at: DateTime<Utc>,
}
