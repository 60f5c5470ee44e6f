//! Dispatches: outbound shipments of stock from one lot to one client

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A recorded dispatch
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Dispatch {
    pub id: Uuid,
    pub seq: i64,
    pub lot_id: Uuid,
    pub client_id: Uuid,
    pub quantity: Decimal,
    pub dispatch_date: NaiveDate,
    /// Transport guide number ("guía de despacho")
    pub transport_guide: String,
    pub notes: Option<String>,
    pub performed_by: Option<Uuid>,
    pub created_at: DateTime<Utc>,
}

/// A dispatch joined with lot, product and client, for history and reports
#[derive(Debug, Clone, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct DispatchView {
    pub id: Uuid,
    pub lot_id: Uuid,
    pub lot_number: String,
    pub sku: String,
    pub product_name: String,
    pub unit: Option<String>,
    pub client_id: Uuid,
    pub client_name: String,
    pub quantity: Decimal,
    pub dispatch_date: NaiveDate,
    pub transport_guide: String,
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}
