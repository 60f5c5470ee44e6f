//! Lot registration
//!
//! Creates a lot together with its initiating production movement.
//! Repeated submissions of the same lot are absorbed and answered with
//! the existing lot id.

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use uuid::Uuid;

use shared::{
    classify_resubmission, production_reference, validate_lot_number, validate_quantity,
    validate_sku, LotDimensions, MovementType, ProcessingFlags, ProductType, Resubmission,
};

use crate::config::LedgerConfig;
use crate::db::{begin_ledger_tx, ACTIVE_LOT_NUMBER_KEY};
use crate::error::{AppError, AppResult};
use crate::services::catalog::{get_or_create_product, ProductInput};
use crate::services::stock;

#[derive(Clone)]
pub struct RegistrationService {
    db: PgPool,
    lock_timeout_ms: u64,
}

/// Registration request as submitted by an operator
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterLotInput {
    pub sku: String,
    /// Product name; known names ("Tablas", "Machihembrado", ...) select a measurement rule
    pub name: String,
    pub unit: Option<String>,
    pub lot_number: String,
    /// Derived from the dimensions when omitted
    pub quantity: Option<Decimal>,
    #[serde(flatten)]
    pub dimensions: LotDimensions,
    pub production_date: Option<NaiveDate>,
    pub quality: Option<String>,
    #[serde(flatten)]
    pub processing: ProcessingFlags,
    pub notes: Option<String>,
}

/// A validated registration with every default resolved
#[derive(Debug, Clone, PartialEq)]
pub struct NewLot {
    pub sku: String,
    pub product_name: String,
    pub unit: Option<String>,
    pub lot_number: String,
    pub quantity: Decimal,
    pub dimensions: LotDimensions,
    pub production_date: NaiveDate,
    pub quality: Option<String>,
    pub processing: ProcessingFlags,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RegistrationOutcome {
    pub lot_id: Uuid,
    /// False when the request repeated an already registered lot
    pub created: bool,
}

#[derive(Debug, FromRow)]
struct ActiveLot {
    id: Uuid,
    sku: String,
    initial_quantity: Decimal,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

impl RegisterLotInput {
    /// Validate the request and fill in defaults.
    pub fn normalize(self, today: NaiveDate) -> AppResult<NewLot> {
        validate_sku(&self.sku).map_err(|m| AppError::invalid("sku", m))?;
        if self.name.trim().is_empty() {
            return Err(AppError::Validation {
                field: "name".to_string(),
                message: "Product name is required".to_string(),
                message_es: "El nombre del producto es obligatorio".to_string(),
            });
        }
        validate_lot_number(&self.lot_number).map_err(|m| AppError::invalid("lot_number", m))?;

        let product_type = ProductType::from_name(&self.name);
        let quantity = match self.quantity {
            Some(q) => {
                validate_quantity(q).map_err(|m| AppError::invalid("quantity", m))?;
                q
            }
            None => product_type.derive_quantity(&self.dimensions)?,
        };

        let unit = non_empty(self.unit)
            .or_else(|| product_type.default_unit().map(str::to_string));

        Ok(NewLot {
            sku: self.sku.trim().to_string(),
            product_name: self.name.trim().to_string(),
            unit,
            lot_number: self.lot_number.trim().to_string(),
            quantity,
            dimensions: self.dimensions,
            production_date: self.production_date.unwrap_or(today),
            quality: non_empty(self.quality),
            processing: self.processing,
            notes: non_empty(self.notes),
        })
    }
}

impl RegistrationService {
    pub fn new(db: PgPool, ledger: &LedgerConfig) -> Self {
        Self {
            db,
            lock_timeout_ms: ledger.lock_timeout_ms,
        }
    }

    /// Register a production lot, or return the existing one when the
    /// request repeats an active lot with the same SKU and quantity.
    pub async fn register_lot(
        &self,
        input: RegisterLotInput,
        performed_by: Option<Uuid>,
    ) -> AppResult<RegistrationOutcome> {
        let lot = input.normalize(Utc::now().date_naive())?;

        if let Some(outcome) = self.find_resubmission(&lot).await? {
            return Ok(outcome);
        }

        match self.insert_lot(&lot, performed_by).await {
            Ok(lot_id) => {
                tracing::info!(
                    lot_id = %lot_id,
                    lot_number = %lot.lot_number,
                    sku = %lot.sku,
                    quantity = %lot.quantity,
                    "lot registered"
                );
                Ok(RegistrationOutcome {
                    lot_id,
                    created: true,
                })
            }
            // A concurrent registration of the same number won the insert
            Err(err) if err.is_constraint(ACTIVE_LOT_NUMBER_KEY) => {
                tracing::debug!(lot_number = %lot.lot_number, "registration raced a concurrent insert");
                self.find_resubmission(&lot).await?.ok_or(err)
            }
            Err(err) => Err(err),
        }
    }

    /// Compare against the active lot holding the same number, if any.
    async fn find_resubmission(&self, lot: &NewLot) -> AppResult<Option<RegistrationOutcome>> {
        let existing = sqlx::query_as::<_, ActiveLot>(
            r#"
            SELECT l.id, p.sku, l.initial_quantity
            FROM lots l
            JOIN products p ON p.id = l.product_id
            WHERE l.lot_number = $1 AND l.status <> 'retired'
            "#,
        )
        .bind(&lot.lot_number)
        .fetch_optional(&self.db)
        .await?;

        let Some(existing) = existing else {
            return Ok(None);
        };

        match classify_resubmission(&existing.sku, existing.initial_quantity, &lot.sku, lot.quantity) {
            Resubmission::Duplicate => {
                tracing::info!(
                    lot_id = %existing.id,
                    lot_number = %lot.lot_number,
                    "duplicate registration absorbed"
                );
                Ok(Some(RegistrationOutcome {
                    lot_id: existing.id,
                    created: false,
                }))
            }
            Resubmission::Conflict => Err(AppError::DuplicateLot {
                lot_number: lot.lot_number.clone(),
                existing_lot_id: existing.id,
            }),
        }
    }

    async fn insert_lot(&self, lot: &NewLot, performed_by: Option<Uuid>) -> AppResult<Uuid> {
        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;

        let product = get_or_create_product(
            &mut *tx,
            &ProductInput {
                sku: lot.sku.clone(),
                name: lot.product_name.clone(),
                unit: lot.unit.clone(),
                quality: lot.quality.clone(),
            },
        )
        .await?;

        let lot_id = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO lots (
                product_id, lot_number, initial_quantity, quantity, length, width, thickness,
                piece_count, production_date, quality, dried, planed, impregnated, notes, created_by
            )
            VALUES ($1, $2, $3, 0, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING id
            "#,
        )
        .bind(product.id)
        .bind(&lot.lot_number)
        .bind(lot.quantity)
        .bind(lot.dimensions.length)
        .bind(lot.dimensions.width)
        .bind(lot.dimensions.thickness)
        .bind(lot.dimensions.piece_count)
        .bind(lot.production_date)
        .bind(&lot.quality)
        .bind(lot.processing.dried)
        .bind(lot.processing.planed)
        .bind(lot.processing.impregnated)
        .bind(&lot.notes)
        .bind(performed_by)
        .fetch_one(&mut *tx)
        .await?;

        if !lot.quantity.is_zero() {
            stock::apply_movement(
                &mut *tx,
                lot_id,
                lot.quantity,
                MovementType::In,
                Some(&production_reference(&lot.lot_number)),
                performed_by,
            )
            .await?;
        }

        tx.commit().await?;

        Ok(lot_id)
    }
}
