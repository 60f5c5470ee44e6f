//! Stock mutation engine
//!
//! The only code that writes `lots.quantity`. Callers pass the connection
//! of a transaction they opened with [`crate::db::begin_ledger_tx`]; the
//! lot row stays locked from the read in [`lock_lot`] until that
//! transaction ends, so concurrent writers are serialized per lot.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use sqlx::{FromRow, PgConnection};
use uuid::Uuid;

use shared::{plan_movement, LotStatus, Movement, MovementType, StockSnapshot};

use crate::error::{AppError, AppResult};

/// A lot row read under `FOR UPDATE`
#[derive(Debug, Clone, FromRow)]
pub struct LockedLot {
    pub id: Uuid,
    pub sku: String,
    pub lot_number: String,
    pub initial_quantity: Decimal,
    pub quantity: Decimal,
    pub status: LotStatus,
    pub production_date: NaiveDate,
    pub notes: Option<String>,
}

impl LockedLot {
    pub fn snapshot(&self) -> StockSnapshot {
        StockSnapshot {
            quantity: self.quantity,
            status: self.status,
        }
    }
}

/// Lock a lot row for the rest of the transaction.
pub async fn lock_lot(conn: &mut PgConnection, lot_id: Uuid) -> AppResult<LockedLot> {
    sqlx::query_as::<_, LockedLot>(
        r#"
        SELECT l.id, p.sku, l.lot_number, l.initial_quantity, l.quantity, l.status,
               l.production_date, l.notes
        FROM lots l
        JOIN products p ON p.id = l.product_id
        WHERE l.id = $1
        FOR UPDATE OF l
        "#,
    )
    .bind(lot_id)
    .fetch_optional(conn)
    .await?
    .ok_or_else(|| AppError::NotFound("Lot".to_string()))
}

/// Apply a signed quantity change to a lot and record it as a movement.
///
/// Fails without writing anything when the change would leave the lot
/// below zero or its sign contradicts `movement_type`.
pub async fn apply_movement(
    conn: &mut PgConnection,
    lot_id: Uuid,
    delta: Decimal,
    movement_type: MovementType,
    reference: Option<&str>,
    performed_by: Option<Uuid>,
) -> AppResult<Movement> {
    let lot = lock_lot(&mut *conn, lot_id).await?;
    let plan = plan_movement(lot.snapshot(), delta, movement_type)
        .map_err(|e| AppError::for_lot(lot_id, e))?;

    let movement = sqlx::query_as::<_, Movement>(
        r#"
        INSERT INTO movements (lot_id, product_sku, change_quantity, movement_type, reference, performed_by)
        VALUES ($1, $2, $3, $4, $5, $6)
        RETURNING id, seq, lot_id, product_sku, change_quantity, movement_type, reference,
                  performed_by, occurred_at
        "#,
    )
    .bind(lot_id)
    .bind(&lot.sku)
    .bind(plan.change)
    .bind(movement_type)
    .bind(reference)
    .bind(performed_by)
    .fetch_one(&mut *conn)
    .await?;

    sqlx::query(
        r#"
        UPDATE lots
        SET quantity = $2,
            status = $3,
            retirement_reason = CASE WHEN $3 = 'retired'::lot_status THEN retirement_reason END,
            retired_at = CASE WHEN $3 = 'retired'::lot_status THEN retired_at END,
            updated_at = NOW()
        WHERE id = $1
        "#,
    )
    .bind(lot_id)
    .bind(plan.new_quantity)
    .bind(plan.new_status)
    .execute(&mut *conn)
    .await?;

    tracing::debug!(
        lot_id = %lot_id,
        movement_type = %movement_type,
        change = %plan.change,
        quantity = %plan.new_quantity,
        status = %plan.new_status,
        "movement applied"
    );

    Ok(movement)
}
