//! Dispatch service: shipments, retirement ("baja") and recovery of lots

use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{
    check_dispatch, check_recovery, plan_retirement, recovery_notes, retirement_reference,
    validate_transport_guide, Dispatch, DispatchView, LotStatus, MovementType,
};

use crate::config::LedgerConfig;
use crate::db::{begin_ledger_tx, ACTIVE_LOT_NUMBER_KEY};
use crate::error::{AppError, AppResult};
use crate::services::stock;

#[derive(Clone)]
pub struct DispatchService {
    db: PgPool,
    lock_timeout_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct DispatchRequest {
    pub lot_id: Uuid,
    pub client_id: Uuid,
    pub quantity: Decimal,
    pub dispatch_date: NaiveDate,
    pub transport_guide: String,
    pub notes: Option<String>,
}

/// Joined dispatch columns shared with the dispatch report
pub(crate) const DISPATCH_VIEW_SELECT: &str = r#"
    SELECT d.id, d.lot_id, l.lot_number, p.sku, p.name AS product_name, p.unit,
           d.client_id, c.name AS client_name, d.quantity, d.dispatch_date,
           d.transport_guide, d.notes, d.created_at
    FROM dispatches d
    JOIN lots l ON l.id = d.lot_id
    JOIN products p ON p.id = l.product_id
    JOIN clients c ON c.id = d.client_id
"#;

impl DispatchService {
    pub fn new(db: PgPool, ledger: &LedgerConfig) -> Self {
        Self {
            db,
            lock_timeout_ms: ledger.lock_timeout_ms,
        }
    }

    /// Ship part or all of a lot to a client.
    ///
    /// The dispatch row and its OUT movement commit together; a failed
    /// stock check leaves neither behind.
    pub async fn create_dispatch(
        &self,
        request: DispatchRequest,
        performed_by: Option<Uuid>,
    ) -> AppResult<Dispatch> {
        validate_transport_guide(&request.transport_guide)
            .map_err(|m| AppError::invalid("transport_guide", m))?;
        let guide = request.transport_guide.trim();
        let notes = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|n| !n.is_empty());

        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;

        let lot = stock::lock_lot(&mut *tx, request.lot_id).await?;

        let client_active = sqlx::query_scalar::<_, bool>(
            "SELECT is_active FROM clients WHERE id = $1 FOR SHARE",
        )
        .bind(request.client_id)
        .fetch_optional(&mut *tx)
        .await?
        .ok_or_else(|| AppError::NotFound("Client".to_string()))?;

        if !client_active {
            return Err(AppError::Validation {
                field: "client_id".to_string(),
                message: "Client is inactive and cannot receive dispatches".to_string(),
                message_es: "El cliente está inactivo y no puede recibir despachos".to_string(),
            });
        }

        check_dispatch(
            lot.quantity,
            lot.production_date,
            request.quantity,
            request.dispatch_date,
        )
        .map_err(|e| AppError::for_lot(lot.id, e))?;

        let dispatch = sqlx::query_as::<_, Dispatch>(
            r#"
            INSERT INTO dispatches (lot_id, client_id, quantity, dispatch_date, transport_guide, notes, performed_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING id, seq, lot_id, client_id, quantity, dispatch_date, transport_guide, notes,
                      performed_by, created_at
            "#,
        )
        .bind(lot.id)
        .bind(request.client_id)
        .bind(request.quantity)
        .bind(request.dispatch_date)
        .bind(guide)
        .bind(notes)
        .bind(performed_by)
        .fetch_one(&mut *tx)
        .await?;

        stock::apply_movement(
            &mut *tx,
            lot.id,
            -request.quantity,
            MovementType::Out,
            Some(guide),
            performed_by,
        )
        .await?;

        tx.commit().await?;

        tracing::info!(
            dispatch_id = %dispatch.id,
            lot_id = %lot.id,
            client_id = %request.client_id,
            quantity = %request.quantity,
            transport_guide = %guide,
            "dispatch created"
        );

        Ok(dispatch)
    }

    /// Withdraw a lot from stock for an administrative reason.
    ///
    /// Remaining stock is zeroed with an ADJUSTMENT movement carrying the
    /// reason before the lot is marked retired.
    pub async fn retire_lot(
        &self,
        lot_id: Uuid,
        reason: &str,
        performed_by: Option<Uuid>,
    ) -> AppResult<()> {
        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;

        let lot = stock::lock_lot(&mut *tx, lot_id).await?;
        let plan = plan_retirement(lot.snapshot(), reason)?;

        if let Some(delta) = plan.compensating_delta {
            stock::apply_movement(
                &mut *tx,
                lot_id,
                delta,
                MovementType::Adjustment,
                Some(&retirement_reference(&plan.reason)),
                performed_by,
            )
            .await?;
        }

        sqlx::query(
            r#"
            UPDATE lots
            SET status = $2, retirement_reason = $3, retired_at = NOW(), updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lot_id)
        .bind(LotStatus::Retired)
        .bind(&plan.reason)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;

        tracing::info!(
            lot_id = %lot_id,
            lot_number = %lot.lot_number,
            written_off = %lot.quantity,
            reason = %plan.reason,
            "lot retired"
        );

        Ok(())
    }

    /// Return a retired lot to AVAILABLE without touching its quantity.
    ///
    /// The note is appended to the lot notes with the recovery date.
    pub async fn recover_lot(
        &self,
        lot_id: Uuid,
        note: &str,
        performed_by: Option<Uuid>,
    ) -> AppResult<()> {
        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;

        let lot = stock::lock_lot(&mut *tx, lot_id).await?;
        check_recovery(lot.status, note)?;

        let notes = recovery_notes(lot.notes.as_deref(), note, Utc::now().date_naive());

        let updated = sqlx::query(
            r#"
            UPDATE lots
            SET status = $2, retirement_reason = NULL, retired_at = NULL, notes = $3,
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lot_id)
        .bind(LotStatus::Available)
        .bind(&notes)
        .execute(&mut *tx)
        .await
        .map_err(AppError::from);

        match updated {
            Ok(_) => {}
            // Another active lot took the number while this one was retired
            Err(err) if err.is_constraint(ACTIVE_LOT_NUMBER_KEY) => {
                drop(tx);
                let existing_lot_id = sqlx::query_scalar::<_, Uuid>(
                    "SELECT id FROM lots WHERE lot_number = $1 AND status <> 'retired'",
                )
                .bind(&lot.lot_number)
                .fetch_optional(&self.db)
                .await?;
                return Err(match existing_lot_id {
                    Some(existing_lot_id) => AppError::DuplicateLot {
                        lot_number: lot.lot_number,
                        existing_lot_id,
                    },
                    None => err,
                });
            }
            Err(err) => return Err(err),
        }

        tx.commit().await?;

        tracing::info!(
            lot_id = %lot_id,
            lot_number = %lot.lot_number,
            performed_by = ?performed_by,
            "lot recovered"
        );

        Ok(())
    }

    /// Every dispatch, newest first
    pub async fn list_dispatch_history(&self) -> AppResult<Vec<DispatchView>> {
        let dispatches = sqlx::query_as::<_, DispatchView>(&format!(
            "{} ORDER BY d.dispatch_date DESC, d.seq DESC",
            DISPATCH_VIEW_SELECT
        ))
        .fetch_all(&self.db)
        .await?;

        Ok(dispatches)
    }
}
