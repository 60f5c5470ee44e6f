//! Lot listing and maintenance

use rust_decimal::Decimal;
use serde::Deserialize;
use sqlx::PgPool;
use uuid::Uuid;

use shared::{validate_reason, LotView, Movement, MovementType};

use crate::config::LedgerConfig;
use crate::db::{begin_ledger_tx, contains_pattern};
use crate::error::{AppError, AppResult};
use crate::services::stock;

#[derive(Clone)]
pub struct LotService {
    db: PgPool,
    lock_timeout_ms: u64,
}

/// Correction of a lot's descriptive attributes; absent fields are kept
#[derive(Debug, Clone, Default, Deserialize)]
pub struct LotCorrection {
    pub length: Option<Decimal>,
    pub width: Option<Decimal>,
    pub thickness: Option<Decimal>,
    pub piece_count: Option<i32>,
    pub quality: Option<String>,
    pub dried: Option<bool>,
    pub planed: Option<bool>,
    pub impregnated: Option<bool>,
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AdjustStockInput {
    /// Signed change; negative removes stock
    pub delta: Decimal,
    pub reason: String,
}

/// Joined lot columns shared with the reports
pub(crate) const LOT_VIEW_SELECT: &str = r#"
    SELECT l.id, l.product_id, p.sku, p.name AS product_name, p.unit, l.lot_number,
           l.initial_quantity, l.quantity, l.length, l.width, l.thickness, l.piece_count,
           l.production_date, l.quality, l.dried, l.planed, l.impregnated, l.notes,
           l.status, l.retirement_reason, l.created_by, l.created_at, l.updated_at
    FROM lots l
    JOIN products p ON p.id = l.product_id
"#;

impl LotCorrection {
    pub fn validate(&self) -> AppResult<()> {
        for (field, value) in [
            ("length", self.length),
            ("width", self.width),
            ("thickness", self.thickness),
        ] {
            if matches!(value, Some(v) if v <= Decimal::ZERO) {
                return Err(AppError::invalid(field, "Dimensions must be positive"));
            }
        }
        if matches!(self.piece_count, Some(p) if p <= 0) {
            return Err(AppError::invalid("piece_count", "Piece count must be positive"));
        }
        Ok(())
    }
}

impl LotService {
    pub fn new(db: PgPool, ledger: &LedgerConfig) -> Self {
        Self {
            db,
            lock_timeout_ms: ledger.lock_timeout_ms,
        }
    }

    /// All lots, newest production first; retired lots only on request
    pub async fn list_lots(&self, include_retired: bool) -> AppResult<Vec<LotView>> {
        let lots = sqlx::query_as::<_, LotView>(&format!(
            r#"
            {}
            WHERE $1 OR l.status <> 'retired'
            ORDER BY l.production_date DESC, l.created_at DESC
            "#,
            LOT_VIEW_SELECT
        ))
        .bind(include_retired)
        .fetch_all(&self.db)
        .await?;

        Ok(lots.into_iter().map(LotView::with_packages).collect())
    }

    /// Lots with stock that can be dispatched from, optionally filtered by
    /// a case-insensitive match on product name, SKU or lot number
    pub async fn list_available_for_dispatch(
        &self,
        search: Option<&str>,
    ) -> AppResult<Vec<LotView>> {
        let pattern = search
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(contains_pattern);

        let lots = sqlx::query_as::<_, LotView>(&format!(
            r#"
            {}
            WHERE l.status <> 'retired' AND l.quantity > 0
              AND ($1::text IS NULL
                   OR p.name ILIKE $1 OR p.sku ILIKE $1 OR l.lot_number ILIKE $1)
            ORDER BY l.production_date, l.lot_number
            "#,
            LOT_VIEW_SELECT
        ))
        .bind(pattern)
        .fetch_all(&self.db)
        .await?;

        Ok(lots.into_iter().map(LotView::with_packages).collect())
    }

    pub async fn get_lot(&self, lot_id: Uuid) -> AppResult<LotView> {
        let lot = sqlx::query_as::<_, LotView>(&format!("{} WHERE l.id = $1", LOT_VIEW_SELECT))
            .bind(lot_id)
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(|| AppError::NotFound("Lot".to_string()))?;

        Ok(lot.with_packages())
    }

    /// Movements of a lot in commit order
    pub async fn list_movements(&self, lot_id: Uuid) -> AppResult<Vec<Movement>> {
        self.ensure_exists(lot_id).await?;

        let movements = sqlx::query_as::<_, Movement>(
            r#"
            SELECT id, seq, lot_id, product_sku, change_quantity, movement_type, reference,
                   performed_by, occurred_at
            FROM movements
            WHERE lot_id = $1
            ORDER BY seq
            "#,
        )
        .bind(lot_id)
        .fetch_all(&self.db)
        .await?;

        Ok(movements)
    }

    /// Correct measurements, quality, processing flags or notes.
    /// Quantity, status, SKU, lot number and production date are not editable here.
    pub async fn update_lot_attributes(
        &self,
        lot_id: Uuid,
        correction: LotCorrection,
    ) -> AppResult<LotView> {
        correction.validate()?;

        let result = sqlx::query(
            r#"
            UPDATE lots
            SET length = COALESCE($2, length),
                width = COALESCE($3, width),
                thickness = COALESCE($4, thickness),
                piece_count = COALESCE($5, piece_count),
                quality = COALESCE($6, quality),
                dried = COALESCE($7, dried),
                planed = COALESCE($8, planed),
                impregnated = COALESCE($9, impregnated),
                notes = COALESCE($10, notes),
                updated_at = NOW()
            WHERE id = $1
            "#,
        )
        .bind(lot_id)
        .bind(correction.length)
        .bind(correction.width)
        .bind(correction.thickness)
        .bind(correction.piece_count)
        .bind(&correction.quality)
        .bind(correction.dried)
        .bind(correction.planed)
        .bind(correction.impregnated)
        .bind(&correction.notes)
        .execute(&self.db)
        .await?;

        if result.rows_affected() == 0 {
            return Err(AppError::NotFound("Lot".to_string()));
        }

        tracing::info!(lot_id = %lot_id, "lot attributes corrected");

        self.get_lot(lot_id).await
    }

    /// Manual signed correction of stock, recorded as an ADJUSTMENT
    pub async fn adjust_stock(
        &self,
        lot_id: Uuid,
        input: AdjustStockInput,
        performed_by: Option<Uuid>,
    ) -> AppResult<Movement> {
        validate_reason(&input.reason).map_err(|m| AppError::invalid("reason", m))?;

        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;
        let movement = stock::apply_movement(
            &mut *tx,
            lot_id,
            input.delta,
            MovementType::Adjustment,
            Some(input.reason.trim()),
            performed_by,
        )
        .await?;
        tx.commit().await?;

        tracing::info!(lot_id = %lot_id, delta = %input.delta, "stock adjusted");

        Ok(movement)
    }

    /// Hard delete a lot that never had any stock activity.
    pub async fn delete_lot(&self, lot_id: Uuid) -> AppResult<()> {
        let mut tx = begin_ledger_tx(&self.db, self.lock_timeout_ms).await?;
        let lot = stock::lock_lot(&mut *tx, lot_id).await?;

        let referenced = sqlx::query_scalar::<_, bool>(
            r#"
            SELECT EXISTS(SELECT 1 FROM movements WHERE lot_id = $1)
                OR EXISTS(SELECT 1 FROM dispatches WHERE lot_id = $1)
            "#,
        )
        .bind(lot_id)
        .fetch_one(&mut *tx)
        .await?;

        if referenced {
            return Err(AppError::Integrity {
                constraint: None,
                message: format!(
                    "Lot {} has recorded movements and cannot be deleted; retire it instead",
                    lot.lot_number
                ),
            });
        }

        sqlx::query("DELETE FROM lots WHERE id = $1")
            .bind(lot_id)
            .execute(&mut *tx)
            .await?;
        tx.commit().await?;

        tracing::info!(lot_id = %lot_id, lot_number = %lot.lot_number, "lot deleted");

        Ok(())
    }

    async fn ensure_exists(&self, lot_id: Uuid) -> AppResult<()> {
        let exists = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM lots WHERE id = $1)")
            .bind(lot_id)
            .fetch_one(&self.db)
            .await?;

        if !exists {
            return Err(AppError::NotFound("Lot".to_string()));
        }
        Ok(())
    }
}
