//! Reporting service: read-only queries over the ledger
//! Production by date, dispatches by date and lot-number ranges

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use shared::{select_lot_range, DateRange, DispatchView, LotNumberRange, LotStatus, LotView};

use crate::db::contains_pattern;
use crate::error::{AppError, AppResult};
use crate::services::dispatch::DISPATCH_VIEW_SELECT;
use crate::services::lot::LOT_VIEW_SELECT;

/// Reporting service
#[derive(Clone)]
pub struct ReportingService {
    db: PgPool,
}

/// Production report entry
#[derive(Debug, Serialize, sqlx::FromRow)]
pub struct ProductionReportRow {
    pub lot_id: Uuid,
    pub lot_number: String,
    pub sku: String,
    pub product_name: String,
    pub unit: Option<String>,
    pub production_date: NaiveDate,
    pub quality: Option<String>,
    pub piece_count: Option<i32>,
    pub initial_quantity: Decimal,
    pub quantity: Decimal,
    pub status: LotStatus,
}

#[derive(Debug, Deserialize)]
pub struct ProductionReportFilter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    /// SKU or product name, case-insensitive
    pub product: Option<String>,
    pub quality: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct DispatchReportFilter {
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
    pub client_id: Option<Uuid>,
    /// SKU or product name, case-insensitive
    pub product: Option<String>,
    /// Substring of the transport guide
    pub guide: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LotRangeFilter {
    pub lot_from: i64,
    pub lot_to: i64,
    #[serde(default)]
    pub include_retired: bool,
    pub product: Option<String>,
}

fn optional_filter(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn date_range(start: NaiveDate, end: NaiveDate) -> AppResult<DateRange> {
    DateRange::new(start, end).map_err(|m| AppError::invalid("end_date", m))
}

impl ReportingService {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }

    /// Lots produced within the date range, in production order
    pub async fn production_report(
        &self,
        filter: ProductionReportFilter,
    ) -> AppResult<Vec<ProductionReportRow>> {
        let range = date_range(filter.start_date, filter.end_date)?;

        let rows = sqlx::query_as::<_, ProductionReportRow>(
            r#"
            SELECT l.id AS lot_id, l.lot_number, p.sku, p.name AS product_name, p.unit,
                   l.production_date, l.quality, l.piece_count, l.initial_quantity,
                   l.quantity, l.status
            FROM lots l
            JOIN products p ON p.id = l.product_id
            WHERE l.production_date BETWEEN $1 AND $2
              AND ($3::text IS NULL OR lower(p.sku) = lower($3) OR lower(p.name) = lower($3))
              AND ($4::text IS NULL OR lower(l.quality) = lower($4))
            ORDER BY l.production_date, l.lot_number
            "#,
        )
        .bind(range.start)
        .bind(range.end)
        .bind(optional_filter(&filter.product))
        .bind(optional_filter(&filter.quality))
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Dispatches within the date range with lot, product and client details
    pub async fn dispatch_report(&self, filter: DispatchReportFilter) -> AppResult<Vec<DispatchView>> {
        let range = date_range(filter.start_date, filter.end_date)?;
        let guide = optional_filter(&filter.guide).map(contains_pattern);

        let rows = sqlx::query_as::<_, DispatchView>(&format!(
            r#"
            {}
            WHERE d.dispatch_date BETWEEN $1 AND $2
              AND ($3::uuid IS NULL OR d.client_id = $3)
              AND ($4::text IS NULL OR lower(p.sku) = lower($4) OR lower(p.name) = lower($4))
              AND ($5::text IS NULL OR d.transport_guide ILIKE $5)
            ORDER BY d.dispatch_date, d.seq
            "#,
            DISPATCH_VIEW_SELECT
        ))
        .bind(range.start)
        .bind(range.end)
        .bind(filter.client_id)
        .bind(optional_filter(&filter.product))
        .bind(guide)
        .fetch_all(&self.db)
        .await?;

        Ok(rows)
    }

    /// Lots whose numeric lot number falls in `[lot_from, lot_to]`,
    /// ascending. Non-numeric lot numbers never match.
    pub async fn lot_range_report(&self, filter: LotRangeFilter) -> AppResult<Vec<LotView>> {
        let range = LotNumberRange::new(filter.lot_from, filter.lot_to)
            .map_err(|m| AppError::invalid("lot_to", m))?;

        let candidates = sqlx::query_as::<_, LotView>(&format!(
            r#"
            {}
            WHERE l.lot_number ~ '^[[:space:]]*[0-9]+[[:space:]]*$'
              AND ($1 OR (l.status <> 'retired' AND l.quantity > 0))
              AND ($2::text IS NULL OR lower(p.sku) = lower($2) OR lower(p.name) = lower($2))
            "#,
            LOT_VIEW_SELECT
        ))
        .bind(filter.include_retired)
        .bind(optional_filter(&filter.product))
        .fetch_all(&self.db)
        .await?;

        let lots = select_lot_range(candidates, range.from, range.to, |lot| lot.lot_number.as_str());

        Ok(lots.into_iter().map(LotView::with_packages).collect())
    }
}
