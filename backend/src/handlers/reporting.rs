//! HTTP handlers for reports

use axum::{
    extract::{Query, State},
    Json,
};

use shared::{DispatchView, LotView};

use crate::error::AppResult;
use crate::services::reporting::{
    DispatchReportFilter, LotRangeFilter, ProductionReportFilter, ProductionReportRow,
};
use crate::services::ReportingService;
use crate::AppState;

pub async fn production_report(
    State(state): State<AppState>,
    Query(filter): Query<ProductionReportFilter>,
) -> AppResult<Json<Vec<ProductionReportRow>>> {
    let service = ReportingService::new(state.db);
    Ok(Json(service.production_report(filter).await?))
}

pub async fn dispatch_report(
    State(state): State<AppState>,
    Query(filter): Query<DispatchReportFilter>,
) -> AppResult<Json<Vec<DispatchView>>> {
    let service = ReportingService::new(state.db);
    Ok(Json(service.dispatch_report(filter).await?))
}

pub async fn lot_range_report(
    State(state): State<AppState>,
    Query(filter): Query<LotRangeFilter>,
) -> AppResult<Json<Vec<LotView>>> {
    let service = ReportingService::new(state.db);
    Ok(Json(service.lot_range_report(filter).await?))
}
