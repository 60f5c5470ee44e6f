//! HTTP handlers for lot registration, listing and maintenance

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{LotView, Movement};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::lot::{AdjustStockInput, LotCorrection};
use crate::services::registration::{RegisterLotInput, RegistrationOutcome};
use crate::services::{DispatchService, LotService, RegistrationService};
use crate::AppState;

#[derive(Deserialize)]
pub struct ListLotsQuery {
    #[serde(default)]
    pub include_retired: bool,
}

#[derive(Deserialize)]
pub struct AvailableLotsQuery {
    pub search: Option<String>,
}

#[derive(Deserialize)]
pub struct RetireLotRequest {
    pub reason: String,
}

#[derive(Deserialize)]
pub struct RecoverLotRequest {
    pub note: String,
}

/// Register a lot; 201 when created, 200 when it repeats an existing lot
pub async fn register_lot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(input): Json<RegisterLotInput>,
) -> AppResult<(StatusCode, Json<RegistrationOutcome>)> {
    let service = RegistrationService::new(state.db, &state.config.ledger);
    let outcome = service
        .register_lot(input, current_user.performed_by())
        .await?;
    let status = if outcome.created {
        StatusCode::CREATED
    } else {
        StatusCode::OK
    };
    Ok((status, Json(outcome)))
}

pub async fn list_lots(
    State(state): State<AppState>,
    Query(query): Query<ListLotsQuery>,
) -> AppResult<Json<Vec<LotView>>> {
    let service = LotService::new(state.db, &state.config.ledger);
    Ok(Json(service.list_lots(query.include_retired).await?))
}

pub async fn list_available_lots(
    State(state): State<AppState>,
    Query(query): Query<AvailableLotsQuery>,
) -> AppResult<Json<Vec<LotView>>> {
    let service = LotService::new(state.db, &state.config.ledger);
    let lots = service
        .list_available_for_dispatch(query.search.as_deref())
        .await?;
    Ok(Json(lots))
}

pub async fn get_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<LotView>> {
    let service = LotService::new(state.db, &state.config.ledger);
    Ok(Json(service.get_lot(lot_id).await?))
}

pub async fn update_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
    Json(correction): Json<LotCorrection>,
) -> AppResult<Json<LotView>> {
    let service = LotService::new(state.db, &state.config.ledger);
    Ok(Json(service.update_lot_attributes(lot_id, correction).await?))
}

pub async fn delete_lot(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = LotService::new(state.db, &state.config.ledger);
    service.delete_lot(lot_id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_lot_movements(
    State(state): State<AppState>,
    Path(lot_id): Path<Uuid>,
) -> AppResult<Json<Vec<Movement>>> {
    let service = LotService::new(state.db, &state.config.ledger);
    Ok(Json(service.list_movements(lot_id).await?))
}

pub async fn adjust_lot_stock(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(input): Json<AdjustStockInput>,
) -> AppResult<(StatusCode, Json<Movement>)> {
    let service = LotService::new(state.db, &state.config.ledger);
    let movement = service
        .adjust_stock(lot_id, input, current_user.performed_by())
        .await?;
    Ok((StatusCode::CREATED, Json(movement)))
}

pub async fn retire_lot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(body): Json<RetireLotRequest>,
) -> AppResult<Json<LotView>> {
    let dispatches = DispatchService::new(state.db.clone(), &state.config.ledger);
    dispatches
        .retire_lot(lot_id, &body.reason, current_user.performed_by())
        .await?;

    let lots = LotService::new(state.db, &state.config.ledger);
    Ok(Json(lots.get_lot(lot_id).await?))
}

pub async fn recover_lot(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Path(lot_id): Path<Uuid>,
    Json(body): Json<RecoverLotRequest>,
) -> AppResult<Json<LotView>> {
    let dispatches = DispatchService::new(state.db.clone(), &state.config.ledger);
    dispatches
        .recover_lot(lot_id, &body.note, current_user.performed_by())
        .await?;

    let lots = LotService::new(state.db, &state.config.ledger);
    Ok(Json(lots.get_lot(lot_id).await?))
}
