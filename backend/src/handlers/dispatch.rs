//! HTTP handlers for dispatches

use axum::{extract::State, http::StatusCode, Json};

use shared::{Dispatch, DispatchView};

use crate::error::AppResult;
use crate::middleware::CurrentUser;
use crate::services::dispatch::DispatchRequest;
use crate::services::DispatchService;
use crate::AppState;

pub async fn create_dispatch(
    State(state): State<AppState>,
    current_user: CurrentUser,
    Json(request): Json<DispatchRequest>,
) -> AppResult<(StatusCode, Json<Dispatch>)> {
    let service = DispatchService::new(state.db, &state.config.ledger);
    let dispatch = service
        .create_dispatch(request, current_user.performed_by())
        .await?;
    Ok((StatusCode::CREATED, Json(dispatch)))
}

pub async fn list_dispatch_history(
    State(state): State<AppState>,
) -> AppResult<Json<Vec<DispatchView>>> {
    let service = DispatchService::new(state.db, &state.config.ledger);
    Ok(Json(service.list_dispatch_history().await?))
}
