//! HTTP handlers for clients

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::Client;

use crate::error::AppResult;
use crate::services::client::{CreateClientInput, UpdateClientInput};
use crate::services::ClientService;
use crate::AppState;

#[derive(Deserialize)]
pub struct ListClientsQuery {
    #[serde(default)]
    pub active_only: bool,
}

#[derive(Deserialize)]
pub struct SetActiveRequest {
    pub is_active: bool,
}

pub async fn list_clients(
    State(state): State<AppState>,
    Query(query): Query<ListClientsQuery>,
) -> AppResult<Json<Vec<Client>>> {
    let service = ClientService::new(state.db);
    Ok(Json(service.list_clients(query.active_only).await?))
}

pub async fn create_client(
    State(state): State<AppState>,
    Json(input): Json<CreateClientInput>,
) -> AppResult<(StatusCode, Json<Client>)> {
    let service = ClientService::new(state.db);
    let client = service.create_client(input).await?;
    Ok((StatusCode::CREATED, Json(client)))
}

pub async fn update_client(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(input): Json<UpdateClientInput>,
) -> AppResult<Json<Client>> {
    let service = ClientService::new(state.db);
    Ok(Json(service.update_client(client_id, input).await?))
}

pub async fn set_client_active(
    State(state): State<AppState>,
    Path(client_id): Path<Uuid>,
    Json(body): Json<SetActiveRequest>,
) -> AppResult<Json<Client>> {
    let service = ClientService::new(state.db);
    Ok(Json(service.set_client_active(client_id, body.is_active).await?))
}
