//! HTTP handlers for products and predefined measures

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use shared::{PredefinedMeasure, Product};

use crate::error::AppResult;
use crate::services::catalog::{CreateMeasureInput, ProductInput};
use crate::services::CatalogService;
use crate::AppState;

#[derive(Deserialize)]
pub struct MeasureQuery {
    pub product_type: String,
}

pub async fn list_products(State(state): State<AppState>) -> AppResult<Json<Vec<Product>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(service.list_products().await?))
}

/// Get or create a product by SKU
pub async fn upsert_product(
    State(state): State<AppState>,
    Json(input): Json<ProductInput>,
) -> AppResult<Json<Product>> {
    let service = CatalogService::new(state.db);
    Ok(Json(service.get_or_create_product(input).await?))
}

pub async fn list_measures(
    State(state): State<AppState>,
    Query(query): Query<MeasureQuery>,
) -> AppResult<Json<Vec<PredefinedMeasure>>> {
    let service = CatalogService::new(state.db);
    Ok(Json(service.list_measures(&query.product_type).await?))
}

pub async fn create_measure(
    State(state): State<AppState>,
    Json(input): Json<CreateMeasureInput>,
) -> AppResult<(StatusCode, Json<PredefinedMeasure>)> {
    let service = CatalogService::new(state.db);
    let measure = service.create_measure(input).await?;
    Ok((StatusCode::CREATED, Json(measure)))
}

pub async fn retire_measure(
    State(state): State<AppState>,
    Path(measure_id): Path<Uuid>,
) -> AppResult<StatusCode> {
    let service = CatalogService::new(state.db);
    service.retire_measure(measure_id).await?;
    Ok(StatusCode::NO_CONTENT)
}
