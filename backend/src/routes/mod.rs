//! Route definitions for the lot ledger API

use axum::{
    middleware,
    routing::{delete, get, patch, post, put},
    Router,
};

use crate::{handlers, middleware::auth_middleware, AppState};

/// Create API routes
pub fn api_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route("/users", post(handlers::create_user))
        .nest("/products", product_routes())
        .nest("/measures", measure_routes())
        .nest("/lots", lot_routes())
        .nest("/dispatches", dispatch_routes())
        .nest("/clients", client_routes())
        .nest("/reports", report_routes())
        .route_layer(middleware::from_fn_with_state(state, auth_middleware));

    Router::new()
        // Health check (public)
        .route("/health", get(handlers::health_check))
        // Auth routes (public)
        .route("/auth/login", post(handlers::login))
        .merge(protected)
}

fn product_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_products).post(handlers::upsert_product),
    )
}

fn measure_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(handlers::list_measures).post(handlers::create_measure),
        )
        .route("/:measure_id", delete(handlers::retire_measure))
}

fn lot_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_lots).post(handlers::register_lot))
        .route("/available", get(handlers::list_available_lots))
        .route(
            "/:lot_id",
            get(handlers::get_lot)
                .patch(handlers::update_lot)
                .delete(handlers::delete_lot),
        )
        .route("/:lot_id/movements", get(handlers::list_lot_movements))
        .route("/:lot_id/adjustments", post(handlers::adjust_lot_stock))
        .route("/:lot_id/retire", post(handlers::retire_lot))
        .route("/:lot_id/recover", post(handlers::recover_lot))
}

fn dispatch_routes() -> Router<AppState> {
    Router::new().route(
        "/",
        get(handlers::list_dispatch_history).post(handlers::create_dispatch),
    )
}

fn client_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(handlers::list_clients).post(handlers::create_client))
        .route("/:client_id", patch(handlers::update_client))
        .route("/:client_id/active", put(handlers::set_client_active))
}

fn report_routes() -> Router<AppState> {
    Router::new()
        .route("/production", get(handlers::production_report))
        .route("/dispatches", get(handlers::dispatch_report))
        .route("/lot-range", get(handlers::lot_range_report))
}
