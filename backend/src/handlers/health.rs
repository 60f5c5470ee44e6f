//! Liveness and database readiness

use axum::{extract::State, http::StatusCode, Json};
use serde::Serialize;

use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub database: &'static str,
    /// Idle connections in the pool at the time of the check
    pub idle_connections: usize,
    pub lock_timeout_ms: u64,
}

/// Report whether the ledger can reach its database.
///
/// Answers 503 when the `lots` table cannot be queried.
pub async fn health_check(State(state): State<AppState>) -> (StatusCode, Json<HealthResponse>) {
    let reachable = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM lots WHERE false")
        .fetch_one(&state.db)
        .await;

    let (code, status, database) = match reachable {
        Ok(_) => (StatusCode::OK, "healthy", "connected"),
        Err(err) => {
            tracing::warn!(error = %err, "health check could not reach the ledger tables");
            (StatusCode::SERVICE_UNAVAILABLE, "degraded", "unavailable")
        }
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
            database,
            idle_connections: state.db.num_idle(),
            lock_timeout_ms: state.config.ledger.lock_timeout_ms,
        }),
    )
}
