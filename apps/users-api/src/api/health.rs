//! Readiness endpoint
//!
//! Liveness (`/health`) comes from `axum_helpers::health_router`.

use axum::{Router, extract::State, response::IntoResponse, routing::get};
use axum_helpers::{HealthCheckFuture, run_health_checks};

use crate::state::AppState;

/// Create a readiness router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ready", get(readiness_check))
        .with_state(state)
}

/// Readiness check - verifies PostgreSQL and the cache backend
async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    let checks: Vec<(&str, HealthCheckFuture)> = vec![
        (
            "database",
            Box::pin(async {
                database::postgres::check_health(&state.db)
                    .await
                    .map_err(|e| e.to_string())
            }),
        ),
        (
            "cache",
            Box::pin(async { state.cache.ping().await.map_err(|e| e.to_string()) }),
        ),
    ];

    run_health_checks(checks).await
}
