//! Liveness and readiness probes.
//!
//! - `GET /healthz` (alias `GET /healthcheck`): liveness. No dependencies,
//!   never blocks, always `200 {"status":"ok"}`.
//! - `GET /health`: readiness. Pings the user store and answers
//!   `200 {"status":"healthy"}` or `503 {"status":"unhealthy"}`.

use std::sync::Arc;

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
}

/// `GET /healthz` — always returns 200 OK with `{"status":"ok"}`.
///
/// Safe to use as a Docker / Kubernetes liveness probe.
pub async fn healthz() -> impl IntoResponse {
    (StatusCode::OK, Json(HealthStatus { status: "ok" }))
}

/// `GET /health` — 503 when the user store cannot be reached.
pub async fn readiness(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    match state.store.ping().await {
        Ok(()) => (StatusCode::OK, Json(HealthStatus { status: "healthy" })),
        Err(e) => {
            tracing::warn!(error = %e, "readiness check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthStatus { status: "unhealthy" }),
            )
        }
    }
}
