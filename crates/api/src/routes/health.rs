//! Liveness endpoint.

use axum::Json;
use serde::Serialize;

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// GET /health — liveness check; answers `ok` whenever the server is up.
pub async fn check() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}
