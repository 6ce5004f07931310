use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::state::AppState;

/// Health check response payload.
#[derive(Serialize)]
pub struct HealthResponse {
    /// `ok`, or `degraded` when the creation tool cannot be found.
    pub status: &'static str,
    /// Crate version from Cargo.toml.
    pub version: &'static str,
    pub builder_available: bool,
    /// Configured name or path of the creation tool.
    pub builder: String,
}

/// GET /health
pub async fn health_check(State(state): State<AppState>) -> Json<HealthResponse> {
    let builder_available = state.builder.is_available();
    let status = if builder_available { "ok" } else { "degraded" };

    Json(HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION"),
        builder_available,
        builder: state.builder.tool().to_string(),
    })
}
