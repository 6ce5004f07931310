//! Handlers for the `/config` resource.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;
use serde_json::Value;
use torrentforge_core::config::AppConfig;

use crate::error::AppResult;
use crate::state::AppState;

/// GET /api/config
pub async fn get_config(State(state): State<AppState>) -> Json<AppConfig> {
    Json(state.settings.get().await)
}

/// POST /api/config
///
/// Accepts a partial object; given keys replace the current values, the
/// rest are kept. Returns the full resulting configuration.
pub async fn update_config(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> AppResult<Json<AppConfig>> {
    let Json(patch) = payload?;
    let updated = state.settings.update(patch).await?;
    tracing::info!(path = %state.settings.path().display(), "Configuration updated");
    state.activity.info("Configuration saved").await;
    Ok(Json(updated))
}
