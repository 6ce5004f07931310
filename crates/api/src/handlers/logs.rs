//! Handlers for the activity log.

use axum::extract::rejection::QueryRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use torrentforge_core::activity::LogEntry;

use crate::error::AppResult;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct LogsQuery {
    /// Only entries with a greater sequence id are returned.
    pub after: Option<u64>,
}

/// GET /api/logs?after=<id>
pub async fn list_logs(
    State(state): State<AppState>,
    query: Result<Query<LogsQuery>, QueryRejection>,
) -> AppResult<Json<Vec<LogEntry>>> {
    let Query(query) = query?;
    Ok(Json(state.activity.since(query.after).await))
}

/// DELETE /api/logs
pub async fn clear_logs(State(state): State<AppState>) -> StatusCode {
    state.activity.clear().await;
    StatusCode::NO_CONTENT
}
