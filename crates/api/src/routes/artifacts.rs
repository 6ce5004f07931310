//! Route definitions for the `/artifacts` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::artifacts;
use crate::state::AppState;

/// Routes mounted at `/artifacts`.
///
/// ```text
/// GET    /                -> list_artifacts
/// GET    /download        -> download_artifact
/// POST   /delete          -> delete_artifact
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(artifacts::list_artifacts))
        .route("/download", get(artifacts::download_artifact))
        .route("/delete", post(artifacts::delete_artifact))
}
