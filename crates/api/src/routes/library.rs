//! Route definitions for library scanning.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::library;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// POST   /scan/{category}     -> scan
/// GET    /library/{category}  -> get_library
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/scan/{category}", post(library::scan))
        .route("/library/{category}", get(library::get_library))
}
