use axum::routing::get;
use axum::Router;

use crate::handlers::browse;
use crate::state::AppState;

/// Routes merged at the API root.
///
/// ```text
/// GET    /drives          -> list_drives
/// GET    /browse          -> browse_dir
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/drives", get(browse::list_drives))
        .route("/browse", get(browse::browse_dir))
}
