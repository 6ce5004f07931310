use axum::routing::get;
use axum::Router;

use crate::handlers::logs;
use crate::state::AppState;

/// Routes mounted at `/logs`.
///
/// ```text
/// GET    /                -> list_logs
/// DELETE /                -> clear_logs
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(logs::list_logs).delete(logs::clear_logs))
}
