//! Route definitions for the `/config` resource.

use axum::routing::get;
use axum::Router;

use crate::handlers::config;
use crate::state::AppState;

/// Routes mounted at `/config`.
///
/// ```text
/// GET    /                -> get_config
/// POST   /                -> update_config
/// ```
pub fn router() -> Router<AppState> {
    Router::new().route("/", get(config::get_config).post(config::update_config))
}
