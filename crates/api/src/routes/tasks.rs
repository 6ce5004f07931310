//! Route definitions for the `/tasks` resource.

use axum::routing::{get, post};
use axum::Router;

use crate::handlers::tasks;
use crate::state::AppState;

/// Routes mounted at `/tasks`.
///
/// ```text
/// GET    /                -> list_tasks
/// POST   /                -> create_tasks
/// GET    /clear           -> clear_tasks
/// POST   /clear           -> clear_tasks
/// GET    /{id}            -> get_task
/// POST   /{id}/retry      -> retry_task
/// POST   /{id}/cancel     -> cancel_task
/// POST   /{id}/delete     -> delete_task
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(tasks::list_tasks).post(tasks::create_tasks))
        .route("/clear", get(tasks::clear_tasks).post(tasks::clear_tasks))
        .route("/{id}", get(tasks::get_task))
        .route("/{id}/retry", post(tasks::retry_task))
        .route("/{id}/cancel", post(tasks::cancel_task))
        .route("/{id}/delete", post(tasks::delete_task))
}
