pub mod artifacts;
pub mod browse;
pub mod config;
pub mod health;
pub mod library;
pub mod logs;
pub mod tasks;

use axum::http::Uri;
use axum::Router;
use torrentforge_core::error::CoreError;

use crate::error::AppError;
use crate::state::AppState;

/// Build the `/api` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /config                      get, merge-update (POST)
///
/// /scan/{category}             scan the category root (POST)
/// /library/{category}          last scan result
///
/// /tasks                       list, create
/// /tasks/clear                 remove finished tasks (GET or POST)
/// /tasks/{id}                  get
/// /tasks/{id}/retry            reset to running (POST)
/// /tasks/{id}/cancel           cancel, killing the build in flight (POST)
/// /tasks/{id}/delete           remove (POST)
///
/// /logs                        entries after a cursor, clear (DELETE)
///
/// /artifacts                   list per category
/// /artifacts/download          stream one file
/// /artifacts/delete            remove one file (POST)
///
/// /drives                      directory picker roots
/// /browse                      immediate subdirectories
/// ```
///
/// Unknown `/api` paths answer with a JSON 404 rather than the frontend.
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/config", config::router())
        .merge(library::router())
        .nest("/tasks", tasks::router())
        .nest("/logs", logs::router())
        .nest("/artifacts", artifacts::router())
        .merge(browse::router())
        .fallback(api_not_found)
}

async fn api_not_found(uri: Uri) -> AppError {
    AppError::Core(CoreError::NotFound {
        entity: "Route",
        id: uri.path().to_string(),
    })
}
