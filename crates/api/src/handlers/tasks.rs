//! Handlers for the `/tasks` resource.
//!
//! Handlers only touch the Task Store and the processor's [`JobControl`];
//! building happens in the background processor.
//!
//! [`JobControl`]: crate::engine::control::JobControl

use std::path::{Component, Path as FsPath};

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde::{Deserialize, Serialize};
use torrentforge_core::error::CoreError;
use torrentforge_core::task::{NewTask, Task};
use torrentforge_core::types::TaskId;

use super::parse_category;
use crate::error::{AppError, AppResult};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct CreateTasksRequest {
    #[serde(alias = "type")]
    pub category: String,
    #[serde(default, alias = "tasks")]
    pub items: Vec<CreateTaskItem>,
}

#[derive(Debug, Deserialize)]
pub struct CreateTaskItem {
    /// Directory or file name under the category root.
    pub name: String,
    #[serde(default, alias = "lang_tag")]
    pub language_tag: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct CreatedTasks {
    pub ids: Vec<TaskId>,
}

#[derive(Debug, Serialize)]
pub struct ClearedTasks {
    pub removed: usize,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A name must be exactly one normal path component so the source stays
/// under the category root.
fn validate_name(name: &str) -> AppResult<&str> {
    let name = name.trim();
    let mut components = FsPath::new(name).components();
    match (components.next(), components.next()) {
        (Some(Component::Normal(_)), None) => Ok(name),
        _ => Err(AppError::BadRequest(format!("Invalid item name: {name:?}"))),
    }
}

// ---------------------------------------------------------------------------
// Create
// ---------------------------------------------------------------------------

/// POST /api/tasks
///
/// Enqueues one task per item, already runnable. Returns 201 with the new
/// ids in item order and wakes the processor.
pub async fn create_tasks(
    State(state): State<AppState>,
    payload: Result<Json<CreateTasksRequest>, JsonRejection>,
) -> AppResult<impl IntoResponse> {
    let Json(input) = payload?;
    let category = parse_category(&input.category)?;
    if input.items.is_empty() {
        return Err(AppError::BadRequest("items must not be empty".into()));
    }

    let config = state.settings.get().await;
    let root = config.root_for(category);
    let new_tasks = input
        .items
        .iter()
        .map(|item| -> AppResult<NewTask> {
            let name = validate_name(&item.name)?;
            let language_tag = item
                .language_tag
                .as_deref()
                .map(str::trim)
                .filter(|t| !t.is_empty())
                .unwrap_or_else(|| config.default_language());
            Ok(NewTask {
                name: name.to_string(),
                source_path: root.join(name),
                category,
                language_tag: language_tag.to_string(),
            })
        })
        .collect::<AppResult<Vec<_>>>()?;

    let ids = state.tasks.add_many(new_tasks).await?;
    state.control.wake();

    tracing::info!(%category, count = ids.len(), "Tasks queued");
    state
        .activity
        .info(format!("Queued {} {} task(s)", ids.len(), category))
        .await;

    Ok((StatusCode::CREATED, Json(CreatedTasks { ids })))
}

// ---------------------------------------------------------------------------
// Read
// ---------------------------------------------------------------------------

/// GET /api/tasks
pub async fn list_tasks(State(state): State<AppState>) -> Json<Vec<Task>> {
    Json(state.tasks.list().await)
}

/// GET /api/tasks/{id}
pub async fn get_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    Ok(Json(state.tasks.get(&id).await?))
}

// ---------------------------------------------------------------------------
// Lifecycle
// ---------------------------------------------------------------------------

/// POST /api/tasks/{id}/retry
///
/// Resets a finished task to running with progress 0. 409 while the task
/// is being processed, or while a cancelled build of it is still stopping.
pub async fn retry_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    state.tasks.get(&id).await?;
    if state.control.is_in_flight(&id).await {
        return Err(CoreError::Conflict(format!("Task {id} is still stopping")).into());
    }
    let task = state.tasks.retry(&id).await?;
    state.control.wake();
    tracing::info!(task_id = %task.id, "Task retried");
    state.activity.info(format!("Retrying {}", task.name)).await;
    Ok(Json(task))
}

/// POST /api/tasks/{id}/cancel
///
/// Marks a running task as cancelled and kills its build if one is in
/// flight. 409 when the task is already finished.
pub async fn cancel_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let task = state.tasks.cancel(&id).await?;
    let aborted = state.control.cancel(&id).await;
    tracing::info!(task_id = %task.id, aborted, "Task cancelled");
    if !aborted {
        state.activity.warning(format!("Cancelled {}", task.name)).await;
    }
    Ok(Json(task))
}

/// POST /api/tasks/{id}/delete
pub async fn delete_task(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<Task>> {
    let task = state.tasks.delete(&id).await?;
    state.control.cancel(&id).await;
    tracing::info!(task_id = %task.id, "Task deleted");
    state.activity.info(format!("Removed {}", task.name)).await;
    Ok(Json(task))
}

/// GET|POST /api/tasks/clear
///
/// Removes every completed or cancelled task; running ones are kept.
pub async fn clear_tasks(State(state): State<AppState>) -> AppResult<Json<ClearedTasks>> {
    let removed = state.tasks.clear_finished().await?;
    if removed > 0 {
        tracing::info!(removed, "Finished tasks cleared");
        state
            .activity
            .info(format!("Cleared {removed} finished task(s)"))
            .await;
    }
    Ok(Json(ClearedTasks { removed }))
}
