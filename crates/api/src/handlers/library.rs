//! Handlers for library scanning.

use axum::extract::{Path, State};
use axum::Json;
use serde::Serialize;
use torrentforge_core::library::{self, LibraryItem};

use super::parse_category;
use crate::error::AppResult;
use crate::state::AppState;

#[derive(Serialize)]
pub struct ScanResponse {
    pub status: &'static str,
    pub items: Vec<LibraryItem>,
}

/// POST /api/scan/{category}
///
/// Enumerates the immediate subdirectories of the category root and caches
/// the result for [`get_library`]. An unreadable root scans as empty.
pub async fn scan(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<ScanResponse>> {
    let category = parse_category(&category)?;
    let config = state.settings.get().await;
    let root = config.root_for(category).to_path_buf();

    let items = library::scan(
        root.clone(),
        config.show_size,
        config.default_language().to_string(),
    )
    .await;

    tracing::info!(%category, root = %root.display(), count = items.len(), "Library scanned");
    state
        .activity
        .info(format!("Scanned {}: {} item(s)", category, items.len()))
        .await;
    state.library.store(category, items.clone()).await;

    Ok(Json(ScanResponse {
        status: "ok",
        items,
    }))
}

/// GET /api/library/{category}
pub async fn get_library(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> AppResult<Json<Vec<LibraryItem>>> {
    let category = parse_category(&category)?;
    Ok(Json(state.library.get(category).await))
}
