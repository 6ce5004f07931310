//! Directory picker handlers.

use std::path::PathBuf;

use axum::extract::rejection::QueryRejection;
use axum::extract::Query;
use axum::Json;
use serde::Deserialize;
use torrentforge_core::browse::{self, BrowseListing, DirEntry};
use torrentforge_core::error::CoreError;

use crate::error::{AppError, AppResult};

#[derive(Debug, Deserialize)]
pub struct BrowseQuery {
    pub path: Option<PathBuf>,
}

/// GET /api/drives
pub async fn list_drives() -> AppResult<Json<Vec<DirEntry>>> {
    let drives = tokio::task::spawn_blocking(browse::list_drives)
        .await
        .map_err(|e| CoreError::Internal(format!("directory listing task failed: {e}")))?;
    Ok(Json(drives))
}

/// GET /api/browse?path=<dir>
///
/// Without `path`, lists the first drive root. Relative paths are rejected.
pub async fn browse_dir(
    query: Result<Query<BrowseQuery>, QueryRejection>,
) -> AppResult<Json<BrowseListing>> {
    let Query(query) = query?;
    let path = match query.path.filter(|p| !p.as_os_str().is_empty()) {
        Some(p) if !p.is_absolute() => {
            return Err(AppError::BadRequest("path must be absolute".into()));
        }
        Some(p) => p,
        None => browse::list_drives()
            .into_iter()
            .next()
            .map(|d| d.path)
            .unwrap_or_else(|| PathBuf::from("/")),
    };

    let listing = tokio::task::spawn_blocking(move || browse::browse(&path))
        .await
        .map_err(|e| CoreError::Internal(format!("directory listing task failed: {e}")))?;
    Ok(Json(listing))
}
