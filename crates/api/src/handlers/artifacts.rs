//! Handlers for produced artifacts.
//!
//! Download and delete go through [`resolve_contained`], so only files
//! inside the two configured output directories are reachable.

use std::path::PathBuf;

use axum::body::Body;
use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{Query, State};
use axum::http::{header, StatusCode};
use axum::response::Response;
use axum::Json;
use serde::{Deserialize, Serialize};
use tokio_util::io::ReaderStream;
use torrentforge_core::artifacts::{self, resolve_contained, ArtifactListing};

use crate::error::{AppError, AppResult};
use crate::state::AppState;

/// MIME type of `.torrent` files.
const ARTIFACT_CONTENT_TYPE: &str = "application/x-bittorrent";

#[derive(Debug, Deserialize)]
pub struct ArtifactPath {
    pub path: PathBuf,
}

#[derive(Debug, Serialize)]
pub struct DeletedArtifact {
    pub deleted: PathBuf,
}

/// GET /api/artifacts
pub async fn list_artifacts(State(state): State<AppState>) -> Json<ArtifactListing> {
    let config = state.settings.get().await;
    Json(ArtifactListing {
        series: artifacts::list_artifacts(&config.series_out).await,
        movies: artifacts::list_artifacts(&config.movies_out).await,
    })
}

/// GET /api/artifacts/download?path=<file>
///
/// Streams the file as an attachment. 403 outside the output directories.
pub async fn download_artifact(
    State(state): State<AppState>,
    query: Result<Query<ArtifactPath>, QueryRejection>,
) -> AppResult<Response> {
    let Query(query) = query?;
    let config = state.settings.get().await;
    let path = resolve_contained(&query.path, &config.output_dirs())?;

    let file = tokio::fs::File::open(&path)
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?;
    let length = file
        .metadata()
        .await
        .map_err(|e| AppError::InternalError(e.to_string()))?
        .len();
    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();

    tracing::debug!(path = %path.display(), length, "Serving artifact");

    Response::builder()
        .status(StatusCode::OK)
        .header(header::CONTENT_TYPE, ARTIFACT_CONTENT_TYPE)
        .header(header::CONTENT_LENGTH, length.to_string())
        .header(header::CONTENT_DISPOSITION, content_disposition(&file_name))
        .body(Body::from_stream(ReaderStream::new(file)))
        .map_err(|e| AppError::InternalError(e.to_string()))
}

/// POST /api/artifacts/delete
///
/// Body: `{"path": "<file>"}`. 403 outside the output directories.
pub async fn delete_artifact(
    State(state): State<AppState>,
    payload: Result<Json<ArtifactPath>, JsonRejection>,
) -> AppResult<Json<DeletedArtifact>> {
    let Json(input) = payload?;
    let config = state.settings.get().await;
    let deleted = artifacts::delete_artifact(&input.path, &config.output_dirs()).await?;

    tracing::info!(path = %deleted.display(), "Artifact deleted");
    state
        .activity
        .info(format!("Deleted {}", deleted.display()))
        .await;
    Ok(Json(DeletedArtifact { deleted }))
}

/// `attachment` disposition with an ASCII fallback and an RFC 5987 UTF-8 name.
fn content_disposition(file_name: &str) -> String {
    let fallback: String = file_name
        .chars()
        .map(|c| {
            if (c.is_ascii_graphic() && c != '"' && c != '\\') || c == ' ' {
                c
            } else {
                '_'
            }
        })
        .collect();
    let encoded: String = file_name
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"!#$&+-.^_`|~".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect();
    format!("attachment; filename=\"{fallback}\"; filename*=UTF-8''{encoded}")
}
