//! Produced artifact files: listing, containment, deletion.
//!
//! Every path coming from a client goes through [`resolve_contained`] before
//! it is read or removed. Only regular files strictly inside one of the
//! configured output directories are accepted.

use std::path::{Component, Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::error::CoreError;
use crate::library::format_size;
use crate::naming::ARTIFACT_EXTENSION;
use crate::types::Timestamp;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ArtifactEntry {
    pub name: String,
    pub path: PathBuf,
    pub size: String,
    pub size_bytes: u64,
    pub modified: Option<Timestamp>,
}

/// Artifacts grouped by category output directory.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ArtifactListing {
    pub series: Vec<ArtifactEntry>,
    pub movies: Vec<ArtifactEntry>,
}

// ---------------------------------------------------------------------------
// Listing
// ---------------------------------------------------------------------------

/// List `.torrent` files directly inside `dir`, sorted by name.
///
/// A missing or unreadable directory lists as empty.
pub async fn list_artifacts(dir: &Path) -> Vec<ArtifactEntry> {
    let mut read_dir = match tokio::fs::read_dir(dir).await {
        Ok(rd) => rd,
        Err(e) => {
            tracing::debug!(dir = %dir.display(), error = %e, "Artifact directory unreadable");
            return Vec::new();
        }
    };

    let mut entries = Vec::new();
    while let Ok(Some(entry)) = read_dir.next_entry().await {
        let path = entry.path();
        let is_artifact = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(ARTIFACT_EXTENSION));
        if !is_artifact {
            continue;
        }
        let Ok(meta) = entry.metadata().await else {
            continue;
        };
        if !meta.is_file() {
            continue;
        }
        entries.push(ArtifactEntry {
            name: entry.file_name().to_string_lossy().into_owned(),
            path,
            size: format_size(meta.len()),
            size_bytes: meta.len(),
            modified: meta.modified().ok().map(DateTime::<Utc>::from),
        });
    }
    entries.sort_by(|a, b| a.name.cmp(&b.name));
    entries
}

// ---------------------------------------------------------------------------
// Containment
// ---------------------------------------------------------------------------

/// Resolve a client-supplied path to a file inside one of `roots`.
///
/// - Relative paths and paths with `..` components are forbidden outright.
/// - Existing paths are canonicalized (following symlinks) before the check.
/// - A missing path inside a root is `NotFound`; outside, `Forbidden`.
pub fn resolve_contained(requested: &Path, roots: &[&Path]) -> Result<PathBuf, CoreError> {
    let forbidden = || CoreError::Forbidden("Path is outside the artifact directories".into());

    if !requested.is_absolute()
        || requested
            .components()
            .any(|c| matches!(c, Component::ParentDir))
    {
        return Err(forbidden());
    }

    let canonical_roots: Vec<PathBuf> = roots
        .iter()
        .map(|r| r.canonicalize().unwrap_or_else(|_| r.to_path_buf()))
        .collect();
    let inside = |p: &Path| {
        canonical_roots
            .iter()
            .any(|r| p.starts_with(r) && p != r.as_path())
    };

    match requested.canonicalize() {
        Ok(canonical) => {
            if !inside(&canonical) {
                return Err(forbidden());
            }
            if !canonical.is_file() {
                return Err(CoreError::Validation("Path is not a file".into()));
            }
            Ok(canonical)
        }
        Err(_) => {
            let lexically_inside = roots
                .iter()
                .copied()
                .chain(canonical_roots.iter().map(PathBuf::as_path))
                .any(|r| requested.starts_with(r) && requested != r);
            if lexically_inside {
                Err(CoreError::NotFound {
                    entity: "Artifact",
                    id: requested.display().to_string(),
                })
            } else {
                Err(forbidden())
            }
        }
    }
}

/// Remove an artifact after the containment check. Returns the removed path.
pub async fn delete_artifact(requested: &Path, roots: &[&Path]) -> Result<PathBuf, CoreError> {
    let path = resolve_contained(requested, roots)?;
    tokio::fs::remove_file(&path).await?;
    Ok(path)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
