//! Media library scanning.
//!
//! Enumerates the immediate subdirectories of a category root, optionally
//! sums their size recursively, and guesses a language tag from the
//! directory name. Filesystem errors never propagate: an unreadable root
//! scans as empty and unreadable children count as zero bytes.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tokio::sync::RwLock;

use crate::task::Category;

/// Tags recognised in release names, highest priority first.
const LANGUAGE_TAGS: &[&str] = &[
    "MULTI",
    "VOSTFR",
    "VFF",
    "VFQ",
    "VF2",
    "TRUEFRENCH",
    "FRENCH",
    "VO",
];

const GIB: f64 = 1024.0 * 1024.0 * 1024.0;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LibraryItem {
    pub name: String,
    pub path: PathBuf,
    /// Human-readable size, e.g. `"4.37 GB"`.
    pub size: String,
    pub size_bytes: u64,
    pub detected_tag: String,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Format a byte count in gigabytes with two decimals (`"0 GB"` when empty).
pub fn format_size_gb(bytes: u64) -> String {
    if bytes == 0 {
        "0 GB".to_string()
    } else {
        format!("{:.2} GB", bytes as f64 / GIB)
    }
}

/// Format a byte count with an adaptive unit (B, KB, MB, GB).
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{bytes} B")
    } else {
        format!("{value:.2} {}", UNITS[unit])
    }
}

/// Guess a language tag from a release name, or return `default`.
///
/// Matching is case-insensitive on whole tokens (split on anything that is
/// not an ASCII letter or digit), so `"Vostfr"` matches but `"VOSTFRANCE"`
/// does not.
pub fn detect_language_tag(name: &str, default: &str) -> String {
    let tokens: Vec<String> = name
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|t| !t.is_empty())
        .map(str::to_ascii_uppercase)
        .collect();
    LANGUAGE_TAGS
        .iter()
        .find(|tag| tokens.iter().any(|t| t == *tag))
        .map(|tag| tag.to_string())
        .unwrap_or_else(|| default.to_string())
}

/// Total size of all regular files under `path` (a single file counts itself).
///
/// Symlinks are not followed.
pub fn dir_size(path: &Path) -> u64 {
    let mut total = 0u64;
    let mut stack = vec![path.to_path_buf()];
    while let Some(current) = stack.pop() {
        let Ok(meta) = std::fs::symlink_metadata(&current) else {
            continue;
        };
        if meta.is_file() {
            total += meta.len();
        } else if meta.is_dir() {
            let Ok(entries) = std::fs::read_dir(&current) else {
                continue;
            };
            stack.extend(entries.flatten().map(|e| e.path()));
        }
    }
    total
}

// ---------------------------------------------------------------------------
// Scan
// ---------------------------------------------------------------------------

/// Scan `root` synchronously. See [`scan`] for the async wrapper.
pub fn scan_blocking(root: &Path, with_size: bool, default_tag: &str) -> Vec<LibraryItem> {
    let entries = match std::fs::read_dir(root) {
        Ok(entries) => entries,
        Err(e) => {
            tracing::warn!(root = %root.display(), error = %e, "Library root unreadable");
            return Vec::new();
        }
    };

    let mut items: Vec<LibraryItem> = entries
        .flatten()
        .filter(|e| e.file_type().map(|t| t.is_dir()).unwrap_or(false))
        .filter_map(|e| {
            let name = e.file_name().to_str()?.to_string();
            if name.starts_with('.') {
                return None;
            }
            let path = e.path();
            let size_bytes = if with_size { dir_size(&path) } else { 0 };
            Some(LibraryItem {
                detected_tag: detect_language_tag(&name, default_tag),
                size: format_size_gb(size_bytes),
                size_bytes,
                name,
                path,
            })
        })
        .collect();
    items.sort_by(|a, b| a.name.cmp(&b.name));
    items
}

/// Scan `root` on the blocking pool.
pub async fn scan(root: PathBuf, with_size: bool, default_tag: String) -> Vec<LibraryItem> {
    tokio::task::spawn_blocking(move || scan_blocking(&root, with_size, &default_tag))
        .await
        .unwrap_or_else(|e| {
            tracing::error!(error = %e, "Library scan task panicked");
            Vec::new()
        })
}

// ---------------------------------------------------------------------------
// Cache
// ---------------------------------------------------------------------------

/// Last scan result per category.
#[derive(Default)]
pub struct LibraryCache {
    items: RwLock<HashMap<Category, Vec<LibraryItem>>>,
}

impl LibraryCache {
    pub async fn store(&self, category: Category, items: Vec<LibraryItem>) {
        self.items.write().await.insert(category, items);
    }

    /// Items of the last scan, empty when the category was never scanned.
    pub async fn get(&self, category: Category) -> Vec<LibraryItem> {
        self.items
            .read()
            .await
            .get(&category)
            .cloned()
            .unwrap_or_default()
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
