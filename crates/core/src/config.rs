//! Persisted application configuration (`config.json`).
//!
//! The file is merged over [`AppConfig::default`] key by key: every field
//! carries `#[serde(default)]`, so a partial or older file still loads. A
//! missing or unparsable file yields the defaults and is never fatal.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;

use crate::error::CoreError;
use crate::persist::write_json_atomic;
use crate::task::{Category, DEFAULT_LANGUAGE_TAG};

/// Environment variable overriding the data directory.
pub const CONFIG_DIR_ENV: &str = "TF_CONFIG_DIR";

/// Well-known data directory used by container deployments.
pub const SYSTEM_CONFIG_DIR: &str = "/config";

/// Fallback data directory, relative to the working directory.
pub const LOCAL_CONFIG_DIR: &str = "config";

/// File name of the persisted configuration inside the data directory.
pub const CONFIG_FILE: &str = "config.json";

/// Default per-task timeout for the creation tool (2 hours).
pub const DEFAULT_TIMEOUT_SECS: u64 = 7200;

/// Default number of concurrently running creation processes.
pub const DEFAULT_MAX_WORKERS: usize = 2;

// ---------------------------------------------------------------------------
// Data directory
// ---------------------------------------------------------------------------

/// Resolve the directory holding `config.json` and `tasks.json`.
///
/// `TF_CONFIG_DIR` wins, then `/config` when it exists, then `./config`.
pub fn resolve_data_dir() -> PathBuf {
    let env = std::env::var(CONFIG_DIR_ENV).ok();
    resolve_data_dir_from(env.as_deref(), Path::new(SYSTEM_CONFIG_DIR))
}

fn resolve_data_dir_from(env: Option<&str>, system_dir: &Path) -> PathBuf {
    match env.map(str::trim).filter(|v| !v.is_empty()) {
        Some(dir) => PathBuf::from(dir),
        None if system_dir.is_dir() => system_dir.to_path_buf(),
        None => PathBuf::from(LOCAL_CONFIG_DIR),
    }
}

// ---------------------------------------------------------------------------
// AppConfig
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub series_root: PathBuf,
    pub series_out: PathBuf,
    pub movies_root: PathBuf,
    pub movies_out: PathBuf,
    /// Announce URL passed to the creation tool.
    pub tracker: String,
    pub private: bool,
    /// Piece length exponent hint (`2^n` bytes), left to the tool when absent.
    pub piece_size: Option<u8>,
    pub comment: Option<String>,
    /// Default language tag for new tasks and scan detection.
    pub language: String,
    pub timeout_secs: u64,
    pub max_workers: usize,
    /// Compute recursive directory sizes during scans.
    pub show_size: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            series_root: PathBuf::from("/data/series"),
            series_out: PathBuf::from("/data/torrents/series"),
            movies_root: PathBuf::from("/data/movies"),
            movies_out: PathBuf::from("/data/torrents/movies"),
            tracker: "udp://tracker.opentrackr.org:1337/announce".to_string(),
            private: true,
            piece_size: None,
            comment: None,
            language: DEFAULT_LANGUAGE_TAG.to_string(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_workers: DEFAULT_MAX_WORKERS,
            show_size: true,
        }
    }
}

impl AppConfig {
    /// Source root scanned for a category.
    pub fn root_for(&self, category: Category) -> &Path {
        match category {
            Category::Series => &self.series_root,
            Category::Movies => &self.movies_root,
        }
    }

    /// Output directory receiving a category's artifacts.
    pub fn output_for(&self, category: Category) -> &Path {
        match category {
            Category::Series => &self.series_out,
            Category::Movies => &self.movies_out,
        }
    }

    pub fn output_dirs(&self) -> [&Path; 2] {
        [&self.series_out, &self.movies_out]
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }

    /// The configured default tag, or `MULTI` when blank.
    pub fn default_language(&self) -> &str {
        let tag = self.language.trim();
        if tag.is_empty() {
            DEFAULT_LANGUAGE_TAG
        } else {
            tag
        }
    }

    fn validate(&self) -> Result<(), CoreError> {
        if self.tracker.trim().is_empty() {
            return Err(CoreError::Validation("tracker must not be empty".into()));
        }
        if self.max_workers == 0 {
            return Err(CoreError::Validation("max_workers must be at least 1".into()));
        }
        if let Some(p) = self.piece_size {
            if !(15..=28).contains(&p) {
                return Err(CoreError::Validation(format!(
                    "piece_size must be between 15 and 28, got {p}"
                )));
            }
        }
        Ok(())
    }
}

/// Read the config at `path`, falling back to defaults on any failure.
pub async fn load(path: &Path) -> AppConfig {
    match tokio::fs::read(path).await {
        Ok(bytes) => match serde_json::from_slice(&bytes) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Config file is invalid, using defaults");
                AppConfig::default()
            }
        },
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            tracing::info!(path = %path.display(), "No config file, using defaults");
            AppConfig::default()
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Config file unreadable, using defaults");
            AppConfig::default()
        }
    }
}

// ---------------------------------------------------------------------------
// ConfigStore
// ---------------------------------------------------------------------------

/// In-memory config guarded by a `RwLock`, mirrored to disk on every write.
pub struct ConfigStore {
    path: PathBuf,
    current: RwLock<AppConfig>,
}

impl ConfigStore {
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let current = load(&path).await;
        Self {
            path,
            current: RwLock::new(current),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Snapshot of the current configuration.
    pub async fn get(&self) -> AppConfig {
        self.current.read().await.clone()
    }

    /// Replace the whole configuration and persist it.
    pub async fn save(&self, config: AppConfig) -> Result<AppConfig, CoreError> {
        config.validate()?;
        let mut current = self.current.write().await;
        write_json_atomic(&self.path, &config).await?;
        *current = config.clone();
        Ok(config)
    }

    /// Merge a partial JSON object over the current configuration and persist.
    pub async fn update(&self, patch: Value) -> Result<AppConfig, CoreError> {
        let Value::Object(patch) = patch else {
            return Err(CoreError::Validation("config update must be a JSON object".into()));
        };

        let mut current = self.current.write().await;
        let mut merged = serde_json::to_value(&*current)?;
        if let Value::Object(fields) = &mut merged {
            fields.extend(patch);
        }
        let next: AppConfig = serde_json::from_value(merged)
            .map_err(|e| CoreError::Validation(format!("invalid config: {e}")))?;
        next.validate()?;

        write_json_atomic(&self.path, &next).await?;
        *current = next.clone();
        Ok(next)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn env_override_wins() {
        let dir = resolve_data_dir_from(Some("/srv/tf"), Path::new("/definitely/not/here"));
        assert_eq!(dir, PathBuf::from("/srv/tf"));
    }

    #[test]
    fn falls_back_to_system_then_local_dir() {
        let system = tempfile::tempdir().expect("create temp dir");
        assert_eq!(resolve_data_dir_from(None, system.path()), system.path());
        assert_eq!(
            resolve_data_dir_from(Some("  "), Path::new("/definitely/not/here")),
            PathBuf::from(LOCAL_CONFIG_DIR)
        );
    }

    #[tokio::test]
    async fn missing_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let config = load(&dir.path().join(CONFIG_FILE)).await;
        assert_eq!(config, AppConfig::default());
    }

    #[tokio::test]
    async fn partial_file_merges_over_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, r#"{"series_out": "/tmp/out/series", "private": false}"#).unwrap();

        let config = load(&path).await;
        assert_eq!(config.series_out, PathBuf::from("/tmp/out/series"));
        assert!(!config.private);
        assert_eq!(config.movies_root, PathBuf::from("/data/movies"));
        assert_eq!(config.timeout_secs, DEFAULT_TIMEOUT_SECS);
    }

    #[tokio::test]
    async fn garbage_file_yields_defaults() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        std::fs::write(&path, "definitely not json").unwrap();
        assert_eq!(load(&path).await, AppConfig::default());
    }

    #[tokio::test]
    async fn update_merges_and_persists() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join("sub").join(CONFIG_FILE);
        let store = ConfigStore::open(&path).await;

        let updated = store
            .update(serde_json::json!({"tracker": "http://t.example/announce", "comment": "hi"}))
            .await
            .unwrap();
        assert_eq!(updated.tracker, "http://t.example/announce");
        assert_eq!(updated.comment.as_deref(), Some("hi"));

        let reloaded = load(&path).await;
        assert_eq!(reloaded, updated);
    }

    #[tokio::test]
    async fn save_replaces_whole_record_and_persists() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        let store = ConfigStore::open(&path).await;
        store
            .update(serde_json::json!({"comment": "old", "show_size": false}))
            .await
            .unwrap();

        let replacement = AppConfig {
            series_out: PathBuf::from("/tmp/out/series"),
            language: "VFF".into(),
            ..AppConfig::default()
        };
        let saved = store.save(replacement.clone()).await.unwrap();
        assert_eq!(saved, replacement);

        // Earlier values are gone, not merged.
        let current = store.get().await;
        assert_eq!(current.comment, None);
        assert!(current.show_size);
        assert_eq!(load(&path).await, replacement);
    }

    #[tokio::test]
    async fn save_rejects_invalid_record() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        let store = ConfigStore::open(&path).await;

        let invalid = AppConfig {
            max_workers: 0,
            ..AppConfig::default()
        };
        assert_matches!(store.save(invalid).await, Err(CoreError::Validation(_)));
        assert_eq!(store.get().await, AppConfig::default());
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn update_rejects_bad_values_without_persisting() {
        let dir = tempfile::tempdir().expect("create temp dir");
        let path = dir.path().join(CONFIG_FILE);
        let store = ConfigStore::open(&path).await;

        let res = store.update(serde_json::json!({"max_workers": 0})).await;
        assert_matches!(res, Err(CoreError::Validation(_)));
        let res = store.update(serde_json::json!({"private": "yes"})).await;
        assert_matches!(res, Err(CoreError::Validation(_)));
        let res = store.update(serde_json::json!(["not", "an", "object"])).await;
        assert_matches!(res, Err(CoreError::Validation(_)));

        assert!(!path.exists());
        assert_eq!(store.get().await, AppConfig::default());
    }

    #[test]
    fn blank_language_falls_back_to_multi() {
        let config = AppConfig {
            language: "  ".into(),
            ..AppConfig::default()
        };
        assert_eq!(config.default_language(), "MULTI");
    }
}
