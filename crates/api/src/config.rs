use std::path::PathBuf;
use std::time::Duration;

use torrentforge_core::builder::mktorrent::DEFAULT_BINARY;
use torrentforge_core::config::resolve_data_dir;

/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// User-editable settings (roots, tracker, ...) live in the Config Store
/// instead, under [`ServerConfig::data_dir`].
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Directory of the built frontend, served for non-API paths.
    pub static_dir: PathBuf,
    /// Directory holding `config.json` and `tasks.json`.
    pub data_dir: PathBuf,
    /// Fallback wake-up period of the job processor.
    pub poll_interval: Duration,
    /// Creation tool, as a name looked up on `PATH` or an explicit path.
    pub builder_bin: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                | Default                    |
    /// |------------------------|----------------------------|
    /// | `HOST`                 | `0.0.0.0`                  |
    /// | `PORT`                 | `5000`                     |
    /// | `CORS_ORIGINS`         | `http://localhost:5173`    |
    /// | `REQUEST_TIMEOUT_SECS` | `30`                       |
    /// | `STATIC_DIR`           | `dist`                     |
    /// | `TF_CONFIG_DIR`        | `/config`, else `./config` |
    /// | `TF_POLL_INTERVAL_MS`  | `1500`                     |
    /// | `TF_BUILDER_BIN`       | `mktorrent`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let static_dir = std::env::var("STATIC_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from("dist"));

        let poll_interval_ms: u64 = std::env::var("TF_POLL_INTERVAL_MS")
            .unwrap_or_else(|_| "1500".into())
            .parse()
            .expect("TF_POLL_INTERVAL_MS must be a valid u64");

        let builder_bin =
            std::env::var("TF_BUILDER_BIN").unwrap_or_else(|_| DEFAULT_BINARY.to_string());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            static_dir,
            data_dir: resolve_data_dir(),
            poll_interval: Duration::from_millis(poll_interval_ms.max(50)),
            builder_bin,
        }
    }
}
