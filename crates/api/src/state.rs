use std::sync::Arc;

use torrentforge_core::activity::ActivityLog;
use torrentforge_core::builder::ToolStatus;
use torrentforge_core::config::{ConfigStore, CONFIG_FILE};
use torrentforge_core::library::LibraryCache;
use torrentforge_core::task_store::{TaskStore, TASKS_FILE};

use crate::config::ServerConfig;
use crate::engine::control::JobControl;

/// Shared application state available to all Axum handlers via `State<AppState>`.
///
/// This is cheaply cloneable (inner data is behind `Arc`).
#[derive(Clone)]
pub struct AppState {
    /// Server configuration.
    pub config: Arc<ServerConfig>,
    /// User-editable settings, persisted to `config.json`.
    pub settings: Arc<ConfigStore>,
    /// Task list, persisted to `tasks.json`.
    pub tasks: Arc<TaskStore>,
    /// User-facing activity log.
    pub activity: Arc<ActivityLog>,
    /// Last scan result per category.
    pub library: Arc<LibraryCache>,
    /// Wake-up and cancellation handle of the job processor.
    pub control: Arc<JobControl>,
    /// The creation tool the processor runs, for health reporting.
    pub builder: Arc<dyn ToolStatus>,
}

impl AppState {
    /// Open both stores under `config.data_dir`.
    pub async fn open(config: ServerConfig, builder: Arc<dyn ToolStatus>) -> Self {
        let settings = ConfigStore::open(config.data_dir.join(CONFIG_FILE)).await;
        let tasks = TaskStore::open(config.data_dir.join(TASKS_FILE)).await;
        Self {
            config: Arc::new(config),
            settings: Arc::new(settings),
            tasks: Arc::new(tasks),
            activity: Arc::new(ActivityLog::default()),
            library: Arc::new(LibraryCache::default()),
            control: Arc::new(JobControl::default()),
            builder,
        }
    }
}
