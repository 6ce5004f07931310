//! Ordered, persisted collection of tasks.
//!
//! Every read and mutation goes through one `tokio::sync::Mutex`. Mutations
//! rewrite the whole list to `tasks.json` while still holding the lock, so
//! the on-disk mirror never lags behind a completed call.
//!
//! ## Operations
//!
//! - `add` / `add_many`: append runnable tasks (status `running`, progress 0)
//! - `list` / `get`: consistent snapshots
//! - `retry`, `cancel`, `delete`, `clear_finished`: explicit user mutations
//! - `claim_undispatched`: processor-side claim of progress-0 tasks
//! - `mark_completed` / `mark_failed`: processor-side outcomes

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use chrono::Utc;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::CoreError;
use crate::persist::write_json_atomic;
use crate::task::{NewTask, Task, TaskStatus, COMPLETE_PROGRESS, DISPATCHED_PROGRESS};
use crate::types::TaskId;

/// File name of the persisted task list inside the data directory.
pub const TASKS_FILE: &str = "tasks.json";

/// Length of generated task ids.
const ID_LEN: usize = 8;

struct Inner {
    tasks: Vec<Task>,
    /// Every id handed out during this process lifetime, including deleted ones.
    issued: HashSet<TaskId>,
}

impl Inner {
    fn position(&self, id: &str) -> Result<usize, CoreError> {
        self.tasks
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| CoreError::task_not_found(id))
    }

    fn next_id(&mut self) -> TaskId {
        loop {
            let candidate: TaskId = Uuid::new_v4().simple().to_string()[..ID_LEN].to_string();
            if self.issued.insert(candidate.clone()) {
                return candidate;
            }
        }
    }
}

pub struct TaskStore {
    path: PathBuf,
    inner: Mutex<Inner>,
}

impl TaskStore {
    /// Open the store backed by `path`, hydrating from disk when the file exists.
    ///
    /// An unreadable or corrupt file is logged and replaced by an empty list.
    /// Tasks left `running` with a non-zero progress were claimed by a process
    /// that is gone; they are reset to progress 0 so they get redispatched.
    pub async fn open(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let mut tasks: Vec<Task> = match tokio::fs::read(&path).await {
            Ok(bytes) => serde_json::from_slice(&bytes).unwrap_or_else(|e| {
                tracing::warn!(path = %path.display(), error = %e, "Task file is corrupt, starting empty");
                Vec::new()
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Vec::new(),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Task file unreadable, starting empty");
                Vec::new()
            }
        };

        let mut recovered = 0usize;
        for task in tasks.iter_mut() {
            if task.status == TaskStatus::Running && task.progress != 0 {
                task.progress = 0;
                recovered += 1;
            }
        }
        if recovered > 0 {
            tracing::info!(recovered, "Requeued tasks interrupted by a previous run");
        }
        tracing::info!(path = %path.display(), count = tasks.len(), "Task store loaded");

        let issued = tasks.iter().map(|t| t.id.clone()).collect();
        Self {
            path,
            inner: Mutex::new(Inner { tasks, issued }),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, tasks: &[Task]) -> Result<(), CoreError> {
        write_json_atomic(&self.path, tasks).await
    }

    /// Write the current list to disk.
    pub async fn flush(&self) -> Result<(), CoreError> {
        let inner = self.inner.lock().await;
        self.persist(&inner.tasks).await
    }

    // -----------------------------------------------------------------------
    // Caller-facing operations
    // -----------------------------------------------------------------------

    /// Append one runnable task and return its id.
    pub async fn add(&self, new: NewTask) -> Result<TaskId, CoreError> {
        let mut ids = self.add_many(vec![new]).await?;
        Ok(ids.remove(0))
    }

    /// Append several runnable tasks with a single persistence write.
    ///
    /// Ids are returned in input order.
    pub async fn add_many(&self, items: Vec<NewTask>) -> Result<Vec<TaskId>, CoreError> {
        let mut inner = self.inner.lock().await;
        let now = Utc::now();
        let mut ids = Vec::with_capacity(items.len());
        for new in items {
            let id = inner.next_id();
            inner.tasks.push(Task {
                id: id.clone(),
                name: new.name,
                source_path: new.source_path,
                category: new.category,
                language_tag: new.language_tag,
                status: TaskStatus::Running,
                progress: 0,
                created_at: now,
            });
            ids.push(id);
        }
        self.persist(&inner.tasks).await?;
        Ok(ids)
    }

    /// Snapshot of every task in insertion order.
    pub async fn list(&self) -> Vec<Task> {
        self.inner.lock().await.tasks.clone()
    }

    pub async fn get(&self, id: &str) -> Result<Task, CoreError> {
        let inner = self.inner.lock().await;
        let idx = inner.position(id)?;
        Ok(inner.tasks[idx].clone())
    }

    /// Reset a task to `running` with progress 0 so it is dispatched again.
    ///
    /// A task that is currently in flight cannot be retried.
    pub async fn retry(&self, id: &str) -> Result<Task, CoreError> {
        let mut inner = self.inner.lock().await;
        let idx = inner.position(id)?;
        let task = &mut inner.tasks[idx];
        if task.status == TaskStatus::Running && task.progress != 0 {
            return Err(CoreError::Conflict(format!("Task {id} is already being processed")));
        }
        task.status = TaskStatus::Running;
        task.progress = 0;
        let snapshot = task.clone();
        self.persist(&inner.tasks).await?;
        Ok(snapshot)
    }

    /// Mark a running task as cancelled by the user.
    pub async fn cancel(&self, id: &str) -> Result<Task, CoreError> {
        let mut inner = self.inner.lock().await;
        let idx = inner.position(id)?;
        let task = &mut inner.tasks[idx];
        if task.status.is_finished() {
            return Err(CoreError::Conflict(format!(
                "Task {id} is already finished and cannot be cancelled"
            )));
        }
        task.status = TaskStatus::Cancelled;
        let snapshot = task.clone();
        self.persist(&inner.tasks).await?;
        Ok(snapshot)
    }

    pub async fn delete(&self, id: &str) -> Result<Task, CoreError> {
        let mut inner = self.inner.lock().await;
        let idx = inner.position(id)?;
        let removed = inner.tasks.remove(idx);
        self.persist(&inner.tasks).await?;
        Ok(removed)
    }

    /// Drop every completed or cancelled task. Returns how many were removed.
    pub async fn clear_finished(&self) -> Result<usize, CoreError> {
        let mut inner = self.inner.lock().await;
        let before = inner.tasks.len();
        inner.tasks.retain(|t| !t.status.is_finished());
        let removed = before - inner.tasks.len();
        if removed > 0 {
            self.persist(&inner.tasks).await?;
        }
        Ok(removed)
    }

    // -----------------------------------------------------------------------
    // Processor-facing operations
    // -----------------------------------------------------------------------

    /// Claim every undispatched task in list order.
    ///
    /// The progress-0 check and the sentinel write happen under the same lock
    /// acquisition, so a task is handed out at most once.
    pub async fn claim_undispatched(&self) -> Result<Vec<Task>, CoreError> {
        let mut inner = self.inner.lock().await;
        let mut claimed = Vec::new();
        for task in inner.tasks.iter_mut().filter(|t| t.is_undispatched()) {
            task.progress = DISPATCHED_PROGRESS;
            claimed.push(task.clone());
        }
        if !claimed.is_empty() {
            self.persist(&inner.tasks).await?;
        }
        Ok(claimed)
    }

    /// Record a successful build.
    ///
    /// Returns `false` (and changes nothing) when the task was deleted or
    /// cancelled while the tool was running.
    pub async fn mark_completed(&self, id: &str) -> Result<bool, CoreError> {
        self.finish(id, TaskStatus::Completed).await
    }

    /// Record a failed build. Same no-op rules as [`Self::mark_completed`].
    pub async fn mark_failed(&self, id: &str) -> Result<bool, CoreError> {
        self.finish(id, TaskStatus::Cancelled).await
    }

    async fn finish(&self, id: &str, status: TaskStatus) -> Result<bool, CoreError> {
        let mut inner = self.inner.lock().await;
        let Some(task) = inner.tasks.iter_mut().find(|t| t.id == id) else {
            return Ok(false);
        };
        if task.status != TaskStatus::Running {
            return Ok(false);
        }
        task.status = status;
        if status == TaskStatus::Completed {
            task.progress = COMPLETE_PROGRESS;
        }
        self.persist(&inner.tasks).await?;
        Ok(true)
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
