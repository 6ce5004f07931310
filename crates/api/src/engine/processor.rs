//! Background job processor.
//!
//! Wakes every `poll_interval`, or as soon as [`JobControl::wake`] is called,
//! claims every undispatched task through [`TaskStore::claim_undispatched`],
//! and runs the creation tool for each claimed task. At most `max_workers`
//! builds run at once; the rest stay claimed until a permit frees up.
//!
//! Every failure of a single task ends in `cancelled` plus an activity log
//! entry. Nothing a task does can stop the loop.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;
use torrentforge_core::activity::ActivityLog;
use torrentforge_core::builder::{ArtifactBuilder, BuildError, BuildOutput, BuildRequest};
use torrentforge_core::config::{AppConfig, ConfigStore};
use torrentforge_core::error::CoreError;
use torrentforge_core::naming::artifact_path;
use torrentforge_core::task::{Task, TaskStatus};
use torrentforge_core::task_store::TaskStore;

use super::control::JobControl;
use crate::state::AppState;

pub struct JobProcessor<B> {
    tasks: Arc<TaskStore>,
    settings: Arc<ConfigStore>,
    activity: Arc<ActivityLog>,
    control: Arc<JobControl>,
    builder: Arc<B>,
    limit: Arc<Semaphore>,
    poll_interval: Duration,
}

impl<B: ArtifactBuilder> JobProcessor<B> {
    /// Create a processor sharing the stores of `state`.
    ///
    /// `max_workers` is read once here; changing it takes effect on restart.
    pub fn new(state: &AppState, builder: Arc<B>, max_workers: usize) -> Self {
        Self {
            tasks: Arc::clone(&state.tasks),
            settings: Arc::clone(&state.settings),
            activity: Arc::clone(&state.activity),
            control: Arc::clone(&state.control),
            builder,
            limit: Arc::new(Semaphore::new(max_workers.max(1))),
            poll_interval: state.config.poll_interval,
        }
    }

    /// Run the processor loop until the cancellation token is triggered.
    ///
    /// On shutdown every build still in flight is cancelled and awaited. Those
    /// tasks stay `running` on disk and are picked up again on the next start.
    pub async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut running: JoinSet<()> = JoinSet::new();

        tracing::info!(
            poll_interval_ms = self.poll_interval.as_millis() as u64,
            max_workers = self.limit.available_permits(),
            tool = self.builder.tool(),
            "Job processor started",
        );

        loop {
            tokio::select! {
                _ = cancel.cancelled() => {
                    tracing::info!("Job processor shutting down");
                    break;
                }
                Some(joined) = running.join_next(), if !running.is_empty() => {
                    if let Err(e) = joined {
                        tracing::error!(error = %e, "Task worker panicked");
                    }
                    continue;
                }
                _ = ticker.tick() => {}
                _ = self.control.woken() => {}
            }

            if let Err(e) = self.dispatch(&mut running).await {
                tracing::error!(error = %e, "Dispatch cycle failed");
            }
        }

        let aborted = self.control.cancel_all().await;
        if aborted > 0 {
            tracing::info!(aborted, "Cancelled builds in flight");
        }
        while running.join_next().await.is_some() {}
    }

    /// One dispatch cycle: claim undispatched tasks and start a worker for each.
    ///
    /// Returns how many tasks were claimed.
    pub async fn dispatch(self: &Arc<Self>, running: &mut JoinSet<()>) -> Result<usize, CoreError> {
        let claimed = self.tasks.claim_undispatched().await?;
        if claimed.is_empty() {
            return Ok(0);
        }

        let config = Arc::new(self.settings.get().await);
        let count = claimed.len();
        for task in claimed {
            tracing::info!(
                task_id = %task.id,
                category = %task.category,
                name = %task.name,
                "Task claimed",
            );
            let this = Arc::clone(self);
            let config = Arc::clone(&config);
            running.spawn(async move {
                let Ok(_permit) = Arc::clone(&this.limit).acquire_owned().await else {
                    return;
                };
                this.process(task, &config).await;
            });
        }
        Ok(count)
    }

    /// Claim and process everything currently undispatched, waiting for it
    /// to finish.
    pub async fn drain(self: &Arc<Self>) -> Result<usize, CoreError> {
        let mut running = JoinSet::new();
        let count = self.dispatch(&mut running).await?;
        while running.join_next().await.is_some() {}
        Ok(count)
    }

    // -----------------------------------------------------------------------
    // Per-task flow
    // -----------------------------------------------------------------------

    async fn process(&self, task: Task, config: &AppConfig) {
        let registration = self.control.register(&task.id).await;

        // Cancelled or deleted while waiting for a permit.
        let still_running = matches!(
            self.tasks.get(&task.id).await,
            Ok(Task { status: TaskStatus::Running, .. })
        );
        if !still_running {
            self.control.unregister(registration).await;
            tracing::debug!(task_id = %task.id, "Task withdrawn before start");
            return;
        }

        self.activity.info(format!("Creating torrent for {}", task.name)).await;
        let result = self.build(&task, config, registration.token.clone()).await;
        self.control.unregister(registration).await;

        match result {
            Ok(output) => self.record_success(&task, output).await,
            Err(BuildError::Cancelled) => {
                self.activity
                    .warning(format!("Cancelled {}", task.name))
                    .await;
            }
            Err(e) => self.record_failure(&task, e).await,
        }
    }

    async fn build(
        &self,
        task: &Task,
        config: &AppConfig,
        cancel: CancellationToken,
    ) -> Result<BuildOutput, BuildError> {
        if !self.builder.is_available() {
            return Err(BuildError::BinaryNotFound(self.builder.tool().to_string()));
        }
        if !tokio::fs::try_exists(&task.source_path).await.unwrap_or(false) {
            return Err(BuildError::SourceMissing(task.source_path.clone()));
        }

        let output_dir = config.output_for(task.category);
        tokio::fs::create_dir_all(output_dir).await?;

        let request = BuildRequest {
            source: task.source_path.clone(),
            destination: artifact_path(output_dir, &task.name, &task.language_tag),
            tracker: config.tracker.clone(),
            private: config.private,
            comment: config.comment.clone(),
            piece_size: config.piece_size,
            timeout: config.timeout(),
        };
        self.builder.build(request, cancel).await
    }

    async fn record_success(&self, task: &Task, output: BuildOutput) {
        let file_name = output
            .artifact
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();

        match self.tasks.mark_completed(&task.id).await {
            Ok(true) => {
                tracing::info!(
                    task_id = %task.id,
                    artifact = %output.artifact.display(),
                    duration_ms = output.duration_ms,
                    "Task completed",
                );
                self.activity.success(format!("Created {file_name}")).await;
            }
            Ok(false) => {
                // Cancelled or deleted while the tool was finishing.
                tracing::info!(task_id = %task.id, "Task finished after being withdrawn");
                if let Err(e) = tokio::fs::remove_file(&output.artifact).await {
                    tracing::warn!(
                        artifact = %output.artifact.display(),
                        error = %e,
                        "Failed to remove artifact of withdrawn task",
                    );
                }
            }
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Failed to record completion");
            }
        }
    }

    async fn record_failure(&self, task: &Task, error: BuildError) {
        match self.tasks.mark_failed(&task.id).await {
            Ok(true) => {
                tracing::warn!(task_id = %task.id, error = %error, "Task failed");
                self.activity
                    .error(format!("Failed {}: {error}", task.name))
                    .await;
            }
            Ok(false) => {
                tracing::info!(task_id = %task.id, error = %error, "Withdrawn task failed");
            }
            Err(e) => {
                tracing::error!(task_id = %task.id, error = %e, "Failed to record failure");
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
