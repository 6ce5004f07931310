#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Method, Request, Response};
use axum::Router;
use http_body_util::BodyExt;
use tokio_util::sync::CancellationToken;
use tower::ServiceExt;

use torrentforge_api::config::ServerConfig;
use torrentforge_api::engine::processor::JobProcessor;
use torrentforge_api::router::build_app_router;
use torrentforge_api::state::AppState;
use torrentforge_core::builder::{ArtifactBuilder, BuildError, BuildOutput, BuildRequest, ToolStatus};
use torrentforge_core::task::{Task, TaskStatus};

// ---------------------------------------------------------------------------
// Fake creation tool
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy)]
pub enum FakeMode {
    /// Write a small artifact and succeed.
    Succeed,
    /// Exit non-zero with a diagnostic.
    Fail,
    /// Block until cancelled.
    Hang,
    /// Block until cancelled, then take a while to stop.
    SlowStop,
}

/// Stands in for the real tool so no process is spawned.
pub struct FakeBuilder {
    mode: FakeMode,
    available: bool,
    pub calls: AtomicUsize,
}

impl FakeBuilder {
    pub fn new(mode: FakeMode) -> Arc<Self> {
        Arc::new(Self {
            mode,
            available: true,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn unavailable() -> Arc<Self> {
        Arc::new(Self {
            mode: FakeMode::Succeed,
            available: false,
            calls: AtomicUsize::new(0),
        })
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl ToolStatus for FakeBuilder {
    fn tool(&self) -> &str {
        "fake-mktorrent"
    }

    fn is_available(&self) -> bool {
        self.available
    }
}

impl ArtifactBuilder for FakeBuilder {
    async fn build(
        &self,
        request: BuildRequest,
        cancel: CancellationToken,
    ) -> Result<BuildOutput, BuildError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        match self.mode {
            FakeMode::Succeed => {
                tokio::fs::write(&request.destination, b"d8:announce0:e").await?;
                Ok(BuildOutput {
                    artifact: request.destination,
                    duration_ms: 1,
                })
            }
            FakeMode::Fail => Err(BuildError::ExecutionFailed {
                exit_code: 1,
                stderr: "hashing failed".into(),
            }),
            FakeMode::Hang => {
                cancel.cancelled().await;
                Err(BuildError::Cancelled)
            }
            FakeMode::SlowStop => {
                cancel.cancelled().await;
                tokio::time::sleep(Duration::from_millis(300)).await;
                Err(BuildError::Cancelled)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Test application
// ---------------------------------------------------------------------------

/// A fully wired application over a scratch directory.
///
/// Layout under the temp dir: `media/{series,movies}` (roots),
/// `out/{series,movies}` (artifact outputs), `config/` (stores) and
/// `dist/` (static frontend).
pub struct TestApp {
    pub dir: tempfile::TempDir,
    pub state: AppState,
    pub router: Router,
    pub builder: Arc<FakeBuilder>,
    processor: Option<CancellationToken>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_builder(FakeBuilder::new(FakeMode::Succeed)).await
    }

    pub async fn with_builder(builder: Arc<FakeBuilder>) -> Self {
        let dir = tempfile::tempdir().expect("create temp dir");
        let root = dir.path();
        for sub in ["media/series", "media/movies", "dist"] {
            std::fs::create_dir_all(root.join(sub)).expect("create layout");
        }

        let config = test_config(root);
        let state = AppState::open(config.clone(), builder.clone()).await;
        state
            .settings
            .update(serde_json::json!({
                "series_root": root.join("media/series"),
                "series_out": root.join("out/series"),
                "movies_root": root.join("media/movies"),
                "movies_out": root.join("out/movies"),
            }))
            .await
            .expect("configure roots");

        let router = build_app_router(state.clone(), &config);
        Self {
            dir,
            state,
            router,
            builder,
            processor: None,
        }
    }

    /// Start the background processor driving the fake builder.
    pub fn start_processor(&mut self) {
        let processor = Arc::new(JobProcessor::new(&self.state, Arc::clone(&self.builder), 2));
        let cancel = CancellationToken::new();
        tokio::spawn(processor.run(cancel.clone()));
        self.processor = Some(cancel);
    }

    pub fn path(&self, relative: &str) -> PathBuf {
        self.dir.path().join(relative)
    }

    /// Create a source directory under the series root.
    pub fn series_source(&self, name: &str) -> PathBuf {
        let path = self.path("media/series").join(name);
        std::fs::create_dir_all(&path).expect("create source");
        std::fs::write(path.join("e01.mkv"), b"video").expect("write source file");
        path
    }

    /// Poll the store until the task leaves `running`, or give up after 5s.
    pub async fn wait_finished(&self, id: &str) -> Task {
        for _ in 0..250 {
            let task = self.state.tasks.get(id).await.expect("task exists");
            if task.status != TaskStatus::Running {
                return task;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("task {id} did not finish in time");
    }

    /// Poll until the task has been claimed by the processor.
    pub async fn wait_claimed(&self, id: &str) {
        for _ in 0..250 {
            let task = self.state.tasks.get(id).await.expect("task exists");
            if task.progress != 0 && self.state.control.in_flight().await > 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("task {id} was not claimed in time");
    }

    /// Poll until no build is in flight.
    pub async fn wait_idle(&self) {
        for _ in 0..250 {
            if self.state.control.in_flight().await == 0 {
                return;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
        panic!("builds still in flight");
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        if let Some(cancel) = &self.processor {
            cancel.cancel();
        }
    }
}

/// Build a test `ServerConfig` rooted at `dir`.
pub fn test_config(dir: &Path) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        static_dir: dir.join("dist"),
        data_dir: dir.join("config"),
        poll_interval: Duration::from_millis(50),
        builder_bin: "fake-mktorrent".to_string(),
    }
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

pub async fn send(app: &TestApp, method: Method, uri: &str, body: Option<serde_json::Value>) -> Response<Body> {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(json) => builder
            .header("content-type", "application/json")
            .body(Body::from(json.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    app.router.clone().oneshot(request).await.unwrap()
}

pub async fn get(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::GET, uri, None).await
}

pub async fn post(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::POST, uri, None).await
}

pub async fn post_json(app: &TestApp, uri: &str, body: serde_json::Value) -> Response<Body> {
    send(app, Method::POST, uri, Some(body)).await
}

pub async fn delete(app: &TestApp, uri: &str) -> Response<Body> {
    send(app, Method::DELETE, uri, None).await
}

pub async fn body_bytes(response: Response<Body>) -> Vec<u8> {
    response
        .into_body()
        .collect()
        .await
        .unwrap()
        .to_bytes()
        .to_vec()
}

pub async fn body_json(response: Response<Body>) -> serde_json::Value {
    serde_json::from_slice(&body_bytes(response).await).unwrap()
}

/// Percent-encode a value for use in a query string.
pub fn encode_query(value: &str) -> String {
    value
        .bytes()
        .map(|b| {
            if b.is_ascii_alphanumeric() || b"-._~/".contains(&b) {
                (b as char).to_string()
            } else {
                format!("%{b:02X}")
            }
        })
        .collect()
}
