//! Builder capability and shared types.
//!
//! Defines [`ArtifactBuilder`], the trait the job processor drives, along
//! with [`BuildRequest`], [`BuildOutput`], and [`BuildError`].

use std::path::PathBuf;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

/// Everything needed to produce one artifact.
#[derive(Debug, Clone)]
pub struct BuildRequest {
    /// File or directory the artifact describes.
    pub source: PathBuf,
    /// Where the artifact is written. Replaced if it already exists.
    pub destination: PathBuf,
    /// Announce URL embedded in the artifact.
    pub tracker: String,
    pub private: bool,
    pub comment: Option<String>,
    /// Piece length as a power of two (e.g. `21` for 2 MiB).
    pub piece_size: Option<u8>,
    /// Maximum wall-clock time before the tool is killed.
    pub timeout: Duration,
}

/// Result of a successful build.
#[derive(Debug, Clone)]
pub struct BuildOutput {
    pub artifact: PathBuf,
    /// Wall-clock duration in milliseconds.
    pub duration_ms: u64,
}

/// Errors that can occur while building an artifact.
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    /// The creation tool could not be located or is not executable.
    #[error("Creation tool not found: {0}")]
    BinaryNotFound(String),

    /// The source path does not exist.
    #[error("Source not found: {}", .0.display())]
    SourceMissing(PathBuf),

    /// The tool exceeded its timeout and was killed.
    #[error("Creation timed out after {elapsed_ms}ms")]
    Timeout { elapsed_ms: u64 },

    /// The tool ran but did not produce an artifact.
    #[error("Creation failed with exit code {exit_code}: {stderr}")]
    ExecutionFailed { exit_code: i32, stderr: String },

    /// The build was cancelled while the tool was running.
    #[error("Creation cancelled")]
    Cancelled,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Identity and availability of the underlying tool.
///
/// Object safe, so the HTTP layer can report on whichever builder the
/// processor was started with.
pub trait ToolStatus: Send + Sync {
    /// Name of the underlying tool, as configured.
    fn tool(&self) -> &str;

    /// Whether the tool can currently be invoked.
    fn is_available(&self) -> bool;
}

/// Capability to turn a source path into an artifact file.
///
/// Implementations must honour `cancel`: once it fires, any child process is
/// killed and the call returns [`BuildError::Cancelled`].
pub trait ArtifactBuilder: ToolStatus + 'static {
    fn build(
        &self,
        request: BuildRequest,
        cancel: CancellationToken,
    ) -> impl std::future::Future<Output = Result<BuildOutput, BuildError>> + Send;
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
