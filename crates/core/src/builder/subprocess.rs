//! Subprocess management for the creation tool.
//!
//! [`run_command`] spawns a prepared [`Command`], captures stdout/stderr, and
//! races the child against both a timeout and a cancellation token. The child
//! is killed on timeout, on cancellation, and whenever the future is dropped.

use std::process::Stdio;
use std::time::{Duration, Instant};

use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio_util::sync::CancellationToken;

use super::executor::BuildError;

/// Maximum stdout or stderr size captured per stream (1 MiB).
const MAX_OUTPUT_BYTES: u64 = 1024 * 1024;

/// Captured output of a process that exited successfully.
#[derive(Debug, Clone)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    pub duration_ms: u64,
}

/// Spawn `cmd`, wait for it, and map its outcome to a [`BuildError`].
///
/// A non-zero exit becomes [`BuildError::ExecutionFailed`] carrying the
/// trimmed stderr. A program that cannot be spawned because it does not
/// exist becomes [`BuildError::BinaryNotFound`].
pub async fn run_command(
    cmd: &mut Command,
    timeout: Duration,
    cancel: &CancellationToken,
) -> Result<CommandOutput, BuildError> {
    cmd.stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true);

    let program = cmd.as_std().get_program().to_string_lossy().into_owned();
    let start = Instant::now();

    let mut child = cmd.spawn().map_err(|e| match e.kind() {
        std::io::ErrorKind::NotFound => BuildError::BinaryNotFound(program.clone()),
        _ => BuildError::Io(e),
    })?;

    let stdout_task = tokio::spawn(read_stream(child.stdout.take()));
    let stderr_task = tokio::spawn(read_stream(child.stderr.take()));

    let outcome = tokio::select! {
        waited = tokio::time::timeout(timeout, child.wait()) => Some(waited),
        _ = cancel.cancelled() => None,
    };
    let elapsed_ms = start.elapsed().as_millis() as u64;

    let status = match outcome {
        Some(Ok(Ok(status))) => status,
        Some(Ok(Err(e))) => return Err(BuildError::Io(e)),
        Some(Err(_elapsed)) => {
            stop(&mut child, &program, stdout_task, stderr_task).await;
            return Err(BuildError::Timeout { elapsed_ms });
        }
        None => {
            stop(&mut child, &program, stdout_task, stderr_task).await;
            return Err(BuildError::Cancelled);
        }
    };

    let stdout = String::from_utf8_lossy(&stdout_task.await.unwrap_or_default()).into_owned();
    let stderr = String::from_utf8_lossy(&stderr_task.await.unwrap_or_default()).into_owned();

    if !status.success() {
        return Err(BuildError::ExecutionFailed {
            exit_code: status.code().unwrap_or(-1),
            stderr: stderr.trim().to_string(),
        });
    }

    Ok(CommandOutput {
        stdout,
        stderr,
        duration_ms: elapsed_ms,
    })
}

/// Kill and reap the child; abandon its output readers.
async fn stop(
    child: &mut tokio::process::Child,
    program: &str,
    stdout_task: tokio::task::JoinHandle<Vec<u8>>,
    stderr_task: tokio::task::JoinHandle<Vec<u8>>,
) {
    if let Err(e) = child.kill().await {
        tracing::warn!(program, error = %e, "Failed to kill child process");
    }
    // Grandchildren may still hold the pipes open.
    stdout_task.abort();
    stderr_task.abort();
}

/// Read an entire output stream into a byte buffer, capped at [`MAX_OUTPUT_BYTES`].
async fn read_stream<R: AsyncRead + Unpin>(handle: Option<R>) -> Vec<u8> {
    let mut buf = Vec::new();
    if let Some(h) = handle {
        let _ = h.take(MAX_OUTPUT_BYTES).read_to_end(&mut buf).await;
    }
    buf
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
