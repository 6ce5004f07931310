//! `mktorrent` builder.
//!
//! Invokes the tool directly (not through a shell) as
//! `mktorrent -a <tracker> [-p] [-c <comment>] [-l <exp>] -o <dest> <source>`.
//! Any stale file at the destination is removed first, since the tool refuses
//! to overwrite, and any partial output is removed when a build does not
//! complete.

use std::ffi::OsString;
use std::path::Path;

use tokio_util::sync::CancellationToken;

use super::binary::resolve_binary;
use super::executor::{ArtifactBuilder, BuildError, BuildOutput, BuildRequest, ToolStatus};
use super::subprocess;

/// Default program name looked up on `PATH`.
pub const DEFAULT_BINARY: &str = "mktorrent";

pub struct MktorrentBuilder {
    binary: String,
}

impl MktorrentBuilder {
    /// `binary` is a program name searched on `PATH` or an explicit path.
    pub fn new(binary: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
        }
    }

    /// Command-line arguments for `request`, source last.
    pub fn args(request: &BuildRequest) -> Vec<OsString> {
        let mut args: Vec<OsString> = vec!["-a".into(), request.tracker.clone().into()];
        if request.private {
            args.push("-p".into());
        }
        if let Some(comment) = request.comment.as_deref().filter(|c| !c.trim().is_empty()) {
            args.push("-c".into());
            args.push(comment.into());
        }
        if let Some(exp) = request.piece_size {
            args.push("-l".into());
            args.push(exp.to_string().into());
        }
        args.push("-o".into());
        args.push(request.destination.clone().into_os_string());
        args.push(request.source.clone().into_os_string());
        args
    }
}

impl Default for MktorrentBuilder {
    fn default() -> Self {
        Self::new(DEFAULT_BINARY)
    }
}

impl ToolStatus for MktorrentBuilder {
    fn tool(&self) -> &str {
        &self.binary
    }

    fn is_available(&self) -> bool {
        resolve_binary(&self.binary).is_some()
    }
}

impl ArtifactBuilder for MktorrentBuilder {
    async fn build(
        &self,
        request: BuildRequest,
        cancel: CancellationToken,
    ) -> Result<BuildOutput, BuildError> {
        let program =
            resolve_binary(&self.binary).ok_or_else(|| BuildError::BinaryNotFound(self.binary.clone()))?;

        if !tokio::fs::try_exists(&request.source).await.unwrap_or(false) {
            return Err(BuildError::SourceMissing(request.source));
        }

        remove_if_exists(&request.destination).await?;

        let mut cmd = tokio::process::Command::new(&program);
        cmd.args(Self::args(&request));

        tracing::debug!(
            program = %program.display(),
            source = %request.source.display(),
            destination = %request.destination.display(),
            "Invoking creation tool"
        );

        let result = match subprocess::run_command(&mut cmd, request.timeout, &cancel).await {
            Ok(out) => {
                let written = tokio::fs::try_exists(&request.destination)
                    .await
                    .unwrap_or(false);
                if written {
                    Ok(BuildOutput {
                        artifact: request.destination.clone(),
                        duration_ms: out.duration_ms,
                    })
                } else {
                    Err(BuildError::ExecutionFailed {
                        exit_code: 0,
                        stderr: format!("no artifact written. {}", out.stderr.trim())
                            .trim()
                            .to_string(),
                    })
                }
            }
            Err(e) => Err(e),
        };

        if result.is_err() {
            if let Err(e) = remove_if_exists(&request.destination).await {
                tracing::warn!(
                    destination = %request.destination.display(),
                    error = %e,
                    "Failed to remove partial artifact"
                );
            }
        }
        result
    }
}

async fn remove_if_exists(path: &Path) -> std::io::Result<()> {
    match tokio::fs::remove_file(path).await {
        Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
        _ => Ok(()),
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
