//! Container build engine boundary.
//!
//! The pipeline drives an external engine through the [`BuildEngine`] trait;
//! [`DockerEngine`] is the production implementation, a thin wrapper around
//! the `docker` CLI. Keeping the seam here lets tests run the full pipeline
//! against an in-memory engine with no daemon present.

use crate::error::EngineError;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tokio::time::timeout;

/// Timeout for the daemon liveness probe.
///
/// A responsive daemon answers `docker info` near-instantly; builds and
/// exports themselves run unbounded.
pub const DAEMON_PROBE_TIMEOUT: Duration = Duration::from_secs(5);

/// Operations the pipeline needs from a container engine.
///
/// All calls are blocking from the pipeline's point of view: each resolves
/// fully before the next stage starts, and build/export/load have no
/// enforced timeout.
#[allow(async_fn_in_trait)]
pub trait BuildEngine {
    /// Checks that the engine is installed and its daemon is answering.
    async fn availability(&self) -> Result<(), EngineError>;

    /// Builds an image tagged `tag` from the recipe in `context_dir`.
    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError>;

    /// Exports the image `tag` to an archive at `output_path`.
    async fn export(&self, tag: &str, output_path: &Path) -> Result<(), EngineError>;

    /// Loads a previously exported image archive; returns the engine's
    /// output text (which names the loaded image).
    async fn load(&self, archive_path: &Path) -> Result<String, EngineError>;
}

/// Docker CLI implementation of [`BuildEngine`].
#[derive(Debug, Clone)]
pub struct DockerEngine {
    binary: PathBuf,
}

impl DockerEngine {
    /// Locates the `docker` binary on the current `PATH`.
    pub fn discover() -> Result<Self, EngineError> {
        let binary = which::which("docker")?;
        log::debug!("using container engine at {}", binary.display());
        Ok(Self { binary })
    }

    /// Runs a docker subcommand to completion, capturing combined output.
    ///
    /// On a non-zero exit the raw stdout and stderr are handed back to the
    /// caller so they can be preserved verbatim in the surfaced error.
    async fn run_captured(
        &self,
        args: &[&str],
        current_dir: Option<&Path>,
    ) -> Result<std::result::Result<String, String>, EngineError> {
        let mut command = Command::new(&self.binary);
        command.args(args);
        if let Some(dir) = current_dir {
            command.current_dir(dir);
        }
        let output = command
            .output()
            .await
            .map_err(|source| EngineError::Spawn {
                command: format!("docker {}", args.join(" ")),
                source,
            })?;

        let mut log_text = String::from_utf8_lossy(&output.stdout).into_owned();
        log_text.push_str(&String::from_utf8_lossy(&output.stderr));

        if output.status.success() {
            Ok(Ok(log_text))
        } else {
            Ok(Err(log_text))
        }
    }
}

impl BuildEngine for DockerEngine {
    async fn availability(&self) -> Result<(), EngineError> {
        let status_result = timeout(
            DAEMON_PROBE_TIMEOUT,
            Command::new(&self.binary)
                .arg("info")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status(),
        )
        .await;

        match status_result {
            Err(_) => Err(EngineError::DaemonTimeout {
                seconds: DAEMON_PROBE_TIMEOUT.as_secs(),
            }),
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(EngineError::DaemonUnavailable {
                exit_code: status.code().unwrap_or(-1),
            }),
            Ok(Err(source)) => Err(EngineError::Spawn {
                command: "docker info".to_string(),
                source,
            }),
        }
    }

    async fn build(&self, context_dir: &Path, tag: &str) -> Result<(), EngineError> {
        log::info!("building image '{}' from {}", tag, context_dir.display());
        match self
            .run_captured(&["build", "-t", tag, "."], Some(context_dir))
            .await?
        {
            Ok(_) => Ok(()),
            Err(log) => Err(EngineError::BuildFailed {
                tag: tag.to_string(),
                log,
            }),
        }
    }

    async fn export(&self, tag: &str, output_path: &Path) -> Result<(), EngineError> {
        log::info!("saving image '{}' to {}", tag, output_path.display());
        let path_arg = output_path.display().to_string();
        match self
            .run_captured(&["save", "-o", &path_arg, tag], None)
            .await?
        {
            Ok(_) => Ok(()),
            Err(log) => Err(EngineError::ExportFailed {
                tag: tag.to_string(),
                log,
            }),
        }
    }

    async fn load(&self, archive_path: &Path) -> Result<String, EngineError> {
        log::info!("loading image from {}", archive_path.display());
        let path_arg = archive_path.display().to_string();
        match self.run_captured(&["load", "-i", &path_arg], None).await? {
            Ok(log) => Ok(log),
            Err(log) => Err(EngineError::LoadFailed {
                path: archive_path.to_path_buf(),
                log,
            }),
        }
    }
}
