//! Error types for archive-to-image pipeline operations.
//!
//! This module defines all error types with actionable error messages and recovery suggestions.

use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, ShipError>;

/// Pipeline stages, in execution order.
///
/// Every failure surfaced by [`Pipeline::run`](crate::pipeline::Pipeline::run)
/// is tagged with the stage it occurred in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Removing and recreating the working directory
    Cleaning,
    /// Unpacking the archive into the working directory
    Extracting,
    /// Finding and validating the project manifest
    Locating,
    /// Generating the build recipe
    Generating,
    /// Writing the recipe into the manifest directory
    Writing,
    /// Building the container image
    Building,
    /// Exporting the image archive
    Exporting,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Cleaning => "cleaning",
            Stage::Extracting => "extracting",
            Stage::Locating => "locating",
            Stage::Generating => "generating",
            Stage::Writing => "writing",
            Stage::Building => "building",
            Stage::Exporting => "exporting",
        };
        f.write_str(name)
    }
}

/// Main error type for all pipeline operations
#[derive(Error, Debug)]
pub enum ShipError {
    /// A pipeline step failed; carries the step name and the underlying cause
    #[error("{stage} failed: {source}")]
    Stage {
        /// Pipeline stage that failed
        stage: Stage,
        /// Underlying error
        #[source]
        source: Box<ShipError>,
    },

    /// Working-directory preparation errors
    #[error("Setup error: {0}")]
    Setup(#[from] SetupError),

    /// Archive extraction errors
    #[error("Extraction error: {0}")]
    Extract(#[from] ExtractError),

    /// Manifest discovery and validation errors
    #[error("Manifest error: {0}")]
    Manifest(#[from] ManifestError),

    /// Container engine errors
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic errors from anyhow
    #[error("{0}")]
    Anyhow(#[from] anyhow::Error),
}

/// Working-directory preparation errors
#[derive(Error, Debug)]
pub enum SetupError {
    /// Filesystem operation failed while preparing or populating the working tree
    #[error("{context} {path}: {source}")]
    Fs {
        /// Operation being performed (e.g., "creating work directory")
        context: &'static str,
        /// Path that was being accessed
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Archive name yields no usable working-directory name
    #[error("cannot derive a working directory from archive name '{name}'")]
    BadArchiveName {
        /// The offending archive name
        name: String,
    },
}

/// Archive extraction errors
#[derive(Error, Debug)]
pub enum ExtractError {
    /// Archive bytes could not be read as a ZIP entry list
    #[error("failed to read archive: {0}")]
    Archive(#[from] async_zip::error::ZipError),

    /// Entry path would escape the destination directory
    #[error("unsafe entry path in archive: {path}")]
    UnsafePath {
        /// The offending entry path, verbatim from the archive
        path: String,
    },

    /// Entry content could not be decompressed
    #[error("failed to read entry {path}: {source}")]
    EntryRead {
        /// Entry path within the archive
        path: String,
        /// The underlying error
        source: std::io::Error,
    },

    /// Filesystem write failed mid-extraction
    #[error("{context} {path}: {source}")]
    Fs {
        /// Operation being performed (e.g., "writing file")
        context: &'static str,
        /// Path that was being written
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },
}

/// Manifest discovery and validation errors
#[derive(Error, Debug)]
pub enum ManifestError {
    /// No manifest file anywhere in the extracted tree
    #[error("mcp.json not found in the extracted directory {root}")]
    NotFound {
        /// Root of the searched tree
        root: PathBuf,
    },

    /// Directory traversal failed
    #[error("error walking directory: {0}")]
    Walk(#[from] walkdir::Error),

    /// Manifest file could not be read
    #[error("failed to read {path}: {source}")]
    Read {
        /// Path of the manifest file
        path: PathBuf,
        /// The underlying I/O error
        source: std::io::Error,
    },

    /// Manifest file is not valid JSON
    #[error("failed to parse {path}: {source}")]
    Malformed {
        /// Path of the manifest file
        path: PathBuf,
        /// The underlying decode error
        source: serde_json::Error,
    },

    /// Manifest decoded but a required field is absent or empty
    #[error("mcp.json is missing required '{field}' field")]
    MissingField {
        /// Dotted path of the missing field
        field: &'static str,
    },
}

/// Container engine errors
#[derive(Error, Debug)]
pub enum EngineError {
    /// Engine binary not present on this machine
    #[error("docker command not found: {0}")]
    NotInstalled(#[from] which::Error),

    /// Engine binary exists but the daemon did not answer
    #[error("docker daemon is not responding (exit code: {exit_code})")]
    DaemonUnavailable {
        /// Exit code of the probe command
        exit_code: i32,
    },

    /// Daemon liveness probe did not return in time
    #[error("docker daemon check timed out after {seconds} seconds")]
    DaemonTimeout {
        /// Probe timeout that elapsed
        seconds: u64,
    },

    /// Engine process could not be spawned or awaited
    #[error("failed to run {command}: {source}")]
    Spawn {
        /// Command that failed to execute
        command: String,
        /// The underlying error
        source: std::io::Error,
    },

    /// Image build failed; carries the engine's combined output verbatim
    #[error("docker build failed for '{tag}':\n{log}")]
    BuildFailed {
        /// Image tag being built
        tag: String,
        /// Raw combined stdout and stderr of the build
        log: String,
    },

    /// Image export failed; carries the engine's combined output verbatim
    #[error("docker save failed for '{tag}':\n{log}")]
    ExportFailed {
        /// Image tag being exported
        tag: String,
        /// Raw combined stdout and stderr of the export
        log: String,
    },

    /// Image load failed; carries the engine's combined output verbatim
    #[error("docker load failed for {path}:\n{log}")]
    LoadFailed {
        /// Archive being loaded
        path: PathBuf,
        /// Raw combined stdout and stderr of the load
        log: String,
    },
}

impl ShipError {
    /// Wrap an error with the pipeline stage it occurred in.
    pub fn at_stage(stage: Stage, source: impl Into<ShipError>) -> Self {
        ShipError::Stage {
            stage,
            source: Box::new(source.into()),
        }
    }

    /// The pipeline stage this error occurred in, if it was surfaced by a run.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            ShipError::Stage { stage, .. } => Some(*stage),
            _ => None,
        }
    }

    /// Get actionable recovery suggestions for this error
    pub fn recovery_suggestions(&self) -> Vec<String> {
        match self {
            ShipError::Stage { source, .. } => source.recovery_suggestions(),
            ShipError::Engine(EngineError::NotInstalled(_)) => vec![
                "Install Docker: https://docs.docker.com/get-docker/".to_string(),
                "Ensure the docker binary is on your PATH".to_string(),
            ],
            ShipError::Engine(
                EngineError::DaemonUnavailable { .. } | EngineError::DaemonTimeout { .. },
            ) => vec![
                "Start the Docker daemon and try again".to_string(),
                "If Docker is running, check: docker ps".to_string(),
            ],
            ShipError::Extract(ExtractError::Archive(_)) => vec![
                "Verify the file is a valid .zip archive".to_string(),
                "Re-create the archive and upload it again".to_string(),
            ],
            ShipError::Manifest(ManifestError::NotFound { .. }) => vec![
                "Add an mcp.json file to the project root before archiving".to_string(),
            ],
            ShipError::Manifest(ManifestError::MissingField { field }) => vec![format!(
                "Add a non-empty '{}' field to mcp.json",
                field
            )],
            _ => vec!["Check the error message above for specific details".to_string()],
        }
    }
}
