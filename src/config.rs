//! Process configuration.
//!
//! Filesystem roots and the upload size cap, resolved from the environment
//! with the historical defaults.

use crate::pipeline::PipelineConfig;
use std::path::PathBuf;

/// Default cap on accepted archive size (100 MB).
pub const DEFAULT_MAX_ARCHIVE_SIZE: u64 = 100 * 1024 * 1024;

/// Resolved process configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// Root under which archives are extracted
    pub extract_root: PathBuf,
    /// Root under which exported image archives land
    pub output_root: PathBuf,
    /// Maximum accepted archive size in bytes
    pub max_archive_size: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            extract_root: PathBuf::from("extracted"),
            output_root: PathBuf::from("output"),
            max_archive_size: DEFAULT_MAX_ARCHIVE_SIZE,
        }
    }
}

impl Config {
    /// Loads configuration from `MCPSHIP_*` environment variables, falling
    /// back to defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            extract_root: std::env::var_os("MCPSHIP_EXTRACT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.extract_root),
            output_root: std::env::var_os("MCPSHIP_OUTPUT_DIR")
                .map(PathBuf::from)
                .unwrap_or(defaults.output_root),
            max_archive_size: std::env::var("MCPSHIP_MAX_ARCHIVE_SIZE")
                .ok()
                .and_then(|raw| match raw.parse() {
                    Ok(size) => Some(size),
                    Err(_) => {
                        log::warn!("ignoring unparsable MCPSHIP_MAX_ARCHIVE_SIZE: {raw}");
                        None
                    }
                })
                .unwrap_or(defaults.max_archive_size),
        }
    }

    /// The pipeline view of this configuration.
    pub fn pipeline_config(&self) -> PipelineConfig {
        PipelineConfig {
            extract_root: self.extract_root.clone(),
            output_root: self.output_root.clone(),
        }
    }
}
