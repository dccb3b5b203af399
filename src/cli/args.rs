//! Command line argument parsing and validation.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Turn project archives into runnable Docker image artifacts
#[derive(Parser, Debug)]
#[command(
    name = "mcpship",
    version,
    about = "Turn project archives into runnable Docker image artifacts",
    long_about = "Unpack a project archive, find its mcp.json manifest, generate a \
Dockerfile, and drive Docker to build and export the image.

Usage:
  mcpship build my-project.zip
  mcpship pull my-project"
)]
pub struct Args {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available subcommands
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Build and export a container image from a project archive
    Build {
        /// Path to the project archive (.zip)
        #[arg(value_name = "ARCHIVE")]
        archive: PathBuf,
    },
    /// Load a previously exported image into the local engine
    Pull {
        /// Image name or path to an exported .tar file
        #[arg(value_name = "IMAGE")]
        image: String,
    },
}

impl Args {
    /// Parse command line arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Validate arguments for consistency
    pub fn validate(&self) -> Result<(), String> {
        match &self.command {
            Command::Build { archive } => {
                if archive.as_os_str().is_empty() {
                    return Err("Archive path is required".to_string());
                }
            }
            Command::Pull { image } => {
                if image.is_empty() {
                    return Err("Image name is required".to_string());
                }
            }
        }
        Ok(())
    }
}

impl Command {
    /// Name of the subcommand, for error reporting
    pub fn name(&self) -> &'static str {
        match self {
            Command::Build { .. } => "build",
            Command::Pull { .. } => "pull",
        }
    }
}
