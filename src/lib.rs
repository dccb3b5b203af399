//! # MCP Ship
//!
//! Turns an uploaded project archive into a runnable Docker image artifact.
//!
//! The pipeline unpacks the archive (flattening a single enclosing folder),
//! locates the project's `mcp.json` manifest, synthesizes a Dockerfile from
//! its run specification, and drives Docker to build and export the image.
//!
//! ## Usage
//!
//! ```bash
//! mcpship build my-project.zip    # extract, build, and export the image
//! mcpship pull my-project         # load a previously exported image
//! ```
//!
//! The library surface mirrors the pipeline stages: [`archive`] extraction,
//! [`manifest`] discovery, [`recipe`] generation, and the [`pipeline`]
//! orchestrator over a pluggable [`engine::BuildEngine`].

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

// Core modules
pub mod archive;
pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod manifest;
pub mod pipeline;
pub mod recipe;

// Re-export main types for public API
pub use archive::ExtractedEntry;
pub use config::Config;
pub use engine::{BuildEngine, DockerEngine};
pub use error::{
    EngineError, ExtractError, ManifestError, Result, SetupError, ShipError, Stage,
};
pub use manifest::{ProjectManifest, Repository, RunSpec};
pub use pipeline::{Pipeline, PipelineConfig, PipelineResult};
