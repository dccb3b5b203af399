//! Pipeline orchestration.
//!
//! Sequences the archive-to-image pipeline: clean the working directory,
//! extract the archive, locate the manifest, generate and write the recipe,
//! then delegate building and exporting to the container engine. Stages run
//! strictly in order; the first failure is surfaced with its stage name and
//! nothing is retried.

use crate::archive;
use crate::engine::BuildEngine;
use crate::error::{Result, SetupError, ShipError, Stage};
use crate::manifest::{self, ProjectManifest};
use crate::recipe;
use std::path::{Path, PathBuf};

/// Filesystem roots the pipeline works under.
///
/// Explicit configuration instead of hard-coded relative directories, so
/// runs are free of working-directory coupling.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Root under which per-archive working directories are created
    pub extract_root: PathBuf,
    /// Root under which exported image archives are written
    pub output_root: PathBuf,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            extract_root: PathBuf::from("extracted"),
            output_root: PathBuf::from("output"),
        }
    }
}

/// Outcome of a successful pipeline run.
#[derive(Debug, Clone)]
pub struct PipelineResult {
    /// Absolute path of the extraction working directory
    pub extract_dir: PathBuf,
    /// Absolute path of the written recipe file
    pub recipe_path: PathBuf,
    /// Image tag derived from the manifest name
    pub image_tag: String,
    /// Absolute path of the exported image archive
    pub artifact_path: PathBuf,
    /// The parsed project manifest
    pub manifest: ProjectManifest,
    /// Whether the run succeeded
    pub success: bool,
    /// Human-readable summary naming the archive and artifact
    pub message: String,
}

/// The archive-to-image pipeline.
///
/// One instance can serve many runs; each run owns its working directory for
/// the duration of the invocation. Two concurrent runs with the same archive
/// name race on that directory, so callers must serialize same-name requests.
#[derive(Debug)]
pub struct Pipeline<E> {
    config: PipelineConfig,
    engine: E,
}

impl<E: BuildEngine> Pipeline<E> {
    /// Creates a pipeline over the given engine.
    pub fn new(config: PipelineConfig, engine: E) -> Self {
        Self { config, engine }
    }

    /// Runs the full pipeline for one uploaded archive.
    ///
    /// `archive_name` is the upload's file name; its stem names the working
    /// directory, the exported artifact, and appears in the result message.
    pub async fn run(&self, archive_bytes: &[u8], archive_name: &str) -> Result<PipelineResult> {
        // Cleaning
        let stem = archive_stem(archive_name)
            .map_err(|e| ShipError::at_stage(Stage::Cleaning, e))?;
        let work_dir = self.config.extract_root.join(&stem);
        self.clean_work_dir(&work_dir)
            .await
            .map_err(|e| ShipError::at_stage(Stage::Cleaning, e))?;

        // Extracting
        let entries = archive::extract(archive_bytes, &work_dir)
            .await
            .map_err(|e| ShipError::at_stage(Stage::Extracting, e))?;
        log::info!("extracted {} files from {}", entries.len(), archive_name);

        // Locating
        let (manifest, manifest_dir) = manifest::locate(&work_dir)
            .map_err(|e| ShipError::at_stage(Stage::Locating, e))?;
        log::debug!("manifest for '{}' found in {}", manifest.name, manifest_dir.display());

        // Generating
        let recipe_text = recipe::generate(&manifest, &manifest_dir);

        // Writing
        let recipe_path = manifest_dir.join(recipe::RECIPE_FILENAME);
        tokio::fs::write(&recipe_path, &recipe_text)
            .await
            .map_err(|source| {
                ShipError::at_stage(
                    Stage::Writing,
                    SetupError::Fs {
                        context: "writing recipe",
                        path: recipe_path.clone(),
                        source,
                    },
                )
            })?;

        // Building
        let image_tag = manifest.name.to_lowercase();
        self.engine
            .build(&manifest_dir, &image_tag)
            .await
            .map_err(|e| ShipError::at_stage(Stage::Building, e))?;

        // Exporting
        let artifact_name = format!("{}.tar", stem);
        let artifact_path = self.config.output_root.join(&artifact_name);
        tokio::fs::create_dir_all(&self.config.output_root)
            .await
            .map_err(|source| {
                ShipError::at_stage(
                    Stage::Exporting,
                    SetupError::Fs {
                        context: "creating output directory",
                        path: self.config.output_root.clone(),
                        source,
                    },
                )
            })?;
        self.engine
            .export(&image_tag, &artifact_path)
            .await
            .map_err(|e| ShipError::at_stage(Stage::Exporting, e))?;

        let message = format!(
            "Successfully processed {}. Image saved as {}",
            archive_name, artifact_name
        );
        log::info!("{}", message);

        Ok(PipelineResult {
            extract_dir: absolute(&work_dir)?,
            recipe_path: absolute(&recipe_path)?,
            image_tag,
            artifact_path: absolute(&artifact_path)?,
            manifest,
            success: true,
            message,
        })
    }

    /// Removes any stale working directory from a prior run, then recreates it.
    async fn clean_work_dir(&self, work_dir: &Path) -> std::result::Result<(), SetupError> {
        if work_dir.exists() {
            tokio::fs::remove_dir_all(work_dir)
                .await
                .map_err(|source| SetupError::Fs {
                    context: "cleaning work directory",
                    path: work_dir.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::create_dir_all(work_dir)
            .await
            .map_err(|source| SetupError::Fs {
                context: "creating work directory",
                path: work_dir.to_path_buf(),
                source,
            })
    }
}

/// Derives the working-directory name from the archive name by stripping its
/// extension.
fn archive_stem(archive_name: &str) -> std::result::Result<String, SetupError> {
    Path::new(archive_name)
        .file_stem()
        .and_then(|stem| stem.to_str())
        .filter(|stem| !stem.is_empty())
        .map(str::to_string)
        .ok_or_else(|| SetupError::BadArchiveName {
            name: archive_name.to_string(),
        })
}

fn absolute(path: &Path) -> Result<PathBuf> {
    Ok(std::path::absolute(path)?)
}
