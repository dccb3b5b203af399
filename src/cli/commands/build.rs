//! The `build` command: archive in, image artifact out.

use crate::cli::OutputManager;
use crate::config::Config;
use crate::engine::{BuildEngine, DockerEngine};
use crate::error::Result;
use crate::pipeline::Pipeline;
use std::path::Path;

/// Runs the full pipeline against an archive on disk.
///
/// The size cap is enforced before any bytes are read, mirroring the upload
/// boundary this command stands in for.
pub async fn execute_build(
    archive: &Path,
    config: &Config,
    output: &OutputManager,
) -> Result<i32> {
    let archive_name = match archive.file_name().and_then(|n| n.to_str()) {
        Some(name) => name.to_string(),
        None => {
            output.error(&format!("Not a usable archive path: {}", archive.display()));
            return Ok(1);
        }
    };

    let metadata = match tokio::fs::metadata(archive).await {
        Ok(metadata) => metadata,
        Err(e) => {
            output.error(&format!("Cannot read archive {}: {}", archive.display(), e));
            return Ok(1);
        }
    };
    if metadata.len() > config.max_archive_size {
        output.error(&format!(
            "Archive {} is {} bytes, over the {} byte limit",
            archive.display(),
            metadata.len(),
            config.max_archive_size
        ));
        return Ok(1);
    }

    let archive_bytes = tokio::fs::read(archive).await?;

    let engine = DockerEngine::discover()?;
    engine.availability().await?;

    output.progress(&format!("Processing {}...", archive_name));
    let pipeline = Pipeline::new(config.pipeline_config(), engine);
    let result = pipeline.run(&archive_bytes, &archive_name).await?;

    output.success(&result.message);
    output.indent(&format!("Image tag:  {}", result.image_tag));
    output.indent(&format!("Recipe:     {}", result.recipe_path.display()));
    output.indent(&format!("Artifact:   {}", result.artifact_path.display()));
    Ok(0)
}
