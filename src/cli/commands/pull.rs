//! The `pull` command: load a previously exported image archive.

use crate::cli::OutputManager;
use crate::config::Config;
use crate::engine::{BuildEngine, DockerEngine};
use crate::error::Result;
use std::path::PathBuf;

/// Loads an exported image into the local engine.
///
/// Accepts either a literal `.tar` path or an image name; names are resolved
/// against the output directory first, then the current directory.
pub async fn execute_pull(image: &str, config: &Config, output: &OutputManager) -> Result<i32> {
    let engine = DockerEngine::discover()?;
    engine.availability().await?;

    let archive_path = match resolve_archive(image, config) {
        Some(path) => path,
        None => {
            output.error(&format!("Could not find an exported archive for '{}'", image));
            output.indent(&format!(
                "Looked for: {} and {}.tar",
                config.output_root.join(format!("{image}.tar")).display(),
                image
            ));
            return Ok(1);
        }
    };

    output.progress(&format!("Loading image from {}...", archive_path.display()));
    let engine_output = engine.load(&archive_path).await?;

    output.success("Image loaded successfully");
    if let Some(loaded) = loaded_image_name(&engine_output) {
        output.indent(&format!("Image: {}", loaded));
    }
    Ok(0)
}

/// Resolves an image argument to an archive path on disk.
fn resolve_archive(image: &str, config: &Config) -> Option<PathBuf> {
    if image.ends_with(".tar") {
        return Some(PathBuf::from(image));
    }
    let in_output = config.output_root.join(format!("{image}.tar"));
    if in_output.is_file() {
        return Some(in_output);
    }
    let in_cwd = PathBuf::from(format!("{image}.tar"));
    if in_cwd.is_file() {
        return Some(in_cwd);
    }
    None
}

/// Extracts the loaded image name from the engine's output.
fn loaded_image_name(engine_output: &str) -> Option<&str> {
    let rest = engine_output.split("Loaded image:").nth(1)?;
    let name = rest.trim().lines().next()?.trim();
    (!name.is_empty()).then_some(name)
}
