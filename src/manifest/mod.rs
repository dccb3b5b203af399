//! Project manifest discovery and validation.
//!
//! The manifest (`mcp.json`) declares how a project is run. This module finds
//! it inside an extracted tree, resolves ambiguity when duplicates exist, and
//! maps it onto [`ProjectManifest`].

use crate::error::ManifestError;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Manifest file name searched for in the extracted tree.
pub const MANIFEST_FILENAME: &str = "mcp.json";

/// Parsed project manifest.
///
/// Only `name` and `run.command` are required; every other field takes its
/// zero value when absent. Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct ProjectManifest {
    /// Project name; also the source of the derived image tag
    #[serde(default)]
    pub name: String,
    /// Project version
    #[serde(default)]
    pub version: String,
    /// Free-text description
    #[serde(default)]
    pub description: String,
    /// Author
    #[serde(default)]
    pub author: String,
    /// License identifier or text
    #[serde(default)]
    pub license: String,
    /// Keywords, order preserved
    #[serde(default)]
    pub keywords: Vec<String>,
    /// Source repository
    #[serde(default)]
    pub repository: Repository,
    /// How to run the project
    #[serde(default)]
    pub run: RunSpec,
}

/// Source repository reference.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct Repository {
    /// Repository type (e.g., "git")
    #[serde(default, rename = "type")]
    pub kind: String,
    /// Repository URL
    #[serde(default)]
    pub url: String,
}

/// Run specification for the project.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
pub struct RunSpec {
    /// Executable to start the project with
    #[serde(default)]
    pub command: String,
    /// Arguments passed to the command, order preserved
    #[serde(default)]
    pub args: Vec<String>,
    /// Port the project listens on; 0 means none declared
    #[serde(default)]
    pub port: u16,
}

impl ProjectManifest {
    /// Checks that the required fields are present and non-empty.
    pub fn validate(&self) -> Result<(), ManifestError> {
        if self.name.is_empty() {
            return Err(ManifestError::MissingField { field: "name" });
        }
        if self.run.command.is_empty() {
            return Err(ManifestError::MissingField { field: "run.command" });
        }
        Ok(())
    }
}

/// Finds and parses the manifest within an extracted tree.
///
/// Walks the whole tree depth-first with siblings visited in lexicographic
/// order, so results do not depend on incidental filesystem ordering. When
/// multiple manifests exist, the one with the fewest path segments relative
/// to `root` wins; exact depth ties keep the first one seen.
///
/// Returns the manifest together with the directory containing it: the
/// build context used downstream, which may be a strict subdirectory of
/// `root`.
pub fn locate(root: &Path) -> Result<(ProjectManifest, PathBuf), ManifestError> {
    let mut winner: Option<(usize, PathBuf)> = None;

    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }
        if entry.file_name().to_str() != Some(MANIFEST_FILENAME) {
            continue;
        }
        let depth = entry.depth();
        let closer = match &winner {
            None => true,
            Some((best, _)) => depth < *best,
        };
        if closer {
            winner = Some((depth, entry.into_path()));
        }
    }

    let (_, path) = winner.ok_or_else(|| ManifestError::NotFound {
        root: root.to_path_buf(),
    })?;

    let contents = std::fs::read(&path).map_err(|source| ManifestError::Read {
        path: path.clone(),
        source,
    })?;
    let manifest: ProjectManifest =
        serde_json::from_slice(&contents).map_err(|source| ManifestError::Malformed {
            path: path.clone(),
            source,
        })?;
    manifest.validate()?;

    let dir = path
        .parent()
        .map(Path::to_path_buf)
        .unwrap_or_else(|| root.to_path_buf());
    Ok((manifest, dir))
}
