//! Build recipe generation.
//!
//! Maps a manifest's run specification onto a Dockerfile through an ordered
//! rule table evaluated first-match-wins. Unrecognized runtimes degrade to a
//! generic base image rather than erroring, so generation never fails.

use crate::manifest::{ProjectManifest, RunSpec};
use std::path::Path;

/// File name the generated recipe is written under.
pub const RECIPE_FILENAME: &str = "Dockerfile";

/// Runtime profile selected for a run command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RuntimeProfile {
    /// Base image the recipe starts from
    pub base_image: &'static str,
    /// Dependency descriptor file probed for next to the manifest
    pub dependency_file: Option<&'static str>,
    /// Install step emitted when the descriptor is present
    pub install_command: Option<&'static str>,
}

const NODE: RuntimeProfile = RuntimeProfile {
    base_image: "node:18-slim",
    dependency_file: Some("package.json"),
    install_command: Some("npm install"),
};

const PYTHON: RuntimeProfile = RuntimeProfile {
    base_image: "python:3.11-slim",
    dependency_file: Some("requirements.txt"),
    install_command: Some("pip install --no-cache-dir -r requirements.txt"),
};

const GENERIC: RuntimeProfile = RuntimeProfile {
    base_image: "debian:bookworm-slim",
    dependency_file: None,
    install_command: None,
};

/// Ordered rule table: the first rule whose command list contains the run
/// command decides the profile. Adding a runtime means adding a row.
const RULES: &[(&[&str], RuntimeProfile)] = &[
    (&["node"], NODE),
    (&["python", "python3"], PYTHON),
];

/// Resolves the runtime profile for a run command.
pub fn profile_for(command: &str) -> RuntimeProfile {
    RULES
        .iter()
        .find(|(commands, _)| commands.contains(&command))
        .map(|(_, profile)| *profile)
        .unwrap_or(GENERIC)
}

/// Generates the build recipe for a manifest.
///
/// The only filesystem access is a single existence probe for the profile's
/// dependency descriptor in `manifest_dir`; everything else is a pure
/// function of the manifest, so identical input always yields byte-identical
/// text.
pub fn generate(manifest: &ProjectManifest, manifest_dir: &Path) -> String {
    let profile = profile_for(&manifest.run.command);
    let with_install = profile
        .dependency_file
        .is_some_and(|file| manifest_dir.join(file).is_file());
    render(&manifest.run, &profile, with_install)
}

/// Renders the recipe text. Pure; no I/O.
fn render(run: &RunSpec, profile: &RuntimeProfile, with_install: bool) -> String {
    let mut recipe = String::new();
    recipe.push_str(&format!("FROM {}\n", profile.base_image));
    recipe.push_str("\nWORKDIR /app\n");
    recipe.push_str("\nCOPY . .\n");
    if with_install {
        if let Some(install) = profile.install_command {
            recipe.push_str(&format!("\nRUN {}\n", install));
        }
    }
    if run.port != 0 {
        recipe.push_str(&format!("\nEXPOSE {}\n", run.port));
    }
    recipe.push_str(&format!("\nCMD [{}]\n", exec_form(run)));
    recipe
}

/// Encodes the start command in exec (non-shell) form.
///
/// Each token is JSON-quoted so arguments survive verbatim and are never
/// re-split by a shell.
fn exec_form(run: &RunSpec) -> String {
    std::iter::once(&run.command)
        .chain(run.args.iter())
        .map(|token| {
            serde_json::to_string(token).unwrap_or_else(|_| format!("\"{}\"", token))
        })
        .collect::<Vec<_>>()
        .join(", ")
}
