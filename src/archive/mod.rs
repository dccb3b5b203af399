//! Archive extraction for uploaded project archives.
//!
//! Unpacks a ZIP archive from memory into a working directory, flattening a
//! single enclosing top-level folder when the whole archive is wrapped in one.
//!
//! **Security:** Validates paths to prevent traversal attacks. Only extracts files within the
//! destination directory, rejecting entries with `..` or absolute paths.

use crate::error::ExtractError;
use async_zip::base::read::mem::ZipFileReader;
use futures_lite::io::AsyncReadExt as _;
use std::path::{Path, PathBuf};

/// A single file produced by extraction.
///
/// `relative_path` is relative to the destination directory and already has
/// any common top-level folder stripped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedEntry {
    /// Output path relative to the destination directory
    pub relative_path: PathBuf,
    /// File contents, verbatim
    pub contents: Vec<u8>,
}

/// Extracts all files from a ZIP archive into `dest`.
///
/// Directory entries are skipped; directories are implied by file paths and
/// created on demand. When every file in the archive sits under the same
/// single top-level folder, that folder is stripped from every output path.
///
/// The first read, directory-creation, or write failure aborts the whole
/// extraction. Already-written files are left in place; the caller owns
/// working-directory cleanup.
pub async fn extract(archive: &[u8], dest: &Path) -> Result<Vec<ExtractedEntry>, ExtractError> {
    let reader = ZipFileReader::new(archive.to_vec()).await?;

    // Pass 1: detect a common top-level folder across all file entries.
    let mut names = Vec::with_capacity(reader.file().entries().len());
    for entry in reader.file().entries() {
        let name = entry
            .filename()
            .as_str()
            .map_err(ExtractError::Archive)?
            .to_string();
        let is_dir = entry.dir().map_err(ExtractError::Archive)?;
        if !is_dir {
            names.push(name);
        }
    }
    let prefix = common_top_folder(names.iter().map(String::as_str));

    // Pass 2: write files, stripping the detected prefix.
    let mut extracted = Vec::with_capacity(names.len());
    for index in 0..reader.file().entries().len() {
        let entry = match reader.file().entries().get(index) {
            Some(entry) => entry,
            None => continue,
        };
        let name = entry
            .filename()
            .as_str()
            .map_err(ExtractError::Archive)?
            .to_string();
        if entry.dir().map_err(ExtractError::Archive)? {
            continue;
        }

        if name.contains("..") || name.starts_with('/') || name.starts_with('\\') {
            return Err(ExtractError::UnsafePath { path: name });
        }

        let target = match &prefix {
            Some(p) => name.strip_prefix(p.as_str()).unwrap_or(&name),
            None => name.as_str(),
        };
        let relative_path = PathBuf::from(target);
        let file_path = dest.join(&relative_path);

        if let Some(parent) = file_path.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ExtractError::Fs {
                    context: "creating directory",
                    path: parent.to_path_buf(),
                    source,
                })?;
        }

        let mut entry_reader =
            reader
                .reader_with_entry(index)
                .await
                .map_err(ExtractError::Archive)?;
        let mut contents = Vec::new();
        entry_reader
            .read_to_end(&mut contents)
            .await
            .map_err(|source| ExtractError::EntryRead {
                path: name.clone(),
                source,
            })?;

        tokio::fs::write(&file_path, &contents)
            .await
            .map_err(|source| ExtractError::Fs {
                context: "writing file",
                path: file_path.clone(),
                source,
            })?;

        extracted.push(ExtractedEntry {
            relative_path,
            contents,
        });
    }

    Ok(extracted)
}

/// Detects a single enclosing top-level folder across all file paths.
///
/// The first path fixes the candidate (its leading segment, when it has one);
/// any later path outside that folder cancels it. A lone root-level file has
/// no multi-segment prefix, so it never triggers flattening.
fn common_top_folder<'a>(mut names: impl Iterator<Item = &'a str>) -> Option<String> {
    let first = names.next()?;
    let prefix = first
        .split_once('/')
        .map(|(top, _)| format!("{}/", top))?;
    for name in names {
        if !name.starts_with(prefix.as_str()) {
            return None;
        }
    }
    Some(prefix)
}
