//! Source file discovery.

use std::path::{Path, PathBuf};

use depsreg_common::constants::SOURCE_EXTENSION;
use depsreg_common::error::{RegistryError, Result};
use walkdir::WalkDir;

/// Returns `true` if `path` carries the script source extension.
#[must_use]
pub fn is_source_file(path: &Path) -> bool {
    path.extension().is_some_and(|ext| ext == SOURCE_EXTENSION)
}

/// Lists the source files under `path`, sorted by path.
///
/// A file yields itself when it has the source extension and nothing
/// otherwise. A directory is walked recursively.
///
/// # Errors
///
/// Returns `RegistryError::Io` if `path` does not exist or the walk fails.
pub fn source_files(path: &Path) -> Result<Vec<PathBuf>> {
    let meta = std::fs::metadata(path).map_err(|e| RegistryError::io(path, e))?;
    if !meta.is_dir() {
        return Ok(if is_source_file(path) {
            vec![path.to_path_buf()]
        } else {
            Vec::new()
        });
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry.map_err(|e| {
            let at = e.path().unwrap_or(path).to_path_buf();
            RegistryError::io(&at, std::io::Error::other(e))
        })?;
        if entry.file_type().is_file() && is_source_file(entry.path()) {
            files.push(entry.into_path());
        }
    }
    tracing::debug!(path = %path.display(), count = files.len(), "collected source files");
    Ok(files)
}

/// Converts a package-relative source path into its dotted module name,
/// e.g. `net/http.lua` becomes `net.http`.
#[must_use]
pub fn module_name(relative: &Path) -> Option<String> {
    let stem = relative.with_extension("");
    let parts: Vec<&str> = stem
        .components()
        .map(|c| c.as_os_str().to_str())
        .collect::<Option<Vec<_>>>()?;
    if parts.is_empty() {
        return None;
    }
    Some(parts.join("."))
}
