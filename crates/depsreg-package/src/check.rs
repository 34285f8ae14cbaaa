//! Manifest-versus-disk consistency of a version directory.

use std::path::Path;

use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::{self, Manifest};

use crate::hash::{list_files, validate_hash};

fn invalid(dir: &Path, message: impl Into<String>) -> RegistryError {
    RegistryError::InvalidManifest {
        path: dir.to_path_buf(),
        message: message.into(),
    }
}

/// Loads the manifest of `version_dir` and checks it against the disk.
///
/// The manifest must carry an id and a version matching the enclosing
/// directory names, list at least one file, list only files that exist,
/// list every file present besides itself, and record each file's current
/// SHA-256 digest.
///
/// # Errors
///
/// Returns `RegistryError::InvalidManifest` describing the first violation,
/// or the load error if the manifest cannot be read.
pub fn check_manifest(version_dir: &Path) -> Result<Manifest> {
    let m = manifest::load(version_dir)?;

    if m.id.is_empty() {
        return Err(invalid(version_dir, "missing id"));
    }
    if m.version.is_empty() {
        return Err(invalid(version_dir, "missing version"));
    }
    if let Some(dir_version) = version_dir.file_name().and_then(|n| n.to_str()) {
        if dir_version != m.version {
            return Err(invalid(
                version_dir,
                format!("version {} does not match directory {dir_version}", m.version),
            ));
        }
    }
    if let Some(dir_id) = version_dir
        .parent()
        .and_then(Path::file_name)
        .and_then(|n| n.to_str())
    {
        if dir_id != m.id {
            return Err(invalid(
                version_dir,
                format!("id {} does not match directory {dir_id}", m.id),
            ));
        }
    }
    if m.files.is_empty() {
        return Err(invalid(version_dir, "no files listed"));
    }
    if let Some(missing) = m.files.keys().find(|f| !version_dir.join(f).is_file()) {
        return Err(invalid(version_dir, format!("file {missing} not found")));
    }
    if let Some(unlisted) = list_files(version_dir)?
        .into_iter()
        .find(|f| !m.files.contains_key(f))
    {
        return Err(invalid(version_dir, format!("file {unlisted} not in manifest")));
    }
    for (name, info) in &m.files {
        validate_hash(&version_dir.join(name), &info.sha256).map_err(|e| match e {
            RegistryError::HashMismatch { .. } => {
                invalid(version_dir, format!("file {name} digest mismatch"))
            }
            other => other,
        })?;
    }

    tracing::debug!(path = %version_dir.display(), id = %m.id, "manifest consistent");
    Ok(m)
}
