//! Zip archives of version directories.
//!
//! Entry names mirror the version directory exactly, manifest included.
//! Directory entries end in `/` and are stored; files are deflated. Entries
//! are written in sorted path order.

use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};

use depsreg_common::constants::{ARCHIVE_EXTENSION, MANIFEST_FILE};
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::{self, Manifest};
use walkdir::WalkDir;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

use crate::hash::relative_name;

/// Returns `"<id>-<version>.zip"`.
#[must_use]
pub fn archive_name(id: &str, version: &str) -> String {
    format!("{id}-{version}.{ARCHIVE_EXTENSION}")
}

fn archive_error(path: &Path, e: impl std::fmt::Display) -> RegistryError {
    RegistryError::Archive {
        path: path.to_path_buf(),
        message: e.to_string(),
    }
}

/// Zips `source_dir` into `dest`.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked or the archive
/// cannot be written.
pub fn build_archive(source_dir: &Path, dest: &Path) -> Result<PathBuf> {
    tracing::debug!(source = %source_dir.display(), dest = %dest.display(), "building archive");
    let file = File::create(dest).map_err(|e| RegistryError::io(dest, e))?;
    let mut zip = ZipWriter::new(file);
    let dir_options = FileOptions::default().compression_method(CompressionMethod::Stored);
    let file_options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for entry in WalkDir::new(source_dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| RegistryError::io(source_dir, std::io::Error::other(e)))?;
        let name = relative_name(source_dir, entry.path());
        if entry.file_type().is_dir() {
            zip.add_directory(format!("{name}/"), dir_options)
                .map_err(|e| archive_error(dest, e))?;
        } else if entry.file_type().is_file() {
            zip.start_file(name, file_options)
                .map_err(|e| archive_error(dest, e))?;
            let mut src = File::open(entry.path()).map_err(|e| RegistryError::io(entry.path(), e))?;
            let _ = std::io::copy(&mut src, &mut zip).map_err(|e| RegistryError::io(dest, e))?;
        }
    }

    let _ = zip.finish().map_err(|e| archive_error(dest, e))?;
    Ok(dest.to_path_buf())
}

/// Reads one entry of an archive into memory.
///
/// # Errors
///
/// Returns `RegistryError::Archive` if the archive is unreadable or the
/// entry is absent.
pub fn read_entry(archive: &Path, name: &str) -> Result<Vec<u8>> {
    let file = File::open(archive).map_err(|e| RegistryError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;
    let mut entry = zip
        .by_name(name)
        .map_err(|e| archive_error(archive, format!("{name}: {e}")))?;
    let mut buf = Vec::new();
    let _ = entry
        .read_to_end(&mut buf)
        .map_err(|e| RegistryError::io(archive, e))?;
    Ok(buf)
}

/// Lists the entry names of an archive in stored order.
///
/// # Errors
///
/// Returns `RegistryError::Archive` if the archive is unreadable.
pub fn entry_names(archive: &Path) -> Result<Vec<String>> {
    let file = File::open(archive).map_err(|e| RegistryError::io(archive, e))?;
    let mut zip = ZipArchive::new(file).map_err(|e| archive_error(archive, e))?;
    (0..zip.len())
        .map(|i| {
            zip.by_index(i)
                .map(|entry| entry.name().to_string())
                .map_err(|e| archive_error(archive, e))
        })
        .collect()
}

/// Reads the manifest embedded at the root of an archive.
///
/// # Errors
///
/// Returns an error if the archive has no root manifest or it is malformed.
pub fn extract_manifest(archive: &Path) -> Result<Manifest> {
    let bytes = read_entry(archive, MANIFEST_FILE)?;
    let content = String::from_utf8(bytes).map_err(|e| archive_error(archive, e))?;
    manifest::parse(&content, archive)
}
