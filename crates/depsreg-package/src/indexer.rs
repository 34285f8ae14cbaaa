//! Index generation from the distribution tree.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use depsreg_common::constants::{ARCHIVE_EXTENSION, INDEX_FILE};
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::index::{Index, PackageEntry, VersionEntry};
use depsreg_common::types::ItemType;
use depsreg_graph::version;

use crate::archive::{archive_name, extract_manifest};
use crate::hash::hash_file;

/// Builds the index of every archive under `dist/deps` and `dist/scripts`.
///
/// Package id and version come from the manifest embedded in each archive,
/// and the file name must be `<id>-<version>.zip` for that manifest, so any
/// version string the packager accepts is indexed. Each package's `latest`
/// is chosen by semver-aware ordering. Every other archive is skipped with
/// a warning.
///
/// # Errors
///
/// Returns an error if a `dist/<type>` directory exists but cannot be listed.
pub fn generate_index(dist: &Path, cdn_url: &str, now: DateTime<Utc>) -> Result<Index> {
    let mut index = Index::new(now);
    for item_type in ItemType::ALL {
        let entries = index_item_type(dist, cdn_url, item_type)?;
        *index.packages_mut(item_type) = entries;
    }
    tracing::info!(
        dependencies = index.dependencies.len(),
        scripts = index.scripts.len(),
        "index generated"
    );
    Ok(index)
}

fn index_item_type(
    dist: &Path,
    cdn_url: &str,
    item_type: ItemType,
) -> Result<BTreeMap<String, PackageEntry>> {
    let dir = dist.join(item_type.dir_name());
    let listing = match std::fs::read_dir(&dir) {
        Ok(listing) => listing,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(BTreeMap::new()),
        Err(e) => return Err(RegistryError::io(&dir, e)),
    };

    let mut archives = Vec::new();
    for entry in listing {
        let entry = entry.map_err(|e| RegistryError::io(&dir, e))?;
        let path = entry.path();
        if entry.file_type().is_ok_and(|t| t.is_file())
            && path.extension().is_some_and(|ext| ext == ARCHIVE_EXTENSION)
        {
            archives.push(path);
        }
    }
    archives.sort();

    let base = cdn_url.trim_end_matches('/');
    let mut grouped: BTreeMap<String, BTreeMap<String, VersionEntry>> = BTreeMap::new();
    for path in archives {
        let entry = match version_entry(&path, base, item_type) {
            Ok(entry) => entry,
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "skipping archive");
                continue;
            }
        };
        let (id, ver) = (entry.manifest.id.clone(), entry.manifest.version.clone());
        if id.is_empty() || ver.is_empty() {
            tracing::warn!(path = %path.display(), "skipping archive without id or version");
            continue;
        }
        let expected = archive_name(&id, &ver);
        if path.file_name().is_none_or(|name| *name != *expected) {
            tracing::warn!(
                path = %path.display(),
                expected = %expected,
                "skipping archive whose name disagrees with its manifest"
            );
            continue;
        }
        let _ = grouped.entry(id).or_default().insert(ver, entry);
    }

    let mut packages = BTreeMap::new();
    for (id, versions) in grouped {
        let keys: Vec<&String> = versions.keys().collect();
        let Some(latest) = version::latest(&keys).map(str::to_string) else {
            continue;
        };
        let _ = packages.insert(id, PackageEntry { latest, versions });
    }
    Ok(packages)
}

fn version_entry(archive: &Path, base_url: &str, item_type: ItemType) -> Result<VersionEntry> {
    let sha256 = hash_file(archive)?;
    let size = std::fs::metadata(archive)
        .map_err(|e| RegistryError::io(archive, e))?
        .len();
    let manifest = extract_manifest(archive)?;
    let file_name = archive
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    Ok(VersionEntry {
        url: format!("{base_url}/{}/{file_name}", item_type.dir_name()),
        sha256,
        size,
        manifest,
    })
}

/// Writes `index` as pretty JSON to `dist/index.json`.
///
/// # Errors
///
/// Returns an error if `dist` cannot be created or the file written.
pub fn write_index(dist: &Path, index: &Index) -> Result<PathBuf> {
    std::fs::create_dir_all(dist).map_err(|e| RegistryError::io(dist, e))?;
    let path = dist.join(INDEX_FILE);
    let json = serde_json::to_string_pretty(index)?;
    std::fs::write(&path, json).map_err(|e| RegistryError::io(&path, e))?;
    tracing::info!(path = %path.display(), "index written");
    Ok(path)
}
