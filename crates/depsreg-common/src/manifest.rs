//! The per-version `dep.json` manifest model and its persistence.
//!
//! One manifest lives at `<root>/<itemType>/<id>/<version>/dep.json`.
//! Maps are ordered so a manifest re-serializes byte-for-byte identically
//! when its content has not changed.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants::{MANIFEST_FILE, MANIFEST_SCHEMA_VERSION};
use crate::error::{RegistryError, Result};
use crate::types::Sha256Hash;

/// Digest and size of one file listed in a manifest.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileInfo {
    /// SHA-256 of the file contents.
    pub sha256: Sha256Hash,
    /// File size in bytes.
    pub size: u64,
}

/// Risk signals extracted by the source analyzer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Security {
    /// Whether any source calls a networking library.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub network_access: bool,
    /// Working-directory paths the sources read or write.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub file_access: Vec<String>,
    /// Whether any source loads the FFI binding.
    #[serde(default, rename = "usesFFI", skip_serializing_if = "std::ops::Not::not")]
    pub uses_ffi: bool,
}

/// Descriptive, non-functional package metadata.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    /// Upstream location of the sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source_url: Option<String>,
    /// Free-form search tags.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tags: Vec<String>,
    /// Whether the package is deprecated.
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub deprecated: bool,
}

/// Metadata document persisted for every package version.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Schema version of this document; absent on legacy manifests.
    #[serde(default)]
    pub manifest_version: String,
    /// Package identifier; matches the package directory name.
    pub id: String,
    /// Display name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// Version string; matches the version directory name. Not necessarily semver.
    pub version: String,
    /// Additional module paths this package satisfies.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub provides: Vec<String>,
    /// Relative file path to digest, excluding `dep.json` itself.
    #[serde(default)]
    pub files: BTreeMap<String, FileInfo>,
    /// Dependency id to version string.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub dependencies: BTreeMap<String, String>,
    /// Analyzer risk signals.
    #[serde(default)]
    pub security: Security,
    /// Descriptive metadata.
    #[serde(default)]
    pub metadata: Metadata,
}

impl Manifest {
    /// Creates an empty manifest for `id` at `version` using the current schema.
    #[must_use]
    pub fn new(id: impl Into<String>, version: impl Into<String>) -> Self {
        Self {
            manifest_version: MANIFEST_SCHEMA_VERSION.to_string(),
            id: id.into(),
            version: version.into(),
            ..Self::default()
        }
    }

    /// Returns `"<id>@<version>"`.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}@{}", self.id, self.version)
    }
}

/// Returns the manifest path inside a version directory.
#[must_use]
pub fn manifest_path(version_dir: &Path) -> PathBuf {
    version_dir.join(MANIFEST_FILE)
}

/// Parses a manifest document.
///
/// # Errors
///
/// Returns `RegistryError::InvalidManifest` if the JSON is malformed.
pub fn parse(content: &str, origin: &Path) -> Result<Manifest> {
    serde_json::from_str(content).map_err(|e| RegistryError::InvalidManifest {
        path: origin.to_path_buf(),
        message: e.to_string(),
    })
}

/// Loads the manifest stored in `version_dir`.
///
/// # Errors
///
/// Returns an error if `dep.json` is missing, unreadable, or malformed.
pub fn load(version_dir: &Path) -> Result<Manifest> {
    let path = manifest_path(version_dir);
    tracing::debug!(path = %path.display(), "loading manifest");
    let content = std::fs::read_to_string(&path).map_err(|e| RegistryError::io(&path, e))?;
    parse(&content, &path)
}

/// Writes `manifest` as pretty-printed JSON into `version_dir`.
///
/// # Errors
///
/// Returns an error if serialization or the write fails.
pub fn save(version_dir: &Path, manifest: &Manifest) -> Result<()> {
    let path = manifest_path(version_dir);
    let json = serde_json::to_string_pretty(manifest)?;
    std::fs::write(&path, json).map_err(|e| RegistryError::io(&path, e))?;
    tracing::debug!(path = %path.display(), id = %manifest.id, "manifest saved");
    Ok(())
}
