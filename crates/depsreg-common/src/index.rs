//! The published registry index document (`dist/index.json`).
//!
//! Produced by the indexer, consumed read-only by the registry client.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::INDEX_SCHEMA_VERSION;
use crate::manifest::Manifest;
use crate::types::{ItemType, Sha256Hash};

/// Download record for one published archive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionEntry {
    /// Canonical download URL of the archive.
    pub url: String,
    /// SHA-256 of the whole archive, for downloader integrity checks.
    pub sha256: Sha256Hash,
    /// Archive size in bytes.
    pub size: u64,
    /// Manifest embedded in the archive.
    pub manifest: Manifest,
}

/// All published versions of one package.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Version reported as current.
    pub latest: String,
    /// Version string to download record.
    #[serde(default)]
    pub versions: BTreeMap<String, VersionEntry>,
}

/// The distributable index of every package and script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Index {
    /// Index schema version.
    #[serde(rename = "version", alias = "schemaVersion")]
    pub schema_version: String,
    /// Generation timestamp.
    pub last_updated: DateTime<Utc>,
    /// Dependencies by id.
    #[serde(default)]
    pub dependencies: BTreeMap<String, PackageEntry>,
    /// Scripts by id.
    #[serde(default)]
    pub scripts: BTreeMap<String, PackageEntry>,
}

impl Index {
    /// Creates an empty index stamped with `last_updated`.
    #[must_use]
    pub fn new(last_updated: DateTime<Utc>) -> Self {
        Self {
            schema_version: INDEX_SCHEMA_VERSION.to_string(),
            last_updated,
            dependencies: BTreeMap::new(),
            scripts: BTreeMap::new(),
        }
    }

    /// Returns the packages stored under `item_type`.
    #[must_use]
    pub const fn packages(&self, item_type: ItemType) -> &BTreeMap<String, PackageEntry> {
        match item_type {
            ItemType::Deps => &self.dependencies,
            ItemType::Scripts => &self.scripts,
        }
    }

    /// Returns the packages stored under `item_type` for mutation.
    pub fn packages_mut(&mut self, item_type: ItemType) -> &mut BTreeMap<String, PackageEntry> {
        match item_type {
            ItemType::Deps => &mut self.dependencies,
            ItemType::Scripts => &mut self.scripts,
        }
    }

    /// Looks up one package by type and id.
    #[must_use]
    pub fn package(&self, item_type: ItemType, id: &str) -> Option<&PackageEntry> {
        self.packages(item_type).get(id)
    }
}
