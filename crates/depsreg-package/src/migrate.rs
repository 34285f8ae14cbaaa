//! Conversion of legacy manifests to the current schema.
//!
//! Legacy documents carry no `manifestVersion`, name the network flag
//! `hasNetworkAccess` and the touched paths `touchedFiles`, and have no file
//! digests. Fields of the wrong JSON type are treated as absent.

use std::collections::BTreeMap;
use std::path::Path;

use depsreg_common::constants::MANIFEST_SCHEMA_VERSION;
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::{self, Manifest, Metadata, Security};
use serde_json::{Map, Value};

use crate::hash::digest_dir;

/// What migration did to one manifest.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateOutcome {
    /// The legacy document was rewritten.
    Migrated,
    /// The document already declares a schema version.
    AlreadyCurrent,
}

fn string(doc: &Map<String, Value>, key: &str) -> Option<String> {
    doc.get(key).and_then(Value::as_str).map(str::to_string)
}

fn strings(doc: &Map<String, Value>, key: &str) -> Vec<String> {
    doc.get(key)
        .and_then(Value::as_array)
        .map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        })
        .unwrap_or_default()
}

fn string_map(doc: &Map<String, Value>, key: &str) -> BTreeMap<String, String> {
    doc.get(key)
        .and_then(Value::as_object)
        .map(|obj| {
            obj.iter()
                .filter_map(|(k, v)| v.as_str().map(|s| (k.clone(), s.to_string())))
                .collect()
        })
        .unwrap_or_default()
}

/// Converts a parsed legacy document, given the digests of its directory.
#[must_use]
pub fn convert_legacy(
    doc: &Map<String, Value>,
    files: BTreeMap<String, depsreg_common::manifest::FileInfo>,
) -> Manifest {
    Manifest {
        manifest_version: MANIFEST_SCHEMA_VERSION.to_string(),
        id: string(doc, "id").unwrap_or_default(),
        name: string(doc, "name").filter(|n| !n.is_empty()),
        version: string(doc, "version").unwrap_or_default(),
        provides: Vec::new(),
        files,
        dependencies: string_map(doc, "dependencies"),
        security: Security {
            network_access: doc
                .get("hasNetworkAccess")
                .and_then(Value::as_bool)
                .unwrap_or(false),
            file_access: strings(doc, "touchedFiles"),
            uses_ffi: false,
        },
        metadata: Metadata {
            source_url: string(doc, "sourceUrl").filter(|u| !u.is_empty()),
            tags: strings(doc, "tags"),
            deprecated: false,
        },
    }
}

/// Migrates the manifest of `version_dir` in place when it is legacy.
///
/// # Errors
///
/// Returns an error if the manifest is unreadable or not a JSON object, if
/// a file cannot be hashed, or if the save fails.
pub fn migrate(version_dir: &Path) -> Result<MigrateOutcome> {
    let path = manifest::manifest_path(version_dir);
    let content = std::fs::read_to_string(&path).map_err(|e| RegistryError::io(&path, e))?;
    let value: Value = serde_json::from_str(&content).map_err(|e| RegistryError::InvalidManifest {
        path: path.clone(),
        message: e.to_string(),
    })?;
    let Value::Object(doc) = value else {
        return Err(RegistryError::InvalidManifest {
            path,
            message: "manifest is not a JSON object".to_string(),
        });
    };
    if doc.contains_key("manifestVersion") {
        return Ok(MigrateOutcome::AlreadyCurrent);
    }

    let m = convert_legacy(&doc, digest_dir(version_dir)?);
    manifest::save(version_dir, &m)?;
    tracing::info!(path = %version_dir.display(), id = %m.id, "manifest migrated");
    Ok(MigrateOutcome::Migrated)
}
