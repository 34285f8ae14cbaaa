//! Adding a new package version to the registry tree from loose sources.
//!
//! The version directory is created from the script header declarations,
//! dependencies come from source analysis restricted to ids the registry
//! already knows, and their versions from the published index. The
//! analyzer's risk flags land in the manifest's `security` block.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use depsreg_analyzer::analyzer::root_segment;
use depsreg_analyzer::metadata::extract_from_path;
use depsreg_analyzer::{Analysis, AnalyzerOptions, Registry, ScriptMetadata, SourceAnalyzer, Warning};
use depsreg_client::{IndexFetcher, RegistryClient};
use depsreg_common::constants::MANIFEST_FILE;
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::{self, FileInfo, Manifest, Metadata, Security};
use depsreg_common::storage::RegistryTree;
use depsreg_common::types::ItemType;
use walkdir::WalkDir;

use crate::hash::{digest_dir, relative_name};

/// What to add and how to label it.
#[derive(Debug, Clone)]
pub struct AddOptions {
    /// Subtree receiving the new version.
    pub item_type: ItemType,
    /// Overrides the id slugified from `script_name`.
    pub id: Option<String>,
    /// Overrides the declared `script_version`.
    pub version: Option<String>,
    /// Tags recorded in the manifest metadata.
    pub tags: Vec<String>,
    /// Upstream location recorded in the manifest metadata.
    pub source_url: Option<String>,
}

impl AddOptions {
    /// Options adding to `item_type` with everything else derived.
    #[must_use]
    pub const fn new(item_type: ItemType) -> Self {
        Self {
            item_type,
            id: None,
            version: None,
            tags: Vec::new(),
            source_url: None,
        }
    }
}

/// Outcome of a successful [`add`].
#[derive(Debug, Clone)]
pub struct AddReport {
    /// Manifest written to the new version directory.
    pub manifest: Manifest,
    /// Directory the sources were copied into.
    pub version_dir: PathBuf,
    /// Versions of the same id already published, in semver order.
    pub published_versions: Vec<String>,
    /// Dynamic-require findings from the analysis.
    pub warnings: Vec<Warning>,
}

/// Splits a comma-separated tag list, trimming blanks.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

/// Assembles the manifest of a new version from its identity, analysis,
/// resolved dependency versions and file digests.
#[must_use]
pub fn build_manifest(
    identity: &ScriptMetadata,
    analysis: &Analysis,
    dependencies: BTreeMap<String, String>,
    files: BTreeMap<String, FileInfo>,
    options: &AddOptions,
) -> Manifest {
    Manifest {
        name: Some(identity.name.clone()),
        files,
        dependencies,
        security: Security {
            network_access: analysis.uses_network,
            file_access: analysis.file_paths.iter().cloned().collect(),
            uses_ffi: analysis.uses_ffi,
        },
        metadata: Metadata {
            source_url: options.source_url.clone(),
            tags: options.tags.clone(),
            deprecated: false,
        },
        ..Manifest::new(identity.id.clone(), identity.version.clone())
    }
}

/// Creates `<root>/<itemType>/<id>/<version>/` from `source`, a script file
/// or a directory, and writes its manifest.
///
/// Dependency versions fall back to `*` when the index is unreachable or
/// does not list the id.
///
/// # Errors
///
/// Returns `RegistryError::AlreadyExists` if the version is present in the
/// tree or already published, `RegistryError::Config` if no id can be
/// derived, or any analysis, copy or save error.
pub fn add<F: IndexFetcher>(
    tree: &RegistryTree,
    source: &Path,
    options: &AddOptions,
    client: &RegistryClient<F>,
) -> Result<AddReport> {
    let mut identity = extract_from_path(source)?;
    if let Some(id) = &options.id {
        identity.id.clone_from(id);
    }
    if let Some(version) = &options.version {
        identity.version.clone_from(version);
    }
    if identity.id.is_empty() {
        return Err(RegistryError::Config {
            message: format!("cannot derive a package id from {}", source.display()),
        });
    }
    let label = format!("{}@{}", identity.id, identity.version);
    if tree.has_version(options.item_type, &identity.id, &identity.version) {
        return Err(RegistryError::AlreadyExists {
            kind: "local version",
            id: label,
        });
    }
    let published_versions = published_versions(client, options.item_type, &identity, &label)?;

    let registry = Registry::scan(tree)?;
    let analyzer = SourceAnalyzer::new(AnalyzerOptions {
        exclude_id: Some(identity.id.clone()),
        known_roots: Some(registry.roots()),
    })?;
    let analysis = analyzer.analyze(source)?;
    let ids: BTreeSet<String> = analysis
        .dependencies
        .iter()
        .map(|reference| {
            registry
                .resolve_module(reference)
                .map_or_else(|| root_segment(reference).to_string(), str::to_string)
        })
        .filter(|id| *id != identity.id)
        .collect();
    let dependencies = client.resolve_versions(ids.iter().map(String::as_str));

    let version_dir = tree.version_dir(options.item_type, &identity.id, &identity.version);
    copy_sources(source, &version_dir)?;
    let files = digest_dir(&version_dir)?;
    let manifest = build_manifest(&identity, &analysis, dependencies, files, options);
    manifest::save(&version_dir, &manifest)?;

    tracing::info!(
        package = %label,
        item_type = %options.item_type,
        dependencies = manifest.dependencies.len(),
        network = analysis.uses_network,
        ffi = analysis.uses_ffi,
        "package version added"
    );
    Ok(AddReport {
        manifest,
        version_dir,
        published_versions,
        warnings: analysis.warnings,
    })
}

fn published_versions<F: IndexFetcher>(
    client: &RegistryClient<F>,
    item_type: ItemType,
    identity: &ScriptMetadata,
    label: &str,
) -> Result<Vec<String>> {
    match client.check_duplicate(item_type, &identity.id, &identity.version) {
        Ok(info) if info.exact_match => Err(RegistryError::AlreadyExists {
            kind: "published version",
            id: label.to_string(),
        }),
        Ok(info) => {
            if info.exists {
                tracing::warn!(
                    package = %label,
                    published = ?info.all_versions,
                    "adding a new version of a published package"
                );
            }
            Ok(info.all_versions)
        }
        Err(e) => {
            tracing::warn!(error = %e, "registry unavailable, skipping duplicate check");
            Ok(Vec::new())
        }
    }
}

/// Copies a single file, or every file under a directory except a
/// top-level manifest, into `target`.
fn copy_sources(source: &Path, target: &Path) -> Result<()> {
    std::fs::create_dir_all(target).map_err(|e| RegistryError::io(target, e))?;
    let meta = std::fs::metadata(source).map_err(|e| RegistryError::io(source, e))?;
    if !meta.is_dir() {
        let name = source.file_name().ok_or_else(|| RegistryError::NotFound {
            kind: "source file",
            id: source.display().to_string(),
        })?;
        let dest = target.join(name);
        let _ = std::fs::copy(source, &dest).map_err(|e| RegistryError::io(&dest, e))?;
        return Ok(());
    }

    for entry in WalkDir::new(source).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| RegistryError::io(source, std::io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_name(source, entry.path());
        if rel == MANIFEST_FILE {
            continue;
        }
        let dest = target.join(&rel);
        if let Some(parent) = dest.parent() {
            std::fs::create_dir_all(parent).map_err(|e| RegistryError::io(parent, e))?;
        }
        let _ = std::fs::copy(entry.path(), &dest).map_err(|e| RegistryError::io(&dest, e))?;
    }
    Ok(())
}
