//! In-memory catalog of known packages and their module aliases.
//!
//! A [`Registry`] is built once (from persisted manifests or explicitly
//! through [`RegistryBuilder`]) and is immutable afterwards; components
//! receive it by reference.

use std::collections::HashMap;

use depsreg_common::error::Result;
use depsreg_common::manifest::{self, Manifest};
use depsreg_common::storage::RegistryTree;
use depsreg_common::types::ItemType;

use crate::aliases::WELL_KNOWN_ALIASES;

/// Catalog entry for one package, taken from its first loadable version.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageInfo {
    /// Package identifier.
    pub id: String,
    /// Version the entry was built from.
    pub version: String,
    /// Module paths the package also satisfies.
    pub provides: Vec<String>,
    /// Relative file names listed in the manifest.
    pub files: Vec<String>,
}

impl PackageInfo {
    /// Builds a catalog entry from a manifest.
    #[must_use]
    pub fn from_manifest(manifest: &Manifest) -> Self {
        Self {
            id: manifest.id.clone(),
            version: manifest.version.clone(),
            provides: manifest.provides.clone(),
            files: manifest.files.keys().cloned().collect(),
        }
    }
}

/// Immutable package catalog with alias lookup.
#[derive(Debug, Clone, Default)]
pub struct Registry {
    packages: HashMap<String, PackageInfo>,
    provides: HashMap<String, String>,
}

impl Registry {
    /// Scans every package of both item types under `tree`, then applies
    /// the well-known alias table.
    ///
    /// For each package the first version (by directory name) whose
    /// manifest loads is used; unreadable manifests are skipped.
    ///
    /// # Errors
    ///
    /// Returns an error if an item subtree exists but cannot be listed.
    pub fn scan(tree: &RegistryTree) -> Result<Self> {
        let mut builder = RegistryBuilder::new();
        for item_type in ItemType::ALL {
            for id in tree.package_ids(item_type)? {
                let versions = match tree.versions(item_type, &id) {
                    Ok(v) => v,
                    Err(e) => {
                        tracing::warn!(id = %id, error = %e, "skipping unreadable package");
                        continue;
                    }
                };
                let first = versions.iter().find_map(|version| {
                    manifest::load(&tree.version_dir(item_type, &id, version)).ok()
                });
                match first {
                    Some(m) => {
                        let _ = builder.add_package(PackageInfo::from_manifest(&m));
                    }
                    None => tracing::debug!(id = %id, "no loadable manifest"),
                }
            }
        }
        let registry = builder.apply_well_known_aliases().build();
        tracing::info!(packages = registry.len(), "registry scanned");
        Ok(registry)
    }

    /// Resolves a dotted module path to a package id.
    ///
    /// Tries the full path, then drops trailing segments one at a time; at
    /// each step a package id match is preferred over an alias match.
    #[must_use]
    pub fn resolve_module(&self, module_path: &str) -> Option<&str> {
        let mut candidate = module_path;
        loop {
            if let Some(pkg) = self.packages.get(candidate) {
                return Some(pkg.id.as_str());
            }
            if let Some(id) = self.provides.get(candidate) {
                return Some(id.as_str());
            }
            candidate = &candidate[..candidate.rfind('.')?];
        }
    }

    /// Returns the catalog entry of `id`.
    #[must_use]
    pub fn package(&self, id: &str) -> Option<&PackageInfo> {
        self.packages.get(id)
    }

    /// Checks whether `id` is a known package.
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.packages.contains_key(id)
    }

    /// Lower-cased ids of every known package.
    #[must_use]
    pub fn roots(&self) -> std::collections::HashSet<String> {
        self.packages.keys().map(|id| id.to_lowercase()).collect()
    }

    /// Number of known packages.
    #[must_use]
    pub fn len(&self) -> usize {
        self.packages.len()
    }

    /// Checks whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.packages.is_empty()
    }
}

/// Mutable staging area for a [`Registry`].
#[derive(Debug, Default)]
pub struct RegistryBuilder {
    inner: Registry,
}

impl RegistryBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a package and registers its declared aliases. A later package
    /// with the same id replaces the earlier one.
    pub fn add_package(&mut self, info: PackageInfo) -> &mut Self {
        for alias in &info.provides {
            let _ = self.inner.provides.insert(alias.clone(), info.id.clone());
        }
        let _ = self.inner.packages.insert(info.id.clone(), info);
        self
    }

    /// Overrides `provides` of every present package listed in the
    /// well-known alias table. An alias claimed by several table entries
    /// stays with the first.
    pub fn apply_well_known_aliases(&mut self) -> &mut Self {
        let mut claimed = std::collections::HashSet::new();
        for (id, aliases) in WELL_KNOWN_ALIASES {
            let Some(pkg) = self.inner.packages.get_mut(*id) else {
                continue;
            };
            pkg.provides = aliases.iter().map(|a| (*a).to_string()).collect();
            for alias in *aliases {
                if claimed.insert(*alias) {
                    let _ = self
                        .inner
                        .provides
                        .insert((*alias).to_string(), (*id).to_string());
                }
            }
        }
        self
    }

    /// Finalizes the catalog.
    #[must_use]
    pub fn build(&mut self) -> Registry {
        std::mem::take(&mut self.inner)
    }
}
