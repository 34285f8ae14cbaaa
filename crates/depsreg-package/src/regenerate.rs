//! In-place manifest regeneration from a fresh source analysis.

use std::collections::{BTreeMap, BTreeSet};

use depsreg_analyzer::aliases::aliases_for;
use depsreg_analyzer::{Registry, ResolutionContext, analyze_with_context};
use depsreg_common::error::Result;
use depsreg_common::manifest::{self, Manifest};
use depsreg_common::storage::{RegistryTree, VersionDir};
use depsreg_common::types::ItemType;
use depsreg_graph::version;

use crate::hash::digest_named;

/// Knobs of a regeneration run.
#[derive(Debug, Clone, Copy, Default)]
pub struct RegenerateOptions {
    /// Compute changes without writing manifests.
    pub dry_run: bool,
    /// Skip the registry-wide cycle and duplicate checks.
    pub skip_validation: bool,
}

/// What regeneration did to one manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RegenerateOutcome {
    /// Dependencies or provides changed; written unless dry-run.
    Updated {
        /// New dependency map.
        dependencies: BTreeMap<String, String>,
        /// Dynamic-require findings encountered during analysis.
        warnings: usize,
    },
    /// Nothing to change.
    Unchanged,
}

/// Latest installed version of `id`, looking in `deps/` then `scripts/`.
///
/// # Errors
///
/// Returns an error if a package directory exists but cannot be listed.
pub fn latest_installed(tree: &RegistryTree, id: &str) -> Result<Option<String>> {
    for item_type in ItemType::ALL {
        let versions = tree.versions(item_type, id)?;
        if let Some(latest) = version::latest(&versions) {
            return Ok(Some(latest.to_string()));
        }
    }
    Ok(None)
}

/// Re-analyzes one version directory and rewrites its manifest.
///
/// Dependencies become every resolved id mapped to its latest installed
/// version; ids with no installed version are dropped. `provides` takes
/// the well-known aliases when the id has an entry and is kept otherwise.
/// When anything changed, file digests are refreshed too.
///
/// # Errors
///
/// Returns an error if the manifest cannot be loaded, the sources cannot be
/// analyzed, a listed file cannot be hashed, or the save fails.
pub fn regenerate(
    tree: &RegistryTree,
    registry: &Registry,
    dir: &VersionDir,
    dry_run: bool,
) -> Result<RegenerateOutcome> {
    let mut m = manifest::load(&dir.path)?;
    let ctx = ResolutionContext::scan(m.id.clone(), &dir.path, registry)?;
    let analysis = analyze_with_context(&ctx, &dir.path)?;

    let mut dependencies = BTreeMap::new();
    for id in analysis.dependencies.keys() {
        match latest_installed(tree, id)? {
            Some(v) => {
                let _ = dependencies.insert(id.clone(), v);
            }
            None => tracing::debug!(package = %m.id, dependency = %id, "no installed version"),
        }
    }
    let provides = aliases_for(&m.id).map_or_else(
        || m.provides.clone(),
        |aliases| aliases.iter().map(|a| (*a).to_string()).collect(),
    );

    if !differs(&m, &dependencies, &provides) {
        return Ok(RegenerateOutcome::Unchanged);
    }

    m.dependencies = dependencies.clone();
    m.provides = provides;
    m.files = digest_named(&dir.path, m.files.keys())?;
    if !dry_run {
        manifest::save(&dir.path, &m)?;
    }
    tracing::info!(item = %dir.label(), dry_run, "manifest regenerated");
    Ok(RegenerateOutcome::Updated {
        dependencies,
        warnings: analysis.warnings.len(),
    })
}

fn differs(m: &Manifest, dependencies: &BTreeMap<String, String>, provides: &[String]) -> bool {
    let old: BTreeSet<&String> = m.provides.iter().collect();
    let new: BTreeSet<&String> = provides.iter().collect();
    m.dependencies != *dependencies || old != new
}

#[cfg(test)]
mod tests {
    use std::path::Path;

    use super::*;
    use crate::hash::digest_dir;

    fn install(tree: &RegistryTree, item_type: ItemType, id: &str, version: &str, source: &str) {
        let dir = tree.version_dir(item_type, id, version);
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("init.lua"), source).expect("write");
        let mut m = Manifest::new(id, version);
        m.files = digest_dir(&dir).expect("digest");
        manifest::save(&dir, &m).expect("save");
    }

    fn version_dir(tree: &RegistryTree, item_type: ItemType, id: &str, version: &str) -> VersionDir {
        VersionDir {
            item_type,
            id: id.to_string(),
            version: version.to_string(),
            path: tree.version_dir(item_type, id, version),
        }
    }

    fn setup(root: &Path) -> RegistryTree {
        let tree = RegistryTree::open(root);
        install(&tree, ItemType::Deps, "luasocket", "3.0.0", "return {}");
        install(&tree, ItemType::Deps, "luasocket", "3.1.0", "return {}");
        install(&tree, ItemType::Deps, "cjson", "2.1.0", "return {}");
        install(
            &tree,
            ItemType::Scripts,
            "autologin",
            "1.0.0",
            "local http = require('socket.http')\nlocal json = require('cjson')\nlocal x = require('ghostlib')\nlocal t = require('table')",
        );
        tree
    }

    #[test]
    fn dependencies_map_to_latest_installed_versions() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = setup(root.path());
        let registry = Registry::scan(&tree).expect("scan");
        let dir = version_dir(&tree, ItemType::Scripts, "autologin", "1.0.0");

        let expected: BTreeMap<String, String> = [("cjson", "2.1.0"), ("luasocket", "3.1.0")]
            .into_iter()
            .map(|(a, b)| (a.to_string(), b.to_string()))
            .collect();
        assert_eq!(
            regenerate(&tree, &registry, &dir, false).expect("regenerate"),
            RegenerateOutcome::Updated {
                dependencies: expected.clone(),
                warnings: 0,
            }
        );
        assert_eq!(manifest::load(&dir.path).expect("load").dependencies, expected);
    }

    #[test]
    fn second_run_is_unchanged() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = setup(root.path());
        let registry = Registry::scan(&tree).expect("scan");
        let dir = version_dir(&tree, ItemType::Scripts, "autologin", "1.0.0");

        let _ = regenerate(&tree, &registry, &dir, false).expect("first");
        let before = std::fs::read_to_string(dir.path.join("dep.json")).expect("read");
        assert_eq!(
            regenerate(&tree, &registry, &dir, false).expect("second"),
            RegenerateOutcome::Unchanged
        );
        let after = std::fs::read_to_string(dir.path.join("dep.json")).expect("read");
        assert_eq!(before, after);
    }

    #[test]
    fn dry_run_leaves_manifest_untouched() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = setup(root.path());
        let registry = Registry::scan(&tree).expect("scan");
        let dir = version_dir(&tree, ItemType::Scripts, "autologin", "1.0.0");
        let before = std::fs::read_to_string(dir.path.join("dep.json")).expect("read");

        let outcome = regenerate(&tree, &registry, &dir, true).expect("dry run");
        assert!(matches!(outcome, RegenerateOutcome::Updated { .. }));
        let after = std::fs::read_to_string(dir.path.join("dep.json")).expect("read");
        assert_eq!(before, after);
    }

    #[test]
    fn well_known_aliases_replace_provides() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = setup(root.path());
        let registry = Registry::scan(&tree).expect("scan");
        let dir = version_dir(&tree, ItemType::Deps, "cjson", "2.1.0");

        let _ = regenerate(&tree, &registry, &dir, false).expect("regenerate");
        assert_eq!(manifest::load(&dir.path).expect("load").provides, vec!["cjson.safe"]);
    }

    #[test]
    fn latest_installed_prefers_deps_and_uses_semver() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = setup(root.path());
        assert_eq!(latest_installed(&tree, "luasocket").expect("lookup").as_deref(), Some("3.1.0"));
        assert_eq!(latest_installed(&tree, "autologin").expect("lookup").as_deref(), Some("1.0.0"));
        assert_eq!(latest_installed(&tree, "ghost").expect("lookup"), None);
    }
}
