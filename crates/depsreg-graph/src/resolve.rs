//! Transitive dependency resolution.

use std::collections::BTreeMap;

use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::{self, Manifest};
use depsreg_common::storage::RegistryTree;
use depsreg_common::types::ItemType;

use crate::version::select_version;

/// Namespace marker some manifests keep on dependency ids.
const NAMESPACE_PREFIX: &str = "lib.";

/// Read access to installed dependency manifests.
pub trait ManifestStore {
    /// Lists the installed versions of the package providing `id`.
    ///
    /// # Errors
    ///
    /// Returns an error if the listing fails.
    fn versions(&self, id: &str) -> Result<Vec<String>>;

    /// Loads the manifest of the package providing `id` at `version`.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest is missing or malformed.
    fn manifest(&self, id: &str, version: &str) -> Result<Manifest>;
}

/// [`ManifestStore`] over the `deps/` subtree. Dotted ids map to the
/// directory of their root segment.
#[derive(Debug, Clone, Copy)]
pub struct TreeStore<'a> {
    tree: &'a RegistryTree,
}

impl<'a> TreeStore<'a> {
    /// Wraps a registry tree.
    #[must_use]
    pub const fn new(tree: &'a RegistryTree) -> Self {
        Self { tree }
    }

    fn package_dir_name(id: &str) -> &str {
        let id = id.strip_prefix(NAMESPACE_PREFIX).unwrap_or(id);
        id.split('.').next().unwrap_or(id)
    }
}

impl ManifestStore for TreeStore<'_> {
    fn versions(&self, id: &str) -> Result<Vec<String>> {
        self.tree.versions(ItemType::Deps, Self::package_dir_name(id))
    }

    fn manifest(&self, id: &str, version: &str) -> Result<Manifest> {
        manifest::load(
            &self
                .tree
                .version_dir(ItemType::Deps, Self::package_dir_name(id), version),
        )
    }
}

/// Computes the transitive closure of `roots` (dependency id to constraint).
///
/// Each id maps to the installed version selected for its constraint. An id
/// already in the result is never revisited, which also terminates cycles
/// without reporting them. A dotted id with no installed manifest is kept
/// with its raw constraint; a root id with none fails.
///
/// # Errors
///
/// Returns `RegistryError::DependencyNotFound` for an uninstalled root id,
/// or the store's error if a selected manifest cannot be loaded.
pub fn resolve_transitive<S: ManifestStore + ?Sized>(
    store: &S,
    roots: &BTreeMap<String, String>,
) -> Result<BTreeMap<String, String>> {
    let mut resolved = BTreeMap::new();
    let mut pending: Vec<(String, String)> = roots
        .iter()
        .rev()
        .map(|(id, c)| (id.clone(), c.clone()))
        .collect();

    while let Some((id, constraint)) = pending.pop() {
        if resolved.contains_key(&id) {
            continue;
        }
        let versions = store.versions(&id)?;
        let Some(version) = select_version(&constraint, &versions).map(str::to_string) else {
            let bare = id.strip_prefix(NAMESPACE_PREFIX).unwrap_or(&id);
            if bare.contains('.') {
                tracing::debug!(id = %id, constraint = %constraint, "sub-module without manifest");
                let _ = resolved.insert(id, constraint);
                continue;
            }
            return Err(RegistryError::DependencyNotFound { id, constraint });
        };

        let manifest = store.manifest(&id, &version)?;
        tracing::debug!(id = %id, version = %version, "resolved dependency");
        let _ = resolved.insert(id, version);
        pending.extend(
            manifest
                .dependencies
                .into_iter()
                .rev()
                .filter(|(dep, _)| !resolved.contains_key(dep)),
        );
    }
    Ok(resolved)
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    #[derive(Default)]
    struct MemoryStore {
        manifests: HashMap<String, Vec<Manifest>>,
    }

    impl MemoryStore {
        fn with(mut self, id: &str, version: &str, deps: &[(&str, &str)]) -> Self {
            let mut m = Manifest::new(id, version);
            m.dependencies = deps
                .iter()
                .map(|(d, v)| ((*d).to_string(), (*v).to_string()))
                .collect();
            self.manifests.entry(id.to_string()).or_default().push(m);
            self
        }
    }

    impl ManifestStore for MemoryStore {
        fn versions(&self, id: &str) -> Result<Vec<String>> {
            Ok(self
                .manifests
                .get(id)
                .map(|ms| ms.iter().map(|m| m.version.clone()).collect())
                .unwrap_or_default())
        }

        fn manifest(&self, id: &str, version: &str) -> Result<Manifest> {
            self.manifests
                .get(id)
                .and_then(|ms| ms.iter().find(|m| m.version == version))
                .cloned()
                .ok_or_else(|| RegistryError::NotFound {
                    kind: "manifest",
                    id: format!("{id}@{version}"),
                })
        }
    }

    fn roots(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs
            .iter()
            .map(|(a, b)| ((*a).to_string(), (*b).to_string()))
            .collect()
    }

    #[test]
    fn closure_includes_nested_dependencies() {
        let store = MemoryStore::default()
            .with("requests", "1.0.0", &[("luasocket", "^3")])
            .with("luasocket", "3.0.0", &[("ltn12", "*")])
            .with("luasocket", "3.1.0", &[("ltn12", "*")])
            .with("ltn12", "1.0.0", &[]);

        let resolved = resolve_transitive(&store, &roots(&[("requests", "1.0.0")])).expect("resolve");
        assert_eq!(
            resolved,
            roots(&[("requests", "1.0.0"), ("luasocket", "3.1.0"), ("ltn12", "1.0.0")])
        );
    }

    #[test]
    fn cycles_terminate_silently() {
        let store = MemoryStore::default()
            .with("a", "1.0.0", &[("b", "1.0.0")])
            .with("b", "1.0.0", &[("a", "1.0.0")]);
        let resolved = resolve_transitive(&store, &roots(&[("a", "1.0.0")])).expect("resolve");
        assert_eq!(resolved.len(), 2);
    }

    #[test]
    fn dotted_ids_without_manifest_are_tolerated() {
        let store = MemoryStore::default().with("app", "1.0.0", &[("samp.events", "1.0.0")]);
        let resolved = resolve_transitive(&store, &roots(&[("app", "1.0.0")])).expect("resolve");
        assert_eq!(resolved["samp.events"], "1.0.0");
    }

    #[test]
    fn missing_root_id_is_lookup_failure() {
        let store = MemoryStore::default().with("app", "1.0.0", &[("ghost", "2.0.0")]);
        let err = resolve_transitive(&store, &roots(&[("app", "1.0.0")])).unwrap_err();
        assert!(matches!(err, RegistryError::DependencyNotFound { ref id, .. } if id == "ghost"));
    }

    #[test]
    fn tree_store_maps_dotted_ids_to_root_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(dir.path());
        let vdir = tree.version_dir(ItemType::Deps, "samp", "2.0.0");
        std::fs::create_dir_all(&vdir).expect("mkdir");
        manifest::save(&vdir, &Manifest::new("samp", "2.0.0")).expect("save");

        let store = TreeStore::new(&tree);
        assert_eq!(store.versions("lib.samp.events").expect("versions"), vec!["2.0.0"]);
        let resolved =
            resolve_transitive(&store, &roots(&[("samp.events", "*")])).expect("resolve");
        assert_eq!(resolved["samp.events"], "2.0.0");
    }
}
