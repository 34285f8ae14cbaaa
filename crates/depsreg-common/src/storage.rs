//! On-disk layout of the registry source tree.
//!
//! Packages live at `<root>/<itemType>/<id>/<version>/`, each version
//! directory holding its sources plus exactly one `dep.json`.

use std::path::{Path, PathBuf};

use crate::error::{RegistryError, Result};
use crate::types::ItemType;

/// One discovered version directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDir {
    /// Subtree the package lives in.
    pub item_type: ItemType,
    /// Package directory name.
    pub id: String,
    /// Version directory name.
    pub version: String,
    /// Absolute or root-relative path of the version directory.
    pub path: PathBuf,
}

impl VersionDir {
    /// Returns `"<itemType>/<id>/<version>"`, used to label batch items.
    #[must_use]
    pub fn label(&self) -> String {
        format!("{}/{}/{}", self.item_type, self.id, self.version)
    }
}

/// Read access to the registry source tree.
#[derive(Debug, Clone)]
pub struct RegistryTree {
    /// Root directory containing `deps/` and `scripts/`.
    root: PathBuf,
}

impl RegistryTree {
    /// Opens the registry tree rooted at `root`.
    #[must_use]
    pub fn open(root: impl Into<PathBuf>) -> Self {
        let root = root.into();
        tracing::debug!(path = %root.display(), "opening registry tree");
        Self { root }
    }

    /// Returns the root storage path.
    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Returns the directory holding all packages of `item_type`.
    #[must_use]
    pub fn item_dir(&self, item_type: ItemType) -> PathBuf {
        self.root.join(item_type.dir_name())
    }

    /// Returns the directory of one package.
    #[must_use]
    pub fn package_dir(&self, item_type: ItemType, id: &str) -> PathBuf {
        self.item_dir(item_type).join(id)
    }

    /// Returns the directory of one package version.
    #[must_use]
    pub fn version_dir(&self, item_type: ItemType, id: &str, version: &str) -> PathBuf {
        self.package_dir(item_type, id).join(version)
    }

    /// Checks whether a package version directory exists.
    #[must_use]
    pub fn has_version(&self, item_type: ItemType, id: &str, version: &str) -> bool {
        self.version_dir(item_type, id, version).is_dir()
    }

    /// Lists package ids of `item_type`, sorted. A missing subtree is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the subtree exists but cannot be read.
    pub fn package_ids(&self, item_type: ItemType) -> Result<Vec<String>> {
        list_subdirs(&self.item_dir(item_type))
    }

    /// Lists installed versions of one package, sorted by name.
    /// A missing package directory yields no versions.
    ///
    /// # Errors
    ///
    /// Returns an error if the package directory exists but cannot be read.
    pub fn versions(&self, item_type: ItemType, id: &str) -> Result<Vec<String>> {
        list_subdirs(&self.package_dir(item_type, id))
    }

    /// Lists every version directory of `item_type`, ordered by id then version name.
    /// Packages whose directory cannot be read are skipped with a warning.
    ///
    /// # Errors
    ///
    /// Returns an error if the item subtree exists but cannot be read.
    pub fn version_dirs(&self, item_type: ItemType) -> Result<Vec<VersionDir>> {
        let mut dirs = Vec::new();
        for id in self.package_ids(item_type)? {
            let versions = match self.versions(item_type, &id) {
                Ok(v) => v,
                Err(e) => {
                    tracing::warn!(id = %id, error = %e, "skipping unreadable package directory");
                    continue;
                }
            };
            for version in versions {
                dirs.push(VersionDir {
                    item_type,
                    path: self.version_dir(item_type, &id, &version),
                    id: id.clone(),
                    version,
                });
            }
        }
        Ok(dirs)
    }
}

/// Returns the sorted names of the immediate subdirectories of `dir`.
fn list_subdirs(dir: &Path) -> Result<Vec<String>> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(e) => return Err(RegistryError::io(dir, e)),
    };
    let mut names = Vec::new();
    for entry in entries {
        let entry = entry.map_err(|e| RegistryError::io(dir, e))?;
        if entry.file_type().is_ok_and(|t| t.is_dir()) {
            names.push(entry.file_name().to_string_lossy().into_owned());
        }
    }
    names.sort();
    Ok(names)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mkdirs(root: &Path, rel: &[&str]) {
        for r in rel {
            std::fs::create_dir_all(root.join(r)).expect("mkdir");
        }
    }

    #[test]
    fn missing_item_dir_lists_nothing() {
        let dir = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(dir.path());
        assert!(tree.package_ids(ItemType::Deps).expect("list").is_empty());
        assert!(tree.version_dirs(ItemType::Scripts).expect("list").is_empty());
    }

    #[test]
    fn version_dirs_are_sorted_and_skip_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        mkdirs(
            dir.path(),
            &["deps/zlib/1.0.0", "deps/cjson/2.1.0", "deps/cjson/2.0.0"],
        );
        std::fs::write(dir.path().join("deps/README.md"), "x").expect("write");

        let tree = RegistryTree::open(dir.path());
        let labels: Vec<String> = tree
            .version_dirs(ItemType::Deps)
            .expect("list")
            .iter()
            .map(VersionDir::label)
            .collect();
        assert_eq!(
            labels,
            vec!["deps/cjson/2.0.0", "deps/cjson/2.1.0", "deps/zlib/1.0.0"]
        );
    }

    #[test]
    fn has_version_checks_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        mkdirs(dir.path(), &["scripts/autologin/1.2.0"]);
        let tree = RegistryTree::open(dir.path());
        assert!(tree.has_version(ItemType::Scripts, "autologin", "1.2.0"));
        assert!(!tree.has_version(ItemType::Scripts, "autologin", "9.9.9"));
        assert!(tree
            .version_dir(ItemType::Scripts, "autologin", "1.2.0")
            .ends_with("scripts/autologin/1.2.0"));
    }
}
