//! Duplicate-content detection.
//!
//! Two packages whose `files` maps list the same names with the same
//! digests are byte-identical re-publications under different ids.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use depsreg_common::manifest::Manifest;
use depsreg_common::types::Sha256Hash;
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Packages sharing one content signature.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateSet {
    /// Ids of the packages, sorted.
    pub packages: BTreeSet<String>,
    /// Digest over the sorted `(file name, file digest)` list.
    pub signature: Sha256Hash,
}

impl fmt::Display for DuplicateSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let ids: Vec<&str> = self.packages.iter().map(String::as_str).collect();
        write!(f, "{} share identical files", ids.join(", "))
    }
}

/// Computes the content signature of a manifest: SHA-256 over
/// `name \0 digest \0` for every file, in name order.
#[must_use]
pub fn content_signature(manifest: &Manifest) -> Sha256Hash {
    let mut hasher = Sha256::new();
    for (name, info) in &manifest.files {
        hasher.update(name.as_bytes());
        hasher.update([0u8]);
        hasher.update(info.sha256.as_hex().as_bytes());
        hasher.update([0u8]);
    }
    Sha256Hash::from_digest(&hasher.finalize())
}

/// Groups manifests by content signature and returns every group with
/// more than one distinct id, ordered by first id.
pub fn detect_duplicates<'a, I>(manifests: I) -> Vec<DuplicateSet>
where
    I: IntoIterator<Item = &'a Manifest>,
{
    let mut groups: BTreeMap<Sha256Hash, BTreeSet<String>> = BTreeMap::new();
    for manifest in manifests {
        let _ = groups
            .entry(content_signature(manifest))
            .or_default()
            .insert(manifest.id.clone());
    }

    let mut sets: Vec<DuplicateSet> = groups
        .into_iter()
        .filter(|(_, packages)| packages.len() > 1)
        .map(|(signature, packages)| DuplicateSet {
            packages,
            signature,
        })
        .collect();
    sets.sort_by(|a, b| a.packages.iter().next().cmp(&b.packages.iter().next()));
    sets
}

#[cfg(test)]
mod tests {
    use depsreg_common::manifest::FileInfo;

    use super::*;

    fn digest(byte: u8) -> Sha256Hash {
        Sha256Hash::from_digest(&[byte; 32])
    }

    fn manifest(id: &str, files: &[(&str, u8)]) -> Manifest {
        let mut m = Manifest::new(id, "1.0.0");
        m.files = files
            .iter()
            .map(|(name, byte)| {
                (
                    (*name).to_string(),
                    FileInfo {
                        sha256: digest(*byte),
                        size: 10,
                    },
                )
            })
            .collect();
        m
    }

    #[test]
    fn identical_file_maps_form_one_set() {
        let ms = [
            manifest("X", &[("init.lua", 1), ("util.lua", 2)]),
            manifest("Y", &[("util.lua", 2), ("init.lua", 1)]),
            manifest("Z", &[("init.lua", 1)]),
        ];
        let sets = detect_duplicates(&ms);
        assert_eq!(sets.len(), 1);
        let ids: Vec<&str> = sets[0].packages.iter().map(String::as_str).collect();
        assert_eq!(ids, vec!["X", "Y"]);
        assert_eq!(sets[0].signature, content_signature(&ms[0]));
    }

    #[test]
    fn same_names_different_digests_are_distinct() {
        let ms = [manifest("a", &[("init.lua", 1)]), manifest("b", &[("init.lua", 9)])];
        assert!(detect_duplicates(&ms).is_empty());
    }

    #[test]
    fn versions_of_one_package_are_not_duplicates() {
        let mut newer = manifest("a", &[("init.lua", 1)]);
        newer.version = "2.0.0".to_string();
        let ms = [manifest("a", &[("init.lua", 1)]), newer];
        assert!(detect_duplicates(&ms).is_empty());
    }

    #[test]
    fn signature_separates_name_and_digest() {
        let a = manifest("a", &[("ab", 1)]);
        let b = manifest("b", &[("a", 1)]);
        assert_ne!(content_signature(&a), content_signature(&b));
    }
}
