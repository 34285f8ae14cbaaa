//! SHA-256 content hashing and verification.

use std::collections::BTreeMap;
use std::fs::File;
use std::path::Path;

use depsreg_common::constants::MANIFEST_FILE;
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::FileInfo;
use depsreg_common::types::Sha256Hash;
use sha2::{Digest, Sha256};
use walkdir::WalkDir;

/// Computes the SHA-256 hash of a file.
///
/// # Errors
///
/// Returns an error if the file cannot be read.
pub fn hash_file(path: &Path) -> Result<Sha256Hash> {
    tracing::debug!(path = %path.display(), "computing SHA-256 hash");
    let mut file = File::open(path).map_err(|e| RegistryError::io(path, e))?;
    let mut hasher = Sha256::new();
    let _ = std::io::copy(&mut file, &mut hasher).map_err(|e| RegistryError::io(path, e))?;
    Ok(Sha256Hash::from_digest(&hasher.finalize()))
}

/// Validates that a file matches the expected SHA-256 hash.
///
/// # Errors
///
/// Returns `RegistryError::HashMismatch` if the hashes do not match.
pub fn validate_hash(path: &Path, expected: &Sha256Hash) -> Result<()> {
    let actual = hash_file(path)?;
    if &actual != expected {
        return Err(RegistryError::HashMismatch {
            resource: path.display().to_string(),
            expected: expected.as_hex().to_string(),
            actual: actual.as_hex().to_string(),
        });
    }
    Ok(())
}

/// Digest and size of one file.
///
/// # Errors
///
/// Returns an error if the file cannot be read or stat'ed.
pub fn file_info(path: &Path) -> Result<FileInfo> {
    let size = std::fs::metadata(path)
        .map_err(|e| RegistryError::io(path, e))?
        .len();
    Ok(FileInfo {
        sha256: hash_file(path)?,
        size,
    })
}

/// Lists every file under `dir` as a `/`-separated relative path, sorted,
/// excluding the top-level manifest.
///
/// # Errors
///
/// Returns an error if the directory cannot be walked.
pub fn list_files(dir: &Path) -> Result<Vec<String>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).sort_by_file_name() {
        let entry = entry.map_err(|e| RegistryError::io(dir, std::io::Error::other(e)))?;
        if !entry.file_type().is_file() {
            continue;
        }
        let rel = relative_name(dir, entry.path());
        if rel != MANIFEST_FILE {
            files.push(rel);
        }
    }
    Ok(files)
}

/// Digests every file under `dir` except the top-level manifest.
///
/// # Errors
///
/// Returns an error if any file cannot be read.
pub fn digest_dir(dir: &Path) -> Result<BTreeMap<String, FileInfo>> {
    list_files(dir)?
        .into_iter()
        .map(|name| {
            let info = file_info(&dir.join(&name))?;
            Ok((name, info))
        })
        .collect()
}

/// Re-digests the files named in `names`, relative to `dir`.
///
/// # Errors
///
/// Returns an error if a named file is missing or unreadable.
pub fn digest_named<'a, I>(dir: &Path, names: I) -> Result<BTreeMap<String, FileInfo>>
where
    I: IntoIterator<Item = &'a String>,
{
    names
        .into_iter()
        .map(|name| Ok((name.clone(), file_info(&dir.join(name))?)))
        .collect()
}

/// `/`-separated path of `path` relative to `base`.
pub(crate) fn relative_name(base: &Path, path: &Path) -> String {
    path.strip_prefix(base)
        .unwrap_or(path)
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

#[cfg(test)]
mod tests {
    use super::*;

    const HELLO_SHA256: &str = "2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824";

    #[test]
    fn hash_file_matches_known_digest() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello").expect("write");
        assert_eq!(hash_file(&path).expect("hash").as_hex(), HELLO_SHA256);
    }

    #[test]
    fn validate_hash_reports_mismatch() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("hello.txt");
        std::fs::write(&path, "hello").expect("write");

        let good = Sha256Hash::from_hex(HELLO_SHA256).expect("hex");
        validate_hash(&path, &good).expect("matches");

        let bad = Sha256Hash::from_hex("0".repeat(64)).expect("hex");
        let err = validate_hash(&path, &bad).unwrap_err();
        assert!(matches!(err, RegistryError::HashMismatch { .. }));
    }

    #[test]
    fn list_files_is_recursive_and_skips_manifest() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("lib/sub")).expect("mkdir");
        for rel in ["dep.json", "init.lua", "lib/sub/dep.json", "lib/a.lua"] {
            std::fs::write(dir.path().join(rel), rel).expect("write");
        }
        assert_eq!(
            list_files(dir.path()).expect("list"),
            vec!["init.lua", "lib/a.lua", "lib/sub/dep.json"]
        );
    }

    #[test]
    fn digest_dir_records_sizes() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::write(dir.path().join("init.lua"), "hello").expect("write");
        let files = digest_dir(dir.path()).expect("digest");
        assert_eq!(files["init.lua"].size, 5);
        assert_eq!(files["init.lua"].sha256.as_hex(), HELLO_SHA256);
    }

    #[test]
    fn missing_named_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let names = vec!["ghost.lua".to_string()];
        assert!(digest_named(dir.path(), &names).is_err());
    }
}
