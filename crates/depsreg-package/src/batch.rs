//! Whole-tree batch operations.
//!
//! Every loop here is best-effort: a failing version directory is recorded
//! in the returned [`BatchReport`] and the loop moves on. Only setup errors,
//! such as an unreadable item subtree or an uncreatable output directory,
//! abort the run.

use std::path::{Path, PathBuf};

use depsreg_analyzer::Registry;
use depsreg_common::error::{RegistryError, Result};
use depsreg_common::manifest::Manifest;
use depsreg_common::storage::{RegistryTree, VersionDir};
use depsreg_common::types::{BatchReport, ItemType};
use depsreg_graph::{Cycle, DuplicateSet, detect_cycles, detect_duplicates};

use crate::archive::{archive_name, build_archive};
use crate::check::check_manifest;
use crate::migrate::{MigrateOutcome, migrate};
use crate::regenerate::{RegenerateOptions, RegenerateOutcome, regenerate};

fn all_version_dirs(tree: &RegistryTree) -> Result<Vec<VersionDir>> {
    let mut dirs = Vec::new();
    for item_type in ItemType::ALL {
        dirs.extend(tree.version_dirs(item_type)?);
    }
    Ok(dirs)
}

/// Result of checking every manifest in the tree.
#[derive(Debug)]
pub struct ValidationReport {
    /// Per-version consistency outcomes.
    pub items: BatchReport<Manifest>,
    /// Dependency cycles among the manifests that passed.
    pub cycles: Vec<Cycle>,
    /// Packages with byte-identical content under different ids.
    pub duplicates: Vec<DuplicateSet>,
}

impl ValidationReport {
    /// Returns `true` when every manifest passed and no cycle was found.
    ///
    /// Duplicate sets are advisory and do not affect validity.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.items.is_success() && self.cycles.is_empty()
    }
}

/// Checks every version directory, then runs the graph validators over
/// the manifests that passed.
///
/// # Errors
///
/// Returns an error if an item subtree exists but cannot be listed.
pub fn validate_all(tree: &RegistryTree) -> Result<ValidationReport> {
    let mut items = BatchReport::new();
    for dir in all_version_dirs(tree)? {
        items.record(dir.label(), check_manifest(&dir.path));
    }

    let manifests: Vec<&Manifest> = items.successes().map(|(_, m)| m).collect();
    let cycles = detect_cycles(manifests.iter().copied());
    let duplicates = detect_duplicates(manifests.iter().copied());
    for cycle in &cycles {
        tracing::warn!(cycle = %cycle, "dependency cycle");
    }
    for set in &duplicates {
        tracing::warn!(duplicates = %set, "duplicate package content");
    }
    tracing::info!(
        checked = items.outcomes.len(),
        failed = items.failed(),
        cycles = cycles.len(),
        duplicates = duplicates.len(),
        "validation finished"
    );
    Ok(ValidationReport {
        items,
        cycles,
        duplicates,
    })
}

fn package_one(dir: &VersionDir, out_dir: &Path) -> Result<PathBuf> {
    let m = check_manifest(&dir.path)?;
    build_archive(&dir.path, &out_dir.join(archive_name(&m.id, &m.version)))
}

/// Archives every consistent version directory into `dist/<itemType>/`.
///
/// Directories failing [`check_manifest`] are recorded as failures and not
/// archived.
///
/// # Errors
///
/// Returns an error if an output directory cannot be created or an item
/// subtree cannot be listed.
pub fn package_all(tree: &RegistryTree, dist: &Path) -> Result<BatchReport<PathBuf>> {
    let mut report = BatchReport::new();
    for item_type in ItemType::ALL {
        let out_dir = dist.join(item_type.dir_name());
        std::fs::create_dir_all(&out_dir).map_err(|e| RegistryError::io(&out_dir, e))?;
        for dir in tree.version_dirs(item_type)? {
            report.record(dir.label(), package_one(&dir, &out_dir));
        }
    }
    tracing::info!(
        packaged = report.succeeded(),
        failed = report.failed(),
        dist = %dist.display(),
        "packaging finished"
    );
    Ok(report)
}

/// Result of a regenerate-all run.
#[derive(Debug)]
pub struct RegenerateReport {
    /// Per-version regeneration outcomes.
    pub items: BatchReport<RegenerateOutcome>,
    /// Tree validation after regeneration, absent when skipped.
    pub validation: Option<ValidationReport>,
}

impl RegenerateReport {
    /// Returns `true` when no item failed and validation, if run, passed.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.items.is_success() && self.validation.as_ref().is_none_or(ValidationReport::is_valid)
    }
}

/// Regenerates every manifest against a registry scanned once up front.
///
/// # Errors
///
/// Returns an error if the registry scan fails or an item subtree cannot be
/// listed.
pub fn regenerate_all(tree: &RegistryTree, options: RegenerateOptions) -> Result<RegenerateReport> {
    let registry = Registry::scan(tree)?;
    let mut items = BatchReport::new();
    for dir in all_version_dirs(tree)? {
        items.record(dir.label(), regenerate(tree, &registry, &dir, options.dry_run));
    }
    let updated = items
        .successes()
        .filter(|(_, o)| matches!(o, RegenerateOutcome::Updated { .. }))
        .count();
    tracing::info!(updated, failed = items.failed(), dry_run = options.dry_run, "regeneration finished");

    let validation = if options.skip_validation {
        None
    } else {
        Some(validate_all(tree)?)
    };
    Ok(RegenerateReport { items, validation })
}

/// Migrates every legacy manifest in the tree.
///
/// # Errors
///
/// Returns an error if an item subtree cannot be listed.
pub fn migrate_all(tree: &RegistryTree) -> Result<BatchReport<MigrateOutcome>> {
    let mut report = BatchReport::new();
    for dir in all_version_dirs(tree)? {
        report.record(dir.label(), migrate(&dir.path));
    }
    Ok(report)
}

#[cfg(test)]
mod tests {
    use depsreg_common::manifest;

    use super::*;
    use crate::hash::digest_dir;

    fn install(tree: &RegistryTree, id: &str, version: &str, deps: &[&str]) -> PathBuf {
        let dir = tree.version_dir(ItemType::Deps, id, version);
        std::fs::create_dir_all(&dir).expect("mkdir");
        std::fs::write(dir.join("init.lua"), format!("-- {id}")).expect("write");
        let mut m = Manifest::new(id, version);
        m.files = digest_dir(&dir).expect("digest");
        for d in deps {
            let _ = m.dependencies.insert((*d).to_string(), "1.0.0".to_string());
        }
        manifest::save(&dir, &m).expect("save");
        dir
    }

    #[test]
    fn validate_all_reports_failures_and_cycles() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(root.path());
        let _ = install(&tree, "a", "1.0.0", &["b"]);
        let _ = install(&tree, "b", "1.0.0", &["a"]);
        let broken = install(&tree, "c", "1.0.0", &[]);
        std::fs::write(broken.join("stray.lua"), "x").expect("write");

        let report = validate_all(&tree).expect("validate");
        assert_eq!(report.items.succeeded(), 2);
        assert_eq!(report.items.failed(), 1);
        assert_eq!(report.cycles.len(), 1);
        assert!(!report.is_valid());
    }

    #[test]
    fn duplicates_alone_keep_tree_valid() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(root.path());
        for id in ["x", "y"] {
            let dir = tree.version_dir(ItemType::Deps, id, "1.0.0");
            std::fs::create_dir_all(&dir).expect("mkdir");
            std::fs::write(dir.join("init.lua"), "same").expect("write");
            let mut m = Manifest::new(id, "1.0.0");
            m.files = digest_dir(&dir).expect("digest");
            manifest::save(&dir, &m).expect("save");
        }

        let report = validate_all(&tree).expect("validate");
        assert_eq!(report.duplicates.len(), 1);
        assert!(report.is_valid());
    }

    #[test]
    fn package_all_skips_inconsistent_directories() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(root.path().join("registry"));
        let _ = install(&tree, "good", "1.0.0", &[]);
        let bad = install(&tree, "bad", "1.0.0", &[]);
        std::fs::remove_file(bad.join("init.lua")).expect("remove");
        let dist = root.path().join("dist");

        let report = package_all(&tree, &dist).expect("package");
        assert_eq!(report.succeeded(), 1);
        assert_eq!(report.failed(), 1);
        assert!(dist.join("deps/good-1.0.0.zip").is_file());
        assert!(!dist.join("deps/bad-1.0.0.zip").exists());
        assert!(dist.join("scripts").is_dir());
    }

    #[test]
    fn regenerate_all_can_skip_validation() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(root.path());
        let _ = install(&tree, "a", "1.0.0", &[]);

        let report = regenerate_all(
            &tree,
            RegenerateOptions {
                dry_run: false,
                skip_validation: true,
            },
        )
        .expect("regenerate");
        assert!(report.validation.is_none());
        assert!(report.is_success());

        let report = regenerate_all(&tree, RegenerateOptions::default()).expect("regenerate");
        assert!(report.validation.is_some_and(|v| v.is_valid()));
    }

    #[test]
    fn migrate_all_counts_each_directory() {
        let root = tempfile::tempdir().expect("tempdir");
        let tree = RegistryTree::open(root.path());
        let _ = install(&tree, "current", "1.0.0", &[]);
        let legacy = tree.version_dir(ItemType::Scripts, "old", "0.1.0");
        std::fs::create_dir_all(&legacy).expect("mkdir");
        std::fs::write(legacy.join("dep.json"), r#"{"id":"old","version":"0.1.0"}"#)
            .expect("write");

        let report = migrate_all(&tree).expect("migrate");
        let outcomes: Vec<(&str, &MigrateOutcome)> = report.successes().collect();
        assert_eq!(
            outcomes,
            vec![
                ("deps/current/1.0.0", &MigrateOutcome::AlreadyCurrent),
                ("scripts/old/0.1.0", &MigrateOutcome::Migrated),
            ]
        );
    }
}
