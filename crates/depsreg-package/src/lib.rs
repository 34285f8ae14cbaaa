//! # depsreg-package
//!
//! Everything that reads or rewrites the registry tree as a whole, and
//! everything that produces the distribution tree.
//!
//! Handles:
//! - **Add**: creating a new version directory from loose sources, with
//!   dependencies and security flags taken from source analysis.
//! - **Hash**: streaming SHA-256 of files and per-file digest maps.
//! - **Check**: manifest-versus-disk consistency of one version directory.
//! - **Archive**: deterministic zip archives of version directories and
//!   reading the manifest back out of them.
//! - **Indexer**: folding `dist/` archives into the published index.
//! - **Maintenance**: regenerate and migrate manifests in place.
//! - **Batch**: package-all, validate-all, regenerate-all, migrate-all,
//!   each returning a per-item outcome report.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod add;
pub mod archive;
pub mod batch;
pub mod check;
pub mod hash;
pub mod indexer;
pub mod migrate;
pub mod regenerate;

pub use add::{AddOptions, AddReport, add, build_manifest, parse_tags};
pub use archive::{archive_name, build_archive, extract_manifest};
pub use batch::{
    RegenerateReport, ValidationReport, migrate_all, package_all, regenerate_all, validate_all,
};
pub use check::check_manifest;
pub use hash::{hash_file, validate_hash};
pub use indexer::{generate_index, write_index};
pub use migrate::{MigrateOutcome, migrate};
pub use regenerate::{RegenerateOptions, RegenerateOutcome, regenerate};
