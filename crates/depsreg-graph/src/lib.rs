//! # depsreg-graph
//!
//! Graph-level reasoning over the manifest set.
//!
//! Handles:
//! - **Version**: semver-aware ordering with a lexicographic fallback for
//!   strings that are not versions, latest selection, and constraint matching.
//! - **Resolve**: transitive closure of a dependency map.
//! - **Validate**: cycle detection and duplicate-content detection across
//!   every known manifest. Findings are returned as data, never as errors.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod resolve;
pub mod validate;
pub mod version;

pub use resolve::{ManifestStore, TreeStore, resolve_transitive};
pub use validate::cycles::{Cycle, DependencyGraph, detect_cycles};
pub use validate::duplicates::{DuplicateSet, detect_duplicates};
