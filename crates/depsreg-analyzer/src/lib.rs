//! # depsreg-analyzer
//!
//! Static analysis of script sources and translation of raw module
//! references into registry package identities.
//!
//! Handles:
//! - **Analyzer**: `require` extraction, dynamic-require warnings, network
//!   and FFI detection, and touched working-directory paths.
//! - **Registry**: In-memory package catalog with longest-prefix module
//!   resolution through ids and `provides` aliases.
//! - **Context**: Per-package resolution that drops internal, self, and
//!   builtin modules.
//! - **Metadata**: Script header declarations used when adding a script.
//!
//! Recognition is lexical: fixed patterns, no parser and no evaluation.

#![cfg_attr(test, allow(clippy::expect_used, clippy::unwrap_used))]

pub mod aliases;
pub mod analyzer;
pub mod context;
pub mod metadata;
pub mod paths;
pub mod patterns;
pub mod registry;
pub mod source;
pub mod warning;

pub use analyzer::{Analysis, AnalyzerOptions, SourceAnalyzer, analyze_lua};
pub use context::{
    ContextAnalysis, ResolutionContext, ResolvedDependency, analyze_with_context,
    resolve_dependencies,
};
pub use metadata::{ScriptMetadata, extract_metadata};
pub use registry::{PackageInfo, Registry, RegistryBuilder};
pub use warning::{Severity, Warning, WarningKind};
