//! Per-package resolution of raw module references.

use std::collections::{BTreeMap, BTreeSet};
use std::path::{Path, PathBuf};

use depsreg_common::error::Result;
use serde::Serialize;

use crate::analyzer::{AnalyzerOptions, SourceAnalyzer, root_segment};
use crate::registry::Registry;
use crate::source::{module_name, source_files};
use crate::warning::Warning;

/// Runtime modules that are never registry dependencies.
pub const BUILTIN_MODULES: &[&str] = &[
    "bit",
    "bit32",
    "math",
    "string",
    "table",
    "os",
    "io",
    "debug",
    "coroutine",
    "package",
    "utf8",
    "ffi",
    "jit",
];

/// Checks whether `module` names a runtime builtin (any case).
#[must_use]
pub fn is_builtin(module: &str) -> bool {
    BUILTIN_MODULES
        .iter()
        .any(|builtin| builtin.eq_ignore_ascii_case(module))
}

/// Resolution view of one package.
#[derive(Debug, Clone)]
pub struct ResolutionContext<'r> {
    /// Package id.
    pub package_id: String,
    /// Directory the package sources live in.
    pub package_path: PathBuf,
    /// Dotted names of the package's own modules.
    pub internal_modules: BTreeSet<String>,
    /// Shared catalog.
    pub registry: &'r Registry,
}

impl<'r> ResolutionContext<'r> {
    /// Creates a context with an explicit internal module set.
    #[must_use]
    pub fn new(
        package_id: impl Into<String>,
        package_path: impl Into<PathBuf>,
        internal_modules: BTreeSet<String>,
        registry: &'r Registry,
    ) -> Self {
        Self {
            package_id: package_id.into(),
            package_path: package_path.into(),
            internal_modules,
            registry,
        }
    }

    /// Creates a context by listing the source files under `package_path`.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if the directory cannot be walked.
    pub fn scan(
        package_id: impl Into<String>,
        package_path: impl Into<PathBuf>,
        registry: &'r Registry,
    ) -> Result<Self> {
        let package_id = package_id.into();
        let package_path = package_path.into();
        let relative: Vec<PathBuf> = source_files(&package_path)?
            .into_iter()
            .filter_map(|f| f.strip_prefix(&package_path).ok().map(Path::to_path_buf))
            .collect();
        let internal_modules = internal_module_names(&package_id, &relative);
        Ok(Self::new(package_id, package_path, internal_modules, registry))
    }

    /// Checks whether `module_path` refers to the package itself.
    #[must_use]
    pub fn is_internal_module(&self, module_path: &str) -> bool {
        self.internal_modules.contains(module_path)
            || self
                .internal_modules
                .contains(&format!("{}.{module_path}", self.package_id))
            || root_segment(module_path) == self.package_id
    }
}

/// Registers each package-relative source file under its dotted path and
/// under that path prefixed with the package id.
#[must_use]
pub fn internal_module_names(package_id: &str, relative_files: &[PathBuf]) -> BTreeSet<String> {
    relative_files
        .iter()
        .filter_map(|rel| module_name(rel))
        .flat_map(|name| [format!("{package_id}.{name}"), name])
        .collect()
}

/// One external dependency derived from raw references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedDependency {
    /// Resolved package id, or the raw root segment when unresolved.
    pub package_id: String,
    /// First raw reference that produced this id.
    pub original_path: String,
    /// Whether `package_id` is present in the registry.
    pub resolved: bool,
}

/// Maps raw references to external package ids, keyed and deduplicated by id.
///
/// Internal modules, self-references and builtins are skipped. References
/// the registry cannot resolve fall back to their root segment and are kept
/// with `resolved == false`. The first reference for an id wins.
pub fn resolve_dependencies<'a, I>(
    ctx: &ResolutionContext<'_>,
    raw_modules: I,
) -> BTreeMap<String, ResolvedDependency>
where
    I: IntoIterator<Item = &'a str>,
{
    let mut resolved = BTreeMap::new();
    for module in raw_modules {
        if ctx.is_internal_module(module) {
            continue;
        }
        let root = root_segment(module);
        if root.eq_ignore_ascii_case(&ctx.package_id) || is_builtin(root) {
            continue;
        }
        let id = ctx.registry.resolve_module(module).unwrap_or(root);
        if id.is_empty() || id.eq_ignore_ascii_case(&ctx.package_id) {
            continue;
        }
        if resolved.contains_key(id) {
            continue;
        }
        let _ = resolved.insert(
            id.to_string(),
            ResolvedDependency {
                package_id: id.to_string(),
                original_path: module.to_string(),
                resolved: ctx.registry.contains(id),
            },
        );
    }
    resolved
}

/// Analysis of one package with references resolved against the registry.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ContextAnalysis {
    /// External dependencies keyed by package id.
    pub dependencies: BTreeMap<String, ResolvedDependency>,
    /// Most specific touched working-directory paths.
    pub file_paths: BTreeSet<String>,
    /// Whether any file calls a networking library.
    pub uses_network: bool,
    /// Whether any file loads the FFI binding.
    pub uses_ffi: bool,
    /// Dynamic-require findings.
    pub warnings: Vec<Warning>,
}

impl ContextAnalysis {
    /// Ids the registry knows about.
    pub fn resolved_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .values()
            .filter(|d| d.resolved)
            .map(|d| d.package_id.as_str())
    }

    /// Ids the registry could not resolve.
    pub fn unresolved_ids(&self) -> impl Iterator<Item = &str> {
        self.dependencies
            .values()
            .filter(|d| !d.resolved)
            .map(|d| d.package_id.as_str())
    }
}

/// Analyzes `path` and resolves its references within `ctx`.
///
/// # Errors
///
/// See [`SourceAnalyzer::analyze`].
pub fn analyze_with_context(ctx: &ResolutionContext<'_>, path: &Path) -> Result<ContextAnalysis> {
    let analysis = SourceAnalyzer::new(AnalyzerOptions::default())?.analyze(path)?;
    let dependencies = resolve_dependencies(ctx, analysis.dependencies.iter().map(String::as_str));
    for dep in dependencies.values().filter(|d| !d.resolved) {
        tracing::warn!(
            package = %ctx.package_id,
            dependency = %dep.package_id,
            module = %dep.original_path,
            "dependency not present in registry"
        );
    }
    Ok(ContextAnalysis {
        dependencies,
        file_paths: analysis.file_paths,
        uses_network: analysis.uses_network,
        uses_ffi: analysis.uses_ffi,
        warnings: analysis.warnings,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registry::{PackageInfo, RegistryBuilder};

    fn registry() -> Registry {
        let mut builder = RegistryBuilder::new();
        for id in ["luasocket", "cjson", "samp", "mylib"] {
            let _ = builder.add_package(PackageInfo {
                id: id.to_string(),
                version: "1.0.0".to_string(),
                provides: Vec::new(),
                files: Vec::new(),
            });
        }
        builder.apply_well_known_aliases().build()
    }

    fn ctx(registry: &Registry) -> ResolutionContext<'_> {
        let internal = internal_module_names(
            "mylib",
            &[PathBuf::from("init.lua"), PathBuf::from("util/strings.lua")],
        );
        ResolutionContext::new("mylib", "/pkg/mylib/1.0.0", internal, registry)
    }

    #[test]
    fn internal_names_include_prefixed_variants() {
        let names = internal_module_names("mylib", &[PathBuf::from("util/strings.lua")]);
        assert!(names.contains("util.strings"));
        assert!(names.contains("mylib.util.strings"));
    }

    #[test]
    fn alias_reference_resolves_to_providing_package() {
        let registry = registry();
        let deps = resolve_dependencies(&ctx(&registry), ["socket.http"]);
        let dep = &deps["luasocket"];
        assert_eq!(dep.original_path, "socket.http");
        assert!(dep.resolved);
    }

    #[test]
    fn builtins_are_never_dependencies() {
        let registry = registry();
        let deps = resolve_dependencies(&ctx(&registry), ["table", "OS", "string.format", "jit.util"]);
        assert!(deps.is_empty());
    }

    #[test]
    fn self_and_internal_references_are_dropped() {
        let registry = registry();
        let deps = resolve_dependencies(
            &ctx(&registry),
            ["MyLib.extra", "mylib", "util.strings", "init", "cjson"],
        );
        assert_eq!(deps.keys().collect::<Vec<_>>(), vec!["cjson"]);
    }

    #[test]
    fn unresolved_references_fall_back_to_root_segment() {
        let registry = registry();
        let deps = resolve_dependencies(&ctx(&registry), ["vkeys.extra", "vkeys"]);
        let dep = &deps["vkeys"];
        assert!(!dep.resolved);
        assert_eq!(dep.original_path, "vkeys.extra");
    }

    #[test]
    fn first_occurrence_wins() {
        let registry = registry();
        let deps = resolve_dependencies(&ctx(&registry), ["samp.events", "samp.raknet"]);
        assert_eq!(deps.len(), 1);
        assert_eq!(deps["samp"].original_path, "samp.events");
    }

    #[test]
    fn analyze_with_context_resolves_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        std::fs::create_dir_all(dir.path().join("util")).expect("mkdir");
        std::fs::write(
            dir.path().join("init.lua"),
            "local u = require('util.strings')\nlocal s = require('socket')\nlocal x = require('nothere')",
        )
        .expect("write");
        std::fs::write(dir.path().join("util/strings.lua"), "return {}").expect("write");

        let registry = registry();
        let ctx = ResolutionContext::scan("mylib", dir.path(), &registry).expect("scan");
        let analysis = analyze_with_context(&ctx, dir.path()).expect("analyze");

        assert_eq!(analysis.resolved_ids().collect::<Vec<_>>(), vec!["luasocket"]);
        assert_eq!(analysis.unresolved_ids().collect::<Vec<_>>(), vec!["nothere"]);
    }
}
