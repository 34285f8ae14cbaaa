//! Whole-source-set analysis: module references, risk flags, touched paths,
//! and dynamic-require warnings.

use std::collections::{BTreeSet, HashSet};
use std::path::Path;

use depsreg_common::error::Result;
use serde::Serialize;

use crate::paths::{prune_parent_paths, touched_paths};
use crate::patterns::Patterns;
use crate::source::source_files;
use crate::warning::{DynamicRequireDetector, Warning};

/// Filters applied to extracted module references.
#[derive(Debug, Clone, Default)]
pub struct AnalyzerOptions {
    /// Package being analyzed; references rooted at it are dropped (any case).
    pub exclude_id: Option<String>,
    /// When set, only references whose lower-cased root segment is listed survive.
    pub known_roots: Option<HashSet<String>>,
}

impl AnalyzerOptions {
    /// Options excluding self-references to `id`.
    #[must_use]
    pub fn excluding(id: impl Into<String>) -> Self {
        Self {
            exclude_id: Some(id.into()),
            known_roots: None,
        }
    }

    fn admits(&self, reference: &str) -> bool {
        let root = root_segment(reference);
        if self
            .exclude_id
            .as_deref()
            .is_some_and(|id| !id.is_empty() && root.eq_ignore_ascii_case(id))
        {
            return false;
        }
        self.known_roots
            .as_ref()
            .is_none_or(|roots| roots.contains(&root.to_lowercase()))
    }
}

/// Result of analyzing a file or directory.
///
/// `dependencies` and `file_paths` are sets; their iteration order is
/// lexical and carries no meaning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Analysis {
    /// Raw dotted module references, namespace marker stripped.
    pub dependencies: BTreeSet<String>,
    /// Most specific working-directory paths touched by file-I/O helpers.
    pub file_paths: BTreeSet<String>,
    /// Whether any file calls a networking library.
    pub uses_network: bool,
    /// Whether any file loads the FFI binding.
    pub uses_ffi: bool,
    /// Dynamic-require findings across all files.
    pub warnings: Vec<Warning>,
}

/// Lexical analyzer over script sources.
#[derive(Debug, Clone)]
pub struct SourceAnalyzer {
    patterns: Patterns,
    detector: DynamicRequireDetector,
    options: AnalyzerOptions,
}

impl SourceAnalyzer {
    /// Compiles the recognizers.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Pattern` if a recognizer fails to compile.
    pub fn new(options: AnalyzerOptions) -> Result<Self> {
        Ok(Self {
            patterns: Patterns::compile()?,
            detector: DynamicRequireDetector::new()?,
            options,
        })
    }

    /// Analyzes a source file or every source file under a directory.
    /// Unreadable files are skipped.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Io` if `path` is missing or cannot be walked.
    pub fn analyze(&self, path: &Path) -> Result<Analysis> {
        let mut analysis = Analysis::default();
        let mut touched = BTreeSet::new();

        for file in source_files(path)? {
            let content = match std::fs::read_to_string(&file) {
                Ok(content) => content,
                Err(e) => {
                    tracing::warn!(path = %file.display(), error = %e, "skipping unreadable source");
                    continue;
                }
            };
            self.scan(&content, &file, &mut analysis, &mut touched);
        }

        analysis.file_paths = prune_parent_paths(&touched);
        tracing::debug!(
            path = %path.display(),
            dependencies = analysis.dependencies.len(),
            warnings = analysis.warnings.len(),
            "analysis complete"
        );
        Ok(analysis)
    }

    /// Analyzes one in-memory source attributed to `file`.
    #[must_use]
    pub fn analyze_source(&self, content: &str, file: &Path) -> Analysis {
        let mut analysis = Analysis::default();
        let mut touched = BTreeSet::new();
        self.scan(content, file, &mut analysis, &mut touched);
        analysis.file_paths = prune_parent_paths(&touched);
        analysis
    }

    fn scan(
        &self,
        content: &str,
        file: &Path,
        analysis: &mut Analysis,
        touched: &mut BTreeSet<String>,
    ) {
        for reference in self.patterns.requires(content) {
            if self.options.admits(reference) {
                let _ = analysis.dependencies.insert(reference.to_string());
            }
        }
        analysis.uses_network |= self.patterns.network.is_match(content);
        analysis.uses_ffi |= self.patterns.ffi.is_match(content);
        touched.extend(touched_paths(&self.patterns, content));
        analysis.warnings.extend(self.detector.detect(content, file));
    }
}

/// Analyzes `path`, excluding references to `exclude_id` when given.
///
/// # Errors
///
/// See [`SourceAnalyzer::analyze`].
pub fn analyze_lua(path: &Path, exclude_id: Option<&str>) -> Result<Analysis> {
    let options = AnalyzerOptions {
        exclude_id: exclude_id.map(str::to_string),
        known_roots: None,
    };
    SourceAnalyzer::new(options)?.analyze(path)
}

/// First dotted segment of a module reference.
#[must_use]
pub fn root_segment(reference: &str) -> &str {
    reference.split('.').next().unwrap_or(reference)
}
