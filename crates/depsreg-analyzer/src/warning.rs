//! Dynamic-require findings.
//!
//! A `require` whose argument is not a string literal cannot be resolved
//! statically. Each recognizer is a [`WarningKind`] variant carrying its own
//! pattern, severity, and message.

use std::fmt;
use std::path::PathBuf;

use depsreg_common::error::Result;
use regex::Regex;
use serde::Serialize;

/// How serious a finding is. Findings are reported, never enforced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum Severity {
    /// Purely informational.
    Info,
    /// Worth a reviewer's attention.
    Warning,
    /// Likely broken.
    Error,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Shape of a non-literal `require` argument.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WarningKind {
    /// `require(name)` with a bare identifier.
    VariableRequire,
    /// `require(t[k])` with an index expression.
    TableRequire,
    /// `require("a" .. b)` with a string concatenation.
    ConcatRequire,
}

impl WarningKind {
    /// Every recognizer, in reporting order.
    pub const ALL: [Self; 3] = [Self::VariableRequire, Self::TableRequire, Self::ConcatRequire];

    /// Line pattern recognizing this kind.
    #[must_use]
    pub const fn pattern(self) -> &'static str {
        match self {
            Self::VariableRequire => r"require\s*\(\s*([a-zA-Z_][a-zA-Z0-9_]*)\s*\)",
            Self::TableRequire => r"require\s*\(\s*.+\[.+\]\s*\)",
            Self::ConcatRequire => r"require\s*\(\s*.+\.\..+\s*\)",
        }
    }

    /// Severity attached to findings of this kind.
    #[must_use]
    pub const fn severity(self) -> Severity {
        match self {
            Self::VariableRequire | Self::TableRequire | Self::ConcatRequire => Severity::Warning,
        }
    }

    /// Operator-facing message.
    #[must_use]
    pub const fn message(self) -> &'static str {
        match self {
            Self::VariableRequire => "Dynamic require detected with variable",
            Self::TableRequire => "Dynamic require detected with table index",
            Self::ConcatRequire => "Dynamic require detected with concatenation",
        }
    }
}

/// One dynamic-require finding.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Warning {
    /// Recognizer that fired.
    pub kind: WarningKind,
    /// Source file the line belongs to.
    pub file: PathBuf,
    /// 1-based line number.
    pub line: usize,
    /// Captured argument text, empty when the pattern captures none.
    pub module: String,
    /// Severity of the finding.
    pub severity: Severity,
    /// Operator-facing message.
    pub message: &'static str,
}

impl fmt::Display for Warning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}: {} ({})",
            self.file.display(),
            self.line,
            self.message,
            self.severity
        )
    }
}

/// Compiled dynamic-require recognizers.
#[derive(Debug, Clone)]
pub struct DynamicRequireDetector {
    rules: Vec<(WarningKind, Regex)>,
}

impl DynamicRequireDetector {
    /// Compiles the pattern of every [`WarningKind`].
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Pattern` if a pattern fails to compile.
    pub fn new() -> Result<Self> {
        let rules = WarningKind::ALL
            .iter()
            .map(|&kind| Regex::new(kind.pattern()).map(|re| (kind, re)))
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(Self { rules })
    }

    /// Scans `source` line by line. One line may trigger several kinds.
    pub fn detect(&self, source: &str, file: &std::path::Path) -> Vec<Warning> {
        let mut warnings = Vec::new();
        for (idx, line) in source.lines().enumerate() {
            for (kind, re) in &self.rules {
                let Some(caps) = re.captures(line) else {
                    continue;
                };
                warnings.push(Warning {
                    kind: *kind,
                    file: file.to_path_buf(),
                    line: idx + 1,
                    module: caps
                        .get(1)
                        .map(|m| m.as_str().to_string())
                        .unwrap_or_default(),
                    severity: kind.severity(),
                    message: kind.message(),
                });
            }
        }
        warnings
    }
}
