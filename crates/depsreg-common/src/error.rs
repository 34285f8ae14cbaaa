//! Unified error types for the depsreg workspace.
//!
//! Graph findings (cycles, duplicate sets) are deliberately absent here:
//! validators return them as data so callers decide whether they are fatal.

use std::path::PathBuf;

use thiserror::Error;

/// Top-level error type shared across the workspace.
#[derive(Debug, Error)]
pub enum RegistryError {
    /// An I/O operation failed.
    #[error("I/O error at {path}: {source}")]
    Io {
        /// Path where the I/O error occurred.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// A manifest could not be parsed or is missing required content.
    #[error("invalid manifest at {path}: {message}")]
    InvalidManifest {
        /// Version directory or manifest file at fault.
        path: PathBuf,
        /// Description of the problem.
        message: String,
    },

    /// A configuration value is invalid.
    #[error("invalid configuration: {message}")]
    Config {
        /// Description of the invalid configuration.
        message: String,
    },

    /// A required resource was not found.
    #[error("{kind} not found: {id}")]
    NotFound {
        /// Type of the missing resource.
        kind: &'static str,
        /// Identifier of the missing resource.
        id: String,
    },

    /// A package version is already present and may not be overwritten.
    #[error("{kind} already exists: {id}")]
    AlreadyExists {
        /// Where the version was found.
        kind: &'static str,
        /// `<id>@<version>` of the conflicting package.
        id: String,
    },

    /// A root dependency has no installed manifest matching its constraint.
    #[error("dependency {id} ({constraint}) has no installed manifest")]
    DependencyNotFound {
        /// Dependency identifier.
        id: String,
        /// Declared version constraint.
        constraint: String,
    },

    /// A hash validation failed.
    #[error("hash mismatch for {resource}: expected {expected}, got {actual}")]
    HashMismatch {
        /// Resource that failed validation.
        resource: String,
        /// Expected hash value.
        expected: String,
        /// Actual computed hash value.
        actual: String,
    },

    /// Reading or writing an archive failed.
    #[error("archive error at {path}: {message}")]
    Archive {
        /// Archive path.
        path: PathBuf,
        /// Description of the failure.
        message: String,
    },

    /// The registry index could not be fetched.
    #[error("network error: {message}")]
    Network {
        /// Description of the failure.
        message: String,
    },

    /// Serialization or deserialization failed.
    #[error("serialization error: {source}")]
    Serialization {
        /// Underlying serialization error.
        #[from]
        source: serde_json::Error,
    },

    /// A recognizer pattern failed to compile.
    #[error("invalid pattern: {source}")]
    Pattern {
        /// Underlying regex error.
        #[from]
        source: regex::Error,
    },
}

impl RegistryError {
    /// Wraps an I/O error together with the path it occurred at.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

/// Convenience alias used throughout the workspace.
pub type Result<T> = std::result::Result<T, RegistryError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_message_names_path() {
        let err = RegistryError::io(
            "/tmp/missing/dep.json",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert!(err.to_string().contains("/tmp/missing/dep.json"));
    }

    #[test]
    fn dependency_not_found_message_names_constraint() {
        let err = RegistryError::DependencyNotFound {
            id: "cjson".into(),
            constraint: "2.1.0".into(),
        };
        assert_eq!(
            err.to_string(),
            "dependency cjson (2.1.0) has no installed manifest"
        );
    }
}
