//! Script header declarations (`script_name`, `script_version`, `script_author`).

use std::path::Path;

use depsreg_common::constants::DEFAULT_SCRIPT_VERSION;
use depsreg_common::error::{RegistryError, Result};
use regex::Regex;
use serde::Serialize;

use crate::source::source_files;

/// Identity of a script derived from its header declarations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ScriptMetadata {
    /// Registry id, slugified from the name.
    pub id: String,
    /// Declared display name, or the file stem.
    pub name: String,
    /// Declared version, or `1.0.0`.
    pub version: String,
    /// Declared author, if any.
    pub author: Option<String>,
}

fn declaration(content: &str, function: &str) -> Result<Option<String>> {
    let re = Regex::new(&format!(r#"{function}\s*\(\s*["'](.+?)["']\s*\)"#))?;
    Ok(re
        .captures(content)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string()))
}

/// Reads header declarations from `content`, falling back to
/// `fallback_name` when no `script_name` is declared.
///
/// # Errors
///
/// Returns `RegistryError::Pattern` if a recognizer fails to compile.
pub fn extract_metadata(content: &str, fallback_name: &str) -> Result<ScriptMetadata> {
    let name = declaration(content, "script_name")?.unwrap_or_else(|| fallback_name.to_string());
    let version = declaration(content, "script_version")?
        .unwrap_or_else(|| DEFAULT_SCRIPT_VERSION.to_string());
    let author = declaration(content, "script_author")?;
    Ok(ScriptMetadata {
        id: slugify(&name),
        name,
        version,
        author,
    })
}

/// Reads header declarations from the first source file under `path`.
///
/// # Errors
///
/// Returns `RegistryError::NotFound` if `path` holds no source file, or an
/// I/O error if it cannot be read.
pub fn extract_from_path(path: &Path) -> Result<ScriptMetadata> {
    let first = source_files(path)?
        .into_iter()
        .next()
        .ok_or_else(|| RegistryError::NotFound {
            kind: "source file",
            id: path.display().to_string(),
        })?;
    let content = std::fs::read_to_string(&first).map_err(|e| RegistryError::io(&first, e))?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    extract_metadata(&content, &fallback)
}

/// Lower-cases `name` and collapses every run of characters outside
/// `[a-z0-9-]` into one `-`, trimming dashes at both ends.
#[must_use]
pub fn slugify(name: &str) -> String {
    let mut slug = String::with_capacity(name.len());
    let mut in_run = false;
    for c in name.to_lowercase().chars() {
        if c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-' {
            slug.push(c);
            in_run = false;
        } else if !in_run {
            slug.push('-');
            in_run = true;
        }
    }
    slug.trim_matches('-').to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn declarations_are_extracted() {
        let src = r#"
script_name("Auto Login")
script_version('2.3.1')
script_author("someone")
"#;
        let meta = extract_metadata(src, "fallback").expect("extract");
        assert_eq!(meta.name, "Auto Login");
        assert_eq!(meta.id, "auto-login");
        assert_eq!(meta.version, "2.3.1");
        assert_eq!(meta.author.as_deref(), Some("someone"));
    }

    #[test]
    fn missing_declarations_use_defaults() {
        let meta = extract_metadata("print('hi')", "My_Tool").expect("extract");
        assert_eq!(meta.name, "My_Tool");
        assert_eq!(meta.id, "my-tool");
        assert_eq!(meta.version, "1.0.0");
        assert!(meta.author.is_none());
    }

    #[test]
    fn slugify_collapses_and_trims() {
        assert_eq!(slugify("  Hello,  World!! "), "hello-world");
        assert_eq!(slugify("already-ok-1"), "already-ok-1");
    }

    #[test]
    fn path_without_sources_is_not_found() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = extract_from_path(dir.path()).unwrap_err();
        assert!(matches!(err, RegistryError::NotFound { .. }));
    }

    #[test]
    fn single_file_falls_back_to_stem() {
        let dir = tempfile::tempdir().expect("tempdir");
        let file = dir.path().join("fast_travel.lua");
        std::fs::write(&file, "-- no header").expect("write");
        let meta = extract_from_path(&file).expect("extract");
        assert_eq!(meta.id, "fast-travel");
    }
}
