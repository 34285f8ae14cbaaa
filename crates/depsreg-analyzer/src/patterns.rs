//! Fixed textual recognizers used by the analyzer.

use depsreg_common::error::Result;
use regex::Regex;

/// Static `require("name")` / `require 'name'` call. A parenthesized
/// argument must be a lone literal; group 1 holds it, group 2 holds the
/// unparenthesized form.
pub const REQUIRE: &str =
    r#"require\s*(?:\(\s*["']([\w.-]+)["']\s*\)|["']([\w.-]+)["'])"#;

/// Networking library calls.
pub const NETWORK: &str = r"(http\.request|socket\.tcp|socket\.connect)";

/// FFI binding load.
pub const FFI: &str = r#"\brequire\s*(?:\(\s*["']ffi["']\s*\)|["']ffi["'])"#;

/// `local v = getWorkingDirectory() .. "literal"`.
pub const WORKING_DIR_VAR: &str =
    r#"local\s+([\w_]+)\s*=\s*getWorkingDirectory\(\)\s*\.\.\s*["']([^"']+)["']"#;

/// `local v = base .. "literal"`.
pub const CONCAT_VAR: &str = r#"local\s+([\w_]+)\s*=\s*([\w_]+)\s*\.\.\s*["']([^"']+)["']"#;

/// File-I/O helpers called with a path variable as first argument.
pub const PATH_USAGE: &str =
    r"(io\.open|jsonSave|jsonRead|createDirectory|doesDirectoryExist)\s*\(\s*([\w_]+)";

/// Namespace marker stripped from required module names.
pub const NAMESPACE_PREFIX: &str = "lib.";

/// Compiled set of whole-source recognizers.
#[derive(Debug, Clone)]
pub struct Patterns {
    /// See [`REQUIRE`].
    pub require: Regex,
    /// See [`NETWORK`].
    pub network: Regex,
    /// See [`FFI`].
    pub ffi: Regex,
    /// See [`WORKING_DIR_VAR`].
    pub working_dir_var: Regex,
    /// See [`CONCAT_VAR`].
    pub concat_var: Regex,
    /// See [`PATH_USAGE`].
    pub path_usage: Regex,
}

impl Patterns {
    /// Compiles every recognizer.
    ///
    /// # Errors
    ///
    /// Returns `RegistryError::Pattern` if a pattern fails to compile.
    pub fn compile() -> Result<Self> {
        Ok(Self {
            require: Regex::new(REQUIRE)?,
            network: Regex::new(NETWORK)?,
            ffi: Regex::new(FFI)?,
            working_dir_var: Regex::new(WORKING_DIR_VAR)?,
            concat_var: Regex::new(CONCAT_VAR)?,
            path_usage: Regex::new(PATH_USAGE)?,
        })
    }

    /// Extracts static module references, namespace marker stripped, in source order.
    pub fn requires<'a>(&'a self, source: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.require.captures_iter(source).filter_map(|caps| {
            caps.get(1)
                .or_else(|| caps.get(2))
                .map(|m| m.as_str().strip_prefix(NAMESPACE_PREFIX).unwrap_or(m.as_str()))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn requires_accepts_both_quote_styles_and_no_parens() {
        let patterns = Patterns::compile().expect("compile");
        let src = r#"
local a = require("cjson")
local b = require 'socket.http'
local c = require"lib.samp.events"
"#;
        let found: Vec<&str> = patterns.requires(src).collect();
        assert_eq!(found, vec!["cjson", "socket.http", "samp.events"]);
    }

    #[test]
    fn requires_ignores_expression_arguments() {
        let patterns = Patterns::compile().expect("compile");
        assert_eq!(patterns.requires("require(name)").count(), 0);
        assert_eq!(patterns.requires("require('a' .. b)").count(), 0);
        assert_eq!(patterns.requires("require('plugins.' .. name)").count(), 0);
        assert_eq!(patterns.requires("require ( 'cjson' )").collect::<Vec<_>>(), vec!["cjson"]);
    }

    #[test]
    fn ffi_requires_word_boundary() {
        let patterns = Patterns::compile().expect("compile");
        assert!(patterns.ffi.is_match("local ffi = require 'ffi'"));
        assert!(!patterns.ffi.is_match("myrequire('ffi')"));
        assert!(!patterns.ffi.is_match("require('ffi' .. suffix)"));
    }

    #[test]
    fn network_matches_known_calls() {
        let patterns = Patterns::compile().expect("compile");
        assert!(patterns.network.is_match("local r = http.request(url)"));
        assert!(patterns.network.is_match("local s = socket.tcp()"));
        assert!(!patterns.network.is_match("local s = socket.select()"));
    }
}
