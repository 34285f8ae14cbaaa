//! Touched working-directory path extraction.
//!
//! Scripts build file paths as `getWorkingDirectory() .. "\\config"` and
//! extend them by concatenation. Tracking runs in three passes over one
//! source: capture base assignments, capture extensions of already tracked
//! variables, then resolve variables passed to file-I/O helpers.

use std::collections::{BTreeSet, HashMap};

use depsreg_common::constants::WORKING_DIR_MARKER;

use crate::patterns::Patterns;

const SEPARATORS: [char; 2] = ['\\', '/'];

/// Returns the literal paths the source touches through tracked variables.
pub fn touched_paths(patterns: &Patterns, source: &str) -> BTreeSet<String> {
    let mut vars: HashMap<&str, String> = HashMap::new();

    for caps in patterns.working_dir_var.captures_iter(source) {
        if let (Some(var), Some(lit)) = (caps.get(1), caps.get(2)) {
            let _ = vars.insert(
                var.as_str(),
                format!("{WORKING_DIR_MARKER}{}", unescape(lit.as_str())),
            );
        }
    }

    for caps in patterns.concat_var.captures_iter(source) {
        if let (Some(var), Some(base), Some(lit)) = (caps.get(1), caps.get(2), caps.get(3)) {
            if let Some(base_path) = vars.get(base.as_str()).cloned() {
                let _ = vars.insert(var.as_str(), base_path + &unescape(lit.as_str()));
            }
        }
    }

    patterns
        .path_usage
        .captures_iter(source)
        .filter_map(|caps| caps.get(2))
        .filter_map(|var| vars.get(var.as_str()).cloned())
        .collect()
}

/// Drops every path that is a strict parent directory of another path,
/// keeping only the most specific ones.
pub fn prune_parent_paths(paths: &BTreeSet<String>) -> BTreeSet<String> {
    paths
        .iter()
        .filter(|parent| !paths.iter().any(|child| is_strict_parent(parent, child)))
        .cloned()
        .collect()
}

fn is_strict_parent(parent: &str, child: &str) -> bool {
    if parent == child {
        return false;
    }
    child.strip_prefix(parent).is_some_and(|rest| {
        parent.ends_with(SEPARATORS) || rest.starts_with(SEPARATORS)
    })
}

/// Collapses escaped backslashes (`\\`) in a Lua string literal.
fn unescape(literal: &str) -> String {
    literal.replace("\\\\", "\\")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn paths(src: &str) -> BTreeSet<String> {
        touched_paths(&Patterns::compile().expect("compile"), src)
    }

    #[test]
    fn base_variable_used_in_io_open_is_tracked() {
        let src = r#"
local cfg = getWorkingDirectory() .. "\\config\\bot.json"
local f = io.open(cfg, "r")
"#;
        let found = paths(src);
        assert_eq!(found.len(), 1);
        assert!(found.contains(r"<working_dir>\config\bot.json"));
    }

    #[test]
    fn concatenation_extends_tracked_variable() {
        let src = r#"
local dir = getWorkingDirectory() .. "\\config"
local file = dir .. "\\settings.json"
if not doesDirectoryExist(dir) then createDirectory(dir) end
jsonSave(file, data)
"#;
        let found = paths(src);
        assert!(found.contains(r"<working_dir>\config"));
        assert!(found.contains(r"<working_dir>\config\settings.json"));
    }

    #[test]
    fn untracked_variables_are_ignored() {
        let src = r#"
local other = os.getenv("HOME") .. "/x"
local f = io.open(other)
local g = io.open("literal.txt")
"#;
        assert!(paths(src).is_empty());
    }

    #[test]
    fn variable_not_used_in_io_is_not_reported() {
        let src = r#"local p = getWorkingDirectory() .. "\\unused""#;
        assert!(paths(src).is_empty());
    }

    #[test]
    fn prune_keeps_only_most_specific_paths() {
        let input: BTreeSet<String> = [
            r"<working_dir>\config",
            r"<working_dir>\config\settings.json",
            r"<working_dir>\configs.bak",
            "<working_dir>/logs/",
            "<working_dir>/logs/today.log",
        ]
        .into_iter()
        .map(String::from)
        .collect();

        let pruned = prune_parent_paths(&input);
        let expected: BTreeSet<String> = [
            r"<working_dir>\config\settings.json",
            r"<working_dir>\configs.bak",
            "<working_dir>/logs/today.log",
        ]
        .into_iter()
        .map(String::from)
        .collect();
        assert_eq!(pruned, expected);
    }
}
