//! Version ordering and selection.
//!
//! Strings that parse as semantic versions (leniently: an optional `v`
//! prefix, missing minor/patch padded with zero) order by semver rules and
//! always rank above strings that do not. Non-versions order lexically.
//! Selection functions return the caller's original string so it still
//! names the on-disk version directory.

use std::cmp::Ordering;

use depsreg_common::constants::UNKNOWN_VERSION;
use semver::{Version, VersionReq};

/// Parses `raw` as a semantic version, accepting `v1.2` style shorthands.
#[must_use]
pub fn parse_version(raw: &str) -> Option<Version> {
    let t = raw.trim();
    let t = t
        .strip_prefix('v')
        .or_else(|| t.strip_prefix('V'))
        .unwrap_or(t);
    if t.is_empty() {
        return None;
    }
    if let Ok(v) = Version::parse(t) {
        return Some(v);
    }

    let split = t.find(['-', '+']).unwrap_or(t.len());
    let (core, suffix) = t.split_at(split);
    let parts: Vec<&str> = core.split('.').collect();
    let numeric = |p: &&str| !p.is_empty() && p.bytes().all(|b| b.is_ascii_digit());
    if parts.len() >= 3 || !parts.iter().all(numeric) {
        return None;
    }
    let mut padded = parts.join(".");
    for _ in parts.len()..3 {
        padded.push_str(".0");
    }
    padded.push_str(suffix);
    Version::parse(&padded).ok()
}

/// Checks whether `raw` is a (leniently parsed) semantic version.
#[must_use]
pub fn is_valid(raw: &str) -> bool {
    parse_version(raw).is_some()
}

/// Total order over version strings: valid versions by semver precedence,
/// every valid version above every invalid one, invalid ones lexically.
/// Semver ties (`1.2` vs `1.2.0`) fall back to the raw strings.
#[must_use]
pub fn compare(a: &str, b: &str) -> Ordering {
    match (parse_version(a), parse_version(b)) {
        (Some(va), Some(vb)) => va.cmp(&vb).then_with(|| a.cmp(b)),
        (Some(_), None) => Ordering::Greater,
        (None, Some(_)) => Ordering::Less,
        (None, None) => a.cmp(b),
    }
}

/// Returns the greatest version per [`compare`], or `None` for empty input.
#[must_use]
pub fn latest<S: AsRef<str>>(versions: &[S]) -> Option<&str> {
    versions
        .iter()
        .map(AsRef::as_ref)
        .max_by(|a, b| compare(a, b))
}

/// Like [`latest`] but yields an empty string for empty input.
#[must_use]
pub fn get_latest<S: AsRef<str>>(versions: &[S]) -> String {
    latest(versions).map(str::to_string).unwrap_or_default()
}

/// Sorts valid versions ascending, followed by invalid strings in lexical order.
#[must_use]
pub fn sort_versions<S: AsRef<str>>(versions: &[S]) -> Vec<String> {
    let (mut valid, mut invalid): (Vec<&str>, Vec<&str>) =
        versions.iter().map(AsRef::as_ref).partition(|v| is_valid(v));
    valid.sort_by(|a, b| compare(a, b));
    invalid.sort_unstable();
    valid.into_iter().chain(invalid).map(str::to_string).collect()
}

fn parse_requirement(raw: &str) -> Option<VersionReq> {
    if let Some(v) = parse_version(raw) {
        return VersionReq::parse(&format!("={v}")).ok();
    }
    VersionReq::parse(raw.trim()).ok()
}

/// Picks the installed version satisfying `constraint`.
///
/// An exact string match wins. `*`, empty and `latest` select the greatest
/// installed version. A bare version means exactly that version; any other
/// semver requirement (`^1.2`, `>=1, <2`) selects the greatest valid
/// version matching it.
#[must_use]
pub fn select_version<'a, S: AsRef<str>>(constraint: &str, installed: &'a [S]) -> Option<&'a str> {
    let constraint = constraint.trim();
    if let Some(exact) = installed.iter().map(AsRef::as_ref).find(|v| *v == constraint) {
        return Some(exact);
    }
    if constraint.is_empty() || constraint == UNKNOWN_VERSION || constraint == "latest" {
        return latest(installed);
    }
    let req = parse_requirement(constraint)?;
    installed
        .iter()
        .map(AsRef::as_ref)
        .filter(|v| parse_version(v).is_some_and(|parsed| req.matches(&parsed)))
        .max_by(|a, b| compare(a, b))
}
