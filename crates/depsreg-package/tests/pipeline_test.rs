//! End-to-end tests for the publishing pipeline.
//!
//! A small registry tree is built on disk, then taken through:
//! 1. Manifest regeneration from source analysis
//! 2. Tree validation (consistency, cycles, duplicates)
//! 3. Packaging into `dist/`
//! 4. Index generation over the produced archives

#![allow(clippy::expect_used, clippy::unwrap_used)]

use std::path::Path;

use chrono::{DateTime, Utc};
use depsreg_common::manifest::{self, Manifest};
use depsreg_common::storage::RegistryTree;
use depsreg_common::types::ItemType;
use depsreg_package::hash::digest_dir;
use depsreg_package::{
    RegenerateOptions, RegenerateOutcome, extract_manifest, generate_index, hash_file,
    package_all, regenerate_all, validate_all, write_index,
};

fn install(tree: &RegistryTree, item_type: ItemType, id: &str, version: &str, files: &[(&str, &str)]) {
    let dir = tree.version_dir(item_type, id, version);
    for (name, content) in files {
        let path = dir.join(name);
        std::fs::create_dir_all(path.parent().expect("parent")).expect("mkdir");
        std::fs::write(path, content).expect("write");
    }
    let mut m = Manifest::new(id, version);
    m.files = digest_dir(&dir).expect("digest");
    manifest::save(&dir, &m).expect("save");
}

fn sample_tree(root: &Path) -> RegistryTree {
    let tree = RegistryTree::open(root);
    install(&tree, ItemType::Deps, "luasocket", "3.1.0", &[("socket.lua", "return {}")]);
    install(&tree, ItemType::Deps, "cjson", "2.1.0", &[("cjson.lua", "return {}")]);
    install(
        &tree,
        ItemType::Scripts,
        "autologin",
        "1.0.0",
        &[
            ("main.lua", "local http = require('socket.http')\nlocal util = require('lib.util')\nlocal json = require 'cjson'\nlocal m = require(name)"),
            ("lib/util.lua", "return {}"),
        ],
    );
    tree
}

// ── Regeneration ─────────────────────────────────────────────────────

#[test]
fn regenerate_twice_is_idempotent() {
    let root = tempfile::tempdir().expect("tempdir");
    let tree = sample_tree(root.path());
    let options = RegenerateOptions::default();

    let first = regenerate_all(&tree, options).expect("first run");
    assert!(first.is_success());
    let script_dir = tree.version_dir(ItemType::Scripts, "autologin", "1.0.0");
    let after_first = manifest::load(&script_dir).expect("load");
    assert_eq!(
        after_first.dependencies.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["cjson", "luasocket"]
    );

    let second = regenerate_all(&tree, options).expect("second run");
    assert!(
        second
            .items
            .successes()
            .all(|(_, outcome)| *outcome == RegenerateOutcome::Unchanged)
    );
    assert_eq!(manifest::load(&script_dir).expect("load"), after_first);
}

#[test]
fn dynamic_require_is_counted_as_warning() {
    let root = tempfile::tempdir().expect("tempdir");
    let tree = sample_tree(root.path());

    let report = regenerate_all(&tree, RegenerateOptions::default()).expect("regenerate");
    let warnings: usize = report
        .items
        .successes()
        .filter_map(|(item, outcome)| match outcome {
            RegenerateOutcome::Updated { warnings, .. } if item == "scripts/autologin/1.0.0" => {
                Some(*warnings)
            }
            _ => None,
        })
        .sum();
    assert_eq!(warnings, 1);
}

// ── Validation ───────────────────────────────────────────────────────

#[test]
fn sample_tree_validates_cleanly() {
    let root = tempfile::tempdir().expect("tempdir");
    let tree = sample_tree(root.path());

    let report = validate_all(&tree).expect("validate");
    assert!(report.is_valid());
    assert_eq!(report.items.succeeded(), 3);
    assert!(report.duplicates.is_empty());
}

// ── Packaging & indexing ─────────────────────────────────────────────

#[test]
fn archive_round_trip_preserves_file_digests() {
    let root = tempfile::tempdir().expect("tempdir");
    let tree = sample_tree(root.path().join("registry").as_path());
    let dist = root.path().join("dist");

    let report = package_all(&tree, &dist).expect("package");
    assert!(report.is_success());

    let archive = dist.join("scripts/autologin-1.0.0.zip");
    let embedded = extract_manifest(&archive).expect("manifest");
    let source = tree.version_dir(ItemType::Scripts, "autologin", "1.0.0");
    assert_eq!(embedded.files.len(), 2);
    for (name, info) in &embedded.files {
        assert_eq!(hash_file(&source.join(name)).expect("hash"), info.sha256, "{name}");
    }
}

#[test]
fn packaged_tree_indexes_every_version() {
    let root = tempfile::tempdir().expect("tempdir");
    let tree = sample_tree(root.path().join("registry").as_path());
    install(&tree, ItemType::Deps, "cjson", "2.10.0", &[("cjson.lua", "return {v = 2}")]);
    let dist = root.path().join("dist");

    let _ = package_all(&tree, &dist).expect("package");
    let index = generate_index(&dist, "https://cdn.example", DateTime::<Utc>::UNIX_EPOCH)
        .expect("index");
    let path = write_index(&dist, &index).expect("write");
    assert!(path.ends_with("index.json"));

    let cjson = index.package(ItemType::Deps, "cjson").expect("cjson");
    assert_eq!(cjson.latest, "2.10.0");
    assert_eq!(cjson.versions.len(), 2);
    let entry = &cjson.versions["2.10.0"];
    assert_eq!(entry.url, "https://cdn.example/deps/cjson-2.10.0.zip");
    assert_eq!(entry.manifest.id, "cjson");

    let script = index.package(ItemType::Scripts, "autologin").expect("script");
    assert_eq!(script.latest, "1.0.0");
}
