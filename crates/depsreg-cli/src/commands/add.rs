//! `depsreg add`: Add a new package version from loose sources.

use std::path::PathBuf;

use clap::Args;
use depsreg_client::RegistryClient;
use depsreg_common::config::RegistryConfig;
use depsreg_common::constants::UNKNOWN_VERSION;
use depsreg_common::types::ItemType;
use depsreg_package::{AddOptions, add, parse_tags};

/// Arguments for the `add` command.
#[derive(Args, Debug)]
pub struct AddArgs {
    /// Item type: `deps` or `scripts`.
    pub item_type: ItemType,

    /// Script file or directory to add.
    #[arg(long)]
    pub source: PathBuf,

    /// Package id. Defaults to the slugified `script_name`.
    #[arg(long)]
    pub id: Option<String>,

    /// Package version. Defaults to the declared `script_version`.
    #[arg(long)]
    pub version: Option<String>,

    /// Comma-separated tags.
    #[arg(long, default_value = "")]
    pub tags: String,

    /// Upstream source URL.
    #[arg(long)]
    pub source_url: Option<String>,
}

/// Executes the `add` command.
///
/// # Errors
///
/// Returns an error if the version already exists locally or in the
/// published index, or the sources cannot be analyzed or copied.
pub fn execute(args: &AddArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let client = RegistryClient::from_config(config)?;
    let options = AddOptions {
        id: args.id.clone(),
        version: args.version.clone(),
        tags: parse_tags(&args.tags),
        source_url: args.source_url.clone(),
        ..AddOptions::new(args.item_type)
    };
    tracing::info!(source = %args.source.display(), item_type = %args.item_type, "adding package");
    let report = add(&config.tree(), &args.source, &options, &client)?;
    let m = &report.manifest;

    println!("Package: {} v{}", m.id, m.version);
    if !report.published_versions.is_empty() {
        println!("Published versions: {}", report.published_versions.join(", "));
    }
    if !m.dependencies.is_empty() {
        println!("Dependencies:");
        for (id, version) in &m.dependencies {
            let note = if version == UNKNOWN_VERSION { "  (not in registry)" } else { "" };
            println!("  {id:<24} {version}{note}");
        }
    }
    println!("Network access: {}", m.security.network_access);
    println!("Uses FFI: {}", m.security.uses_ffi);
    for path in &m.security.file_access {
        println!("File access: {path}");
    }
    for w in &report.warnings {
        println!("warning: {w}");
    }
    println!("Created {}", report.version_dir.display());
    Ok(())
}
