//! `depsreg check`: Report whether a version is already published.

use clap::Args;
use depsreg_client::RegistryClient;
use depsreg_common::config::RegistryConfig;
use depsreg_common::types::ItemType;

/// Arguments for the `check` command.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Item type: `deps` or `scripts`.
    pub item_type: ItemType,

    /// Package id.
    pub id: String,

    /// Version about to be published.
    pub version: String,
}

/// Executes the `check` command.
///
/// # Errors
///
/// Returns an error if the index is unreachable.
pub fn execute(args: &CheckArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let client = RegistryClient::from_config(config)?;
    let info = client.check_duplicate(args.item_type, &args.id, &args.version)?;

    if !info.exists {
        println!("{} is not published yet", args.id);
        return Ok(());
    }
    println!(
        "{} is published, latest {}",
        args.id,
        info.existing_version.as_deref().unwrap_or("-")
    );
    println!("Versions: {}", info.all_versions.join(", "));
    if info.exact_match {
        println!(
            "Version {} already exists: {}",
            args.version,
            info.package_url.as_deref().unwrap_or("-")
        );
    }
    Ok(())
}
