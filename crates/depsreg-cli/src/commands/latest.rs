//! `depsreg latest`: Print the latest published version of a package.

use clap::Args;
use depsreg_client::RegistryClient;
use depsreg_common::config::RegistryConfig;
use depsreg_common::types::ItemType;

/// Arguments for the `latest` command.
#[derive(Args, Debug)]
pub struct LatestArgs {
    /// Item type: `deps` or `scripts`.
    pub item_type: ItemType,

    /// Package id.
    pub id: String,
}

/// Executes the `latest` command.
///
/// # Errors
///
/// Returns an error if the index is unreachable or the id is not published.
pub fn execute(args: &LatestArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let client = RegistryClient::from_config(config)?;
    let version = client.latest_version(args.item_type, &args.id)?;
    println!("{version}");
    Ok(())
}
