//! `depsreg index`: Generate `index.json` from the distribution tree.

use clap::Args;
use depsreg_common::config::RegistryConfig;
use depsreg_package::{generate_index, write_index};

/// Arguments for the `index` command.
#[derive(Args, Debug)]
pub struct IndexArgs {}

/// Executes the `index` command.
///
/// Download URLs are rooted at the global `--cdn-url`.
///
/// # Errors
///
/// Returns an error if the distribution tree cannot be read or the index
/// cannot be written.
pub fn execute(_args: &IndexArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let index = generate_index(&config.dist_dir, &config.cdn_url, chrono::Utc::now())?;
    let path = write_index(&config.dist_dir, &index)?;
    println!(
        "Indexed {} dependencies and {} scripts into {}",
        index.dependencies.len(),
        index.scripts.len(),
        path.display()
    );
    Ok(())
}
