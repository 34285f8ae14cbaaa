//! `depsreg package`: Archive every version directory.

use clap::Args;
use depsreg_common::config::RegistryConfig;
use depsreg_package::package_all;

use crate::output::{format_bytes, print_failures};

/// Arguments for the `package` command.
#[derive(Args, Debug)]
pub struct PackageArgs {}

/// Executes the `package` command.
///
/// # Errors
///
/// Returns an error if the distribution directory cannot be created or any
/// version fails to package.
pub fn execute(_args: &PackageArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let report = package_all(&config.tree(), &config.dist_dir)?;

    for (item, archive) in report.successes() {
        let size = std::fs::metadata(archive).map_or(0, |m| m.len());
        println!("{item:<40} {:>10}  {}", format_bytes(size), archive.display());
    }
    print_failures(&report);
    println!("{} packaged, {} failed", report.succeeded(), report.failed());

    if !report.is_success() {
        anyhow::bail!("packaging finished with errors");
    }
    Ok(())
}
