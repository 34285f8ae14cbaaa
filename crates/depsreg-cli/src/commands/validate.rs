//! `depsreg validate`: Check every manifest and the dependency graph.

use clap::Args;
use depsreg_common::config::RegistryConfig;
use depsreg_package::validate_all;

use crate::output::print_failures;

/// Arguments for the `validate` command.
#[derive(Args, Debug)]
pub struct ValidateArgs {}

/// Executes the `validate` command.
///
/// # Errors
///
/// Returns an error if any manifest is inconsistent or a cycle exists.
pub fn execute(_args: &ValidateArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let report = validate_all(&config.tree())?;

    print_failures(&report.items);
    for cycle in &report.cycles {
        println!("cycle: {cycle}");
    }
    for set in &report.duplicates {
        println!("duplicate: {set}");
    }
    println!(
        "{} valid, {} invalid, {} cycle(s), {} duplicate set(s)",
        report.items.succeeded(),
        report.items.failed(),
        report.cycles.len(),
        report.duplicates.len()
    );

    if !report.is_valid() {
        anyhow::bail!("registry validation failed");
    }
    Ok(())
}
