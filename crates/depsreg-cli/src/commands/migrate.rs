//! `depsreg migrate`: Convert legacy manifests to the current schema.

use clap::Args;
use depsreg_common::config::RegistryConfig;
use depsreg_package::{MigrateOutcome, migrate_all};

use crate::output::print_failures;

/// Arguments for the `migrate` command.
#[derive(Args, Debug)]
pub struct MigrateArgs {}

/// Executes the `migrate` command.
///
/// # Errors
///
/// Returns an error if any manifest fails to migrate.
pub fn execute(_args: &MigrateArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let report = migrate_all(&config.tree())?;

    let migrated: Vec<&str> = report
        .successes()
        .filter(|(_, o)| **o == MigrateOutcome::Migrated)
        .map(|(item, _)| item)
        .collect();
    for item in &migrated {
        println!("migrated {item}");
    }
    print_failures(&report);
    println!(
        "{} migrated, {} already current, {} failed",
        migrated.len(),
        report.succeeded() - migrated.len(),
        report.failed()
    );

    if !report.is_success() {
        anyhow::bail!("migration finished with errors");
    }
    Ok(())
}
