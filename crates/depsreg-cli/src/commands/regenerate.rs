//! `depsreg regenerate`: Rebuild manifests from source analysis.

use clap::Args;
use depsreg_common::config::RegistryConfig;
use depsreg_package::{RegenerateOptions, RegenerateOutcome, regenerate_all};

use crate::output::print_failures;

/// Arguments for the `regenerate` command.
#[derive(Args, Debug)]
pub struct RegenerateArgs {
    /// Show what would change without writing manifests.
    #[arg(long)]
    pub dry_run: bool,

    /// Skip the cycle and duplicate checks after regeneration.
    #[arg(long)]
    pub skip_validation: bool,
}

/// Executes the `regenerate` command.
///
/// # Errors
///
/// Returns an error if the registry cannot be scanned, any manifest fails
/// to regenerate, or post-regeneration validation fails.
pub fn execute(args: &RegenerateArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let options = RegenerateOptions {
        dry_run: args.dry_run,
        skip_validation: args.skip_validation,
    };
    let report = regenerate_all(&config.tree(), options)?;

    let mut updated = 0;
    for (item, outcome) in report.items.successes() {
        if let RegenerateOutcome::Updated {
            dependencies,
            warnings,
        } = outcome
        {
            updated += 1;
            let verb = if args.dry_run { "would update" } else { "updated" };
            println!("{verb} {item}");
            for (id, version) in dependencies {
                println!("    {id} = {version}");
            }
            if *warnings > 0 {
                println!("    {warnings} dynamic require warning(s)");
            }
        }
    }
    print_failures(&report.items);
    println!(
        "{updated} updated, {} unchanged, {} failed",
        report.items.succeeded() - updated,
        report.items.failed()
    );
    if let Some(validation) = &report.validation {
        for cycle in &validation.cycles {
            println!("cycle: {cycle}");
        }
        for set in &validation.duplicates {
            println!("duplicate: {set}");
        }
    }

    if !report.is_success() {
        anyhow::bail!("regeneration finished with errors");
    }
    Ok(())
}
