//! # depsreg: registry maintenance CLI
//!
//! Analyzes script sources, keeps manifests consistent with them, and
//! publishes archives plus `index.json` for the CDN.

mod commands;
mod output;

use clap::Parser;

use crate::commands::Cli;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    commands::execute(cli)
}
