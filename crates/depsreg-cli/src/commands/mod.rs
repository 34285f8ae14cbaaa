//! CLI command definitions and dispatch.

pub mod add;
pub mod analyze;
pub mod check;
pub mod index;
pub mod latest;
pub mod migrate;
pub mod package;
pub mod regenerate;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use depsreg_common::config::RegistryConfig;
use depsreg_common::constants::{CDN_URL_ENV, DEFAULT_CDN_URL, DEFAULT_DIST_DIR};

/// depsreg: Script registry maintenance and publishing.
#[derive(Parser, Debug)]
#[command(name = "depsreg", version, about, long_about = None)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Command,

    /// Registry root containing `deps/` and `scripts/`.
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// Distribution directory for archives and the index.
    #[arg(long, global = true, default_value = DEFAULT_DIST_DIR)]
    pub dist: PathBuf,

    /// CDN base URL serving the distribution directory.
    #[arg(long, global = true, env = CDN_URL_ENV, default_value = DEFAULT_CDN_URL)]
    pub cdn_url: String,
}

impl Cli {
    /// Builds the registry configuration from the global flags.
    pub fn config(&self) -> RegistryConfig {
        RegistryConfig {
            root: self.root.clone(),
            dist_dir: self.dist.clone(),
            cdn_url: self.cdn_url.clone(),
            ..RegistryConfig::default()
        }
    }
}

/// Available CLI subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Add a new package version from a script file or directory.
    Add(add::AddArgs),
    /// Analyze a script file or directory and resolve its dependencies.
    Analyze(analyze::AnalyzeArgs),
    /// Check every manifest, then look for cycles and duplicates.
    Validate(validate::ValidateArgs),
    /// Rebuild manifest dependencies from source analysis.
    Regenerate(regenerate::RegenerateArgs),
    /// Convert legacy manifests to the current schema.
    Migrate(migrate::MigrateArgs),
    /// Archive every version directory into the distribution tree.
    Package(package::PackageArgs),
    /// Generate `index.json` from the distribution tree.
    Index(index::IndexArgs),
    /// Print the latest published version of a package.
    Latest(latest::LatestArgs),
    /// Report whether a package version is already published.
    Check(check::CheckArgs),
}

/// Dispatches the parsed CLI command to its handler.
///
/// # Errors
///
/// Returns an error if the command execution fails.
pub fn execute(cli: Cli) -> anyhow::Result<()> {
    let config = cli.config();
    match cli.command {
        Command::Add(args) => add::execute(&args, &config),
        Command::Analyze(args) => analyze::execute(&args, &config),
        Command::Validate(args) => validate::execute(&args, &config),
        Command::Regenerate(args) => regenerate::execute(&args, &config),
        Command::Migrate(args) => migrate::execute(&args, &config),
        Command::Package(args) => package::execute(&args, &config),
        Command::Index(args) => index::execute(&args, &config),
        Command::Latest(args) => latest::execute(&args, &config),
        Command::Check(args) => check::execute(&args, &config),
    }
}

#[cfg(test)]
mod tests {
    use clap::CommandFactory;
    use depsreg_common::types::ItemType;

    use super::*;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_feed_config() {
        let cli = Cli::try_parse_from([
            "depsreg",
            "--root",
            "/registry",
            "package",
            "--dist",
            "/out",
        ])
        .expect("parse");
        let config = cli.config();
        assert_eq!(config.root, PathBuf::from("/registry"));
        assert_eq!(config.dist_dir, PathBuf::from("/out"));
    }

    #[test]
    fn add_parses_item_type_and_tags() {
        let cli = Cli::try_parse_from([
            "depsreg",
            "add",
            "scripts",
            "--source",
            "incoming/autologin",
            "--tags",
            "auth,samp",
        ])
        .expect("parse");
        assert!(matches!(
            cli.command,
            Command::Add(ref args)
                if args.item_type == ItemType::Scripts
                    && args.source == PathBuf::from("incoming/autologin")
                    && args.tags == "auth,samp"
                    && args.version.is_none()
        ));
    }
}
