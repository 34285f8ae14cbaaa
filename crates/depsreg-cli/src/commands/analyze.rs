//! `depsreg analyze`: Analyze sources and resolve them against the registry.

use std::path::PathBuf;

use clap::Args;
use depsreg_analyzer::metadata::extract_from_path;
use depsreg_analyzer::{Registry, ResolutionContext, analyze_with_context};
use depsreg_common::config::RegistryConfig;

/// Arguments for the `analyze` command.
#[derive(Args, Debug)]
pub struct AnalyzeArgs {
    /// Script file or package directory to analyze.
    pub path: PathBuf,

    /// Package id used for self-reference exclusion.
    /// Defaults to the script metadata id, then the path's file stem.
    #[arg(long)]
    pub id: Option<String>,
}

/// Executes the `analyze` command.
///
/// # Errors
///
/// Returns an error if the registry cannot be scanned or the path cannot
/// be analyzed.
pub fn execute(args: &AnalyzeArgs, config: &RegistryConfig) -> anyhow::Result<()> {
    let registry = Registry::scan(&config.tree())?;
    let metadata = extract_from_path(&args.path).ok();
    let id = args
        .id
        .clone()
        .or_else(|| metadata.as_ref().map(|m| m.id.clone()))
        .or_else(|| {
            args.path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
        })
        .unwrap_or_default();
    tracing::info!(path = %args.path.display(), id = %id, "analyzing");

    let ctx = ResolutionContext::scan(id.clone(), &args.path, &registry)?;
    let analysis = analyze_with_context(&ctx, &args.path)?;

    if let Some(m) = &metadata {
        println!("Script: {} ({}) v{}", m.name, m.id, m.version);
        if let Some(author) = &m.author {
            println!("Author: {author}");
        }
    }
    println!("Package: {id}");
    println!("Network access: {}", analysis.uses_network);
    println!("Uses FFI: {}", analysis.uses_ffi);

    println!("Dependencies:");
    for dep in analysis.dependencies.values() {
        let marker = if dep.resolved { "+" } else { "?" };
        println!("  {marker} {:<24} <- {}", dep.package_id, dep.original_path);
    }
    if !analysis.file_paths.is_empty() {
        println!("Touched paths:");
        for p in &analysis.file_paths {
            println!("  {p}");
        }
    }
    for w in &analysis.warnings {
        println!("warning: {w}");
    }
    Ok(())
}
