//! CKG CLI
//!
//! Command-line interface for building and querying code knowledge graphs.

use anyhow::{Context, Result};
use ckg_core::{CkgConfig, CkgTool};
use ckg_indexer::{BuildStats, CkgCache, CkgStore, OpenOutcome};
use clap::{Parser, Subcommand};
use serde_json::json;
use std::path::{Path, PathBuf};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "ckg")]
#[command(about = "CKG - Code knowledge graph builder and query engine")]
#[command(version)]
struct Cli {
    /// Configuration file (default: ~/.ckg/config.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Search the code knowledge graph
    Search {
        /// Search command, e.g. search_function or search_class
        command: String,

        /// Exact name to look up
        identifier: String,

        /// Codebase path (default: current directory)
        #[arg(long, default_value = ".")]
        path: String,

        /// Omit entity bodies from the report
        #[arg(long)]
        no_body: bool,
    },

    /// Build (or reuse) the code knowledge graph of a codebase
    Build {
        /// Codebase path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,

        /// Rebuild even when the snapshot is unchanged
        #[arg(long)]
        force: bool,
    },

    /// Build a codebase's graph and copy the database elsewhere
    Export {
        /// Directory containing the source code to analyze
        #[arg(long)]
        input_dir: PathBuf,

        /// Directory receiving the database
        #[arg(long)]
        output_dir: PathBuf,

        /// File name of the exported database
        #[arg(long)]
        database_name: String,
    },

    /// Remove databases older than the retention window
    Expire,

    /// Print the snapshot fingerprint of a codebase
    Fingerprint {
        /// Codebase path (default: current directory)
        #[arg(long, default_value = ".")]
        path: PathBuf,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => CkgConfig::load_from(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => CkgConfig::load(),
    };

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.log_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    config
        .ensure_dirs()
        .context("Failed to create data directories")?;

    match cli.command {
        Commands::Search {
            command,
            identifier,
            path,
            no_body,
        } => cmd_search(&config, &command, &identifier, &path, !no_body),
        Commands::Build { path, force } => cmd_build(&config, &path, force),
        Commands::Export {
            input_dir,
            output_dir,
            database_name,
        } => cmd_export(&config, &input_dir, &output_dir, &database_name),
        Commands::Expire => cmd_expire(&config),
        Commands::Fingerprint { path } => cmd_fingerprint(&config, &path),
    }
}

fn cmd_search(
    config: &CkgConfig,
    command: &str,
    identifier: &str,
    path: &str,
    print_body: bool,
) -> Result<()> {
    let tool = CkgTool::new(config);
    let result = tool.execute(&json!({
        "command": command,
        "path": path,
        "identifier": identifier,
        "print_body": print_body,
    }));

    if let Some(error) = result.error {
        eprintln!("{}", error);
        std::process::exit(1);
    }
    if let Some(output) = result.output {
        println!("{}", output);
    }
    Ok(())
}

fn cmd_build(config: &CkgConfig, path: &Path, force: bool) -> Result<()> {
    let cache = CkgCache::new(config.cache_options());
    let result = if force {
        cache.rebuild(path)
    } else {
        cache.open(path)
    };
    let opened = result.with_context(|| format!("Failed to build code knowledge graph for {}", path.display()))?;
    info!(path = ?path, fingerprint = %opened.fingerprint, "Code knowledge graph ready");

    println!("Fingerprint: {}", opened.fingerprint);
    println!("Database:    {}", opened.db_path.display());
    match &opened.outcome {
        OpenOutcome::Reused => println!("Snapshot unchanged, reused existing database."),
        OpenOutcome::Built(stats) => print_stats(stats),
    }
    Ok(())
}

fn print_stats(stats: &BuildStats) {
    println!();
    println!("  Files seen:     {}", stats.files_seen);
    println!("  Files indexed:  {}", stats.files_indexed);
    println!("  Files skipped:  {}", stats.files_skipped);
    println!("  Files failed:   {}", stats.files_failed);
    println!("  Entities:       {}", stats.entities);
    if !stats.diagnostics.is_empty() {
        println!("  Diagnostics:    {}", stats.diagnostics.len());
    }
    println!("  Duration:       {}ms", stats.duration_ms);
}

fn cmd_export(
    config: &CkgConfig,
    input_dir: &Path,
    output_dir: &Path,
    database_name: &str,
) -> Result<()> {
    if !input_dir.exists() {
        anyhow::bail!("Input directory does not exist: {}", input_dir.display());
    }
    if !input_dir.is_dir() {
        anyhow::bail!("Input path is not a directory: {}", input_dir.display());
    }

    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create {}", output_dir.display()))?;
    let target = output_dir.join(database_name);
    if target.exists() {
        std::fs::remove_file(&target)
            .with_context(|| format!("Failed to remove {}", target.display()))?;
        println!("Removed existing database: {}", target.display());
    }

    println!("Building CKG database for: {}", input_dir.display());
    let cache = CkgCache::new(config.cache_options());
    let opened = cache
        .open(input_dir)
        .with_context(|| format!("Failed to build code knowledge graph for {}", input_dir.display()))?;
    let source = opened.db_path.clone();
    drop(opened);

    std::fs::copy(&source, &target)
        .with_context(|| format!("Failed to copy {} to {}", source.display(), target.display()))?;
    info!(source = ?source, target = ?target, "Exported database");
    println!("Database copied to: {}", target.display());

    let store = CkgStore::open(&target).context("Failed to open exported database")?;
    let counts = store.table_counts()?;
    let total: usize = counts.iter().map(|(_, n)| n).sum();

    println!();
    for (table, rows) in &counts {
        println!("  {:<15} {}", table, rows);
    }
    println!();
    println!("Total entities: {}", total);
    Ok(())
}

fn cmd_expire(config: &CkgConfig) -> Result<()> {
    let cache = CkgCache::new(config.cache_options());
    let removed = cache.expire().context("Failed to expire databases")?;
    info!(removed, "Expiry complete");
    println!("Removed {} expired database(s)", removed);
    Ok(())
}

fn cmd_fingerprint(config: &CkgConfig, path: &Path) -> Result<()> {
    let cache = CkgCache::new(config.cache_options());
    let fingerprint = cache
        .fingerprint(path)
        .with_context(|| format!("Failed to fingerprint {}", path.display()))?;
    println!("{}", fingerprint);
    Ok(())
}
