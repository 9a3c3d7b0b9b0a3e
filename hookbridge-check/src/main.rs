//! # hookbridge-check
//!
//! Dry-runs a hook manifest against method metadata and the hook security
//! policy, printing one verdict per requested hook.
//!
//! ## Configuration
//!
//! The checker reads configuration from `$XDG_CONFIG_HOME/hookbridge/config.toml`
//! unless `--config` is given. Method metadata is loaded from the configured
//! directory, or from `--metadata`.
//!
//! ## Running
//!
//! ```bash
//! hookbridge-check hooks.toml
//!
//! # With debug logging
//! RUST_LOG=debug hookbridge-check --metadata ./metadata hooks.toml
//! ```
//!
//! The exit status is 1 when any hook would be rejected.

use anyhow::{Context, Result};
use clap::Parser;
use hookbridge_check::{Config, Report};
use hookbridge_runtime::{discover_metadata, HookManifest};
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{EnvFilter, FmtSubscriber};

#[derive(Parser)]
#[command(name = "hookbridge-check")]
#[command(about = "Check hook manifests against method metadata and policy", long_about = None)]
#[command(version)]
struct Cli {
    /// Configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Directory of method metadata tables
    #[arg(long)]
    metadata: Option<PathBuf>,

    /// Hook manifest to check
    manifest: PathBuf,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load(path)?,
        None => Config::load_default()?,
    };

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.logging.level));
    FmtSubscriber::builder()
        .with_env_filter(filter)
        .with_target(true)
        .init();

    info!("Starting hookbridge-check v{}", env!("CARGO_PKG_VERSION"));

    let metadata_dir = match cli.metadata {
        Some(dir) => dir,
        None => config.metadata_dir()?,
    };
    let table = discover_metadata(&metadata_dir)
        .with_context(|| format!("Failed to load metadata from {}", metadata_dir.display()))?;

    let manifest = HookManifest::from_file(&cli.manifest)
        .with_context(|| format!("Failed to load manifest {}", cli.manifest.display()))?;
    info!(
        "Checking {} hook(s) from {}",
        manifest.len(),
        cli.manifest.display()
    );

    let report = Report::check(&table, &config.policy, &manifest);
    for verdict in report.verdicts() {
        println!("{}", verdict);
    }
    println!(
        "{} admitted, {} rejected",
        report.admitted(),
        report.rejected()
    );

    if !report.is_clean() {
        std::process::exit(1);
    }
    Ok(())
}
