//! GraphMap CLI
//!
//! Command-line interface for rebuilding and watching the folder index maps
//! of a markdown vault.

mod daemon;
mod signals;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use graphmap_core::Settings;
use graphmap_indexer::{FsVault, SyncOrchestrator};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::daemon::Daemon;

#[derive(Parser)]
#[command(name = "graphmap")]
#[command(about = "GraphMap - Folder index maps for markdown vaults")]
#[command(version)]
struct Cli {
    /// Vault root (default: current directory)
    #[arg(long, global = true, default_value = ".")]
    vault: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Rebuild every folder index now
    Rebuild {
        /// Delete generated indexes whose folder no longer qualifies
        #[arg(long)]
        prune: bool,

        /// Print the pass report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Watch the vault and keep indexes in sync (foreground)
    Watch,

    /// Show or change vault settings
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,

    /// Print one setting
    Get { key: String },

    /// Change one setting
    Set { key: String, value: String },

    /// Restore default settings
    Reset,

    /// Print the settings file location
    Path,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let vault = cli
        .vault
        .canonicalize()
        .with_context(|| format!("Vault not found: {}", cli.vault.display()))?;

    init_logging(&Settings::load(&vault).log_level);

    match cli.command {
        Commands::Rebuild { prune, json } => cmd_rebuild(&vault, prune, json).await,
        Commands::Watch => cmd_watch(&vault).await,
        Commands::Config { action } => cmd_config(&vault, action),
    }
}

/// RUST_LOG wins over the vault's log_level setting
fn init_logging(level: &str) {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level)),
        )
        .with_target(false)
        .init();
}

async fn cmd_rebuild(vault: &Path, prune: bool, json: bool) -> Result<()> {
    let settings = Settings::load(vault);
    let config = settings.sync_config();

    let store = FsVault::open(vault).context("Failed to open vault")?;
    let sync = SyncOrchestrator::new(Arc::new(store));

    let report = sync
        .synchronize_all(&config)
        .await
        .context("Rebuild failed")?;

    let removed = if prune || settings.prune_orphans {
        sync.prune_orphans(&config, &report).await?
    } else {
        Vec::new()
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        println!("✓ Graph maps rebuilt in {}ms", report.duration_ms);
        println!("  Created:   {}", report.created);
        println!("  Updated:   {}", report.updated);
        println!("  Unchanged: {}", report.unchanged);
        println!("  Skipped:   {}", report.skipped);
        if !removed.is_empty() {
            println!("  Pruned:    {}", removed.len());
        }
    }

    if !report.is_clean() {
        anyhow::bail!("{} folder index(es) could not be written", report.failed);
    }

    Ok(())
}

async fn cmd_watch(vault: &Path) -> Result<()> {
    println!("Watching {} (Ctrl+C to stop)", vault.display());
    let daemon = Daemon::new(vault)?;
    daemon.run().await
}

fn cmd_config(vault: &Path, action: ConfigAction) -> Result<()> {
    match action {
        ConfigAction::Show => {
            let settings = Settings::load(vault);
            print!("{}", serde_yaml::to_string(&settings)?);
        }
        ConfigAction::Get { key } => {
            let settings = Settings::load(vault);
            println!("{}", settings.get(&key)?);
        }
        ConfigAction::Set { key, value } => {
            let mut settings = Settings::load(vault);
            settings.set(&key, &value)?;
            settings.save(vault)?;
            println!("✓ {} = {}", key, settings.get(&key)?);
        }
        ConfigAction::Reset => {
            Settings::default().save(vault)?;
            println!("✓ Settings reset to defaults");
        }
        ConfigAction::Path => {
            println!("{}", Settings::settings_path(vault).display());
        }
    }

    Ok(())
}
