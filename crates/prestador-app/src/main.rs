//! prestador: manage the services you offer from a terminal.
//!
//! Usage:
//!   # SQLite store at the configured (or default) path
//!   cargo run -p prestador-app
//!
//!   # Ephemeral in-memory store
//!   cargo run -p prestador-app -- --memory
//!
//!   # Explicit database and config
//!   cargo run -p prestador-app -- --database ./prestador.db --config ./config.ron

mod config;
mod shell;

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use prestador_client::{SharedRecordStore, SqliteStore, shared_memory_store};
use tracing_subscriber::{EnvFilter, fmt};

use config::AppConfig;
use shell::Shell;

/// Interactive shell for prestador service records.
#[derive(Parser, Debug)]
#[command(name = "prestador")]
#[command(about = "Create, edit and delete the services you offer")]
struct Args {
    /// Config file (RON). Defaults to ~/.config/prestador/config.ron
    #[arg(long)]
    config: Option<PathBuf>,

    /// Keep records in memory only
    #[arg(long, conflicts_with = "database")]
    memory: bool,

    /// SQLite database file, overriding the config
    #[arg(long)]
    database: Option<PathBuf>,
}

fn open_store(args: &Args, config: &AppConfig) -> Result<SharedRecordStore> {
    if args.memory {
        tracing::info!("Starting with in-memory store");
        let store: SharedRecordStore = shared_memory_store();
        return Ok(store);
    }

    let path = args.database.clone().unwrap_or_else(|| config.database_path());
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }
    tracing::info!(path = %path.display(), "Opening SQLite store");
    let store: SharedRecordStore = Arc::new(
        SqliteStore::open(&path).with_context(|| format!("opening database {}", path.display()))?,
    );
    Ok(store)
}

#[tokio::main]
async fn main() -> Result<()> {
    // stdout belongs to the shell
    fmt()
        .with_env_filter(
            EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into())
        )
        .with_writer(std::io::stderr)
        .with_ansi(false)
        .init();

    let args = Args::parse();
    let config = AppConfig::load(args.config.as_deref()).context("loading config")?;
    let store = open_store(&args, &config)?;

    let mut shell = Shell::new(store, config.route_paths());
    shell.run().await?;

    tracing::info!("prestador shutting down");
    Ok(())
}
