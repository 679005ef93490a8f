//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify configuration loading, logging and SQLite connectivity outside
//!   any host application.
//! - Keep output deterministic for quick local sanity checks.

use anyhow::Context;
use cheddar_core::{core_version, init_logging, CheddarConfig, SqliteStore};
use clap::{Parser, Subcommand};
use log::info;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(name = "cheddar", version, about = "Cheddar persistence smoke checks")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Opens the configured SQLite database and runs the connectivity probe.
    Probe {
        /// TOML configuration file; `CHEDDAR__*` variables override it.
        #[arg(long, env = "CHEDDAR_CONFIG")]
        config: Option<PathBuf>,
    },
    /// Prints the core crate version.
    Version,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    match Cli::parse().command {
        Command::Probe { config } => probe(config).await,
        Command::Version => {
            println!("cheddar_core version={}", core_version());
            Ok(())
        }
    }
}

async fn probe(config_path: Option<PathBuf>) -> anyhow::Result<()> {
    let config = CheddarConfig::load(config_path.as_deref()).context("loading configuration")?;
    init_logging(&config.logging).context("initializing logging")?;

    let target = config
        .relational
        .database_path
        .as_ref()
        .map(|path| path.display().to_string())
        .unwrap_or_else(|| ":memory:".to_string());

    let store = SqliteStore::open(&config.relational, &[])
        .with_context(|| format!("opening database {target}"))?;
    store
        .probe()
        .await
        .with_context(|| format!("probing database {target}"))?;

    info!("event=cli_probe module=cli status=ok database={target}");
    println!("probe ok database={target}");
    Ok(())
}
