//! # hearthd: hearth daemon
//!
//! Composition root that wires all adapters together.
//!
//! ## Responsibilities
//! - Parse command-line arguments and configuration (file, env vars)
//! - Install the `tracing` subscriber
//! - Initialize the `SQLite` connection pool and run migrations
//! - Register the configured devices and sensors
//! - Either run the daemon (ingestion, threshold alerts, scheduler) or a
//!   one-shot administration command
//! - Handle graceful shutdown (SIGTERM/SIGINT)
//!
//! ## Dependency rule
//! This is the **only** crate that depends on all other crates.
//! It is the wiring layer. No domain logic belongs here.

mod cli;
mod commands;
mod config;
mod gateway;
mod serve;
mod stores;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::cli::{Cli, Command};
use crate::config::Config;
use crate::stores::Stores;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = Config::load(&cli.config)
        .with_context(|| format!("failed to load {}", cli.config.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_new(&config.logging.filter).unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let stores = Stores::open(&config.database.url)
        .await
        .context("failed to open database")?;
    let inventory = stores.seed(&config).await?;

    match cli.command.unwrap_or(Command::Serve) {
        Command::Serve => serve::run(&config, stores, inventory).await,
        Command::Inventory => commands::inventory(&stores).await,
        Command::Plan(command) => commands::plan(&stores, command).await,
        Command::Schedule(command) => commands::schedule(&stores, command).await,
        Command::Report(command) => commands::report(&config, &stores, command).await,
        Command::Logs(command) => commands::logs(&config, &stores, command).await,
        Command::Notifications { user, limit } => {
            commands::notifications(&stores, user, limit).await
        }
    }
}
