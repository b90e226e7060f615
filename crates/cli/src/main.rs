// Path: crates/cli/src/main.rs
#![cfg_attr(
    not(test),
    deny(
        clippy::unwrap_used,
        clippy::expect_used,
        clippy::panic,
        clippy::unimplemented,
        clippy::todo,
        clippy::indexing_slicing
    )
)]

//! # forklift
//!
//! Governance upgrade testing and release promotion for Cosmos-SDK chains.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forklift_types::config::HarnessConfig;
use std::path::PathBuf;

mod commands;

use commands::*;

#[derive(Parser, Debug)]
#[clap(
    name = "forklift",
    version,
    about = "Upgrade-test orchestrator for Cosmos-SDK chains.",
    long_about = "forklift drives a chain through a sequence of governance software upgrades, verifies block production after each one, and promotes releases whose upgrades proved live."
)]
struct Cli {
    /// Path to the harness configuration file. Missing files fall back to defaults.
    #[clap(long, global = true, env = "FORKLIFT_CONFIG", default_value = "forklift.toml")]
    config: PathBuf,

    /// Emit logs as JSON lines.
    #[clap(long, global = true)]
    json_logs: bool,

    #[clap(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Run the upgrade sequence from the manifest against a node.
    Upgrade(upgrade::UpgradeArgs),

    /// Promote pre-releases whose upgrade proposals passed and proved live.
    Promote(promote::PromoteArgs),

    /// Query a running node.
    Query(query::QueryArgs),

    /// Generate or inspect the harness configuration.
    Config(config::ConfigCmdArgs),

    /// Download release binaries listed in the manifest.
    FetchBinaries(fetch::FetchArgs),

    /// Replace this process with the node daemon.
    StartNode(start::StartArgs),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    forklift_cli::logging::init_tracing(cli.json_logs)?;

    let cfg = HarnessConfig::load(&cli.config)
        .with_context(|| format!("loading configuration from {}", cli.config.display()))?;

    match cli.command {
        Commands::Upgrade(args) => upgrade::run(args, cfg).await,
        Commands::Promote(args) => promote::run(args, cfg).await,
        Commands::Query(args) => query::run(args, cfg).await,
        Commands::Config(args) => config::run(args, cfg),
        Commands::FetchBinaries(args) => fetch::run(args, cfg).await,
        Commands::StartNode(args) => start::run(args, cfg),
    }
}
