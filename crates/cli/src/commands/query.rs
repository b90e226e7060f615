// Path: crates/cli/src/commands/query.rs

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use forklift_client::{ChainQuery, HttpChainClient};
use forklift_types::config::HarnessConfig;
use time::format_description::well_known::Rfc3339;

#[derive(Parser, Debug)]
pub struct QueryArgs {
    /// RPC base URL of the node. Defaults to `node.rpc_url`.
    #[clap(long)]
    pub rpc_url: Option<String>,

    /// REST API base URL of the node. Defaults to `node.api_url`.
    #[clap(long)]
    pub api_url: Option<String>,

    #[clap(subcommand)]
    pub command: QueryCommands,
}

#[derive(Subcommand, Debug)]
pub enum QueryCommands {
    /// Get the current chain status.
    Status,
    /// Get the application version reported by the node.
    Version,
    /// List governance proposal ids, newest first.
    Proposals,
    /// Show one governance proposal.
    Proposal { id: String },
}

pub async fn run(args: QueryArgs, cfg: HarnessConfig) -> Result<()> {
    let rpc_url = args.rpc_url.unwrap_or_else(|| cfg.node.rpc_url.clone());
    let api_url = args.api_url.unwrap_or_else(|| cfg.node.api_url.clone());
    let client = HttpChainClient::new(&rpc_url, &api_url, cfg.node.request_timeout())?;

    match args.command {
        QueryCommands::Status => {
            let status = client.status().await.context("Failed to query node status")?;
            println!("Chain Status:");
            println!("  Height: {}", status.latest_block_height);
            println!("  Catching up: {}", status.catching_up);
            println!("  Node version: {}", status.node_version);
        }
        QueryCommands::Version => {
            println!("{}", client.node_version().await?);
        }
        QueryCommands::Proposals => {
            for id in client.list_proposals().await? {
                println!("{}", id);
            }
        }
        QueryCommands::Proposal { id } => {
            let proposal = client.proposal(&id).await?;
            println!("Proposal {}:", proposal.id);
            println!("  Status: {}", proposal.status);
            println!(
                "  Submitted: {}",
                proposal
                    .submit_time
                    .format(&Rfc3339)
                    .unwrap_or_else(|_| proposal.submit_time.to_string())
            );
            if let Some(title) = &proposal.title {
                println!("  Title: {}", title);
            }
            match proposal.upgrade_plan() {
                Some(plan) => {
                    println!("  Upgrade: {}", plan.version_title);
                    println!("  Upgrade height: {}", plan.target_height);
                }
                None => println!("  Upgrade: none"),
            }
        }
    }

    Ok(())
}
