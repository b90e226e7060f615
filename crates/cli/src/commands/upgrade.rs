// Path: crates/cli/src/commands/upgrade.rs

use anyhow::Result;
use clap::Parser;
use forklift_client::HttpChainClient;
use forklift_cli::orchestrator::{
    run_upgrade, shutdown, DockerNode, ExternalNode, LivenessMonitor, LivenessParams,
    NodeBackend, ProcessRunner, ProposalDriver, SequenceReport, SequencerParams, Session,
    UpgradeSequencer, VersionOutcome,
};
use forklift_types::app::VersionSequenceEntry;
use forklift_types::config::HarnessConfig;
use forklift_types::manifest::UpgradeManifest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct UpgradeArgs {
    /// Upgrade manifest. Defaults to `sequence.manifest_path`.
    #[clap(long)]
    pub manifest: Option<PathBuf>,

    /// Version the node must report at the end. Defaults to the last manifest entry.
    #[clap(long)]
    pub end_version: Option<String>,

    /// Launch the node in a Docker container even if `container.enabled` is false.
    #[clap(long)]
    pub docker: bool,
}

pub async fn run(args: UpgradeArgs, cfg: HarnessConfig) -> Result<()> {
    let manifest_path = args
        .manifest
        .clone()
        .unwrap_or_else(|| cfg.sequence.manifest_path.clone());
    let manifest = UpgradeManifest::load(&manifest_path)?;
    let entries = manifest.sequence();
    let end_version = args
        .end_version
        .clone()
        .or_else(|| cfg.sequence.end_version.clone())
        .or_else(|| manifest.end_version());

    let mut node: Box<dyn NodeBackend> = if args.docker || cfg.container.enabled {
        Box::new(DockerNode::new(cfg.container.clone())?)
    } else {
        Box::new(ExternalNode::new(cfg.node.log_file.clone()))
    };
    tracing::info!(
        target: "upgrade",
        node = %node.describe(),
        versions = entries.len(),
        end_version = ?end_version,
        "Starting upgrade run"
    );

    let report = run_upgrade(
        node.as_mut(),
        drive(&cfg, &entries, end_version.as_deref()),
        shutdown::interrupted(),
    )
    .await?;
    print_report(&report);
    Ok(())
}

async fn drive(
    cfg: &HarnessConfig,
    entries: &[VersionSequenceEntry],
    end_version: Option<&str>,
) -> Result<SequenceReport> {
    let chain = HttpChainClient::new(
        &cfg.node.rpc_url,
        &cfg.node.api_url,
        cfg.node.request_timeout(),
    )?;
    let runner = ProcessRunner::new(cfg.node.tool_path.clone());
    let driver = ProposalDriver::new(
        &runner,
        &chain,
        cfg.node.binary.clone(),
        cfg.governance.resolve_attempts,
        cfg.governance.resolve_delay(),
    );

    let mut session = Session::from_config(&cfg.node);
    if let Some(mnemonic) = cfg.node.mnemonic.as_deref() {
        driver.recover_key(&mut session, mnemonic).await?;
    }

    let monitor = LivenessMonitor::new(&chain, LivenessParams::from_config(&cfg.liveness));
    let mut sequencer =
        UpgradeSequencer::new(&chain, driver, monitor, SequencerParams::from_config(cfg));
    Ok(sequencer.run(&session, entries, end_version).await?)
}

fn print_report(report: &SequenceReport) {
    println!("Upgrade sequence complete, node at {}", report.end_version);
    for outcome in &report.outcomes {
        match outcome {
            VersionOutcome::Confirmed {
                version,
                proposal_id,
                upgrade_height,
                reached_at,
                advanced_to,
            } => println!(
                "  {:<16} proposal {:<6} height {} (reached {}, advanced to {})",
                version, proposal_id, upgrade_height, reached_at, advanced_to
            ),
            VersionOutcome::Skipped { version } => {
                println!("  {:<16} skipped (not consensus-breaking)", version)
            }
        }
    }
    println!("  final height   {}", report.final_height);
}
