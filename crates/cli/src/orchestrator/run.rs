// Path: crates/cli/src/orchestrator/run.rs

//! One upgrade run against a node backend: launch, drive, and always release.

use super::backend::{NodeBackend, CLEANUP_TIMEOUT};
use super::sequencer::SequenceReport;
use anyhow::{Context, Result};
use forklift_types::error::{GovernanceError, LivenessError, UpgradeError};
use forklift_types::ErrorCode;
use std::future::Future;

/// Launches `node`, then runs `drive` to completion, racing both against
/// `interrupt`.
///
/// Node logs are emitted on every failure, including a failed launch and an
/// interrupt. The node is cleaned up in all cases.
pub async fn run_upgrade<D, I>(
    node: &mut dyn NodeBackend,
    drive: D,
    interrupt: I,
) -> Result<SequenceReport>
where
    D: Future<Output = Result<SequenceReport>>,
    I: Future<Output = ()>,
{
    let result = {
        let launched = async {
            node.launch().await.context("launching node")?;
            drive.await
        };
        tokio::select! {
            r = launched => r,
            _ = interrupt => Err(UpgradeError::Interrupted.into()),
        }
    };

    match result {
        Ok(report) => {
            release_node(node).await;
            Ok(report)
        }
        Err(e) => {
            tracing::error!(target: "upgrade", code = failure_code(&e), error = %e, "Upgrade run failed");
            emit_node_logs(node).await;
            release_node(node).await;
            Err(e)
        }
    }
}

/// Stable code for a failed run, falling back to `UPGRADE_ABORTED`.
pub fn failure_code(e: &anyhow::Error) -> &'static str {
    e.downcast_ref::<UpgradeError>()
        .map(|u| u.code())
        .or_else(|| e.downcast_ref::<GovernanceError>().map(|g| g.code()))
        .or_else(|| e.downcast_ref::<LivenessError>().map(|l| l.code()))
        .unwrap_or("UPGRADE_ABORTED")
}

async fn emit_node_logs(node: &mut dyn NodeBackend) {
    match node.collect_logs().await {
        Ok(logs) if logs.is_empty() => {
            tracing::warn!(target: "upgrade", node = %node.describe(), "No node logs available");
        }
        Ok(logs) => {
            eprintln!("===== node logs: {} =====", node.describe());
            eprintln!("{}", logs.trim_end());
            eprintln!("===== end node logs =====");
        }
        Err(e) => tracing::error!(target: "upgrade", error = %e, "Collecting node logs failed"),
    }
}

async fn release_node(node: &mut dyn NodeBackend) {
    match tokio::time::timeout(CLEANUP_TIMEOUT, node.cleanup()).await {
        Ok(Ok(())) => {}
        Ok(Err(e)) => tracing::warn!(target: "upgrade", error = %e, "Node cleanup failed"),
        Err(_) => tracing::warn!(target: "upgrade", "Node cleanup timed out"),
    }
}
