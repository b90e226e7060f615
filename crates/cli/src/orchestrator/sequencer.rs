// Path: crates/cli/src/orchestrator/sequencer.rs

//! Drives an ordered version sequence through governance, one version at a time.
//!
//! For every consensus-breaking entry the sequencer walks
//! `Idle -> ProposalSubmitted -> ProposalIdResolved -> Voted -> AwaitingHeight`
//! and then one of `Confirmed`, `Stalled` or `TimedOut`. Only `Confirmed`
//! continues with the next entry.

use super::governance::{plan_upgrade_height, ProposalDriver, UpgradeProposal};
use super::liveness::LivenessMonitor;
use super::session::Session;
use forklift_client::ChainQuery;
use forklift_types::app::{MonitorOutcome, VersionSequenceEntry, VoteOption};
use forklift_types::config::HarnessConfig;
use forklift_types::error::UpgradeError;
use std::fmt;
use std::time::Duration;
use tokio::time::sleep;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencerParams {
    pub upgrade_info: String,
    pub deposit: String,
    pub fees: String,
    pub vote: VoteOption,
    pub voting_period_secs: u64,
    pub block_time_secs: u64,
    /// Wait between submission and id resolution.
    pub settle_delay: Duration,
    /// Wait between the vote and the start of height monitoring.
    pub inter_upgrade_delay: Duration,
    /// Post-baseline samples of the final liveness check.
    pub final_check_samples: u32,
}

impl SequencerParams {
    pub fn from_config(cfg: &HarnessConfig) -> Self {
        Self {
            upgrade_info: cfg.governance.upgrade_info.clone(),
            deposit: cfg.governance.deposit.clone(),
            fees: cfg.governance.fees.clone(),
            vote: cfg.governance.vote,
            voting_period_secs: cfg.governance.voting_period_secs,
            block_time_secs: cfg.governance.block_time_secs,
            settle_delay: cfg.governance.settle_delay(),
            inter_upgrade_delay: cfg.sequence.inter_upgrade_delay(),
            final_check_samples: cfg.liveness.final_check_samples,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SequencerState {
    Idle,
    ProposalSubmitted,
    ProposalIdResolved,
    Voted,
    AwaitingHeight,
    Confirmed,
    Stalled,
    TimedOut,
}

impl fmt::Display for SequencerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Idle => "idle",
            Self::ProposalSubmitted => "proposal_submitted",
            Self::ProposalIdResolved => "proposal_id_resolved",
            Self::Voted => "voted",
            Self::AwaitingHeight => "awaiting_height",
            Self::Confirmed => "confirmed",
            Self::Stalled => "stalled",
            Self::TimedOut => "timed_out",
        };
        f.write_str(s)
    }
}

/// What happened to one entry of the sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VersionOutcome {
    Confirmed {
        version: String,
        proposal_id: String,
        upgrade_height: u64,
        reached_at: u64,
        advanced_to: u64,
    },
    /// Non-breaking entries need no governance.
    Skipped { version: String },
}

impl VersionOutcome {
    pub fn version(&self) -> &str {
        match self {
            Self::Confirmed { version, .. } | Self::Skipped { version } => version,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SequenceReport {
    pub outcomes: Vec<VersionOutcome>,
    pub end_version: String,
    /// Height the chain advanced to during the final liveness check.
    pub final_height: u64,
}

pub struct UpgradeSequencer<'a> {
    chain: &'a dyn ChainQuery,
    driver: ProposalDriver<'a>,
    monitor: LivenessMonitor<'a>,
    params: SequencerParams,
    state: SequencerState,
}

impl<'a> UpgradeSequencer<'a> {
    pub fn new(
        chain: &'a dyn ChainQuery,
        driver: ProposalDriver<'a>,
        monitor: LivenessMonitor<'a>,
        params: SequencerParams,
    ) -> Self {
        Self {
            chain,
            driver,
            monitor,
            params,
            state: SequencerState::Idle,
        }
    }

    pub fn state(&self) -> SequencerState {
        self.state
    }

    fn transition(&mut self, version: &str, next: SequencerState) {
        tracing::info!(
            target: "sequencer",
            version,
            from = %self.state,
            to = %next,
            "State transition"
        );
        self.state = next;
    }

    /// Runs every entry in order, then verifies the node reports `end_version`
    /// (the last entry when `None`) and still produces blocks.
    pub async fn run(
        &mut self,
        session: &Session,
        entries: &[VersionSequenceEntry],
        end_version: Option<&str>,
    ) -> Result<SequenceReport, UpgradeError> {
        let expected = end_version
            .map(String::from)
            .or_else(|| entries.last().map(|e| e.version.clone()))
            .ok_or(UpgradeError::EmptySequence)?;

        let mut outcomes = Vec::with_capacity(entries.len());
        for entry in entries {
            let outcome = if entry.is_consensus_breaking {
                self.upgrade(session, &entry.version).await?
            } else {
                tracing::info!(
                    target: "sequencer",
                    version = %entry.version,
                    "Non-consensus-breaking version, skipping governance"
                );
                VersionOutcome::Skipped {
                    version: entry.version.clone(),
                }
            };
            outcomes.push(outcome);
            self.state = SequencerState::Idle;
        }

        let final_height = self.final_check(&expected).await?;
        Ok(SequenceReport {
            outcomes,
            end_version: expected,
            final_height,
        })
    }

    async fn upgrade(&mut self, session: &Session, version: &str) -> Result<VersionOutcome, UpgradeError> {
        let current = self.monitor.current_height().await?;
        let upgrade_height = plan_upgrade_height(
            current,
            self.params.voting_period_secs,
            self.params.block_time_secs,
        );
        let proposal = UpgradeProposal {
            version: version.to_string(),
            upgrade_height,
            upgrade_info: self.params.upgrade_info.clone(),
            deposit: self.params.deposit.clone(),
            fees: self.params.fees.clone(),
        };

        let proposal_tx = self.driver.submit_upgrade_proposal(session, &proposal).await?;
        self.transition(version, SequencerState::ProposalSubmitted);
        sleep(self.params.settle_delay).await;

        let proposal_id = self.driver.resolve_proposal_id(version).await?;
        self.transition(version, SequencerState::ProposalIdResolved);

        let vote_tx = self
            .driver
            .submit_vote(session, &proposal_id, self.params.vote, &self.params.fees)
            .await?;
        self.transition(version, SequencerState::Voted);

        tracing::info!(
            target: "sequencer",
            version,
            proposal_id = %proposal_id,
            current_height = current,
            upgrade_height,
            proposal_tx = %proposal_tx,
            vote_tx = %vote_tx,
            "Upgrade scheduled"
        );

        sleep(self.params.inter_upgrade_delay).await;
        self.transition(version, SequencerState::AwaitingHeight);

        match self.monitor.wait_for_upgrade(upgrade_height).await? {
            MonitorOutcome::Live {
                reached_at,
                advanced_to,
                ..
            } => {
                self.transition(version, SequencerState::Confirmed);
                Ok(VersionOutcome::Confirmed {
                    version: version.to_string(),
                    proposal_id,
                    upgrade_height,
                    reached_at,
                    advanced_to,
                })
            }
            MonitorOutcome::Stalled { height, samples, .. } => {
                self.transition(version, SequencerState::Stalled);
                Err(UpgradeError::LivenessStall { height, samples })
            }
            MonitorOutcome::TimedOut {
                target_height,
                last_height,
                checks,
            } => {
                self.transition(version, SequencerState::TimedOut);
                Err(UpgradeError::LivenessTimeout {
                    target_height,
                    last_height,
                    checks,
                })
            }
        }
    }

    async fn final_check(&self, expected: &str) -> Result<u64, UpgradeError> {
        let actual = self.chain.node_version().await?;
        tracing::info!(target: "sequencer", expected, actual = %actual, "Checking end version");
        if actual != expected {
            return Err(UpgradeError::VersionMismatch {
                expected: expected.to_string(),
                actual,
            });
        }

        match self
            .monitor
            .confirm_liveness(self.params.final_check_samples)
            .await?
        {
            MonitorOutcome::Live { advanced_to, .. } => Ok(advanced_to),
            MonitorOutcome::Stalled { height, samples, .. } => {
                Err(UpgradeError::LivenessStall { height, samples })
            }
            MonitorOutcome::TimedOut {
                target_height,
                last_height,
                checks,
            } => Err(UpgradeError::LivenessTimeout {
                target_height,
                last_height,
                checks,
            }),
        }
    }
}
