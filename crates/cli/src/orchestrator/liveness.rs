// Path: crates/cli/src/orchestrator/liveness.rs

//! Two-phase bounded polling: wait for a target height, then confirm the chain
//! keeps producing blocks.
//!
//! Failed height samples are never treated as "no progress". In Phase 1 they
//! spend check budget (the phase bounds wall-clock time); in Phase 2 they are
//! retried without spending sample budget. In both phases a run of
//! `max_consecutive_errors` failures aborts with [`LivenessError::Unreachable`].

use forklift_client::ChainQuery;
use forklift_types::app::MonitorOutcome;
use forklift_types::config::{LivenessConfig, ReleaseConfig};
use forklift_types::error::{LivenessError, RpcError};
use std::time::Duration;
use tokio::time::sleep;

/// Polling budget for one monitor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LivenessParams {
    /// Phase 1: checks allowed below the target height.
    pub max_checks: u32,
    /// Delay between consecutive samples in both phases.
    pub interval: Duration,
    /// Phase 2: successful samples allowed without progress before declaring a stall.
    pub post_reach_samples: u32,
    pub max_consecutive_errors: u32,
}

impl LivenessParams {
    pub fn from_config(cfg: &LivenessConfig) -> Self {
        Self {
            max_checks: cfg.max_height_checks,
            interval: cfg.check_interval(),
            post_reach_samples: cfg.post_reach_samples,
            max_consecutive_errors: cfg.max_consecutive_errors,
        }
    }

    /// The watcher reuses the algorithm with its own Phase 1 bound and interval.
    pub fn for_release(liveness: &LivenessConfig, release: &ReleaseConfig) -> Self {
        Self {
            max_checks: release.max_height_checks,
            interval: release.check_interval(),
            ..Self::from_config(liveness)
        }
    }
}

/// Result of Phase 1.
enum HeightWait {
    Reached(u64),
    TimedOut { last_height: Option<u64>, checks: u32 },
}

/// Counts failed samples in a row.
struct ErrorBudget {
    limit: u32,
    consecutive: u32,
}

impl ErrorBudget {
    fn new(limit: u32) -> Self {
        Self {
            limit: limit.max(1),
            consecutive: 0,
        }
    }

    fn reset(&mut self) {
        self.consecutive = 0;
    }

    fn record(&mut self, err: RpcError) -> Result<(), LivenessError> {
        self.consecutive += 1;
        if self.consecutive >= self.limit {
            return Err(LivenessError::Unreachable {
                consecutive_failures: self.consecutive,
                last_error: err,
            });
        }
        Ok(())
    }
}

pub struct LivenessMonitor<'a> {
    chain: &'a dyn ChainQuery,
    params: LivenessParams,
}

impl<'a> LivenessMonitor<'a> {
    pub fn new(chain: &'a dyn ChainQuery, params: LivenessParams) -> Self {
        Self { chain, params }
    }

    pub fn params(&self) -> &LivenessParams {
        &self.params
    }

    /// Waits for `target_height`, then confirms the chain advances past it.
    pub async fn wait_for_upgrade(&self, target_height: u64) -> Result<MonitorOutcome, LivenessError> {
        tracing::info!(
            target: "liveness",
            target_height,
            max_checks = self.params.max_checks,
            interval_secs = self.params.interval.as_secs(),
            "Waiting for upgrade height"
        );
        match self.wait_for_height(target_height).await? {
            HeightWait::Reached(reached_at) => {
                self.confirm_progress(target_height, reached_at, self.params.post_reach_samples)
                    .await
            }
            HeightWait::TimedOut {
                last_height,
                checks,
            } => {
                tracing::error!(
                    target: "liveness",
                    target_height,
                    ?last_height,
                    checks,
                    "Timed out before reaching target height"
                );
                Ok(MonitorOutcome::TimedOut {
                    target_height,
                    last_height,
                    checks,
                })
            }
        }
    }

    /// One height sample, retried under the consecutive-error budget.
    pub async fn current_height(&self) -> Result<u64, LivenessError> {
        let mut errors = ErrorBudget::new(self.params.max_consecutive_errors);
        loop {
            match self.chain.latest_height().await {
                Ok(h) => return Ok(h),
                Err(e) => {
                    tracing::warn!(target: "liveness", error = %e, "Height sample failed, retrying");
                    errors.record(e)?;
                    sleep(self.params.interval).await;
                }
            }
        }
    }

    /// Samples a baseline height, then requires an increase within `samples` further samples.
    pub async fn confirm_liveness(&self, samples: u32) -> Result<MonitorOutcome, LivenessError> {
        let baseline = self.current_height().await?;
        tracing::info!(target: "liveness", baseline, samples, "Confirming block production");
        self.confirm_progress(baseline, baseline, samples).await
    }

    /// Phase 1. A sample at or above the target spends no budget.
    async fn wait_for_height(&self, target_height: u64) -> Result<HeightWait, LivenessError> {
        let mut checks = 0u32;
        let mut last_height = None;
        let mut errors = ErrorBudget::new(self.params.max_consecutive_errors);

        loop {
            match self.chain.latest_height().await {
                Ok(current) => {
                    errors.reset();
                    last_height = Some(current);
                    if current >= target_height {
                        tracing::info!(
                            target: "liveness",
                            target_height,
                            current,
                            checks,
                            "Target height reached"
                        );
                        return Ok(HeightWait::Reached(current));
                    }
                    checks += 1;
                    tracing::debug!(
                        target: "liveness",
                        target_height,
                        current,
                        checks,
                        "Below target height"
                    );
                }
                Err(e) => {
                    checks += 1;
                    tracing::warn!(
                        target: "liveness",
                        target_height,
                        checks,
                        error = %e,
                        "Height check failed; no data this round"
                    );
                    errors.record(e)?;
                }
            }

            if checks >= self.params.max_checks {
                return Ok(HeightWait::TimedOut {
                    last_height,
                    checks,
                });
            }
            sleep(self.params.interval).await;
        }
    }

    /// Phase 2. Returns `Live` on the first sample above the previous one.
    async fn confirm_progress(
        &self,
        target_height: u64,
        reached_at: u64,
        max_samples: u32,
    ) -> Result<MonitorOutcome, LivenessError> {
        let mut previous = reached_at;
        let mut samples = 0u32;
        let mut errors = ErrorBudget::new(self.params.max_consecutive_errors);

        while samples < max_samples {
            sleep(self.params.interval).await;
            match self.chain.latest_height().await {
                Ok(current) => {
                    errors.reset();
                    samples += 1;
                    if current > previous {
                        tracing::info!(
                            target: "liveness",
                            target_height,
                            previous,
                            current,
                            samples,
                            "Chain is live"
                        );
                        return Ok(MonitorOutcome::Live {
                            target_height,
                            reached_at,
                            advanced_to: current,
                            samples,
                        });
                    }
                    tracing::debug!(
                        target: "liveness",
                        previous,
                        current,
                        samples,
                        "No height progress"
                    );
                    previous = previous.max(current);
                }
                Err(e) => {
                    // Retried: neither spends sample budget nor counts as a stalled sample.
                    tracing::warn!(
                        target: "liveness",
                        previous,
                        samples,
                        error = %e,
                        "Liveness sample failed; retrying"
                    );
                    errors.record(e)?;
                }
            }
        }

        tracing::error!(
            target: "liveness",
            target_height,
            height = previous,
            samples,
            "Chain stalled"
        );
        Ok(MonitorOutcome::Stalled {
            target_height,
            height: previous,
            samples,
        })
    }
}
