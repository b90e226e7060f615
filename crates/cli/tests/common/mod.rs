// Path: crates/cli/tests/common/mod.rs

//! Scripted collaborators for the orchestrator tests.

#![allow(dead_code)]

use async_trait::async_trait;
use anyhow::anyhow;
use forklift_cli::orchestrator::{
    CommandOutput, CommandRunner, LivenessMonitor, LivenessParams, NodeBackend, ProposalDriver,
    Release, ReleaseApi, ReleaseAsset, SequencerParams, Session, UpgradeSequencer,
};
use forklift_client::ChainQuery;
use forklift_types::app::{
    ChainStatus, Proposal, ProposalMessage, ProposalStatus, UpgradePlanMessage, VoteOption,
};
use forklift_types::error::{GovernanceError, ReleaseError, RpcError};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Mutex;
use std::time::Duration;
use time::OffsetDateTime;

pub fn unreachable() -> RpcError {
    RpcError::Unreachable {
        url: "http://mock/status".into(),
        reason: "connection refused".into(),
    }
}

pub fn session() -> Session {
    Session {
        chain_id: "localnet_1001-1".into(),
        key_name: "validator".into(),
        keyring_backend: "test".into(),
        node_rpc: "http://127.0.0.1:26657".into(),
        address: None,
    }
}

pub fn params(max_checks: u32, post_reach_samples: u32) -> LivenessParams {
    LivenessParams {
        max_checks,
        interval: Duration::ZERO,
        post_reach_samples,
        max_consecutive_errors: 5,
    }
}

/// A chain whose height samples follow a script. Once the script is exhausted
/// the last successful height is repeated.
pub struct MockChain {
    heights: Mutex<VecDeque<Result<u64, RpcError>>>,
    last: Mutex<u64>,
    height_calls: AtomicU32,
    list_calls: AtomicU32,
    version: Mutex<String>,
    proposals: Mutex<Vec<Proposal>>,
    /// Proposals only show up in listings from this list call on (1-based).
    visible_from_list_call: u32,
}

impl MockChain {
    pub fn with_heights(heights: &[u64]) -> Self {
        Self::scripted(heights.iter().copied().map(Ok).collect())
    }

    pub fn scripted(script: Vec<Result<u64, RpcError>>) -> Self {
        Self {
            heights: Mutex::new(script.into()),
            last: Mutex::new(0),
            height_calls: AtomicU32::new(0),
            list_calls: AtomicU32::new(0),
            version: Mutex::new(String::new()),
            proposals: Mutex::new(Vec::new()),
            visible_from_list_call: 1,
        }
    }

    pub fn with_version(self, version: &str) -> Self {
        *self.version.lock().unwrap() = version.to_string();
        self
    }

    pub fn with_proposals(self, proposals: Vec<Proposal>) -> Self {
        *self.proposals.lock().unwrap() = proposals;
        self
    }

    pub fn visible_from_list_call(mut self, call: u32) -> Self {
        self.visible_from_list_call = call;
        self
    }

    pub fn height_calls(&self) -> u32 {
        self.height_calls.load(Ordering::SeqCst)
    }

    pub fn list_calls(&self) -> u32 {
        self.list_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChainQuery for MockChain {
    async fn status(&self) -> Result<ChainStatus, RpcError> {
        self.height_calls.fetch_add(1, Ordering::SeqCst);
        let next = self.heights.lock().unwrap().pop_front();
        let height = match next {
            Some(Ok(h)) => {
                *self.last.lock().unwrap() = h;
                h
            }
            Some(Err(e)) => return Err(e),
            None => *self.last.lock().unwrap(),
        };
        Ok(ChainStatus {
            latest_block_height: height,
            catching_up: false,
            node_version: "0.37.4".into(),
        })
    }

    async fn node_version(&self) -> Result<String, RpcError> {
        Ok(self.version.lock().unwrap().clone())
    }

    async fn list_proposals(&self) -> Result<Vec<String>, RpcError> {
        let call = self.list_calls.fetch_add(1, Ordering::SeqCst) + 1;
        if call < self.visible_from_list_call {
            return Ok(Vec::new());
        }
        let mut ids: Vec<String> = self
            .proposals
            .lock()
            .unwrap()
            .iter()
            .map(|p| p.id.clone())
            .collect();
        ids.sort_by_key(|id| std::cmp::Reverse(id.parse::<u64>().unwrap_or(0)));
        Ok(ids)
    }

    async fn proposal(&self, id: &str) -> Result<Proposal, RpcError> {
        self.proposals
            .lock()
            .unwrap()
            .iter()
            .find(|p| p.id == id)
            .cloned()
            .ok_or_else(|| RpcError::Unreachable {
                url: format!("http://mock/proposals/{}", id),
                reason: "HTTP 404 Not Found".into(),
            })
    }
}

/// Ten blocks per voting period.
pub fn sequencer_params() -> SequencerParams {
    SequencerParams {
        upgrade_info: String::new(),
        deposit: "10000000stake".into(),
        fees: "20000stake".into(),
        vote: VoteOption::Yes,
        voting_period_secs: 10,
        block_time_secs: 1,
        settle_delay: Duration::ZERO,
        inter_upgrade_delay: Duration::ZERO,
        final_check_samples: 1,
    }
}

pub fn sequencer<'a>(chain: &'a MockChain, runner: &'a MockRunner, post_reach: u32) -> UpgradeSequencer<'a> {
    let driver = ProposalDriver::new(runner, chain, "simd", 3, Duration::ZERO);
    let monitor = LivenessMonitor::new(chain, params(20, post_reach));
    UpgradeSequencer::new(chain, driver, monitor, sequencer_params())
}

/// A passed `MsgSoftwareUpgrade` proposal.
pub fn upgrade_proposal(id: &str, name: &str, height: u64, submit_time: OffsetDateTime) -> Proposal {
    Proposal {
        id: id.into(),
        title: Some(name.into()),
        status: ProposalStatus::Passed,
        submit_time,
        messages: vec![ProposalMessage {
            type_url: "/cosmos.upgrade.v1beta1.MsgSoftwareUpgrade".into(),
            title: None,
            plan: Some(UpgradePlanMessage {
                height,
                name: name.into(),
                info: String::new(),
            }),
        }],
    }
}

/// Answers node CLI invocations the way a healthy node binary would, and records them.
#[derive(Default)]
pub struct MockRunner {
    calls: Mutex<Vec<(String, Vec<String>, Option<String>)>>,
    /// Subcommand (e.g. "vote") that fails with a non-zero exit.
    pub failing: Option<&'static str>,
}

impl MockRunner {
    pub fn failing_on(subcommand: &'static str) -> Self {
        Self {
            failing: Some(subcommand),
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>, Option<String>)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn calls_with(&self, subcommand: &str) -> Vec<Vec<String>> {
        self.calls()
            .into_iter()
            .filter(|(_, args, _)| args.iter().any(|a| a == subcommand))
            .map(|(_, args, _)| args)
            .collect()
    }
}

fn ok(stdout: &str) -> CommandOutput {
    CommandOutput {
        code: Some(0),
        stdout: stdout.into(),
        stderr: String::new(),
    }
}

#[async_trait]
impl CommandRunner for MockRunner {
    async fn run(
        &self,
        program: &str,
        args: &[String],
        stdin: Option<&str>,
    ) -> Result<CommandOutput, GovernanceError> {
        self.calls.lock().unwrap().push((
            program.to_string(),
            args.to_vec(),
            stdin.map(String::from),
        ));
        let has = |s: &str| args.iter().any(|a| a == s);

        if let Some(sub) = self.failing {
            if has(sub) {
                return Ok(CommandOutput {
                    code: Some(1),
                    stdout: String::new(),
                    stderr: format!("Error: {} failed", sub),
                });
            }
        }
        let out = if has("submit-legacy-proposal") {
            ok(r#"{"height":"0","txhash":"PROPOSALHASH","code":0,"raw_log":""}"#)
        } else if has("vote") {
            ok(r#"{"height":"0","txhash":"VOTEHASH","code":0,"raw_log":""}"#)
        } else if has("delete") {
            CommandOutput {
                code: Some(1),
                stdout: String::new(),
                stderr: "Error: key not found".into(),
            }
        } else if has("add") {
            ok(r#"{"name":"validator","type":"local","address":"cosmos1qy352eufqy352eufqy352eufqy352euf6jqm8w","pubkey":"{}"}"#)
        } else {
            ok("")
        };
        Ok(out)
    }
}

/// An in-memory release API.
pub struct MockReleases {
    releases: Mutex<Vec<Release>>,
    flipped: Mutex<Vec<u64>>,
    downloads: AtomicU32,
}

impl MockReleases {
    pub fn new(releases: Vec<Release>) -> Self {
        Self {
            releases: Mutex::new(releases),
            flipped: Mutex::new(Vec::new()),
            downloads: AtomicU32::new(0),
        }
    }

    pub fn flipped(&self) -> Vec<u64> {
        self.flipped.lock().unwrap().clone()
    }

    pub fn downloads(&self) -> u32 {
        self.downloads.load(Ordering::SeqCst)
    }
}

pub fn release(id: u64, name: &str, tag: &str, prerelease: bool) -> Release {
    Release {
        id,
        name: Some(name.into()),
        tag_name: tag.into(),
        prerelease,
        assets: vec![ReleaseAsset {
            id: id * 10,
            name: "simd-linux-amd64".into(),
            url: format!("https://api.example/assets/{}", id * 10),
            browser_download_url: format!("https://example/download/{}/simd-linux-amd64", tag),
        }],
    }
}

#[async_trait]
impl ReleaseApi for MockReleases {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
        Ok(self.releases.lock().unwrap().clone())
    }

    async fn set_prerelease(&self, release_id: u64, prerelease: bool) -> Result<(), ReleaseError> {
        let mut releases = self.releases.lock().unwrap();
        let release = releases
            .iter_mut()
            .find(|r| r.id == release_id)
            .ok_or(ReleaseError::Api {
                status: 404,
                body: "Not Found".into(),
            })?;
        release.prerelease = prerelease;
        self.flipped.lock().unwrap().push(release_id);
        Ok(())
    }

    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>, ReleaseError> {
        self.downloads.fetch_add(1, Ordering::SeqCst);
        Ok(format!("binary-{}", asset.id).into_bytes())
    }
}

/// How a [`MockNode`] behaves when launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LaunchBehavior {
    #[default]
    Starts,
    Fails,
    /// Never finishes starting, like a container still in its startup grace.
    Hangs,
}

/// A node backend that records which lifecycle hooks ran.
#[derive(Debug, Default)]
pub struct MockNode {
    pub behavior: LaunchBehavior,
    pub launches: u32,
    pub log_collections: u32,
    pub cleanups: u32,
}

impl MockNode {
    pub fn with_behavior(behavior: LaunchBehavior) -> Self {
        Self {
            behavior,
            ..Self::default()
        }
    }
}

#[async_trait]
impl NodeBackend for MockNode {
    async fn launch(&mut self) -> anyhow::Result<()> {
        self.launches += 1;
        match self.behavior {
            LaunchBehavior::Starts => Ok(()),
            LaunchBehavior::Fails => Err(anyhow!("image not found")),
            LaunchBehavior::Hangs => std::future::pending().await,
        }
    }

    async fn collect_logs(&mut self) -> anyhow::Result<String> {
        self.log_collections += 1;
        Ok("INF committed state height=110\n".into())
    }

    async fn cleanup(&mut self) -> anyhow::Result<()> {
        self.cleanups += 1;
        Ok(())
    }

    fn describe(&self) -> String {
        "mock node".into()
    }
}
