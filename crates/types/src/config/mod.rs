// Path: crates/types/src/config/mod.rs

//! Harness configuration.
//!
//! Values are resolved in three layers: serde defaults, then `forklift.toml`,
//! then environment overrides (see [`HarnessConfig::apply_env`]).
use crate::app::VoteOption;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Top-level configuration for every forklift command.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct HarnessConfig {
    #[serde(default)]
    pub node: NodeConfig,
    #[serde(default)]
    pub governance: GovernanceConfig,
    #[serde(default)]
    pub liveness: LivenessConfig,
    #[serde(default)]
    pub sequence: SequenceConfig,
    #[serde(default)]
    pub release: ReleaseConfig,
    #[serde(default)]
    pub container: ContainerConfig,
    #[serde(default)]
    pub daemon: DaemonConfig,
}

/// How to reach and drive the node under test.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NodeConfig {
    /// CometBFT RPC base URL (`/status`, `/abci_info`).
    #[serde(default = "default_rpc_url")]
    pub rpc_url: String,
    /// REST API base URL (governance queries).
    #[serde(default = "default_api_url")]
    pub api_url: String,
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    /// Key name used to sign proposals and votes.
    #[serde(default = "default_moniker")]
    pub moniker: String,
    #[serde(default = "default_keyring_backend")]
    pub keyring_backend: String,
    /// The node CLI executable.
    #[serde(default = "default_binary")]
    pub binary: String,
    /// Prepended to `PATH` for every CLI invocation.
    #[serde(default)]
    pub tool_path: Option<PathBuf>,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// If set, the signing key is recovered from this mnemonic before the run.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mnemonic: Option<String>,
    /// Node log file used for diagnostics when the node is not containerized.
    #[serde(default)]
    pub log_file: Option<PathBuf>,
}

fn default_rpc_url() -> String {
    "http://127.0.0.1:26657".to_string()
}
fn default_api_url() -> String {
    "http://127.0.0.1:1317".to_string()
}
fn default_chain_id() -> String {
    "localnet_1001-1".to_string()
}
fn default_moniker() -> String {
    "validator".to_string()
}
fn default_keyring_backend() -> String {
    "test".to_string()
}
fn default_binary() -> String {
    "simd".to_string()
}
fn default_request_timeout_secs() -> u64 {
    10
}

impl Default for NodeConfig {
    fn default() -> Self {
        Self {
            rpc_url: default_rpc_url(),
            api_url: default_api_url(),
            chain_id: default_chain_id(),
            moniker: default_moniker(),
            keyring_backend: default_keyring_backend(),
            binary: default_binary(),
            tool_path: None,
            request_timeout_secs: default_request_timeout_secs(),
            mnemonic: None,
            log_file: None,
        }
    }
}

impl NodeConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }
}

/// Parameters of the proposal/vote cycle.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GovernanceConfig {
    #[serde(default = "default_deposit")]
    pub deposit: String,
    #[serde(default = "default_fees")]
    pub fees: String,
    #[serde(default)]
    pub upgrade_info: String,
    #[serde(default)]
    pub vote: VoteOption,
    /// Length of the voting period; together with `block_time_secs` it schedules the upgrade height.
    #[serde(default = "default_voting_period_secs")]
    pub voting_period_secs: u64,
    #[serde(default = "default_block_time_secs")]
    pub block_time_secs: u64,
    /// Wait after submission before the proposal is expected to be queryable.
    #[serde(default = "default_settle_delay_secs")]
    pub settle_delay_secs: u64,
    #[serde(default = "default_resolve_attempts")]
    pub resolve_attempts: u32,
    #[serde(default = "default_resolve_delay_secs")]
    pub resolve_delay_secs: u64,
}

fn default_deposit() -> String {
    "10000000stake".to_string()
}
fn default_fees() -> String {
    "20000stake".to_string()
}
fn default_voting_period_secs() -> u64 {
    60
}
fn default_block_time_secs() -> u64 {
    5
}
fn default_settle_delay_secs() -> u64 {
    10
}
fn default_resolve_attempts() -> u32 {
    10
}
fn default_resolve_delay_secs() -> u64 {
    3
}

impl Default for GovernanceConfig {
    fn default() -> Self {
        Self {
            deposit: default_deposit(),
            fees: default_fees(),
            upgrade_info: String::new(),
            vote: VoteOption::Yes,
            voting_period_secs: default_voting_period_secs(),
            block_time_secs: default_block_time_secs(),
            settle_delay_secs: default_settle_delay_secs(),
            resolve_attempts: default_resolve_attempts(),
            resolve_delay_secs: default_resolve_delay_secs(),
        }
    }
}

impl GovernanceConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }

    pub fn resolve_delay(&self) -> Duration {
        Duration::from_secs(self.resolve_delay_secs)
    }
}

/// Polling budget of the liveness monitor.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LivenessConfig {
    /// Phase 1 budget: checks allowed before the target height.
    #[serde(default = "default_max_height_checks")]
    pub max_height_checks: u32,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    /// Phase 2 budget: samples allowed to observe progress after the target.
    #[serde(default = "default_post_reach_samples")]
    pub post_reach_samples: u32,
    /// Failed samples in a row before the monitor gives up on observing the node.
    #[serde(default = "default_max_consecutive_errors")]
    pub max_consecutive_errors: u32,
    /// Samples taken by the final post-sequence liveness check.
    #[serde(default = "default_final_check_samples")]
    pub final_check_samples: u32,
}

fn default_max_height_checks() -> u32 {
    200
}
fn default_check_interval_secs() -> u64 {
    3
}
fn default_post_reach_samples() -> u32 {
    50
}
fn default_max_consecutive_errors() -> u32 {
    5
}
fn default_final_check_samples() -> u32 {
    1
}

impl Default for LivenessConfig {
    fn default() -> Self {
        Self {
            max_height_checks: default_max_height_checks(),
            check_interval_secs: default_check_interval_secs(),
            post_reach_samples: default_post_reach_samples(),
            max_consecutive_errors: default_max_consecutive_errors(),
            final_check_samples: default_final_check_samples(),
        }
    }
}

impl LivenessConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }
}

/// The upgrade sequence to walk.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SequenceConfig {
    #[serde(default = "default_manifest_path")]
    pub manifest_path: PathBuf,
    /// Pause between voting and starting to wait for the upgrade height.
    #[serde(default = "default_inter_upgrade_delay_secs")]
    pub inter_upgrade_delay_secs: u64,
    /// Overrides the manifest's end version.
    #[serde(default)]
    pub end_version: Option<String>,
}

fn default_manifest_path() -> PathBuf {
    PathBuf::from("upgrades.json")
}
fn default_inter_upgrade_delay_secs() -> u64 {
    30
}

impl Default for SequenceConfig {
    fn default() -> Self {
        Self {
            manifest_path: default_manifest_path(),
            inter_upgrade_delay_secs: default_inter_upgrade_delay_secs(),
            end_version: None,
        }
    }
}

impl SequenceConfig {
    pub fn inter_upgrade_delay(&self) -> Duration {
        Duration::from_secs(self.inter_upgrade_delay_secs)
    }
}

/// Release promotion and binary download settings.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ReleaseConfig {
    #[serde(default = "default_release_api_url")]
    pub api_url: String,
    #[serde(default)]
    pub owner: String,
    #[serde(default)]
    pub repo: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
    /// Proposals submitted longer ago than this are ignored.
    #[serde(default = "default_max_proposal_age_days")]
    pub max_proposal_age_days: i64,
    /// Phase 1 budget used while waiting for a proposal's height.
    #[serde(default = "default_release_max_height_checks")]
    pub max_height_checks: u32,
    #[serde(default = "default_check_interval_secs")]
    pub check_interval_secs: u64,
    #[serde(default = "default_upgrades_dir")]
    pub upgrades_dir: PathBuf,
    /// File name given to downloaded binaries.
    #[serde(default = "default_binary")]
    pub daemon_name: String,
}

fn default_release_api_url() -> String {
    "https://api.github.com".to_string()
}
fn default_max_proposal_age_days() -> i64 {
    7
}
fn default_release_max_height_checks() -> u32 {
    100
}
fn default_upgrades_dir() -> PathBuf {
    PathBuf::from("upgrades")
}

impl Default for ReleaseConfig {
    fn default() -> Self {
        Self {
            api_url: default_release_api_url(),
            owner: String::new(),
            repo: String::new(),
            token: None,
            max_proposal_age_days: default_max_proposal_age_days(),
            max_height_checks: default_release_max_height_checks(),
            check_interval_secs: default_check_interval_secs(),
            upgrades_dir: default_upgrades_dir(),
            daemon_name: default_binary(),
        }
    }
}

impl ReleaseConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs)
    }

    pub fn max_proposal_age(&self) -> time::Duration {
        time::Duration::days(self.max_proposal_age_days)
    }
}

/// The containerized node started for an upgrade run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ContainerConfig {
    /// When false, the run targets an already-running node.
    #[serde(default)]
    pub enabled: bool,
    #[serde(default = "default_image")]
    pub image: String,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default = "default_rpc_port")]
    pub rpc_port: u16,
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// Time given to the node to start producing blocks before the sequence begins.
    #[serde(default = "default_startup_grace_secs")]
    pub startup_grace_secs: u64,
}

fn default_image() -> String {
    "local/upgrade-test:latest".to_string()
}
fn default_rpc_port() -> u16 {
    26657
}
fn default_startup_grace_secs() -> u64 {
    120
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            image: default_image(),
            name: None,
            rpc_port: default_rpc_port(),
            env: BTreeMap::new(),
            startup_grace_secs: default_startup_grace_secs(),
        }
    }
}

impl ContainerConfig {
    pub fn startup_grace(&self) -> Duration {
        Duration::from_secs(self.startup_grace_secs)
    }
}

/// How `start-node` launches the daemon.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DaemonConfig {
    #[serde(default = "default_daemon_program")]
    pub program: String,
    #[serde(default = "default_rpc_laddr")]
    pub rpc_laddr: String,
    #[serde(default = "default_gas_prices")]
    pub minimum_gas_prices: String,
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_daemon_program() -> String {
    "cosmovisor".to_string()
}
fn default_rpc_laddr() -> String {
    "tcp://0.0.0.0:26657".to_string()
}
fn default_gas_prices() -> String {
    "0stake".to_string()
}

impl Default for DaemonConfig {
    fn default() -> Self {
        Self {
            program: default_daemon_program(),
            rpc_laddr: default_rpc_laddr(),
            minimum_gas_prices: default_gas_prices(),
            extra_args: Vec::new(),
        }
    }
}

impl HarnessConfig {
    /// Loads `path` if it exists (defaults otherwise) and applies process environment overrides.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let mut cfg = if path.exists() {
            let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
                path: path.display().to_string(),
                source,
            })?;
            toml::from_str(&raw).map_err(|e| ConfigError::Parse {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?
        } else {
            Self::default()
        };
        cfg.apply_env(|key| std::env::var(key).ok())?;
        Ok(cfg)
    }

    pub fn to_toml(&self) -> Result<String, ConfigError> {
        toml::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: "<generated>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Applies environment overrides read through `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        fn parsed<T: FromStr>(key: &'static str, value: String) -> Result<T, ConfigError> {
            value
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidEnv { key, value })
        }

        if let Some(v) = lookup("NODE_RPC_URL") {
            self.node.rpc_url = v;
        }
        if let Some(v) = lookup("NODE_API_URL") {
            self.node.api_url = v;
        }
        if let Some(v) = lookup("CHAIN_ID") {
            self.node.chain_id = v;
        }
        if let Some(v) = lookup("MONIKER") {
            self.node.moniker = v;
        }
        if let Some(v) = lookup("KEYRING_BACKEND") {
            self.node.keyring_backend = v;
        }
        if let Some(v) = lookup("NODE_BINARY") {
            self.node.binary = v;
        }
        if let Some(v) = lookup("MNEMONIC") {
            self.node.mnemonic = Some(v);
        }
        if let Some(v) = lookup("MAX_HEIGHT_CHECKS") {
            self.liveness.max_height_checks = parsed("MAX_HEIGHT_CHECKS", v)?;
        }
        if let Some(v) = lookup("CHECK_INTERVAL_SECS") {
            self.liveness.check_interval_secs = parsed("CHECK_INTERVAL_SECS", v)?;
        }
        if let Some(v) = lookup("POST_REACH_SAMPLES") {
            self.liveness.post_reach_samples = parsed("POST_REACH_SAMPLES", v)?;
        }
        if let Some(v) = lookup("DEPOSIT") {
            self.governance.deposit = v;
        }
        if let Some(v) = lookup("FEES") {
            self.governance.fees = v;
        }
        if let Some(v) = lookup("UPGRADE_INFO") {
            self.governance.upgrade_info = v;
        }
        if let Some(v) = lookup("VOTING_PERIOD_SECS") {
            self.governance.voting_period_secs = parsed("VOTING_PERIOD_SECS", v)?;
        }
        if let Some(v) = lookup("BLOCK_TIME_SECS") {
            self.governance.block_time_secs = parsed("BLOCK_TIME_SECS", v)?;
        }
        if let Some(v) = lookup("END_VERSION") {
            self.sequence.end_version = Some(v);
        }
        if let Some(v) = lookup("GITHUB_OWNER") {
            self.release.owner = v;
        }
        if let Some(v) = lookup("GITHUB_REPO") {
            self.release.repo = v;
        }
        if let Some(v) = lookup("GITHUB_TOKEN") {
            self.release.token = Some(v);
        }
        Ok(())
    }
}
