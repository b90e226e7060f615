// Path: crates/cli/src/orchestrator/mod.rs

//! The upgrade-test orchestrator: node CLI invocation, governance, liveness
//! monitoring, the version sequencer, the upgrade run and release promotion.

pub mod backend;
pub mod exec;
pub mod governance;
pub mod liveness;
pub mod release;
pub mod run;
pub mod sequencer;
pub mod session;
pub mod shutdown;

pub use backend::{DockerNode, ExternalNode, NodeBackend};
pub use exec::{CommandOutput, CommandRunner, ProcessRunner};
pub use governance::{parse_tx_result, plan_upgrade_height, ProposalDriver, TxResult, UpgradeProposal};
pub use liveness::{LivenessMonitor, LivenessParams};
pub use release::{
    fetch_binaries, promote_release, GithubReleases, Promotion, PromotionReport, Release,
    ReleaseApi, ReleaseAsset, ReleaseWatcher,
};
pub use run::{failure_code, run_upgrade};
pub use sequencer::{
    SequenceReport, SequencerParams, SequencerState, UpgradeSequencer, VersionOutcome,
};
pub use session::Session;
