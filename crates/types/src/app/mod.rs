// Path: crates/types/src/app/mod.rs
//! The data model observed from, and derived about, the chain under test.

/// Chain status snapshots and liveness outcomes.
pub mod chain;
/// Governance proposals and upgrade plans.
pub mod governance;
/// Entries of the ordered upgrade sequence.
pub mod sequence;

pub use chain::{ChainStatus, MonitorOutcome};
pub use governance::{
    parse_submit_time, Proposal, ProposalMessage, ProposalStatus, UpgradePlan,
    UpgradePlanMessage, VoteOption,
};
pub use sequence::VersionSequenceEntry;
