// Path: crates/cli/src/lib.rs
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

//! # forklift CLI Library
//!
//! Drives a Cosmos-SDK chain through a sequence of governance-gated software
//! upgrades and verifies that it keeps producing blocks after each one.
//!
//! The library composes `forklift-client` (read-only node queries) with the
//! node's own CLI (transaction signing and broadcast). It holds no chain logic
//! of its own: every decision is made from heights, proposal records and
//! version strings the node reports.
//!
//! - `orchestrator`: the liveness monitor, governance driver, upgrade
//!   sequencer, release watcher and node backends.
//! - `logging`: subscriber setup for the `forklift` binary.

pub mod logging;
pub mod orchestrator;

pub use orchestrator::liveness::{LivenessMonitor, LivenessParams};
pub use orchestrator::sequencer::{SequenceReport, UpgradeSequencer};
pub use orchestrator::session::Session;
