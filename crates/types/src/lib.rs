// Path: crates/types/src/lib.rs
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

//! # forklift Types
//!
//! Core data structures shared by every forklift crate: the chain and
//! governance data model observed over RPC, the upgrade manifest that drives a
//! test run, the harness configuration, and the error taxonomy.
//!
//! This crate performs no I/O beyond reading and writing the manifest and
//! configuration files. Everything that talks to a node lives in
//! `forklift-client` (read-only RPC) or `forklift-cli` (orchestration).

/// Chain status, governance proposals and the values derived from them.
pub mod app;
/// Harness configuration loaded from `forklift.toml` plus environment overrides.
pub mod config;
/// Error types with stable machine-readable codes.
pub mod error;
/// The on-disk upgrade manifest (`upgrades.json`).
pub mod manifest;

pub use app::{
    ChainStatus, MonitorOutcome, Proposal, ProposalMessage, ProposalStatus, UpgradePlan,
    UpgradePlanMessage, VersionSequenceEntry,
};
pub use error::ErrorCode;
