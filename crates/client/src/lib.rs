// Path: crates/client/src/lib.rs
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

//! # forklift Client
//!
//! A read-only view of a running node. Every call issues exactly one HTTP GET
//! and parses exactly one JSON document; there are no retries at this layer.
//! Retry and waiting policy belongs to the callers (the liveness monitor, the
//! proposal resolver), which see failures as typed [`RpcError`]s:
//! `Unreachable` for transport failures and `MalformedResponse` for documents
//! of the wrong shape.

use async_trait::async_trait;
use forklift_types::app::{ChainStatus, Proposal};
use forklift_types::error::RpcError;

pub mod http;
pub mod wire;

pub use http::HttpChainClient;

/// The read-only queries the orchestration layer needs from a node.
#[async_trait]
pub trait ChainQuery: Send + Sync {
    /// Fetches a fresh status snapshot.
    async fn status(&self) -> Result<ChainStatus, RpcError>;

    /// The latest committed block height.
    async fn latest_height(&self) -> Result<u64, RpcError> {
        Ok(self.status().await?.latest_block_height)
    }

    /// The application version the node reports.
    async fn node_version(&self) -> Result<String, RpcError>;

    /// Proposal ids, newest first.
    async fn list_proposals(&self) -> Result<Vec<String>, RpcError>;

    /// Full detail of one proposal.
    async fn proposal(&self, id: &str) -> Result<Proposal, RpcError>;
}
