// Path: crates/types/src/app/chain.rs

use serde::{Deserialize, Serialize};

/// A read-only snapshot of a node's status. Fetched on demand and never cached across polls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChainStatus {
    /// The height of the latest committed block.
    pub latest_block_height: u64,
    /// Whether the node is still syncing.
    pub catching_up: bool,
    /// The consensus-engine version reported in `node_info`.
    pub node_version: String,
}

/// The result of one liveness-monitor invocation. Consumed immediately by the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MonitorOutcome {
    /// The target height was reached and a later sample showed a higher height.
    Live {
        /// The height that was waited for.
        target_height: u64,
        /// The height observed when the target was first met.
        reached_at: u64,
        /// The first height observed above the previous sample.
        advanced_to: u64,
        /// How many post-reach samples were taken.
        samples: u32,
    },
    /// The target height was reached but no post-reach sample showed progress.
    Stalled {
        /// The height that was waited for.
        target_height: u64,
        /// The height the chain is stuck at.
        height: u64,
        /// How many post-reach samples were taken.
        samples: u32,
    },
    /// The check budget ran out before the target height was reached.
    TimedOut {
        /// The height that was waited for.
        target_height: u64,
        /// The last successfully observed height, if any.
        last_height: Option<u64>,
        /// How many checks were spent.
        checks: u32,
    },
}

impl MonitorOutcome {
    pub fn is_live(&self) -> bool {
        matches!(self, Self::Live { .. })
    }

    pub fn target_height(&self) -> u64 {
        match self {
            Self::Live { target_height, .. }
            | Self::Stalled { target_height, .. }
            | Self::TimedOut { target_height, .. } => *target_height,
        }
    }
}
