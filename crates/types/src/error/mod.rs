// Path: crates/types/src/error/mod.rs
//! Core error types for forklift.

use thiserror::Error;

/// A trait for assigning a stable, machine-readable string code to an error.
pub trait ErrorCode {
    /// Returns the unique, stable string identifier for this error variant.
    fn code(&self) -> &'static str;
}

/// Errors raised by the read-only RPC client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum RpcError {
    /// The endpoint could not be reached or answered with a non-success status.
    #[error("Endpoint {url} unreachable: {reason}")]
    Unreachable {
        /// The URL that was requested.
        url: String,
        /// The transport-level reason.
        reason: String,
    },
    /// The endpoint answered, but the body did not have the expected shape.
    #[error("Malformed response from {url}: {reason}")]
    MalformedResponse {
        /// The URL that was requested.
        url: String,
        /// What was wrong with the document.
        reason: String,
    },
}

impl ErrorCode for RpcError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "RPC_UNREACHABLE",
            Self::MalformedResponse { .. } => "RPC_MALFORMED_RESPONSE",
        }
    }
}

/// Errors raised by the governance proposal driver.
#[derive(Debug, Error)]
pub enum GovernanceError {
    /// An invoked CLI command exited unsuccessfully or reported a failed transaction.
    #[error("External tool failure in `{command}` (exit code {code:?}): {stderr}")]
    ExternalToolFailure {
        /// The command line that was executed.
        command: String,
        /// The exit code, if the process exited normally.
        code: Option<i32>,
        /// The captured error output or the transaction's raw log.
        stderr: String,
    },
    /// The command succeeded but its output carried no transaction hash.
    #[error("No transaction hash found in command output: {0}")]
    TxHashMissing(String),
    /// Proposal ID resolution exhausted its retry bound.
    #[error("Proposal for '{title}' not found after {attempts} attempts")]
    ProposalNotFound {
        /// The version title being resolved.
        title: String,
        /// How many list queries were made.
        attempts: u32,
    },
    /// The key management command produced no address.
    #[error("Key recovery for '{0}' produced no address")]
    KeyAddressMissing(String),
    /// A read-only chain query failed.
    #[error("Chain query failed: {0}")]
    Rpc(#[from] RpcError),
}

impl ErrorCode for GovernanceError {
    fn code(&self) -> &'static str {
        match self {
            Self::ExternalToolFailure { .. } => "GOV_EXTERNAL_TOOL_FAILURE",
            Self::TxHashMissing(_) => "GOV_TX_HASH_MISSING",
            Self::ProposalNotFound { .. } => "GOV_PROPOSAL_NOT_FOUND",
            Self::KeyAddressMissing(_) => "GOV_KEY_ADDRESS_MISSING",
            Self::Rpc(_) => "GOV_RPC_ERROR",
        }
    }
}

/// Errors raised by the liveness monitor itself, as opposed to the outcomes it reports.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LivenessError {
    /// Too many consecutive height samples failed; the node could not be observed.
    #[error("Height unobservable after {consecutive_failures} consecutive failed samples: {last_error}")]
    Unreachable {
        /// How many samples failed in a row.
        consecutive_failures: u32,
        /// The last transport or parse error.
        last_error: RpcError,
    },
}

impl ErrorCode for LivenessError {
    fn code(&self) -> &'static str {
        match self {
            Self::Unreachable { .. } => "LIVENESS_UNREACHABLE",
        }
    }
}

/// Errors raised while talking to the release API.
#[derive(Debug, Error)]
pub enum ReleaseError {
    /// The request could not be sent or the response could not be read.
    #[error("Release API transport error: {0}")]
    Transport(String),
    /// The API answered with a non-success status.
    #[error("Release API returned {status}: {body}")]
    Api {
        /// The HTTP status code.
        status: u16,
        /// The response body, for diagnosis.
        body: String,
    },
    /// A requested asset was not present on any matching release.
    #[error("Asset '{asset}' not found for tag '{tag}'")]
    AssetNotFound {
        /// The release tag searched for.
        tag: String,
        /// The asset name searched for.
        asset: String,
    },
    /// Writing a downloaded asset failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    /// A chain query made on behalf of the watcher failed.
    #[error("Chain query failed: {0}")]
    Chain(#[from] RpcError),
    /// The upgrade manifest could not be read or written.
    #[error("Manifest error: {0}")]
    Manifest(#[from] ConfigError),
}

impl ErrorCode for ReleaseError {
    fn code(&self) -> &'static str {
        match self {
            Self::Transport(_) => "RELEASE_TRANSPORT",
            Self::Api { .. } => "RELEASE_API",
            Self::AssetNotFound { .. } => "RELEASE_ASSET_NOT_FOUND",
            Self::Io(_) => "RELEASE_IO",
            Self::Chain(_) => "RELEASE_CHAIN_QUERY",
            Self::Manifest(_) => "RELEASE_MANIFEST",
        }
    }
}

/// Errors raised while loading configuration or the upgrade manifest.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The file could not be read or written.
    #[error("I/O error on {path}: {source}")]
    Io {
        /// The file involved.
        path: String,
        /// The underlying error.
        #[source]
        source: std::io::Error,
    },
    /// The file could not be parsed.
    #[error("Parse error in {path}: {reason}")]
    Parse {
        /// The file involved.
        path: String,
        /// The parser's message.
        reason: String,
    },
    /// An environment override could not be interpreted.
    #[error("Invalid value for environment variable {key}: '{value}'")]
    InvalidEnv {
        /// The variable name.
        key: &'static str,
        /// The rejected value.
        value: String,
    },
    /// A required value is missing after all sources were applied.
    #[error("Missing required setting: {0}")]
    Missing(&'static str),
}

impl ErrorCode for ConfigError {
    fn code(&self) -> &'static str {
        match self {
            Self::Io { .. } => "CONFIG_IO",
            Self::Parse { .. } => "CONFIG_PARSE",
            Self::InvalidEnv { .. } => "CONFIG_INVALID_ENV",
            Self::Missing(_) => "CONFIG_MISSING",
        }
    }
}

/// Fatal conditions of an upgrade run. Any of these aborts the whole sequence.
#[derive(Debug, Error)]
pub enum UpgradeError {
    /// The chain never reached the upgrade height within the check budget.
    #[error("Timed out before height {target_height} after {checks} checks (last seen: {last_height:?})")]
    LivenessTimeout {
        /// The height that was waited for.
        target_height: u64,
        /// The last successfully observed height, if any.
        last_height: Option<u64>,
        /// How many checks were spent.
        checks: u32,
    },
    /// The chain reached its target but stopped producing blocks.
    #[error("Chain stalled at height {height} across {samples} samples")]
    LivenessStall {
        /// The height at which the chain stopped.
        height: u64,
        /// How many samples showed no progress.
        samples: u32,
    },
    /// The node reports a different version than expected at the end of the sequence.
    #[error("Version mismatch: expected '{expected}', node reports '{actual}'")]
    VersionMismatch {
        /// The version the sequence should have ended on.
        expected: String,
        /// The version the node reports.
        actual: String,
    },
    /// The version sequence is empty or names no end version.
    #[error("Empty upgrade sequence")]
    EmptySequence,
    /// The run was stopped by Ctrl-C or SIGTERM.
    #[error("Upgrade run interrupted")]
    Interrupted,
    /// A governance step failed.
    #[error(transparent)]
    Governance(#[from] GovernanceError),
    /// The liveness monitor could not observe the chain.
    #[error(transparent)]
    Liveness(#[from] LivenessError),
    /// A direct chain query failed.
    #[error(transparent)]
    Rpc(#[from] RpcError),
}

impl ErrorCode for UpgradeError {
    fn code(&self) -> &'static str {
        match self {
            Self::LivenessTimeout { .. } => "UPGRADE_LIVENESS_TIMEOUT",
            Self::LivenessStall { .. } => "UPGRADE_LIVENESS_STALL",
            Self::VersionMismatch { .. } => "UPGRADE_VERSION_MISMATCH",
            Self::EmptySequence => "UPGRADE_EMPTY_SEQUENCE",
            Self::Interrupted => "UPGRADE_INTERRUPTED",
            Self::Governance(e) => e.code(),
            Self::Liveness(e) => e.code(),
            Self::Rpc(e) => e.code(),
        }
    }
}
