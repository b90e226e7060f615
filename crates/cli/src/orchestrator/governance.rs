// Path: crates/cli/src/orchestrator/governance.rs

//! Governance actions driven through the node CLI, and proposal-id resolution
//! through the read-only client.
//!
//! None of these actions are idempotent. The sequencer invokes each at most
//! once per version.

use super::exec::{display_command, ensure_success, CommandRunner};
use super::session::Session;
use forklift_client::ChainQuery;
use forklift_types::app::{Proposal, VoteOption};
use forklift_types::error::GovernanceError;
use serde::Deserialize;
use std::time::Duration;
use tokio::time::sleep;

/// Result of a broadcast transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TxResult {
    pub tx_hash: String,
    pub code: u32,
    pub raw_log: String,
}

#[derive(Deserialize)]
struct TxResponse {
    #[serde(default)]
    txhash: String,
    #[serde(default)]
    code: u32,
    #[serde(default)]
    raw_log: String,
}

/// Extracts the transaction result from node CLI output.
///
/// JSON (`--output json`) is tried first, on the whole output and then on the
/// first line that opens an object. Otherwise the output is scanned for a
/// `txhash:` key. A JSON result with a non-zero `code` is a tool failure.
pub fn parse_tx_result(command: &str, stdout: &str) -> Result<TxResult, GovernanceError> {
    let json = serde_json::from_str::<TxResponse>(stdout.trim()).ok().or_else(|| {
        stdout
            .lines()
            .map(str::trim)
            .filter(|l| l.starts_with('{'))
            .find_map(|l| serde_json::from_str::<TxResponse>(l).ok())
    });

    if let Some(tx) = json {
        if tx.code != 0 {
            return Err(GovernanceError::ExternalToolFailure {
                command: command.to_string(),
                code: Some(tx.code as i32),
                stderr: tx.raw_log,
            });
        }
        if tx.txhash.is_empty() {
            return Err(GovernanceError::TxHashMissing(stdout.trim().to_string()));
        }
        return Ok(TxResult {
            tx_hash: tx.txhash,
            code: tx.code,
            raw_log: tx.raw_log,
        });
    }

    stdout
        .lines()
        .find_map(|line| {
            let (_, rest) = line.split_once("txhash:")?;
            let hash = rest.trim().trim_matches('"');
            (!hash.is_empty()).then(|| hash.to_string())
        })
        .map(|tx_hash| TxResult {
            tx_hash,
            code: 0,
            raw_log: String::new(),
        })
        .ok_or_else(|| GovernanceError::TxHashMissing(stdout.trim().to_string()))
}

/// Schedules an upgrade one voting period ahead of `current`.
pub fn plan_upgrade_height(current: u64, voting_period_secs: u64, block_time_secs: u64) -> u64 {
    current + voting_period_secs / block_time_secs.max(1)
}

/// Parameters of one software-upgrade proposal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UpgradeProposal {
    pub version: String,
    pub upgrade_height: u64,
    pub upgrade_info: String,
    pub deposit: String,
    pub fees: String,
}

impl UpgradeProposal {
    fn to_args(&self, session: &Session) -> Vec<String> {
        let mut args: Vec<String> = [
            "tx",
            "gov",
            "submit-legacy-proposal",
            "software-upgrade",
        ]
        .iter()
        .map(|s| s.to_string())
        .collect();
        args.push(self.version.clone());
        args.extend([
            "--from".to_string(),
            session.key_name.clone(),
            "--deposit".to_string(),
            self.deposit.clone(),
            "--upgrade-height".to_string(),
            self.upgrade_height.to_string(),
            "--upgrade-info".to_string(),
            self.upgrade_info.clone(),
            "--title".to_string(),
            self.version.clone(),
            "--description".to_string(),
            format!("Release {}", self.version),
            "--chain-id".to_string(),
            session.chain_id.clone(),
            "--node".to_string(),
            session.node_rpc.clone(),
            "--keyring-backend".to_string(),
            session.keyring_backend.clone(),
            "--fees".to_string(),
            self.fees.clone(),
            "-y".to_string(),
            "--no-validate".to_string(),
            "--output".to_string(),
            "json".to_string(),
        ]);
        args
    }
}

#[derive(Deserialize)]
struct KeyInfo {
    #[serde(default)]
    address: String,
}

pub struct ProposalDriver<'a> {
    runner: &'a dyn CommandRunner,
    chain: &'a dyn ChainQuery,
    binary: String,
    resolve_attempts: u32,
    resolve_delay: Duration,
}

impl<'a> ProposalDriver<'a> {
    pub fn new(
        runner: &'a dyn CommandRunner,
        chain: &'a dyn ChainQuery,
        binary: impl Into<String>,
        resolve_attempts: u32,
        resolve_delay: Duration,
    ) -> Self {
        Self {
            runner,
            chain,
            binary: binary.into(),
            resolve_attempts: resolve_attempts.max(1),
            resolve_delay,
        }
    }

    async fn broadcast(&self, args: Vec<String>) -> Result<TxResult, GovernanceError> {
        let output = self.runner.run(&self.binary, &args, None).await?;
        let output = ensure_success(&self.binary, &args, output)?;
        parse_tx_result(&display_command(&self.binary, &args), &output.stdout)
    }

    /// Broadcasts a legacy software-upgrade proposal and returns its tx hash.
    pub async fn submit_upgrade_proposal(
        &self,
        session: &Session,
        proposal: &UpgradeProposal,
    ) -> Result<String, GovernanceError> {
        let tx = self.broadcast(proposal.to_args(session)).await?;
        tracing::info!(
            target: "governance",
            version = %proposal.version,
            upgrade_height = proposal.upgrade_height,
            tx_hash = %tx.tx_hash,
            "Upgrade proposal submitted"
        );
        Ok(tx.tx_hash)
    }

    /// Finds the newest proposal whose version title or plan name equals `title`.
    pub async fn resolve_proposal_id(&self, title: &str) -> Result<String, GovernanceError> {
        for attempt in 1..=self.resolve_attempts {
            match self.find_newest_matching(title).await {
                Ok(Some(p)) => {
                    tracing::info!(
                        target: "governance",
                        title,
                        proposal_id = %p.id,
                        status = %p.status,
                        attempt,
                        "Resolved proposal id"
                    );
                    return Ok(p.id);
                }
                Ok(None) => {
                    tracing::debug!(target: "governance", title, attempt, "Proposal not listed yet");
                }
                Err(e) => {
                    tracing::warn!(target: "governance", title, attempt, error = %e, "Proposal lookup failed");
                }
            }
            if attempt < self.resolve_attempts {
                sleep(self.resolve_delay).await;
            }
        }
        Err(GovernanceError::ProposalNotFound {
            title: title.to_string(),
            attempts: self.resolve_attempts,
        })
    }

    async fn find_newest_matching(&self, title: &str) -> Result<Option<Proposal>, GovernanceError> {
        let mut best: Option<Proposal> = None;
        for id in self.chain.list_proposals().await? {
            let proposal = match self.chain.proposal(&id).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::debug!(target: "governance", proposal_id = %id, error = %e, "Skipping proposal");
                    continue;
                }
            };
            if !proposal.matches_title(title) {
                continue;
            }
            let newer = match &best {
                None => true,
                Some(b) => {
                    (proposal.submit_time, proposal.numeric_id())
                        > (b.submit_time, b.numeric_id())
                }
            };
            if newer {
                best = Some(proposal);
            }
        }
        Ok(best)
    }

    pub async fn submit_vote(
        &self,
        session: &Session,
        proposal_id: &str,
        choice: VoteOption,
        fees: &str,
    ) -> Result<String, GovernanceError> {
        let mut args = vec![
            "tx".to_string(),
            "gov".to_string(),
            "vote".to_string(),
            proposal_id.to_string(),
            choice.as_cli_arg().to_string(),
        ];
        args.extend(session.tx_flags());
        args.extend([
            "--fees".to_string(),
            fees.to_string(),
            "-y".to_string(),
            "--output".to_string(),
            "json".to_string(),
        ]);
        let tx = self.broadcast(args).await?;
        tracing::info!(
            target: "governance",
            proposal_id,
            vote = choice.as_cli_arg(),
            tx_hash = %tx.tx_hash,
            "Vote submitted"
        );
        Ok(tx.tx_hash)
    }

    /// Replaces the session's signing key with one recovered from `mnemonic`.
    pub async fn recover_key(
        &self,
        session: &mut Session,
        mnemonic: &str,
    ) -> Result<String, GovernanceError> {
        let delete = vec![
            "keys".to_string(),
            "delete".to_string(),
            session.key_name.clone(),
            "--keyring-backend".to_string(),
            session.keyring_backend.clone(),
            "-y".to_string(),
        ];
        let out = self.runner.run(&self.binary, &delete, None).await?;
        if !out.success() {
            tracing::debug!(target: "governance", key = %session.key_name, "No existing key to delete");
        }

        let add = vec![
            "keys".to_string(),
            "add".to_string(),
            session.key_name.clone(),
            "--recover".to_string(),
            "--keyring-backend".to_string(),
            session.keyring_backend.clone(),
            "--output".to_string(),
            "json".to_string(),
        ];
        let out = self.runner.run(&self.binary, &add, Some(mnemonic)).await?;
        let out = ensure_success(&self.binary, &add, out)?;

        // Some versions print the key info on stderr.
        let address = [out.stdout.as_str(), out.stderr.as_str()]
            .iter()
            .flat_map(|s| s.lines())
            .map(str::trim)
            .filter(|l| l.starts_with('{'))
            .find_map(|l| serde_json::from_str::<KeyInfo>(l).ok())
            .map(|k| k.address)
            .filter(|a| !a.is_empty())
            .ok_or_else(|| GovernanceError::KeyAddressMissing(session.key_name.clone()))?;

        tracing::info!(target: "governance", key = %session.key_name, %address, "Key recovered");
        session.address = Some(address.clone());
        Ok(address)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_tx_result_json() {
        let out = r#"{"height":"0","txhash":"ABC123","code":0,"raw_log":"[]"}"#;
        let tx = parse_tx_result("simd tx", out).unwrap();
        assert_eq!(tx.tx_hash, "ABC123");
    }

    #[test]
    fn test_parse_tx_result_json_after_gas_estimate() {
        let out = "gas estimate: 215000\n{\"txhash\":\"DEF456\",\"code\":0}\n";
        assert_eq!(parse_tx_result("simd tx", out).unwrap().tx_hash, "DEF456");
    }

    #[test]
    fn test_parse_tx_result_nonzero_code() {
        let out = r#"{"txhash":"ABC","code":5,"raw_log":"insufficient funds"}"#;
        match parse_tx_result("simd tx", out) {
            Err(GovernanceError::ExternalToolFailure { code, stderr, .. }) => {
                assert_eq!(code, Some(5));
                assert_eq!(stderr, "insufficient funds");
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_parse_tx_result_legacy_text() {
        let out = "code: 0\ncodespace: \"\"\ndata: \"\"\nevents: []\ngas_used: \"0\"\n\
                   gas_wanted: \"0\"\nheight: \"0\"\ninfo: \"\"\nlogs: []\nraw_log: '[]'\n\
                   timestamp: \"\"\ntxhash: 9F3C0D\n";
        assert_eq!(parse_tx_result("simd tx", out).unwrap().tx_hash, "9F3C0D");
    }

    #[test]
    fn test_parse_tx_result_missing_hash() {
        assert!(matches!(
            parse_tx_result("simd tx", "Error: nothing here"),
            Err(GovernanceError::TxHashMissing(_))
        ));
    }

    #[test]
    fn test_plan_upgrade_height() {
        assert_eq!(plan_upgrade_height(100, 60, 5), 112);
        assert_eq!(plan_upgrade_height(100, 60, 0), 160);
    }

    #[test]
    fn test_proposal_args_shape() {
        let session = Session {
            chain_id: "localnet_1001-1".into(),
            key_name: "validator".into(),
            keyring_backend: "test".into(),
            node_rpc: "http://127.0.0.1:26657".into(),
            address: None,
        };
        let p = UpgradeProposal {
            version: "v2.0.0".into(),
            upgrade_height: 120,
            upgrade_info: "{}".into(),
            deposit: "10stake".into(),
            fees: "2stake".into(),
        };
        let args = p.to_args(&session);
        assert_eq!(&args[..5], ["tx", "gov", "submit-legacy-proposal", "software-upgrade", "v2.0.0"]);
        let pos = args.iter().position(|a| a == "--description").unwrap();
        assert_eq!(args[pos + 1], "Release v2.0.0");
        assert!(args.ends_with(&["--output".to_string(), "json".to_string()]));
    }
}
