// Path: crates/cli/src/orchestrator/session.rs

use forklift_types::config::NodeConfig;

/// Identity and addressing for one run, passed explicitly to every governance call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub chain_id: String,
    /// Name of the signing key in the node keyring.
    pub key_name: String,
    pub keyring_backend: String,
    /// RPC endpoint handed to the node CLI via `--node`.
    pub node_rpc: String,
    /// Bech32 address of the signing key, once known.
    pub address: Option<String>,
}

impl Session {
    pub fn from_config(node: &NodeConfig) -> Self {
        Self {
            chain_id: node.chain_id.clone(),
            key_name: node.moniker.clone(),
            keyring_backend: node.keyring_backend.clone(),
            node_rpc: node.rpc_url.clone(),
            address: None,
        }
    }

    /// Flags shared by every signed transaction.
    pub fn tx_flags(&self) -> Vec<String> {
        vec![
            "--from".into(),
            self.key_name.clone(),
            "--keyring-backend".into(),
            self.keyring_backend.clone(),
            "--chain-id".into(),
            self.chain_id.clone(),
            "--node".into(),
            self.node_rpc.clone(),
        ]
    }
}
