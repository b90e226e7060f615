// Path: crates/types/src/app/sequence.rs

use serde::{Deserialize, Serialize};

/// One version in the ordered upgrade sequence.
///
/// Classification is an input, never computed: an entry is consensus-breaking
/// unless the manifest explicitly marks it otherwise.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VersionSequenceEntry {
    pub version: String,
    #[serde(rename = "consensus_breaking", default = "default_consensus_breaking")]
    pub is_consensus_breaking: bool,
}

fn default_consensus_breaking() -> bool {
    true
}

impl VersionSequenceEntry {
    pub fn breaking(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            is_consensus_breaking: true,
        }
    }

    pub fn non_breaking(version: impl Into<String>) -> Self {
        Self {
            version: version.into(),
            is_consensus_breaking: false,
        }
    }
}
