// Path: crates/types/src/manifest.rs

use crate::app::VersionSequenceEntry;
use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// A version entry as written in the manifest: a bare version string
/// (consensus-breaking) or an explicitly classified entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VersionSpec {
    Plain(String),
    Classified(VersionSequenceEntry),
}

impl VersionSpec {
    pub fn to_entry(&self) -> VersionSequenceEntry {
        match self {
            Self::Plain(v) => VersionSequenceEntry::breaking(v.clone()),
            Self::Classified(entry) => entry.clone(),
        }
    }
}

/// A release asset that a version needs installed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinaryAsset {
    /// A (sub)string of the release tag that carries the asset.
    pub tag: String,
    /// The asset file name, matched case-insensitively.
    pub asset: String,
    #[serde(default)]
    pub fetched: bool,
}

/// A binary entry as written in the manifest: the legacy `[tag, asset]` pair or a full record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum BinarySpec {
    Pair(String, String),
    Asset(BinaryAsset),
}

impl BinarySpec {
    pub fn to_asset(&self) -> BinaryAsset {
        match self {
            Self::Pair(tag, asset) => BinaryAsset {
                tag: tag.clone(),
                asset: asset.clone(),
                fetched: false,
            },
            Self::Asset(a) => a.clone(),
        }
    }
}

/// The on-disk sequence file (`upgrades.json`).
///
/// Read once at the start of a run. The version order is exactly the stored
/// order; the only thing ever written back is the `fetched` flag of a binary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpgradeManifest {
    pub upgrade_versions: Vec<VersionSpec>,
    #[serde(default)]
    pub binary_versions: Vec<BinarySpec>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_version: Option<String>,
}

impl UpgradeManifest {
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json(&raw).map_err(|reason| ConfigError::Parse {
            path: path.display().to_string(),
            reason,
        })
    }

    pub fn from_json(raw: &str) -> Result<Self, String> {
        serde_json::from_str(raw).map_err(|e| e.to_string())
    }

    /// Writes the manifest back through a temporary file in the same directory.
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        let io_err = |source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        };
        let body = serde_json::to_string_pretty(self).map_err(|e| ConfigError::Parse {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, body).map_err(io_err)?;
        fs::rename(&tmp, path).map_err(io_err)
    }

    /// The version sequence in stored order.
    pub fn sequence(&self) -> Vec<VersionSequenceEntry> {
        self.upgrade_versions.iter().map(VersionSpec::to_entry).collect()
    }

    /// The version the node must report after the whole sequence ran.
    pub fn end_version(&self) -> Option<String> {
        self.end_version
            .clone()
            .or_else(|| self.upgrade_versions.last().map(|v| v.to_entry().version))
    }

    pub fn pending_binaries(&self) -> Vec<BinaryAsset> {
        self.binary_versions
            .iter()
            .map(BinarySpec::to_asset)
            .filter(|a| !a.fetched)
            .collect()
    }

    /// Records that the binary for `tag` is installed. Returns false if no entry has that tag.
    pub fn mark_fetched(&mut self, tag: &str) -> bool {
        let mut found = false;
        for spec in self.binary_versions.iter_mut() {
            let mut asset = spec.to_asset();
            if asset.tag == tag {
                asset.fetched = true;
                *spec = BinarySpec::Asset(asset);
                found = true;
            }
        }
        found
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MANIFEST: &str = r#"{
        "upgrade_versions": ["v10.1.0", {"version": "v10.1.7", "consensus_breaking": false}, "v11.0.0"],
        "binary_versions": [["v10.1.0", "zetacored-linux-amd64"], {"tag": "v11.0.0", "asset": "zetacored-linux-amd64", "fetched": true}]
    }"#;

    #[test]
    fn test_sequence_keeps_stored_order() {
        let m = UpgradeManifest::from_json(MANIFEST).unwrap();
        let versions: Vec<_> = m.sequence().into_iter().map(|e| e.version).collect();
        assert_eq!(versions, vec!["v10.1.0", "v10.1.7", "v11.0.0"]);
    }

    #[test]
    fn test_classification_defaults_to_breaking() {
        let m = UpgradeManifest::from_json(MANIFEST).unwrap();
        let flags: Vec<_> = m
            .sequence()
            .into_iter()
            .map(|e| e.is_consensus_breaking)
            .collect();
        assert_eq!(flags, vec![true, false, true]);

        let explicit = UpgradeManifest::from_json(r#"{"upgrade_versions": [{"version": "v2"}]}"#)
            .unwrap();
        assert!(explicit.sequence()[0].is_consensus_breaking);
    }

    #[test]
    fn test_end_version_defaults_to_last() {
        let mut m = UpgradeManifest::from_json(MANIFEST).unwrap();
        assert_eq!(m.end_version().as_deref(), Some("v11.0.0"));
        m.end_version = Some("v11.0.1".into());
        assert_eq!(m.end_version().as_deref(), Some("v11.0.1"));
    }

    #[test]
    fn test_mark_fetched_persists_and_preserves_order() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("upgrades.json");
        std::fs::write(&path, MANIFEST).unwrap();

        let mut m = UpgradeManifest::load(&path).unwrap();
        assert_eq!(m.pending_binaries().len(), 1);
        assert!(m.mark_fetched("v10.1.0"));
        assert!(!m.mark_fetched("v99"));
        m.save(&path).unwrap();

        let reloaded = UpgradeManifest::load(&path).unwrap();
        assert!(reloaded.pending_binaries().is_empty());
        assert_eq!(reloaded.sequence(), m.sequence());
    }

    #[test]
    fn test_load_reports_path_on_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.json");
        std::fs::write(&path, "{not json").unwrap();
        match UpgradeManifest::load(&path) {
            Err(ConfigError::Parse { path: p, .. }) => assert!(p.ends_with("bad.json")),
            other => panic!("expected parse error, got {:?}", other),
        }
    }
}
