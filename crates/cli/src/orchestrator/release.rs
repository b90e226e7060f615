// Path: crates/cli/src/orchestrator/release.rs

//! Release publication: promotes pre-releases whose upgrade proposal passed and
//! whose chain kept producing blocks after the upgrade height, and fetches
//! release binaries named by the upgrade manifest.

use super::liveness::LivenessMonitor;
use async_trait::async_trait;
use forklift_client::ChainQuery;
use forklift_types::app::{MonitorOutcome, UpgradePlan};
use forklift_types::config::ReleaseConfig;
use forklift_types::error::ReleaseError;
use forklift_types::manifest::UpgradeManifest;
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, AUTHORIZATION, USER_AGENT};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;
use std::path::{Path, PathBuf};
use time::OffsetDateTime;

const GITHUB_API_VERSION: &str = "2022-11-28";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ReleaseAsset {
    pub id: u64,
    pub name: String,
    /// API URL; downloading it with `Accept: application/octet-stream` yields the bytes.
    pub url: String,
    #[serde(default)]
    pub browser_download_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Release {
    pub id: u64,
    #[serde(default)]
    pub name: Option<String>,
    pub tag_name: String,
    #[serde(default)]
    pub prerelease: bool,
    #[serde(default)]
    pub assets: Vec<ReleaseAsset>,
}

impl Release {
    /// True if the release title, or its tag when untitled, equals `title`.
    pub fn matches_title(&self, title: &str) -> bool {
        match self.name.as_deref().filter(|n| !n.is_empty()) {
            Some(name) => name == title,
            None => self.tag_name == title,
        }
    }

    pub fn find_asset(&self, name: &str) -> Option<&ReleaseAsset> {
        self.assets
            .iter()
            .find(|a| a.name.eq_ignore_ascii_case(name))
    }
}

#[async_trait]
pub trait ReleaseApi: Send + Sync {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError>;
    async fn set_prerelease(&self, release_id: u64, prerelease: bool) -> Result<(), ReleaseError>;
    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>, ReleaseError>;
}

/// [`ReleaseApi`] over the GitHub REST v3 API.
pub struct GithubReleases {
    client: Client,
    base: String,
}

impl GithubReleases {
    pub fn new(cfg: &ReleaseConfig) -> Result<Self, ReleaseError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static("forklift"));
        headers.insert(
            "X-GitHub-Api-Version",
            HeaderValue::from_static(GITHUB_API_VERSION),
        );
        if let Some(token) = cfg.token.as_deref().filter(|t| !t.is_empty()) {
            let value = HeaderValue::from_str(&format!("Bearer {}", token))
                .map_err(|e| ReleaseError::Transport(format!("invalid token: {}", e)))?;
            headers.insert(AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .build()
            .map_err(|e| ReleaseError::Transport(e.to_string()))?;
        Ok(Self {
            client,
            base: format!(
                "{}/repos/{}/{}",
                cfg.api_url.trim_end_matches('/'),
                cfg.owner,
                cfg.repo
            ),
        })
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, ReleaseError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ReleaseError::Api {
            status: status.as_u16(),
            body,
        })
    }
}

fn transport(e: reqwest::Error) -> ReleaseError {
    ReleaseError::Transport(e.to_string())
}

#[async_trait]
impl ReleaseApi for GithubReleases {
    async fn list_releases(&self) -> Result<Vec<Release>, ReleaseError> {
        let response = self
            .client
            .get(format!("{}/releases", self.base))
            .header(ACCEPT, "application/vnd.github+json")
            .send()
            .await
            .map_err(transport)?;
        Self::check(response)
            .await?
            .json::<Vec<Release>>()
            .await
            .map_err(transport)
    }

    async fn set_prerelease(&self, release_id: u64, prerelease: bool) -> Result<(), ReleaseError> {
        let response = self
            .client
            .patch(format!("{}/releases/{}", self.base, release_id))
            .header(ACCEPT, "application/vnd.github+json")
            .json(&json!({ "prerelease": prerelease }))
            .send()
            .await
            .map_err(transport)?;
        Self::check(response).await.map(|_| ())
    }

    async fn download_asset(&self, asset: &ReleaseAsset) -> Result<Vec<u8>, ReleaseError> {
        let response = self
            .client
            .get(&asset.url)
            .header(ACCEPT, "application/octet-stream")
            .send()
            .await
            .map_err(transport)?;
        let bytes = Self::check(response)
            .await?
            .bytes()
            .await
            .map_err(transport)?;
        Ok(bytes.to_vec())
    }
}

/// Result of one promotion attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Promotion {
    Promoted,
    AlreadyPublished,
    NotFound,
}

/// Flips the matching pre-release to published.
pub async fn promote_release(api: &dyn ReleaseApi, title: &str) -> Result<Promotion, ReleaseError> {
    let releases = api.list_releases().await?;
    let matching: Vec<&Release> = releases.iter().filter(|r| r.matches_title(title)).collect();

    if let Some(release) = matching.iter().find(|r| r.prerelease) {
        api.set_prerelease(release.id, false).await?;
        tracing::info!(target: "release", title, release_id = release.id, "Pre-release promoted");
        return Ok(Promotion::Promoted);
    }
    if matching.is_empty() {
        tracing::warn!(target: "release", title, "No release matches; nothing to promote");
        Ok(Promotion::NotFound)
    } else {
        tracing::info!(target: "release", title, "Release already published");
        Ok(Promotion::AlreadyPublished)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PromotionReport {
    /// Titles of releases flipped to published.
    pub promoted: Vec<String>,
    pub already_published: Vec<String>,
    /// Qualifying proposals with no matching release.
    pub not_found: Vec<String>,
    /// Qualifying proposals whose chain did not (yet) prove live past the target.
    pub pending: Vec<String>,
}

impl PromotionReport {
    pub fn candidates(&self) -> usize {
        self.promoted.len() + self.already_published.len() + self.not_found.len() + self.pending.len()
    }
}

pub struct ReleaseWatcher<'a> {
    chain: &'a dyn ChainQuery,
    monitor: LivenessMonitor<'a>,
    releases: &'a dyn ReleaseApi,
    max_age: time::Duration,
}

impl<'a> ReleaseWatcher<'a> {
    pub fn new(
        chain: &'a dyn ChainQuery,
        monitor: LivenessMonitor<'a>,
        releases: &'a dyn ReleaseApi,
        max_age: time::Duration,
    ) -> Self {
        Self {
            chain,
            monitor,
            releases,
            max_age,
        }
    }

    /// Passed, recent software-upgrade proposals as `(proposal id, plan)`,
    /// oldest proposal first.
    ///
    /// A proposal whose detail cannot be fetched is skipped.
    pub async fn candidates(
        &self,
        now: OffsetDateTime,
    ) -> Result<Vec<(String, UpgradePlan)>, ReleaseError> {
        let mut plans = Vec::new();
        for id in self.chain.list_proposals().await? {
            let proposal = match self.chain.proposal(&id).await {
                Ok(p) => p,
                Err(e) => {
                    tracing::warn!(target: "release", proposal_id = %id, error = %e, "Skipping unreadable proposal");
                    continue;
                }
            };
            if proposal.is_older_than(now, self.max_age) {
                tracing::debug!(target: "release", proposal_id = %id, "Proposal too old");
                continue;
            }
            if !proposal.status.is_passed() {
                tracing::debug!(target: "release", proposal_id = %id, status = %proposal.status, "Proposal not passed");
                continue;
            }
            match proposal.upgrade_plan() {
                Some(plan) => {
                    plans.push((proposal.id.clone(), plan));
                }
                None => {
                    tracing::debug!(target: "release", proposal_id = %id, "No upgrade plan");
                }
            }
        }
        plans.sort_by_cached_key(|(id, _)| (id.parse::<u64>().ok(), id.clone()));
        Ok(plans)
    }

    /// Promotes every candidate whose chain has been shown live past its target.
    pub async fn run(&self, now: OffsetDateTime) -> Result<PromotionReport, ReleaseError> {
        let current = self.chain.latest_height().await?;
        let plans = self.candidates(now).await?;
        tracing::info!(target: "release", current, candidates = plans.len(), "Evaluating upgrade proposals");

        let mut report = PromotionReport::default();
        for (proposal_id, plan) in plans {
            let live = if current >= plan.target_height {
                true
            } else {
                match self.monitor.wait_for_upgrade(plan.target_height).await {
                    Ok(MonitorOutcome::Live { .. }) => true,
                    Ok(outcome) => {
                        tracing::warn!(
                            target: "release",
                            proposal_id = %proposal_id,
                            version = %plan.version_title,
                            ?outcome,
                            "Upgrade not confirmed; leaving release unpromoted"
                        );
                        false
                    }
                    Err(e) => {
                        tracing::warn!(
                            target: "release",
                            proposal_id = %proposal_id,
                            version = %plan.version_title,
                            error = %e,
                            "Liveness could not be observed; leaving release unpromoted"
                        );
                        false
                    }
                }
            };

            if !live {
                report.pending.push(plan.version_title);
                continue;
            }
            match promote_release(self.releases, &plan.version_title).await? {
                Promotion::Promoted => report.promoted.push(plan.version_title),
                Promotion::AlreadyPublished => report.already_published.push(plan.version_title),
                Promotion::NotFound => report.not_found.push(plan.version_title),
            }
        }
        Ok(report)
    }
}

/// Directory name for a release tag: `v.1.2` style tags are normalized to `v1.2`.
pub fn version_dir_name(tag: &str) -> String {
    tag.replace("v.", "v")
}

/// Downloads every manifest binary not yet fetched into
/// `<upgrades_dir>/<tag>/bin/<daemon_name>` and records it in the manifest.
pub async fn fetch_binaries(
    api: &dyn ReleaseApi,
    manifest: &mut UpgradeManifest,
    manifest_path: &Path,
    upgrades_dir: &Path,
    daemon_name: &str,
) -> Result<Vec<PathBuf>, ReleaseError> {
    let pending = manifest.pending_binaries();
    if pending.is_empty() {
        tracing::info!(target: "release", "All binaries already fetched");
        return Ok(Vec::new());
    }
    let releases = api.list_releases().await?;
    let mut written = Vec::new();

    for binary in pending {
        let (release, asset) = releases
            .iter()
            .filter(|r| r.tag_name.contains(&binary.tag))
            .find_map(|r| r.find_asset(&binary.asset).map(|a| (r, a)))
            .ok_or_else(|| ReleaseError::AssetNotFound {
                tag: binary.tag.clone(),
                asset: binary.asset.clone(),
            })?;

        let bytes = api.download_asset(asset).await?;
        let bin_dir = upgrades_dir
            .join(version_dir_name(&release.tag_name))
            .join("bin");
        tokio::fs::create_dir_all(&bin_dir).await?;
        let target = bin_dir.join(daemon_name);
        tokio::fs::write(&target, &bytes).await?;
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            tokio::fs::set_permissions(&target, std::fs::Permissions::from_mode(0o755)).await?;
        }

        tracing::info!(
            target: "release",
            tag = %release.tag_name,
            asset = %asset.name,
            bytes = bytes.len(),
            path = %target.display(),
            "Binary fetched"
        );
        manifest.mark_fetched(&binary.tag);
        manifest.save(manifest_path)?;
        written.push(target);
    }
    Ok(written)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn release(name: Option<&str>, tag: &str) -> Release {
        Release {
            id: 1,
            name: name.map(String::from),
            tag_name: tag.into(),
            prerelease: true,
            assets: vec![ReleaseAsset {
                id: 9,
                name: "simd-Linux-amd64".into(),
                url: "https://api/asset/9".into(),
                browser_download_url: String::new(),
            }],
        }
    }

    #[test]
    fn test_release_title_falls_back_to_tag() {
        assert!(release(Some("v2.0.0"), "v2.0.0-rc1").matches_title("v2.0.0"));
        assert!(!release(Some("v2.0.0"), "v2.0.0").matches_title("v2.0"));
        assert!(release(None, "v3.0.0").matches_title("v3.0.0"));
        assert!(release(Some(""), "v3.0.0").matches_title("v3.0.0"));
    }

    #[test]
    fn test_asset_lookup_is_case_insensitive() {
        let r = release(None, "v1");
        assert_eq!(r.find_asset("SIMD-linux-AMD64").map(|a| a.id), Some(9));
        assert!(r.find_asset("simd-darwin").is_none());
    }

    #[test]
    fn test_version_dir_name() {
        assert_eq!(version_dir_name("v.12.0.0"), "v12.0.0");
        assert_eq!(version_dir_name("v12.0.0"), "v12.0.0");
    }

    #[test]
    fn test_release_deserializes_github_shape() {
        let body = r#"[{"id":42,"name":null,"tag_name":"v1.0.0","prerelease":true,
            "assets":[{"id":1,"name":"simd","url":"https://x/1","browser_download_url":"https://y/1","size":3}],
            "draft":false}]"#;
        let releases: Vec<Release> = serde_json::from_str(body).unwrap();
        assert_eq!(releases[0].id, 42);
        assert!(releases[0].matches_title("v1.0.0"));
    }
}
