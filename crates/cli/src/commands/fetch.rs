// Path: crates/cli/src/commands/fetch.rs

use anyhow::{Context, Result};
use clap::Parser;
use forklift_cli::orchestrator::{fetch_binaries, GithubReleases};
use forklift_types::config::HarnessConfig;
use forklift_types::manifest::UpgradeManifest;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct FetchArgs {
    /// Upgrade manifest. Defaults to `sequence.manifest_path`.
    #[clap(long)]
    pub manifest: Option<PathBuf>,

    /// Destination root. Defaults to `release.upgrades_dir`.
    #[clap(long)]
    pub upgrades_dir: Option<PathBuf>,
}

pub async fn run(args: FetchArgs, cfg: HarnessConfig) -> Result<()> {
    let manifest_path = args
        .manifest
        .unwrap_or_else(|| cfg.sequence.manifest_path.clone());
    let upgrades_dir = args
        .upgrades_dir
        .unwrap_or_else(|| cfg.release.upgrades_dir.clone());
    let mut manifest = UpgradeManifest::load(&manifest_path)?;
    let api = GithubReleases::new(&cfg.release)?;

    let written = fetch_binaries(
        &api,
        &mut manifest,
        &manifest_path,
        &upgrades_dir,
        &cfg.release.daemon_name,
    )
    .await
    .with_context(|| format!("fetching binaries into {}", upgrades_dir.display()))?;

    for path in &written {
        println!("{}", path.display());
    }
    Ok(())
}
