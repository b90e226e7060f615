// Path: crates/cli/src/commands/promote.rs

use anyhow::{bail, Context, Result};
use clap::Parser;
use forklift_client::HttpChainClient;
use forklift_cli::orchestrator::{
    GithubReleases, LivenessMonitor, LivenessParams, PromotionReport, ReleaseWatcher,
};
use forklift_types::config::HarnessConfig;
use time::OffsetDateTime;

#[derive(Parser, Debug)]
pub struct PromoteArgs {
    /// Fail if no passed upgrade proposal qualifies for promotion.
    #[clap(long)]
    pub require_candidates: bool,

    /// Override `release.max_proposal_age_days`.
    #[clap(long)]
    pub max_age_days: Option<i64>,
}

pub async fn run(args: PromoteArgs, mut cfg: HarnessConfig) -> Result<()> {
    if let Some(days) = args.max_age_days {
        cfg.release.max_proposal_age_days = days;
    }
    if cfg.release.owner.is_empty() || cfg.release.repo.is_empty() {
        bail!("release.owner and release.repo must be set (GITHUB_OWNER / GITHUB_REPO)");
    }

    let chain = HttpChainClient::new(
        &cfg.node.rpc_url,
        &cfg.node.api_url,
        cfg.node.request_timeout(),
    )?;
    let releases = GithubReleases::new(&cfg.release)?;
    let monitor = LivenessMonitor::new(
        &chain,
        LivenessParams::for_release(&cfg.liveness, &cfg.release),
    );
    let watcher = ReleaseWatcher::new(&chain, monitor, &releases, cfg.release.max_proposal_age());

    let report = watcher
        .run(OffsetDateTime::now_utc())
        .await
        .context("evaluating releases for promotion")?;
    print_report(&report);

    if args.require_candidates && report.candidates() == 0 {
        bail!("no passed upgrade proposal qualifies for promotion");
    }
    Ok(())
}

fn print_report(report: &PromotionReport) {
    if report.candidates() == 0 {
        println!("No passed upgrade proposals in the promotion window.");
        return;
    }
    let sections: [(&str, &Vec<String>); 4] = [
        ("promoted", &report.promoted),
        ("already published", &report.already_published),
        ("no matching release", &report.not_found),
        ("not confirmed live", &report.pending),
    ];
    for (label, titles) in sections {
        for title in titles {
            println!("  {:<20} {}", label, title);
        }
    }
}
