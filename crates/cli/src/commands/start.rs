// Path: crates/cli/src/commands/start.rs

use anyhow::Result;
use clap::Parser;
use forklift_types::config::{DaemonConfig, HarnessConfig};
use std::process::Command;

#[derive(Parser, Debug)]
pub struct StartArgs {
    /// Print the command line instead of executing it.
    #[clap(long)]
    pub dry_run: bool,
}

/// `<program> start --rpc.laddr <laddr> --minimum-gas-prices <gas> [extra args]`
fn daemon_command(daemon: &DaemonConfig) -> (String, Vec<String>) {
    let mut args = vec![
        "start".to_string(),
        "--rpc.laddr".to_string(),
        daemon.rpc_laddr.clone(),
        "--minimum-gas-prices".to_string(),
        daemon.minimum_gas_prices.clone(),
    ];
    args.extend(daemon.extra_args.iter().cloned());
    (daemon.program.clone(), args)
}

pub fn run(args: StartArgs, cfg: HarnessConfig) -> Result<()> {
    let (program, daemon_args) = daemon_command(&cfg.daemon);
    if args.dry_run {
        println!("{} {}", program, daemon_args.join(" "));
        return Ok(());
    }
    tracing::info!(target: "start", %program, args = ?daemon_args, "Handing over to node daemon");

    let mut cmd = Command::new(&program);
    cmd.args(&daemon_args);
    hand_over(cmd, &program)
}

#[cfg(unix)]
fn hand_over(mut cmd: Command, program: &str) -> Result<()> {
    use std::os::unix::process::CommandExt;
    // Only returns on failure.
    let err = cmd.exec();
    Err(anyhow::anyhow!("failed to exec {}: {}", program, err))
}

#[cfg(not(unix))]
fn hand_over(mut cmd: Command, _program: &str) -> Result<()> {
    let status = cmd.status()?;
    std::process::exit(status.code().unwrap_or(1));
}
