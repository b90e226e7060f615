// Path: crates/cli/src/commands/config.rs

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use forklift_types::config::HarnessConfig;
use std::fs;
use std::path::PathBuf;

#[derive(Parser, Debug)]
pub struct ConfigCmdArgs {
    #[clap(subcommand)]
    pub command: ConfigSubCommands,
}

#[derive(Subcommand, Debug)]
pub enum ConfigSubCommands {
    /// Write a forklift.toml with every setting at its default.
    New {
        #[clap(long, default_value = "forklift.toml")]
        out: PathBuf,
        /// Overwrite an existing file.
        #[clap(long)]
        force: bool,
    },
    /// Print the effective configuration (file plus environment overrides).
    Show,
}

pub fn run(args: ConfigCmdArgs, cfg: HarnessConfig) -> Result<()> {
    match args.command {
        ConfigSubCommands::New { out, force } => {
            if out.exists() && !force {
                bail!("{} already exists (use --force to overwrite)", out.display());
            }
            if let Some(parent) = out.parent().filter(|p| !p.as_os_str().is_empty()) {
                fs::create_dir_all(parent)?;
            }
            fs::write(&out, HarnessConfig::default().to_toml()?)?;
            println!("Generated {}", out.display());
        }
        ConfigSubCommands::Show => {
            let mut shown = cfg;
            if shown.release.token.is_some() {
                shown.release.token = Some("<redacted>".to_string());
            }
            if shown.node.mnemonic.is_some() {
                shown.node.mnemonic = Some("<redacted>".to_string());
            }
            print!("{}", shown.to_toml()?);
        }
    }
    Ok(())
}
