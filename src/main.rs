mod cli;
mod config;
mod constants;
mod download;
mod error;
mod gather;
mod ocp;
mod report;
mod runner;
mod session;
mod snapshots;
mod summary;
mod timeutil;
mod window;

#[cfg(test)]
mod test_support;

use anyhow::Result;
use clap::Parser;
use std::process::ExitCode;

use crate::cli::{Cli, Commands};

fn init_tracing(verbose: bool) -> Result<()> {
    let fallback = if verbose {
        "debug,awr_gather=debug"
    } else {
        "info,awr_gather=info"
    };
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| fallback.into());
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .try_init()
        .map_err(|err| anyhow::anyhow!(err.to_string()))?;
    Ok(())
}

fn run(cli: Cli) -> Result<()> {
    init_tracing(cli.verbose)?;
    match cli.command {
        Commands::Awr(args) => gather::gather_awr(args).map(|_| ()),
        Commands::Snapshots(args) => gather::list_snapshots(args),
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::from(error::codes::SUCCESS),
        Err(err) => {
            eprintln!("awr-gather: {err:#}");
            ExitCode::from(error::exit_code(&err))
        }
    }
}
