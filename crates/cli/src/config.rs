//! CLI configuration and dispatch.

use crate::commands::Command;
use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

/// Coverage-planning toolkit for partitioned hash rings.
#[derive(Debug, Parser)]
#[command(name = "ringcover", version, about)]
pub struct CliConfig {
    /// Emit planner debug logs.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

impl CliConfig {
    pub fn run(self) -> Result<()> {
        init_tracing(self.verbose);
        self.command.run()
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose { "debug" } else { "warn" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .init();
}
