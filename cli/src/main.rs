//! ion-rewards: epoch reward allocation and snapshot diffing for gauge votes.

use std::path::PathBuf;

use clap::{ArgAction, Parser, Subcommand};
use tracing_subscriber::EnvFilter;

mod commands;
mod config;

use crate::commands::{allocate::AllocateArgs, diff::DiffArgs};
use crate::config::Config;

#[derive(Parser)]
#[command(name = "ion-rewards")]
#[command(about = "Allocate epoch gauge rewards and compare snapshots", long_about = None)]
#[command(version)]
struct Cli {
    /// TOML config file (defaults reproduce the epoch 1435 run)
    #[arg(short, long, env = "ION_REWARDS_CONFIG")]
    config: Option<PathBuf>,

    /// Raise log verbosity (-v debug, -vv trace). RUST_LOG takes precedence.
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch an epoch's votes and write reward snapshots
    Allocate(AllocateArgs),

    /// Report voters whose distribution increased between two snapshots
    Diff(DiffArgs),

    /// Print the sha256 of a snapshot file
    Fingerprint {
        /// Snapshot to hash
        file: PathBuf,
    },
}

fn init_tracing(verbose: u8) {
    let default_level = match verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .init();
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Allocate(args) => {
            let config = Config::load(cli.config.as_deref())?;
            commands::allocate::run(config, args)
        }
        Commands::Diff(args) => commands::diff::run(args),
        Commands::Fingerprint { file } => commands::fingerprint::run(&file),
    }
}
