use std::path::PathBuf;

use anyhow::Context;
use clap::Args;
use ion_rewards_differ::{diff_files, MalformedRowPolicy};
use tracing::info;

#[derive(Args)]
pub struct DiffArgs {
    /// Earlier snapshot
    pub prior: PathBuf,

    /// Later snapshot
    pub current: PathBuf,

    /// Report destination
    #[arg(short, long, default_value = "increased_votes.csv")]
    pub output: PathBuf,

    /// Log and skip malformed rows instead of failing
    #[arg(long)]
    pub skip_malformed: bool,
}

/// Diff two snapshot files and write the increase report.
pub fn run(args: DiffArgs) -> anyhow::Result<()> {
    let policy = if args.skip_malformed {
        MalformedRowPolicy::Skip
    } else {
        MalformedRowPolicy::Abort
    };
    let records = diff_files(&args.prior, &args.current, &args.output, policy).with_context(|| {
        format!(
            "diffing {} against {}",
            args.current.display(),
            args.prior.display()
        )
    })?;
    info!(
        increased = records.len(),
        output = %args.output.display(),
        "created report of voters with higher ion distribution"
    );
    Ok(())
}
