use std::fs;
use std::path::{Path, PathBuf};

use anyhow::Context;
use clap::Args;
use cosmwasm_std::Decimal;
use ion_rewards_allocator::{
    allocate_epoch, build_report, sample_voters, tally_by_voter, write_report, RunContext,
};
use ion_rewards_common::VoteEvent;
use ion_rewards_ledger::{fetch_vote_events, LogSource, RpcClient, VoteQuery};
use tracing::info;

use crate::config::Config;

#[derive(Args)]
pub struct AllocateArgs {
    /// Epoch to allocate (overrides config)
    #[arg(long)]
    pub epoch: Option<u64>,

    /// Ledger JSON-RPC endpoint (overrides config)
    #[arg(long, env = "ION_REWARDS_RPC_URL")]
    pub rpc_url: Option<String>,

    /// First block to scan (overrides config)
    #[arg(long)]
    pub from_block: Option<u64>,

    /// Last block to scan (default: chain head)
    #[arg(long)]
    pub to_block: Option<u64>,

    /// Directory for the snapshots and summary (overrides config)
    #[arg(short, long)]
    pub output_dir: Option<PathBuf>,

    /// Reward pool in display units (overrides config)
    #[arg(long, value_parser = parse_decimal)]
    pub pool_size: Option<Decimal>,

    /// Read events from a JSON file instead of the ledger
    #[arg(long, conflicts_with = "save_events")]
    pub events_file: Option<PathBuf>,

    /// Also write the fetched events to a JSON file for offline reruns
    #[arg(long)]
    pub save_events: Option<PathBuf>,

    /// Log this many random voters for spot checks (0 disables)
    #[arg(long, default_value_t = 3)]
    pub sample_voters: usize,
}

fn parse_decimal(value: &str) -> Result<Decimal, String> {
    value.parse::<Decimal>().map_err(|e| e.to_string())
}

impl AllocateArgs {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(epoch) = self.epoch {
            config.epoch = epoch;
        }
        if let Some(url) = &self.rpc_url {
            config.rpc_url = url.clone();
        }
        if let Some(block) = self.from_block {
            config.from_block = block;
        }
        if self.to_block.is_some() {
            config.to_block = self.to_block;
        }
        if let Some(dir) = &self.output_dir {
            config.output_dir = dir.clone();
        }
        if let Some(pool) = self.pool_size {
            config.allocation.pool_size = pool;
        }
        config
    }
}

/// Allocate one epoch and write its snapshots and summary.
pub fn run(config: Config, args: AllocateArgs) -> anyhow::Result<()> {
    let config = args.apply(config);
    let params = config.allocation_params();
    params.validate()?;

    let events = match &args.events_file {
        Some(path) => load_events(path)?,
        None => fetch_events(&config)?,
    };
    if let Some(path) = &args.save_events {
        save_events(path, &events)?;
    }

    let outcome = allocate_epoch(&events, &config.primary_gauge, &config.desync_gauge, &params)
        .with_context(|| format!("allocating epoch {}", config.epoch))?;

    let ctx = RunContext {
        epoch: config.epoch,
        primary_gauge: &config.primary_gauge,
        desync_gauge: &config.desync_gauge,
        events: events.len(),
        unique_voters: tally_by_voter(&config.primary_gauge, &events)?.len(),
    };
    let report = build_report(&ctx, &outcome)?;
    write_report(&config.output_dir, &report)?;

    if args.sample_voters > 0 {
        let sample = sample_voters(
            &outcome.allocations,
            args.sample_voters,
            &mut rand::thread_rng(),
        );
        let sample: Vec<String> = sample.iter().map(ToString::to_string).collect();
        info!(voters = %sample.join(","), "random voters");
    }
    Ok(())
}

/// Fetch both gauges' votes against one fixed head so the two sets cover
/// the same block range.
fn fetch_events(config: &Config) -> anyhow::Result<Vec<VoteEvent>> {
    let client = RpcClient::new(config.rpc_url.as_str(), config.rpc_config())?;
    let to_block = match config.to_block {
        Some(block) => block,
        None => client
            .block_number()
            .with_context(|| format!("querying head from {}", client.url()))?,
    };

    let mut events = Vec::new();
    for gauge in [&config.primary_gauge, &config.desync_gauge] {
        let query = VoteQuery {
            contract: config.voter_contract.clone(),
            event_signature: config.event_signature.clone(),
            gauge: gauge.clone(),
            epoch: config.epoch,
            from_block: config.from_block,
            to_block: Some(to_block),
            block_chunk_size: config.rpc.block_chunk_size,
        };
        let fetched = fetch_vote_events(&client, &query)
            .with_context(|| format!("fetching votes for gauge {gauge}"))?;
        events.extend(fetched);
    }
    Ok(events)
}

fn load_events(path: &Path) -> anyhow::Result<Vec<VoteEvent>> {
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let events: Vec<VoteEvent> =
        serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))?;
    info!(path = %path.display(), events = events.len(), "loaded events");
    Ok(events)
}

fn save_events(path: &Path, events: &[VoteEvent]) -> anyhow::Result<()> {
    let json = serde_json::to_string_pretty(events)?;
    fs::write(path, json).with_context(|| format!("writing {}", path.display()))?;
    info!(path = %path.display(), events = events.len(), "saved events");
    Ok(())
}
