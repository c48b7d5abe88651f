use std::fs;
use std::path::{Path, PathBuf};

use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Uint128};
use ion_rewards_common::csv;
use ion_rewards_common::types::{ALLOCATION_HEADER, DESYNC_HEADER, TX_SEPARATOR};
use ion_rewards_common::{sha256_hex, Allocation, DesyncAllocation, EvmAddress};
use tracing::info;

use crate::allocate::EpochAllocation;
use crate::error::AllocatorError;

/// Totals for one allocation run, written next to the snapshots.
#[cw_serde]
pub struct RunSummary {
    pub epoch: u64,
    pub primary_gauge: EvmAddress,
    pub desync_gauge: EvmAddress,
    pub events: u64,
    pub unique_voters: u64,
    pub allocations: u64,
    pub total_voting_power_in_gauge: Uint128,
    /// Power of the retained (non-dust) allocations only.
    pub total_voting_power_cast: Uint128,
    pub total_percentage: Decimal,
    pub total_distribution: Decimal,
    pub desync_allocations: u64,
    pub total_desync_distribution: Decimal,
    pub snapshot_sha256: String,
    pub desync_snapshot_sha256: String,
}

/// Rendered outputs of one run.
#[derive(Clone, Debug, PartialEq)]
pub struct EpochReport {
    pub snapshot_csv: String,
    pub desync_csv: String,
    pub summary: RunSummary,
}

/// Identifies the run a report belongs to.
#[derive(Clone, Debug)]
pub struct RunContext<'a> {
    pub epoch: u64,
    pub primary_gauge: &'a EvmAddress,
    pub desync_gauge: &'a EvmAddress,
    pub events: usize,
    pub unique_voters: usize,
}

pub fn snapshot_file_name(epoch: u64) -> String {
    format!("epoch_{epoch}.csv")
}

pub fn desync_file_name(epoch: u64) -> String {
    format!("desync_epoch_{epoch}.csv")
}

pub fn summary_file_name(epoch: u64) -> String {
    format!("epoch_{epoch}.summary.json")
}

pub fn allocation_row(allocation: &Allocation) -> Vec<String> {
    let mut tx = String::new();
    for (i, tx_ref) in allocation.transaction_refs.iter().enumerate() {
        if i > 0 {
            tx.push(TX_SEPARATOR);
        }
        tx.push_str(tx_ref);
    }
    vec![
        allocation.timestamp.to_string(),
        allocation.voter.to_string(),
        allocation.voting_power_cast.to_string(),
        allocation.percentage_of_total.to_string(),
        allocation.reward_amount.to_string(),
        allocation.reward_amount_raw.to_string(),
        allocation.total_voting_power_in_gauge.to_string(),
        allocation.vote_count.to_string(),
        tx,
    ]
}

pub fn desync_row(allocation: &DesyncAllocation) -> Vec<String> {
    vec![
        allocation.voter.to_string(),
        allocation.reward_amount.to_string(),
        allocation.reward_amount_raw.to_string(),
    ]
}

pub fn render_allocations(allocations: &[Allocation]) -> String {
    csv::render(&ALLOCATION_HEADER, allocations.iter().map(allocation_row))
}

pub fn render_desync(allocations: &[DesyncAllocation]) -> String {
    csv::render(&DESYNC_HEADER, allocations.iter().map(desync_row))
}

/// Render both snapshots and compute the run totals.
pub fn build_report(
    ctx: &RunContext<'_>,
    outcome: &EpochAllocation,
) -> Result<EpochReport, AllocatorError> {
    let snapshot_csv = render_allocations(&outcome.allocations);
    let desync_csv = render_desync(&outcome.desync);

    let mut total_cast = Uint128::zero();
    let mut total_percentage = Decimal::zero();
    let mut total_distribution = Decimal::zero();
    for allocation in &outcome.allocations {
        total_cast = total_cast.checked_add(allocation.voting_power_cast)?;
        total_percentage = total_percentage.checked_add(allocation.percentage_of_total)?;
        total_distribution = total_distribution.checked_add(allocation.reward_amount)?;
    }
    let total_desync = outcome
        .desync
        .iter()
        .try_fold(Decimal::zero(), |acc, d| acc.checked_add(d.reward_amount))?;

    let summary = RunSummary {
        epoch: ctx.epoch,
        primary_gauge: ctx.primary_gauge.clone(),
        desync_gauge: ctx.desync_gauge.clone(),
        events: ctx.events as u64,
        unique_voters: ctx.unique_voters as u64,
        allocations: outcome.allocations.len() as u64,
        total_voting_power_in_gauge: outcome.total_voting_power_in_gauge,
        total_voting_power_cast: total_cast,
        total_percentage,
        total_distribution,
        desync_allocations: outcome.desync.len() as u64,
        total_desync_distribution: total_desync,
        snapshot_sha256: sha256_hex(snapshot_csv.as_bytes()),
        desync_snapshot_sha256: sha256_hex(desync_csv.as_bytes()),
    };

    info!(
        epoch = summary.epoch,
        total_voting_power_cast = %summary.total_voting_power_cast,
        total_percentage = %summary.total_percentage,
        total_distribution = %summary.total_distribution,
        total_desync_distribution = %summary.total_desync_distribution,
        "run totals"
    );

    Ok(EpochReport {
        snapshot_csv,
        desync_csv,
        summary,
    })
}

/// Write the primary snapshot, the desync snapshot and the summary into
/// `dir`. Returns the written paths in that order.
pub fn write_report(dir: &Path, report: &EpochReport) -> Result<Vec<PathBuf>, AllocatorError> {
    fs::create_dir_all(dir).map_err(|source| AllocatorError::Io {
        path: dir.display().to_string(),
        source,
    })?;

    let epoch = report.summary.epoch;
    let summary_json = serde_json::to_string_pretty(&report.summary)?;
    let outputs = [
        (snapshot_file_name(epoch), report.snapshot_csv.as_str()),
        (desync_file_name(epoch), report.desync_csv.as_str()),
        (summary_file_name(epoch), summary_json.as_str()),
    ];

    let mut written = Vec::with_capacity(outputs.len());
    for (name, content) in outputs {
        let path = dir.join(name);
        fs::write(&path, content).map_err(|source| AllocatorError::Io {
            path: path.display().to_string(),
            source,
        })?;
        info!(path = %path.display(), bytes = content.len(), "wrote output");
        written.push(path);
    }
    Ok(written)
}
