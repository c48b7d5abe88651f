use std::fs;
use std::path::Path;

use ion_rewards_common::csv;
use ion_rewards_common::types::DIFF_HEADER;
use ion_rewards_common::DiffRecord;
use tracing::{debug, info};

use crate::error::DiffError;
use crate::snapshot::{load_snapshot, MalformedRowPolicy, Snapshot};

/// Voters whose distribution grew from `prior` to `current`.
///
/// Voters missing from `prior` are skipped rather than treated as growth
/// from zero, and equal amounts are not reported. Output follows the order
/// of `current`.
pub fn diff_snapshots(prior: &Snapshot, current: &Snapshot) -> Result<Vec<DiffRecord>, DiffError> {
    let mut increased = Vec::new();
    for record in current.iter() {
        let Some(before) = prior.get(&record.voter) else {
            debug!(voter = %record.voter, "voter not in prior snapshot");
            continue;
        };
        if record.distribution_value <= before.distribution_value {
            continue;
        }
        let delta = record
            .distribution_value
            .checked_sub(before.distribution_value)?;
        increased.push(DiffRecord {
            voter: record.voter.clone(),
            prior_distribution: before.distribution.clone(),
            current_distribution: record.distribution.clone(),
            delta,
            current: record.clone(),
        });
    }
    Ok(increased)
}

pub fn render_diff(records: &[DiffRecord]) -> String {
    csv::render(&DIFF_HEADER, records.iter().map(DiffRecord::to_row))
}

/// Load two snapshot files, diff them and write the report to `output`.
pub fn diff_files(
    prior_path: &Path,
    current_path: &Path,
    output: &Path,
    policy: MalformedRowPolicy,
) -> Result<Vec<DiffRecord>, DiffError> {
    let prior = load_snapshot(prior_path, policy)?;
    let current = load_snapshot(current_path, policy)?;
    let records = diff_snapshots(&prior, &current)?;

    fs::write(output, render_diff(&records)).map_err(|source| DiffError::Io {
        path: output.display().to_string(),
        source,
    })?;
    info!(
        prior = prior.len(),
        current = current.len(),
        increased = records.len(),
        output = %output.display(),
        "wrote diff report"
    );
    Ok(records)
}
