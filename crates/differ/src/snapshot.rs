use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use cosmwasm_std::Decimal;
use ion_rewards_common::csv::{parse_rows, CsvRow};
use ion_rewards_common::types::ALLOCATION_HEADER;
use ion_rewards_common::{SnapshotRecord, VoterKey};
use tracing::{debug, warn};

use crate::error::DiffError;

/// What to do with a row that fails validation.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum MalformedRowPolicy {
    /// Fail the whole load on the first bad row.
    #[default]
    Abort,
    /// Log the row's line number and keep going.
    ///
    /// Only applies to rows that were split into fields. A quoted field left
    /// open at end of file is a CSV error and still fails the load.
    Skip,
}

/// A loaded epoch snapshot keyed by trimmed, lower-cased voter text.
///
/// Records keep the order in which each voter first appeared. A voter listed
/// twice keeps its first position but takes the later row's values.
#[derive(Clone, Debug, Default)]
pub struct Snapshot {
    records: Vec<SnapshotRecord>,
    index: HashMap<VoterKey, usize>,
    skipped: usize,
}

impl Snapshot {
    fn insert(&mut self, record: SnapshotRecord) {
        match self.index.get(&record.voter).copied() {
            Some(i) => {
                debug!(voter = %record.voter, line = record.line, "duplicate voter, later row wins");
                self.records[i] = record;
            }
            None => {
                self.index.insert(record.voter.clone(), self.records.len());
                self.records.push(record);
            }
        }
    }

    pub fn get(&self, voter: &VoterKey) -> Option<&SnapshotRecord> {
        self.index.get(voter).map(|&i| &self.records[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = &SnapshotRecord> {
        self.records.iter()
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Rows dropped under [`MalformedRowPolicy::Skip`].
    pub fn skipped(&self) -> usize {
        self.skipped
    }
}

fn malformed(line: usize, reason: impl Into<String>) -> DiffError {
    DiffError::MalformedRecord {
        line,
        reason: reason.into(),
    }
}

/// Validate one data row against the primary snapshot layout.
pub fn parse_record(row: &CsvRow) -> Result<SnapshotRecord, DiffError> {
    let line = row.line;
    if row.fields.len() != ALLOCATION_HEADER.len() {
        return Err(malformed(
            line,
            format!(
                "expected {} fields, found {}",
                ALLOCATION_HEADER.len(),
                row.fields.len()
            ),
        ));
    }

    let field = |i: usize| row.fields[i].trim().to_string();

    let voter = VoterKey::new(&row.fields[1]);
    if voter.is_empty() {
        return Err(malformed(line, "empty voter"));
    }
    let distribution = field(4);
    let distribution_value = Decimal::from_str(&distribution)
        .map_err(|e| malformed(line, format!("ionDistribution {distribution:?}: {e}")))?;

    Ok(SnapshotRecord {
        line,
        timestamp: field(0),
        voter,
        voting_power_cast: field(2),
        percentage_of_total: field(3),
        distribution,
        distribution_value,
        distribution_raw: field(5),
        total_voting_power_in_gauge: field(6),
        vote_count: field(7),
        transaction_refs: field(8),
    })
}

/// Parse snapshot text. The first record is the header and is discarded
/// without inspection.
pub fn parse_snapshot(content: &str, policy: MalformedRowPolicy) -> Result<Snapshot, DiffError> {
    let mut snapshot = Snapshot::default();
    for row in parse_rows(content)?.iter().skip(1) {
        match parse_record(row) {
            Ok(record) => snapshot.insert(record),
            Err(err) if policy == MalformedRowPolicy::Skip => {
                warn!(line = row.line, error = %err, "skipping malformed row");
                snapshot.skipped += 1;
            }
            Err(err) => return Err(err),
        }
    }
    Ok(snapshot)
}

pub fn load_snapshot(path: &Path, policy: MalformedRowPolicy) -> Result<Snapshot, DiffError> {
    let content = fs::read_to_string(path).map_err(|source| DiffError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let snapshot = parse_snapshot(&content, policy)?;
    debug!(
        path = %path.display(),
        records = snapshot.len(),
        skipped = snapshot.skipped(),
        "loaded snapshot"
    );
    Ok(snapshot)
}
