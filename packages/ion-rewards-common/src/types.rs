use cosmwasm_schema::cw_serde;
use cosmwasm_std::{Decimal, Uint128};

use crate::address::{EvmAddress, VoterKey};

/// Column layout of a primary epoch snapshot.
pub const ALLOCATION_HEADER: [&str; 9] = [
    "timestamp",
    "voter",
    "votingPowerCastForGauge",
    "percentageOfTotalVotingPower",
    "ionDistribution",
    "ionDistributionParsed",
    "totalVotingPowerInGauge",
    "numVotes",
    "tx",
];

/// Column layout of a desync snapshot.
pub const DESYNC_HEADER: [&str; 3] = ["voter", "ionDistribution", "ionDistributionParsed"];

/// Column layout of a diff report.
pub const DIFF_HEADER: [&str; 11] = [
    "timestamp",
    "voter",
    "votingPowerCastForGauge",
    "percentageOfTotalVotingPower",
    "ionDistribution1",
    "ionDistribution2",
    "ionDistributionDiff",
    "ionDistributionParsed",
    "totalVotingPowerInGauge",
    "numVotes",
    "tx",
];

/// Separator between transaction refs inside the `tx` column.
pub const TX_SEPARATOR: char = ';';

/// A single `Voted` log as read from the ledger.
#[cw_serde]
pub struct VoteEvent {
    /// Unix seconds, as emitted by the voter contract.
    pub timestamp: u64,
    pub voter: EvmAddress,
    /// Raw on-chain units (18 decimals for veION).
    pub voting_power_cast: Uint128,
    pub gauge: EvmAddress,
    pub transaction_ref: String,
    pub block_number: u64,
    pub log_index: u64,
}

/// One voter's share of the primary gauge's reward pool.
#[cw_serde]
pub struct Allocation {
    /// Earliest vote timestamp for this voter in the epoch.
    pub timestamp: u64,
    pub voter: EvmAddress,
    pub voting_power_cast: Uint128,
    pub percentage_of_total: Decimal,
    /// Display units (pool size units).
    pub reward_amount: Decimal,
    /// Smallest token unit, i.e. `reward_amount * 10^decimals`.
    pub reward_amount_raw: Uint128,
    pub total_voting_power_in_gauge: Uint128,
    pub transaction_refs: Vec<String>,
    pub vote_count: u32,
}

/// Discounted supplemental allocation for a desync gauge voter.
#[cw_serde]
pub struct DesyncAllocation {
    pub voter: EvmAddress,
    /// Desync power plus the voter's retained primary power.
    pub combined_voting_power: Uint128,
    pub percentage_of_total: Decimal,
    pub reward_amount: Decimal,
    pub reward_amount_raw: Uint128,
}

/// A parsed snapshot row.
///
/// Only `voter` and `distribution` are interpreted; every other column is
/// kept as the text found in the file so it can be re-emitted unchanged.
#[cw_serde]
pub struct SnapshotRecord {
    pub line: usize,
    pub timestamp: String,
    pub voter: VoterKey,
    pub voting_power_cast: String,
    pub percentage_of_total: String,
    /// Raw text of the `ionDistribution` column.
    pub distribution: String,
    /// Parsed value of `distribution`, used for comparisons.
    pub distribution_value: Decimal,
    pub distribution_raw: String,
    pub total_voting_power_in_gauge: String,
    pub vote_count: String,
    pub transaction_refs: String,
}

/// A voter whose distribution increased between two snapshots.
#[cw_serde]
pub struct DiffRecord {
    pub voter: VoterKey,
    pub prior_distribution: String,
    pub current_distribution: String,
    pub delta: Decimal,
    pub current: SnapshotRecord,
}

impl DiffRecord {
    /// Row in [`DIFF_HEADER`] order.
    pub fn to_row(&self) -> Vec<String> {
        vec![
            self.current.timestamp.clone(),
            self.voter.to_string(),
            self.current.voting_power_cast.clone(),
            self.current.percentage_of_total.clone(),
            self.prior_distribution.clone(),
            self.current_distribution.clone(),
            self.delta.to_string(),
            self.current.distribution_raw.clone(),
            self.current.total_voting_power_in_gauge.clone(),
            self.current.vote_count.clone(),
            self.current.transaction_refs.clone(),
        ]
    }
}
