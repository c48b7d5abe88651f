pub mod allocate;
pub mod config;
pub mod error;
pub mod report;

pub use allocate::{
    allocate, allocate_desync, allocate_epoch, sample_voters, tally_by_voter, total_voting_power,
    EpochAllocation, VoterTally,
};
pub use config::AllocationParams;
pub use error::AllocatorError;
pub use report::{build_report, write_report, EpochReport, RunContext, RunSummary};
