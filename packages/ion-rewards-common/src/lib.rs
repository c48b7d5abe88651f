pub mod address;
pub mod csv;
pub mod error;
pub mod fingerprint;
pub mod types;

pub use address::{EvmAddress, VoterKey};
pub use error::CommonError;
pub use fingerprint::sha256_hex;
pub use types::{Allocation, DesyncAllocation, DiffRecord, SnapshotRecord, VoteEvent};
