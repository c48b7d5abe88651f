pub mod diff;
pub mod error;
pub mod snapshot;

pub use diff::{diff_files, diff_snapshots, render_diff};
pub use error::DiffError;
pub use snapshot::{load_snapshot, parse_snapshot, MalformedRowPolicy, Snapshot};
