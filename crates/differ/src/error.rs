use cosmwasm_std::OverflowError;
use ion_rewards_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("{0}")]
    Common(#[from] CommonError),

    #[error("malformed record at line {line}: {reason}")]
    MalformedRecord { line: usize, reason: String },

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("io error on {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
