use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum CommonError {
    #[error("invalid address {value:?}: {reason}")]
    InvalidAddress { value: String, reason: String },

    #[error("csv line {line}: {reason}")]
    Csv { line: usize, reason: String },
}
