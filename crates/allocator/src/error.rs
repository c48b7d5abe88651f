use cosmwasm_std::{
    CheckedFromRatioError, CheckedMultiplyFractionError, CheckedMultiplyRatioError,
    DecimalRangeExceeded, OverflowError,
};
use ion_rewards_common::CommonError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AllocatorError {
    #[error("{0}")]
    Common(#[from] CommonError),

    #[error("gauge {gauge} has zero total voting power")]
    EmptyGauge { gauge: String },

    #[error("invalid parameter {name}: {reason}")]
    InvalidParameter { name: String, reason: String },

    #[error("{0}")]
    Overflow(#[from] OverflowError),

    #[error("{0}")]
    Ratio(#[from] CheckedFromRatioError),

    #[error("{0}")]
    MultiplyRatio(#[from] CheckedMultiplyRatioError),

    #[error("{0}")]
    Fraction(#[from] CheckedMultiplyFractionError),

    #[error("{0}")]
    Range(#[from] DecimalRangeExceeded),

    #[error("io error writing {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}
