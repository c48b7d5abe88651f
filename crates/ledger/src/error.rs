use ion_rewards_common::CommonError;
use thiserror::Error;

/// JSON-RPC "limit exceeded", returned by most providers when throttling.
pub const RPC_LIMIT_EXCEEDED: i64 = -32005;
/// JSON-RPC "internal error".
pub const RPC_INTERNAL_ERROR: i64 = -32603;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("{0}")]
    Common(#[from] CommonError),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("ledger returned http status {status}")]
    Status { status: u16 },

    #[error("rpc error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("ledger unavailable after {attempts} attempts: {last_error}")]
    Unavailable { attempts: u32, last_error: String },

    #[error("invalid log: {reason}")]
    InvalidLog { reason: String },

    #[error("invalid hex: {field}")]
    InvalidHex { field: String },

    #[error("{field} does not fit in {target}")]
    Overflow { field: String, target: String },

    #[error("{0}")]
    Json(#[from] serde_json::Error),
}

impl LedgerError {
    /// Whether another attempt could succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            LedgerError::Http(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            LedgerError::Status { status } => *status == 429 || *status >= 500,
            LedgerError::Rpc { code, .. } => {
                *code == RPC_LIMIT_EXCEEDED || *code == RPC_INTERNAL_ERROR
            }
            _ => false,
        }
    }
}
