pub mod client;
pub mod error;
pub mod fetch;
pub mod logs;

pub use client::{RpcClient, RpcConfig};
pub use error::LedgerError;
pub use fetch::{fetch_vote_events, LogSource, VoteQuery};
pub use logs::{decode_vote, event_topic, LogFilter, RawLog, DEFAULT_EVENT_SIGNATURE};
