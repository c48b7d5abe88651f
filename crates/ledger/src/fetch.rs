use ion_rewards_common::{EvmAddress, VoteEvent};
use tracing::{debug, info, warn};

use crate::error::LedgerError;
use crate::logs::{decode_vote, event_topic, quantity, uint_topic, LogFilter, RawLog};

pub const DEFAULT_BLOCK_CHUNK_SIZE: u64 = 10_000;

/// Anything that can answer `eth_blockNumber` and `eth_getLogs`.
pub trait LogSource {
    fn block_number(&self) -> Result<u64, LedgerError>;
    fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError>;
}

/// "All `Voted` events for (gauge, epoch)" over a block range.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct VoteQuery {
    pub contract: EvmAddress,
    pub event_signature: String,
    pub gauge: EvmAddress,
    pub epoch: u64,
    pub from_block: u64,
    /// Defaults to the chain head.
    pub to_block: Option<u64>,
    pub block_chunk_size: u64,
}

impl VoteQuery {
    fn filter(&self, topic0: &str, from: u64, to: u64) -> LogFilter {
        LogFilter {
            address: self.contract.to_string(),
            topics: vec![
                Some(topic0.to_string()),
                None,
                Some(self.gauge.to_topic()),
                Some(uint_topic(self.epoch)),
            ],
            from_block: quantity(from),
            to_block: quantity(to),
        }
    }
}

/// Fetch and decode every matching vote, ordered by `(block, log index)`.
///
/// The range is walked in `block_chunk_size` windows to stay under provider
/// result caps. Logs flagged `removed` (reorged out) are dropped.
pub fn fetch_vote_events<S: LogSource + ?Sized>(
    source: &S,
    query: &VoteQuery,
) -> Result<Vec<VoteEvent>, LedgerError> {
    let to_block = match query.to_block {
        Some(block) => block,
        None => source.block_number()?,
    };
    let chunk = query.block_chunk_size.max(1);
    let topic0 = event_topic(&query.event_signature);

    let mut events = Vec::new();
    let mut start = query.from_block;
    while start <= to_block {
        let end = start.saturating_add(chunk - 1).min(to_block);
        let logs = source.get_logs(&query.filter(&topic0, start, end))?;
        debug!(from = start, to = end, logs = logs.len(), "fetched chunk");
        for log in logs {
            if log.removed {
                warn!(tx = ?log.transaction_hash, "ignoring removed log");
                continue;
            }
            let event = decode_vote(&log, &topic0)?;
            if event.gauge != query.gauge {
                return Err(LedgerError::InvalidLog {
                    reason: format!("log for gauge {} in {} query", event.gauge, query.gauge),
                });
            }
            events.push(event);
        }
        if end == u64::MAX {
            break;
        }
        start = end + 1;
    }

    events.sort_by_key(|e| (e.block_number, e.log_index));
    info!(
        gauge = %query.gauge,
        epoch = query.epoch,
        from_block = query.from_block,
        to_block,
        events = events.len(),
        "fetched vote events"
    );
    Ok(events)
}
