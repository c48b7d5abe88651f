//! `Voted` log filters and decoding.
//!
//! Layout of the voter contract's event:
//!
//! ```text
//! Voted(address indexed voter, address indexed gauge, uint256 indexed epoch,
//!       uint256 votingPowerCastForGauge, uint256 totalVotingPowerInGauge,
//!       uint256 timestamp)
//! ```
//!
//! `topics = [keccak256(signature), voter, gauge, epoch]`, and `data` holds
//! the three non-indexed words in declaration order.

use cosmwasm_std::{Uint128, Uint256};
use ion_rewards_common::{EvmAddress, VoteEvent};
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};

use crate::error::LedgerError;

pub const DEFAULT_EVENT_SIGNATURE: &str = "Voted(address,address,uint256,uint256,uint256,uint256)";

const WORD_HEX_LEN: usize = 64;
const DATA_WORDS: usize = 3;

/// `eth_getLogs` filter object.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LogFilter {
    pub address: String,
    pub topics: Vec<Option<String>>,
    pub from_block: String,
    pub to_block: String,
}

/// A log entry as returned by `eth_getLogs`.
#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawLog {
    pub address: String,
    pub topics: Vec<String>,
    pub data: String,
    pub block_number: Option<String>,
    pub transaction_hash: Option<String>,
    pub log_index: Option<String>,
    #[serde(default)]
    pub removed: bool,
}

/// Topic 0 for an event signature.
pub fn event_topic(signature: &str) -> String {
    format!("0x{}", hex::encode(Keccak256::digest(signature.as_bytes())))
}

pub fn quantity(value: u64) -> String {
    format!("0x{value:x}")
}

pub fn uint_topic(value: u64) -> String {
    format!("0x{value:064x}")
}

pub fn parse_quantity(field: &str, value: &str) -> Result<u64, LedgerError> {
    let body = value
        .strip_prefix("0x")
        .ok_or_else(|| invalid_hex(field))?;
    u64::from_str_radix(body, 16).map_err(|_| invalid_hex(field))
}

fn invalid_hex(field: &str) -> LedgerError {
    LedgerError::InvalidHex {
        field: field.to_string(),
    }
}

fn invalid_log(reason: impl Into<String>) -> LedgerError {
    LedgerError::InvalidLog {
        reason: reason.into(),
    }
}

fn data_word(data: &[u8], index: usize) -> Uint256 {
    let mut word = [0u8; 32];
    word.copy_from_slice(&data[index * 32..(index + 1) * 32]);
    Uint256::from_be_bytes(word)
}

fn narrow_u128(field: &str, value: Uint256) -> Result<Uint128, LedgerError> {
    Uint128::try_from(value).map_err(|_| LedgerError::Overflow {
        field: field.to_string(),
        target: "u128".to_string(),
    })
}

/// Decode a `Voted` log whose topic 0 must equal `topic0`.
pub fn decode_vote(log: &RawLog, topic0: &str) -> Result<VoteEvent, LedgerError> {
    if log.topics.len() != 4 {
        return Err(invalid_log(format!(
            "expected 4 topics, found {}",
            log.topics.len()
        )));
    }
    if !log.topics[0].eq_ignore_ascii_case(topic0) {
        return Err(invalid_log(format!("unexpected topic0 {}", log.topics[0])));
    }

    let voter = EvmAddress::from_topic(&log.topics[1])?;
    let gauge = EvmAddress::from_topic(&log.topics[2])?;

    let data_hex = log
        .data
        .strip_prefix("0x")
        .ok_or_else(|| invalid_hex("data"))?;
    if data_hex.len() < DATA_WORDS * WORD_HEX_LEN {
        return Err(invalid_log(format!(
            "data holds {} hex chars, need {}",
            data_hex.len(),
            DATA_WORDS * WORD_HEX_LEN
        )));
    }
    let data = hex::decode(data_hex).map_err(|_| invalid_hex("data"))?;

    let voting_power_cast = narrow_u128("votingPowerCastForGauge", data_word(&data, 0))?;
    let timestamp = narrow_u128("timestamp", data_word(&data, 2))?.u128();
    let timestamp = u64::try_from(timestamp).map_err(|_| LedgerError::Overflow {
        field: "timestamp".to_string(),
        target: "u64".to_string(),
    })?;

    let block_number = log
        .block_number
        .as_deref()
        .ok_or_else(|| invalid_log("pending log without blockNumber"))?;
    let log_index = log
        .log_index
        .as_deref()
        .ok_or_else(|| invalid_log("pending log without logIndex"))?;
    let transaction_ref = log
        .transaction_hash
        .clone()
        .ok_or_else(|| invalid_log("pending log without transactionHash"))?
        .to_lowercase();

    Ok(VoteEvent {
        timestamp,
        voter,
        voting_power_cast,
        gauge,
        transaction_ref,
        block_number: parse_quantity("blockNumber", block_number)?,
        log_index: parse_quantity("logIndex", log_index)?,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn word(value: u128) -> String {
        format!("{value:064x}")
    }

    pub(crate) fn raw_log(
        voter: &EvmAddress,
        gauge: &EvmAddress,
        epoch: u64,
        power: u128,
        timestamp: u64,
        block: u64,
        index: u64,
    ) -> RawLog {
        RawLog {
            address: "0x71439ae82068e19ea90e4f506c74936ae170cf58".to_string(),
            topics: vec![
                event_topic(DEFAULT_EVENT_SIGNATURE),
                voter.to_topic(),
                gauge.to_topic(),
                uint_topic(epoch),
            ],
            data: format!(
                "0x{}{}{}",
                word(power),
                word(power * 10),
                word(timestamp as u128)
            ),
            block_number: Some(quantity(block)),
            transaction_hash: Some(format!("0x{:064X}", block * 1000 + index)),
            log_index: Some(quantity(index)),
            removed: false,
        }
    }

    #[test]
    fn test_event_topic_is_keccak() {
        // keccak256("Transfer(address,address,uint256)")
        assert_eq!(
            event_topic("Transfer(address,address,uint256)"),
            "0xddf252ad1be2c89b69c2b068fc378daa952ba7f163c4a11628f55a4df523b3ef"
        );
    }

    #[test]
    fn test_quantities() {
        assert_eq!(quantity(14405098), "0xdbcdea");
        assert_eq!(parse_quantity("n", "0xdbcdea").unwrap(), 14405098);
        assert!(parse_quantity("n", "dbcdea").is_err());
        assert_eq!(uint_topic(1435).len(), 66);
        assert!(uint_topic(1435).ends_with("59b"));
    }

    #[test]
    fn test_decode_vote() {
        let voter = EvmAddress::from_bytes([0xab; 20]);
        let gauge = EvmAddress::from_bytes([0xf1; 20]);
        let log = raw_log(&voter, &gauge, 1435, 3 * 10u128.pow(21), 1_730_000_000, 14405100, 2);
        let event = decode_vote(&log, &event_topic(DEFAULT_EVENT_SIGNATURE)).unwrap();

        assert_eq!(event.voter, voter);
        assert_eq!(event.gauge, gauge);
        assert_eq!(event.voting_power_cast, Uint128::new(3 * 10u128.pow(21)));
        assert_eq!(event.timestamp, 1_730_000_000);
        assert_eq!(event.block_number, 14405100);
        assert_eq!(event.log_index, 2);
        assert_eq!(event.transaction_ref, event.transaction_ref.to_lowercase());
    }

    #[test]
    fn test_decode_rejects_wrong_topic() {
        let voter = EvmAddress::from_bytes([0xab; 20]);
        let gauge = EvmAddress::from_bytes([0xf1; 20]);
        let log = raw_log(&voter, &gauge, 1435, 1, 1, 1, 0);
        let err = decode_vote(&log, &event_topic("Other(uint256)")).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLog { .. }));
    }

    #[test]
    fn test_decode_rejects_short_data() {
        let voter = EvmAddress::from_bytes([0xab; 20]);
        let gauge = EvmAddress::from_bytes([0xf1; 20]);
        let mut log = raw_log(&voter, &gauge, 1435, 1, 1, 1, 0);
        log.data = format!("0x{}", word(1));
        let err = decode_vote(&log, &event_topic(DEFAULT_EVENT_SIGNATURE)).unwrap_err();
        assert!(matches!(err, LedgerError::InvalidLog { .. }));
    }

    #[test]
    fn test_decode_rejects_oversized_power() {
        let voter = EvmAddress::from_bytes([0xab; 20]);
        let gauge = EvmAddress::from_bytes([0xf1; 20]);
        let mut log = raw_log(&voter, &gauge, 1435, 1, 1, 1, 0);
        log.data = format!("0x{}{}{}", "f".repeat(64), word(1), word(1));
        let err = decode_vote(&log, &event_topic(DEFAULT_EVENT_SIGNATURE)).unwrap_err();
        assert!(matches!(err, LedgerError::Overflow { .. }));
    }

    #[test]
    fn test_raw_log_json() {
        let json = r#"{
            "address": "0x71439ae82068e19ea90e4f506c74936ae170cf58",
            "topics": ["0x01"],
            "data": "0x",
            "blockNumber": "0x10",
            "transactionHash": "0xabc",
            "transactionIndex": "0x0",
            "blockHash": "0xdef",
            "logIndex": "0x1",
            "removed": false
        }"#;
        let log: RawLog = serde_json::from_str(json).unwrap();
        assert_eq!(log.block_number.as_deref(), Some("0x10"));
        assert_eq!(log.log_index.as_deref(), Some("0x1"));
    }
}
