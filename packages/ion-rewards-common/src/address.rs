use std::fmt;
use std::str::FromStr;

use cosmwasm_schema::schemars::{self, gen::SchemaGenerator, schema::Schema, JsonSchema};
use serde::{Deserialize, Serialize};

use crate::error::CommonError;

/// Length of an EVM address in bytes.
pub const ADDRESS_LEN: usize = 20;

/// Canonical EVM address: `0x` followed by 40 lower-case hex digits.
///
/// The ledger emits checksummed (mixed-case) addresses while snapshot files
/// may carry either form. Everything is lower-cased here, at ingestion, so
/// joins between event sets and snapshots never depend on case.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EvmAddress(String);

impl EvmAddress {
    pub fn parse(input: &str) -> Result<Self, CommonError> {
        let trimmed = input.trim();
        let body = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .ok_or_else(|| invalid(input, "missing 0x prefix"))?;
        let bytes = hex::decode(body).map_err(|_| invalid(input, "not hex"))?;
        if bytes.len() != ADDRESS_LEN {
            return Err(invalid(
                input,
                &format!("expected {ADDRESS_LEN} bytes, got {}", bytes.len()),
            ));
        }
        Ok(Self(format!("0x{}", hex::encode(bytes))))
    }

    pub fn from_bytes(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(format!("0x{}", hex::encode(bytes)))
    }

    /// Decode an address from an indexed log topic (32 bytes, left-padded).
    pub fn from_topic(topic: &str) -> Result<Self, CommonError> {
        let body = topic
            .strip_prefix("0x")
            .ok_or_else(|| invalid(topic, "missing 0x prefix"))?;
        let word = hex::decode(body).map_err(|_| invalid(topic, "not hex"))?;
        if word.len() != 32 {
            return Err(invalid(topic, "topic must be 32 bytes"));
        }
        let (padding, address) = word.split_at(32 - ADDRESS_LEN);
        if padding.iter().any(|&b| b != 0) {
            return Err(invalid(topic, "non-zero padding"));
        }
        let mut bytes = [0u8; ADDRESS_LEN];
        bytes.copy_from_slice(address);
        Ok(Self::from_bytes(bytes))
    }

    /// Left-pad to a 32-byte topic for `eth_getLogs` filters.
    pub fn to_topic(&self) -> String {
        format!("0x{:0>64}", &self.0[2..])
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

fn invalid(value: &str, reason: &str) -> CommonError {
    CommonError::InvalidAddress {
        value: value.to_string(),
        reason: reason.to_string(),
    }
}

impl fmt::Display for EvmAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for EvmAddress {
    type Err = CommonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl TryFrom<String> for EvmAddress {
    type Error = CommonError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EvmAddress> for String {
    fn from(address: EvmAddress) -> Self {
        address.0
    }
}

impl JsonSchema for EvmAddress {
    fn schema_name() -> String {
        "EvmAddress".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}

/// Voter column of a snapshot file: trimmed, lower-cased text.
///
/// Snapshots are not required to hold full 20-byte addresses, so the differ
/// joins on this key instead of [`EvmAddress`].
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct VoterKey(String);

impl VoterKey {
    pub fn new(raw: &str) -> Self {
        Self(raw.trim().to_lowercase())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for VoterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<String> for VoterKey {
    fn from(value: String) -> Self {
        Self::new(&value)
    }
}

impl From<&EvmAddress> for VoterKey {
    fn from(address: &EvmAddress) -> Self {
        Self(address.0.clone())
    }
}

impl From<VoterKey> for String {
    fn from(key: VoterKey) -> Self {
        key.0
    }
}

impl JsonSchema for VoterKey {
    fn schema_name() -> String {
        "VoterKey".to_string()
    }

    fn json_schema(gen: &mut SchemaGenerator) -> Schema {
        String::json_schema(gen)
    }
}
