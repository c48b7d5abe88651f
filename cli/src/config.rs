//! `ion-rewards.toml` loading.
//!
//! Every key has a default matching the epoch-1435 Mode mainnet run, so an
//! empty file (or no file) reproduces that run.

use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use cosmwasm_std::Decimal;
use ion_rewards_allocator::config::{
    DEFAULT_DESYNC_DISCOUNT_PERCENT, DEFAULT_DUST_THRESHOLD, DEFAULT_POOL_SIZE,
    DEFAULT_TOKEN_DECIMALS,
};
use ion_rewards_allocator::AllocationParams;
use ion_rewards_common::{CommonError, EvmAddress};
use ion_rewards_ledger::client::{DEFAULT_BACKOFF_BASE_MS, DEFAULT_MAX_RETRIES, DEFAULT_TIMEOUT_MS};
use ion_rewards_ledger::fetch::DEFAULT_BLOCK_CHUNK_SIZE;
use ion_rewards_ledger::{RpcConfig, DEFAULT_EVENT_SIGNATURE};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ConfigFile")]
pub struct Config {
    pub rpc_url: String,
    pub voter_contract: EvmAddress,
    pub from_block: u64,
    /// Empty = chain head at fetch time.
    pub to_block: Option<u64>,
    pub epoch: u64,
    pub primary_gauge: EvmAddress,
    pub desync_gauge: EvmAddress,
    pub event_signature: String,
    pub output_dir: PathBuf,
    pub allocation: AllocationConfig,
    pub rpc: RpcSettings,
}

/// On-disk layout. Addresses stay text until [`Config`] validates them.
#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct ConfigFile {
    #[serde(default = "default_rpc_url")]
    rpc_url: String,
    #[serde(default = "default_voter_contract")]
    voter_contract: String,
    #[serde(default = "default_from_block")]
    from_block: u64,
    #[serde(default)]
    to_block: Option<u64>,
    #[serde(default = "default_epoch")]
    epoch: u64,
    #[serde(default = "default_primary_gauge")]
    primary_gauge: String,
    #[serde(default = "default_desync_gauge")]
    desync_gauge: String,
    #[serde(default = "default_event_signature")]
    event_signature: String,
    #[serde(default = "default_output_dir")]
    output_dir: PathBuf,
    #[serde(default)]
    allocation: AllocationConfig,
    #[serde(default)]
    rpc: RpcSettings,
}

impl TryFrom<ConfigFile> for Config {
    type Error = CommonError;

    fn try_from(file: ConfigFile) -> Result<Self, Self::Error> {
        Ok(Self {
            rpc_url: file.rpc_url,
            voter_contract: EvmAddress::parse(&file.voter_contract)?,
            from_block: file.from_block,
            to_block: file.to_block,
            epoch: file.epoch,
            primary_gauge: EvmAddress::parse(&file.primary_gauge)?,
            desync_gauge: EvmAddress::parse(&file.desync_gauge)?,
            event_signature: file.event_signature,
            output_dir: file.output_dir,
            allocation: file.allocation,
            rpc: file.rpc,
        })
    }
}

/// Reward pool parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AllocationConfig {
    #[serde(default = "default_pool_size")]
    pub pool_size: Decimal,
    #[serde(default = "default_token_decimals")]
    pub token_decimals: u32,
    #[serde(default = "default_dust_threshold")]
    pub dust_threshold: Decimal,
    #[serde(default = "default_desync_discount")]
    pub desync_discount: Decimal,
}

/// Ledger transport settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RpcSettings {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
    #[serde(default = "default_backoff_base_ms")]
    pub backoff_base_ms: u64,
    #[serde(default = "default_block_chunk_size")]
    pub block_chunk_size: u64,
}

impl Default for AllocationConfig {
    fn default() -> Self {
        Self {
            pool_size: default_pool_size(),
            token_decimals: default_token_decimals(),
            dust_threshold: default_dust_threshold(),
            desync_discount: default_desync_discount(),
        }
    }
}

impl Default for RpcSettings {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            max_retries: default_max_retries(),
            backoff_base_ms: default_backoff_base_ms(),
            block_chunk_size: default_block_chunk_size(),
        }
    }
}

impl Config {
    /// Every key at its default value.
    pub fn defaults() -> anyhow::Result<Self> {
        Self::from_toml("").context("building default config")
    }

    /// Load from `path`, or defaults when no path is given.
    pub fn load(path: Option<&Path>) -> anyhow::Result<Self> {
        let Some(path) = path else {
            return Self::defaults();
        };
        let raw = fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        Self::from_toml(&raw).with_context(|| format!("parsing config {}", path.display()))
    }

    pub fn from_toml(raw: &str) -> anyhow::Result<Self> {
        Ok(toml::from_str(raw)?)
    }

    pub fn allocation_params(&self) -> AllocationParams {
        AllocationParams {
            pool_size: self.allocation.pool_size,
            token_decimals: self.allocation.token_decimals,
            dust_threshold: self.allocation.dust_threshold,
            desync_discount: self.allocation.desync_discount,
        }
    }

    pub fn rpc_config(&self) -> RpcConfig {
        RpcConfig {
            timeout: Duration::from_millis(self.rpc.timeout_ms),
            max_retries: self.rpc.max_retries,
            backoff_base: Duration::from_millis(self.rpc.backoff_base_ms),
        }
    }
}

// Default value functions

fn default_rpc_url() -> String {
    "https://mainnet.mode.network".to_string()
}

fn default_voter_contract() -> String {
    "0x71439Ae82068E19ea90e4F506c74936aE170Cf58".to_string()
}

fn default_from_block() -> u64 {
    14_405_098
}

fn default_epoch() -> u64 {
    1435
}

fn default_primary_gauge() -> String {
    "0x8be11aBd61E07EF9d4551aCdd43bb390E3CE03Bd".to_string()
}

fn default_desync_gauge() -> String {
    "0x78b7C35d2B8cdFf03971935832DDD2BBc54D8BD0".to_string()
}

fn default_event_signature() -> String {
    DEFAULT_EVENT_SIGNATURE.to_string()
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_pool_size() -> Decimal {
    Decimal::from_ratio(DEFAULT_POOL_SIZE, 1u128)
}

fn default_token_decimals() -> u32 {
    DEFAULT_TOKEN_DECIMALS
}

fn default_dust_threshold() -> Decimal {
    Decimal::from_ratio(DEFAULT_DUST_THRESHOLD, 1u64)
}

fn default_desync_discount() -> Decimal {
    Decimal::percent(DEFAULT_DESYNC_DISCOUNT_PERCENT)
}

fn default_timeout_ms() -> u64 {
    DEFAULT_TIMEOUT_MS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

fn default_backoff_base_ms() -> u64 {
    DEFAULT_BACKOFF_BASE_MS
}

fn default_block_chunk_size() -> u64 {
    DEFAULT_BLOCK_CHUNK_SIZE
}
