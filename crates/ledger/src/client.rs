use std::thread::sleep;
use std::time::Duration;

use rand::Rng;
use reqwest::blocking::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::LedgerError;
use crate::fetch::LogSource;
use crate::logs::{parse_quantity, LogFilter, RawLog};

pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_BACKOFF_BASE_MS: u64 = 500;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RpcConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Retries after the first attempt.
    pub max_retries: u32,
    /// First backoff delay; doubled on every retry.
    pub backoff_base: Duration,
}

impl Default for RpcConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            max_retries: DEFAULT_MAX_RETRIES,
            backoff_base: Duration::from_millis(DEFAULT_BACKOFF_BASE_MS),
        }
    }
}

/// Blocking EVM JSON-RPC client with timeouts and jittered exponential
/// backoff on transient failures.
#[derive(Clone, Debug)]
pub struct RpcClient {
    http: Client,
    url: String,
    config: RpcConfig,
}

#[derive(Serialize)]
struct Request<'a, P> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: P,
}

#[derive(Deserialize)]
struct Envelope<T> {
    result: Option<T>,
    error: Option<RpcErrorBody>,
}

#[derive(Deserialize)]
struct RpcErrorBody {
    code: i64,
    message: String,
}

impl RpcClient {
    pub fn new(url: impl Into<String>, config: RpcConfig) -> Result<Self, LedgerError> {
        let http = Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            http,
            url: url.into(),
            config,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Delay before retry number `attempt` (1-based): `base * 2^(attempt-1)`
    /// plus up to `base` of random jitter.
    pub fn backoff_with_jitter(&self, attempt: u32) -> Duration {
        let base = self.config.backoff_base;
        let exp = base.saturating_mul(1u32 << attempt.saturating_sub(1).min(16));
        let jitter_ms = base.as_millis() as u64;
        let extra = if jitter_ms == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..jitter_ms)
        };
        exp + Duration::from_millis(extra)
    }

    fn call_once<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: &P,
    ) -> Result<R, LedgerError> {
        let request = Request {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let response = self.http.post(&self.url).json(&request).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LedgerError::Status {
                status: status.as_u16(),
            });
        }
        let envelope: Envelope<R> = response.json()?;
        if let Some(err) = envelope.error {
            return Err(LedgerError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        envelope.result.ok_or_else(|| LedgerError::Rpc {
            code: 0,
            message: format!("{method} returned neither result nor error"),
        })
    }

    /// Perform a JSON-RPC call, retrying transient failures.
    pub fn call<P: Serialize, R: DeserializeOwned>(
        &self,
        method: &str,
        params: P,
    ) -> Result<R, LedgerError> {
        let mut attempt = 0u32;
        loop {
            match self.call_once(method, &params) {
                Ok(result) => return Ok(result),
                Err(err) if err.is_retryable() && attempt < self.config.max_retries => {
                    attempt += 1;
                    let delay = self.backoff_with_jitter(attempt);
                    warn!(
                        method,
                        attempt,
                        delay_ms = delay.as_millis() as u64,
                        error = %err,
                        "rpc call failed, retrying"
                    );
                    sleep(delay);
                }
                Err(err) if err.is_retryable() => {
                    return Err(LedgerError::Unavailable {
                        attempts: attempt + 1,
                        last_error: err.to_string(),
                    });
                }
                Err(err) => return Err(err),
            }
        }
    }
}

impl LogSource for RpcClient {
    fn block_number(&self) -> Result<u64, LedgerError> {
        let head: String = self.call("eth_blockNumber", Vec::<()>::new())?;
        parse_quantity("blockNumber", &head)
    }

    fn get_logs(&self, filter: &LogFilter) -> Result<Vec<RawLog>, LedgerError> {
        debug!(
            from = %filter.from_block,
            to = %filter.to_block,
            "eth_getLogs"
        );
        self.call("eth_getLogs", [filter])
    }
}
