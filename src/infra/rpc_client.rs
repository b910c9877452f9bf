use alloy_primitives::{Address, U256};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};
use tracing::debug;

use crate::app::ports::VestingContractPort;
use crate::error::{ExportError, Result};
use crate::infra::vesting_abi::VestingAbi;
use crate::observability::metrics;
use crate::pipeline::rate_limiter::RateLimiter;
use crate::tokens::format_address;

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<String>,
    #[serde(default)]
    error: Option<RpcErrorObject>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorObject {
    code: i64,
    message: String,
}

/// Minimal Ethereum JSON-RPC client issuing read-only `eth_call`s
pub struct JsonRpcClient {
    http: reqwest::Client,
    url: String,
    block: String,
    limiter: RateLimiter,
    next_id: AtomicU64,
}

impl JsonRpcClient {
    pub fn new(url: &str, block: &str, timeout: Duration, limiter: RateLimiter) -> Result<Self> {
        let http = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http,
            url: url.to_string(),
            block: block_param(block),
            limiter,
            next_id: AtomicU64::new(1),
        })
    }

    pub async fn eth_call(&self, to: Address, data: &[u8]) -> Result<Vec<u8>> {
        self.limiter.acquire().await;
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let body = json!({
            "jsonrpc": "2.0",
            "id": id,
            "method": "eth_call",
            "params": [
                { "to": format_address(&to), "data": format!("0x{}", hex::encode(data)) },
                self.block,
            ],
        });

        let started = Instant::now();
        let outcome = self.send(&body).await;
        metrics::rpc::call_duration(started.elapsed().as_secs_f64());
        match &outcome {
            Ok(_) => metrics::rpc::call_success(),
            Err(_) => metrics::rpc::call_error(),
        }
        outcome
    }

    async fn send(&self, body: &serde_json::Value) -> Result<Vec<u8>> {
        let response: RpcResponse = self
            .http
            .post(&self.url)
            .json(body)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if let Some(err) = response.error {
            return Err(ExportError::Rpc {
                code: err.code,
                message: err.message,
            });
        }
        let result = response
            .result
            .ok_or_else(|| ExportError::Decode("response has neither result nor error".to_string()))?;
        debug!("eth_call returned {}", result);
        decode_hex(&result)
    }
}

/// Translates a configured block into a JSON-RPC block parameter:
/// decimal numbers become hex quantities, tags pass through.
pub fn block_param(block: &str) -> String {
    match block.trim().parse::<u64>() {
        Ok(number) => format!("{:#x}", number),
        Err(_) => block.trim().to_string(),
    }
}

pub fn decode_hex(value: &str) -> Result<Vec<u8>> {
    let digits = value.strip_prefix("0x").unwrap_or(value);
    hex::decode(digits).map_err(|e| ExportError::Decode(format!("invalid hex '{}': {}", value, e)))
}

fn first_word(bytes: &[u8]) -> Result<&[u8]> {
    if bytes.len() < 32 {
        return Err(ExportError::Decode(format!(
            "expected a 32-byte word, got {} bytes (is this a vesting contract?)",
            bytes.len()
        )));
    }
    Ok(&bytes[..32])
}

pub fn decode_address(bytes: &[u8]) -> Result<Address> {
    let word = first_word(bytes)?;
    Ok(Address::from_slice(&word[12..]))
}

pub fn decode_uint(bytes: &[u8]) -> Result<U256> {
    let word = first_word(bytes)?;
    U256::try_from_be_slice(word).ok_or_else(|| ExportError::Decode("uint256 out of range".to_string()))
}

/// `VestingContractPort` backed by a live node
pub struct RpcVestingContract {
    client: JsonRpcClient,
    abi: VestingAbi,
}

impl RpcVestingContract {
    pub fn new(client: JsonRpcClient, abi: VestingAbi) -> Self {
        Self { client, abi }
    }
}

#[async_trait]
impl VestingContractPort for RpcVestingContract {
    async fn token(&self, vesting: Address) -> Result<Address> {
        let bytes = self.client.eth_call(vesting, &self.abi.token).await?;
        decode_address(&bytes)
    }

    async fn released(&self, vesting: Address) -> Result<U256> {
        let bytes = self.client.eth_call(vesting, &self.abi.released).await?;
        decode_uint(&bytes)
    }

    async fn releasable_amount(&self, vesting: Address) -> Result<U256> {
        let bytes = self.client.eth_call(vesting, &self.abi.releasable_amount).await?;
        decode_uint(&bytes)
    }
}
