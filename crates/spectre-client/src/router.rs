//! Router contract `Deposit` event decoding and windowed log fetching.
//!
//! `eth_getLogs` rejects overly wide block ranges on most public RPC
//! providers, so every fetch is split into `MAX_BLOCK_RANGE`-sized windows
//! and concatenated — the same strategy Sygma's relayer uses.

use alloy_primitives::{Address, Log as PrimitiveLog, LogData, B256};
use alloy_sol_types::{sol, SolEvent};
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

sol! {
    #[derive(Debug)]
    event Deposit(
        uint8 destinationDomainID,
        uint8 securityModel,
        bytes32 resourceID,
        uint64 depositNonce,
        address indexed sender,
        bytes data
    );
}

/// Maximum number of blocks requested in a single `eth_getLogs` call.
pub const MAX_BLOCK_RANGE: u64 = 1000;

#[derive(Debug, Error)]
pub enum RouterLogError {
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed log entry: {0}")]
    Decode(String),
}

/// A decoded Router `Deposit` event, plus the block it was observed in.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DepositRecord {
    pub block_number: u64,
    pub destination_domain_id: u8,
    pub security_model: u8,
    pub resource_id: [u8; 32],
    pub deposit_nonce: u64,
    pub sender: [u8; 20],
    pub data: Vec<u8>,
}

#[derive(Deserialize)]
struct RawLog {
    address: String,
    topics: Vec<String>,
    data: String,
    #[serde(rename = "blockNumber")]
    block_number: String,
}

fn hex_u64(s: &str) -> Result<u64, RouterLogError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    u64::from_str_radix(s, 16).map_err(|e| RouterLogError::Decode(e.to_string()))
}

/// Decode a single raw JSON-RPC log entry into a `DepositRecord`, matching
/// it against the `Deposit` event's topic0 signature hash.
pub fn decode_deposit_log(raw_address: &str, topics: &[String], data_hex: &str, block_number: u64) -> Result<DepositRecord, RouterLogError> {
    let address: Address = raw_address
        .parse()
        .map_err(|_| RouterLogError::Decode(format!("invalid log address: {raw_address}")))?;

    let topic_hashes: Vec<B256> = topics
        .iter()
        .map(|t| t.parse::<B256>().map_err(|_| RouterLogError::Decode(format!("invalid topic: {t}"))))
        .collect::<Result<_, _>>()?;

    let data_bytes = {
        let s = data_hex.strip_prefix("0x").unwrap_or(data_hex);
        hex::decode(s).map_err(|e| RouterLogError::Decode(e.to_string()))?
    };

    let log_data = LogData::new(topic_hashes, data_bytes.into())
        .ok_or_else(|| RouterLogError::Decode("log topic/data shape rejected by alloy".into()))?;
    let primitive_log = PrimitiveLog { address, data: log_data };

    let decoded = Deposit::decode_log(&primitive_log, true)
        .map_err(|e| RouterLogError::Decode(e.to_string()))?
        .data;

    Ok(DepositRecord {
        block_number,
        destination_domain_id: decoded.destinationDomainID,
        security_model: decoded.securityModel,
        resource_id: decoded.resourceID.0,
        deposit_nonce: decoded.depositNonce,
        sender: decoded.sender.into_array(),
        data: decoded.data.to_vec(),
    })
}

#[derive(Serialize)]
struct EthGetLogsParams {
    address: String,
    topics: Vec<String>,
    #[serde(rename = "fromBlock")]
    from_block: String,
    #[serde(rename = "toBlock")]
    to_block: String,
}

/// Fetches `Deposit` logs from an execution-layer JSON-RPC endpoint,
/// windowing any requested range into `MAX_BLOCK_RANGE`-sized chunks.
pub struct RouterLogFetcher {
    http: reqwest::Client,
    rpc_url: String,
    router_address: String,
}

impl RouterLogFetcher {
    pub fn new(rpc_url: impl Into<String>, router_address: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            rpc_url: rpc_url.into(),
            router_address: router_address.into(),
        }
    }

    /// Fetch all `Deposit` logs in `[from_block, to_block]` inclusive.
    pub async fn fetch(&self, from_block: u64, to_block: u64) -> Result<Vec<DepositRecord>, RouterLogError> {
        let mut all = Vec::new();
        let mut window_start = from_block;
        while window_start <= to_block {
            let window_end = (window_start + MAX_BLOCK_RANGE - 1).min(to_block);
            let mut batch = self.fetch_window(window_start, window_end).await?;
            all.append(&mut batch);
            if window_end == u64::MAX {
                break;
            }
            window_start = window_end + 1;
        }
        Ok(all)
    }

    async fn fetch_window(&self, from_block: u64, to_block: u64) -> Result<Vec<DepositRecord>, RouterLogError> {
        let params = EthGetLogsParams {
            address: self.router_address.clone(),
            topics: vec![format!("0x{:x}", Deposit::SIGNATURE_HASH)],
            from_block: format!("0x{from_block:x}"),
            to_block: format!("0x{to_block:x}"),
        };

        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": "eth_getLogs",
            "params": [params],
        });

        #[derive(Deserialize)]
        struct Response {
            result: Option<Vec<RawLog>>,
            error: Option<ResponseError>,
        }
        #[derive(Deserialize)]
        struct ResponseError {
            code: i64,
            message: String,
        }

        let resp: Response = self
            .http
            .post(&self.rpc_url)
            .json(&body)
            .send()
            .await
            .map_err(|e| RouterLogError::Request { url: self.rpc_url.clone(), source: e })?
            .json()
            .await
            .map_err(|e| RouterLogError::Request { url: self.rpc_url.clone(), source: e })?;

        if let Some(error) = resp.error {
            return Err(RouterLogError::Rpc { code: error.code, message: error.message });
        }

        let decoded = resp
            .result
            .unwrap_or_default()
            .into_iter()
            .filter_map(|raw| {
                let record = hex_u64(&raw.block_number)
                    .and_then(|block_number| decode_deposit_log(&raw.address, &raw.topics, &raw.data, block_number));
                match record {
                    Ok(record) => Some(record),
                    Err(e) => {
                        tracing::error!(error = %e, address = %raw.address, "skipping malformed Deposit log");
                        None
                    }
                }
            })
            .collect();

        Ok(decoded)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy_primitives::keccak256;

    #[test]
    fn deposit_signature_hash_matches_keccak() {
        let expected = keccak256(b"Deposit(uint8,uint8,bytes32,uint64,address,bytes)");
        assert_eq!(Deposit::SIGNATURE_HASH, expected);
    }

    #[test]
    fn window_sizing_never_exceeds_max_block_range() {
        let from = 10_000u64;
        let to = 10_000 + MAX_BLOCK_RANGE * 3 - 1;
        let mut window_start = from;
        let mut windows = 0;
        while window_start <= to {
            let window_end = (window_start + MAX_BLOCK_RANGE - 1).min(to);
            assert!(window_end - window_start < MAX_BLOCK_RANGE);
            window_start = window_end + 1;
            windows += 1;
        }
        assert_eq!(windows, 3);
    }
}
