//! Beacon API JSON format adapter.
//!
//! The Ethereum beacon chain REST API uses a different JSON shape than
//! `spectre_core`'s internal types (string-encoded numbers, 0x-hex strings,
//! headers nested as `{ beacon: {...}, execution: {...} }`, everything
//! wrapped in `{ data: {...} }`). This module owns that conversion and
//! implements `spectre_core::BeaconAdapter` against a real beacon node over
//! `reqwest`.

use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

use spectre_core::types::beacon::{
    BeaconBlockHeader, BlsPublicKey, BlsSignature, ExecutionPayloadHeader, LightClientBootstrap,
    LightClientUpdate, SyncAggregate, SyncCommittee,
};
use spectre_core::witness_builder::BeaconAdapter;
use spectre_core::WitnessError;

#[derive(Debug, Error)]
pub enum BeaconApiError {
    #[error("HTTP request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("beacon API returned status {status} for {url}")]
    Status { url: String, status: u16 },
    #[error("malformed beacon API response: {0}")]
    Decode(String),
}

impl From<BeaconApiError> for WitnessError {
    fn from(e: BeaconApiError) -> Self {
        WitnessError::Transport(e.to_string())
    }
}

fn hex_to_bytes32(s: &str) -> Result<[u8; 32], BeaconApiError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| BeaconApiError::Decode(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| BeaconApiError::Decode("expected 32 bytes".into()))
}

fn hex_to_bytes20(s: &str) -> Result<[u8; 20], BeaconApiError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    let bytes = hex::decode(s).map_err(|e| BeaconApiError::Decode(e.to_string()))?;
    bytes
        .try_into()
        .map_err(|_| BeaconApiError::Decode("expected 20 bytes".into()))
}

fn hex_to_bytes(s: &str) -> Result<Vec<u8>, BeaconApiError> {
    let s = s.strip_prefix("0x").unwrap_or(s);
    hex::decode(s).map_err(|e| BeaconApiError::Decode(e.to_string()))
}

fn parse_u64(s: &str) -> Result<u64, BeaconApiError> {
    s.parse().map_err(|_| BeaconApiError::Decode(format!("not a u64: {s}")))
}

#[derive(Deserialize)]
struct ApiBeaconBlockHeader {
    slot: String,
    proposer_index: String,
    parent_root: String,
    state_root: String,
    body_root: String,
}

impl ApiBeaconBlockHeader {
    fn into_core(self) -> Result<BeaconBlockHeader, BeaconApiError> {
        Ok(BeaconBlockHeader {
            slot: parse_u64(&self.slot)?,
            proposer_index: parse_u64(&self.proposer_index)?,
            parent_root: hex_to_bytes32(&self.parent_root)?,
            state_root: hex_to_bytes32(&self.state_root)?,
            body_root: hex_to_bytes32(&self.body_root)?,
        })
    }
}

#[derive(Deserialize)]
struct ApiExecutionPayloadHeader {
    parent_hash: String,
    fee_recipient: String,
    state_root: String,
    receipts_root: String,
    block_number: String,
    gas_limit: String,
    gas_used: String,
    timestamp: String,
    base_fee_per_gas: String,
    block_hash: String,
    transactions_root: String,
    withdrawals_root: String,
}

impl ApiExecutionPayloadHeader {
    fn into_core(self) -> Result<ExecutionPayloadHeader, BeaconApiError> {
        Ok(ExecutionPayloadHeader {
            parent_hash: hex_to_bytes32(&self.parent_hash)?,
            fee_recipient: hex_to_bytes20(&self.fee_recipient)?,
            state_root: hex_to_bytes32(&self.state_root)?,
            receipts_root: hex_to_bytes32(&self.receipts_root)?,
            block_number: parse_u64(&self.block_number)?,
            gas_limit: parse_u64(&self.gas_limit)?,
            gas_used: parse_u64(&self.gas_used)?,
            timestamp: parse_u64(&self.timestamp)?,
            base_fee_per_gas: parse_u64(&self.base_fee_per_gas)?,
            block_hash: hex_to_bytes32(&self.block_hash)?,
            transactions_root: hex_to_bytes32(&self.transactions_root)?,
            withdrawals_root: hex_to_bytes32(&self.withdrawals_root)?,
        })
    }
}

#[derive(Deserialize)]
struct ApiLightClientHeader {
    beacon: ApiBeaconBlockHeader,
    execution: Option<ApiExecutionPayloadHeader>,
}

#[derive(Deserialize)]
struct ApiSyncAggregate {
    sync_committee_bits: String,
    sync_committee_signature: String,
}

impl ApiSyncAggregate {
    fn into_core(self) -> Result<SyncAggregate, BeaconApiError> {
        let bits = hex_to_bytes(&self.sync_committee_bits)?;
        let sig_bytes = hex_to_bytes(&self.sync_committee_signature)?;
        let signature = BlsSignature::from_bytes(&sig_bytes)
            .map_err(|e| BeaconApiError::Decode(e.to_string()))?;
        Ok(SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: signature,
        })
    }
}

#[derive(Deserialize)]
struct ApiSyncCommittee {
    pubkeys: Vec<String>,
    aggregate_pubkey: String,
}

impl ApiSyncCommittee {
    fn into_core(self) -> Result<SyncCommittee, BeaconApiError> {
        let pubkeys = self
            .pubkeys
            .iter()
            .map(|s| {
                let bytes = hex_to_bytes(s)?;
                BlsPublicKey::from_bytes(&bytes).map_err(|e| BeaconApiError::Decode(e.to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let agg_bytes = hex_to_bytes(&self.aggregate_pubkey)?;
        let aggregate_pubkey =
            BlsPublicKey::from_bytes(&agg_bytes).map_err(|e| BeaconApiError::Decode(e.to_string()))?;
        Ok(SyncCommittee {
            pubkeys,
            aggregate_pubkey,
        })
    }
}

#[derive(Deserialize)]
struct ApiBootstrapResponse {
    data: ApiBootstrapData,
}

#[derive(Deserialize)]
struct ApiBootstrapData {
    header: ApiLightClientHeader,
    current_sync_committee: ApiSyncCommittee,
    current_sync_committee_branch: Vec<String>,
}

#[derive(Deserialize)]
struct ApiLightClientUpdateEnvelope {
    data: ApiLightClientUpdateData,
}

#[derive(Deserialize)]
struct ApiLightClientUpdateData {
    attested_header: ApiLightClientHeader,
    next_sync_committee: Option<ApiSyncCommittee>,
    next_sync_committee_branch: Option<Vec<String>>,
    finalized_header: ApiLightClientHeader,
    finality_branch: Vec<String>,
    sync_aggregate: ApiSyncAggregate,
    signature_slot: String,
}

impl ApiLightClientUpdateData {
    fn into_core(self) -> Result<LightClientUpdate, BeaconApiError> {
        let finality_branch = self
            .finality_branch
            .iter()
            .map(|s| hex_to_bytes32(s))
            .collect::<Result<Vec<_>, _>>()?;

        let next_sync_committee_branch = self
            .next_sync_committee_branch
            .unwrap_or_default()
            .iter()
            .map(|s| hex_to_bytes32(s))
            .collect::<Result<Vec<_>, _>>()?;

        let finalized_execution = self
            .finalized_header
            .execution
            .map(|e| e.into_core())
            .transpose()?;

        Ok(LightClientUpdate {
            attested_header: self.attested_header.beacon.into_core()?,
            next_sync_committee: self
                .next_sync_committee
                .map(|c| c.into_core())
                .transpose()?,
            next_sync_committee_branch,
            finalized_header: self.finalized_header.beacon.into_core()?,
            finalized_execution,
            finality_branch,
            sync_aggregate: self.sync_aggregate.into_core()?,
            signature_slot: parse_u64(&self.signature_slot)?,
        })
    }
}

#[derive(Deserialize)]
struct ApiHeaderResponse {
    data: ApiHeaderData,
}

#[derive(Deserialize)]
struct ApiHeaderData {
    root: String,
}

#[derive(Deserialize)]
struct ApiGenesisResponse {
    data: ApiGenesisData,
}

#[derive(Deserialize)]
struct ApiGenesisData {
    genesis_validators_root: String,
}

#[derive(Deserialize)]
struct ApiForkResponse {
    data: ApiForkData,
}

#[derive(Deserialize)]
struct ApiForkData {
    current_version: String,
}

#[derive(Deserialize)]
struct ApiSignedBlockResponse {
    data: ApiSignedBlockData,
}

#[derive(Deserialize)]
struct ApiSignedBlockData {
    message: ApiBeaconBlockMessage,
}

#[derive(Deserialize)]
struct ApiBeaconBlockMessage {
    body: ApiBeaconBlockBody,
}

#[derive(Deserialize)]
struct ApiBeaconBlockBody {
    execution_payload: ApiExecutionPayloadBlockNumber,
}

#[derive(Deserialize)]
struct ApiExecutionPayloadBlockNumber {
    block_number: String,
}

/// An `HttpBeaconAdapter` reaches a standard Ethereum beacon node REST API.
/// The one-time genesis-validators-root lookup is cached for the lifetime
/// of the adapter; fork version is re-fetched per `domain()` call since it
/// changes at hard forks.
pub struct HttpBeaconAdapter {
    http: reqwest::Client,
    base_url: String,
    genesis_validators_root: tokio::sync::OnceCell<[u8; 32]>,
}

impl HttpBeaconAdapter {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into(),
            genesis_validators_root: tokio::sync::OnceCell::new(),
        }
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, path: &str) -> Result<T, BeaconApiError> {
        let url = format!("{}{}", self.base_url, path);
        let resp = self
            .http
            .get(&url)
            .send()
            .await
            .map_err(|e| BeaconApiError::Request { url: url.clone(), source: e })?;
        if !resp.status().is_success() {
            return Err(BeaconApiError::Status {
                url,
                status: resp.status().as_u16(),
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| BeaconApiError::Request { url, source: e })
    }

    async fn genesis_validators_root(&self) -> Result<[u8; 32], BeaconApiError> {
        self.genesis_validators_root
            .get_or_try_init(|| async {
                let resp: ApiGenesisResponse = self.get_json("/eth/v1/beacon/genesis").await?;
                hex_to_bytes32(&resp.data.genesis_validators_root)
            })
            .await
            .copied()
    }
}

#[async_trait]
impl BeaconAdapter for HttpBeaconAdapter {
    async fn finality_update(&self) -> Result<LightClientUpdate, WitnessError> {
        let resp: ApiLightClientUpdateEnvelope = self
            .get_json("/eth/v1/beacon/light_client/finality_update")
            .await?;
        Ok(resp.data.into_core()?)
    }

    async fn beacon_block_root(&self, slot: u64) -> Result<[u8; 32], WitnessError> {
        let resp: ApiHeaderResponse = self
            .get_json(&format!("/eth/v1/beacon/headers/{slot}"))
            .await?;
        Ok(hex_to_bytes32(&resp.data.root)?)
    }

    async fn bootstrap(&self, block_root: [u8; 32]) -> Result<LightClientBootstrap, WitnessError> {
        let resp: ApiBootstrapResponse = self
            .get_json(&format!(
                "/eth/v1/beacon/light_client/bootstrap/0x{}",
                hex::encode(block_root)
            ))
            .await?;
        let current_sync_committee_branch = resp
            .data
            .current_sync_committee_branch
            .iter()
            .map(|s| hex_to_bytes32(s))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(LightClientBootstrap {
            header: resp.data.header.beacon.into_core()?,
            current_sync_committee: resp.data.current_sync_committee.into_core()?,
            current_sync_committee_branch,
        })
    }

    async fn updates(
        &self,
        start_period: u64,
        count: u8,
    ) -> Result<Vec<LightClientUpdate>, WitnessError> {
        let path = format!(
            "/eth/v1/beacon/light_client/updates?start_period={start_period}&count={count}"
        );
        let envelopes: Vec<ApiLightClientUpdateEnvelope> = self.get_json(&path).await?;
        envelopes
            .into_iter()
            .map(|e| e.data.into_core().map_err(WitnessError::from))
            .collect()
    }

    async fn domain(&self, domain_type: [u8; 4], _epoch: u64) -> Result<[u8; 32], WitnessError> {
        let fork: ApiForkResponse = self.get_json("/eth/v1/beacon/states/head/fork").await?;
        let fork_version = {
            let bytes = hex_to_bytes(&fork.data.current_version)?;
            let arr: [u8; 4] = bytes
                .try_into()
                .map_err(|_| BeaconApiError::Decode("fork version must be 4 bytes".into()))?;
            arr
        };
        let genesis_validators_root = self.genesis_validators_root().await?;
        Ok(spectre_core::ssz::compute_domain(
            domain_type,
            fork_version,
            genesis_validators_root,
        ))
    }

    async fn signed_block_number(&self, slot: u64) -> Result<u64, WitnessError> {
        let resp: ApiSignedBlockResponse = self
            .get_json(&format!("/eth/v2/beacon/blocks/{slot}"))
            .await?;
        Ok(parse_u64(&resp.data.message.body.execution_payload.block_number)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hex_to_bytes32_strips_prefix() {
        let bytes = hex_to_bytes32(&format!("0x{}", "11".repeat(32))).unwrap();
        assert_eq!(bytes, [0x11; 32]);
    }

    #[test]
    fn parse_u64_rejects_non_numeric() {
        assert!(parse_u64("not-a-number").is_err());
    }

    #[tokio::test]
    async fn finality_update_surfaces_transport_errors_as_retryable() {
        let adapter = HttpBeaconAdapter::new("http://127.0.0.1:1".to_string());
        let err = adapter.finality_update().await.unwrap_err();
        assert!(err.is_retryable());
    }
}
