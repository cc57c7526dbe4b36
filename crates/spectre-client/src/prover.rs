//! JSON-RPC 2.0 client for the SNARK prover service.
//!
//! The prover's wire format predates typed byte arrays in its JSON-RPC
//! schema: every byte field is transported as a JSON array of `u16`, one
//! entry per byte. This module is the only place that legacy encoding is
//! visible — everything above `ProverClient` deals in plain `Vec<u8>` and
//! `spectre_core` types.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::json;
use thiserror::Error;

use spectre_core::types::beacon::{BlsPublicKey, LightClientUpdate, SpecTag};
use spectre_core::witness_builder::{ProverClient, RotateProofResponse, StepProofResponse};
use spectre_core::WitnessError;

#[derive(Debug, Error)]
pub enum ProverRpcError {
    #[error("HTTP request to prover at {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("prover returned JSON-RPC error {code}: {message}")]
    Rpc { code: i64, message: String },
    #[error("malformed prover response: {0}")]
    Decode(String),
}

impl From<ProverRpcError> for WitnessError {
    fn from(e: ProverRpcError) -> Self {
        match &e {
            ProverRpcError::Request { .. } => WitnessError::Transport(e.to_string()),
            ProverRpcError::Rpc { .. } => WitnessError::Prover(e.to_string()),
            ProverRpcError::Decode(_) => WitnessError::Decoding(e.to_string()),
        }
    }
}

/// Legacy "byte-as-u16" wire encoding: one JSON number per byte.
fn encode_u16_bytes(bytes: &[u8]) -> Vec<u16> {
    bytes.iter().map(|&b| b as u16).collect()
}

fn decode_u16_bytes(values: &[u16]) -> Result<Vec<u8>, ProverRpcError> {
    values
        .iter()
        .map(|&v| {
            u8::try_from(v).map_err(|_| ProverRpcError::Decode(format!("byte value out of range: {v}")))
        })
        .collect()
}

/// Parse the prover's `committee_poseidon` field — a decimal or `0x`-hex
/// big integer string — reduced to its big-endian 32-byte representation.
fn parse_committee_poseidon(raw: &str) -> Result<[u8; 32], ProverRpcError> {
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let bytes = if raw.starts_with("0x") {
        hex::decode(format!("{:0>64}", digits)).map_err(|e| ProverRpcError::Decode(e.to_string()))?
    } else {
        big_decimal_to_be_bytes(digits)?
    };
    let mut out = [0u8; 32];
    let start = 32usize.saturating_sub(bytes.len());
    out[start..].copy_from_slice(&bytes[bytes.len().saturating_sub(32)..]);
    Ok(out)
}

/// Convert a base-10 string to big-endian bytes via repeated divmod-256 —
/// the field is a ~254-bit Poseidon hash, too wide for any native integer.
fn big_decimal_to_be_bytes(decimal: &str) -> Result<Vec<u8>, ProverRpcError> {
    let mut digits: Vec<u8> = decimal
        .bytes()
        .map(|b| {
            if b.is_ascii_digit() {
                Ok(b - b'0')
            } else {
                Err(ProverRpcError::Decode(format!("not a decimal string: {decimal}")))
            }
        })
        .collect::<Result<_, _>>()?;

    let mut out = Vec::new();
    while !(digits.len() == 1 && digits[0] == 0) {
        let mut remainder = 0u32;
        let mut next_digits = Vec::with_capacity(digits.len());
        for &d in &digits {
            let acc = remainder * 10 + d as u32;
            next_digits.push((acc / 256) as u8);
            remainder = acc % 256;
        }
        while next_digits.len() > 1 && next_digits[0] == 0 {
            next_digits.remove(0);
        }
        out.push(remainder as u8);
        digits = next_digits;
        if digits.is_empty() {
            break;
        }
    }
    out.reverse();
    if out.is_empty() {
        out.push(0);
    }
    Ok(out)
}

#[derive(Serialize)]
struct RpcRequest<'a> {
    jsonrpc: &'static str,
    id: u64,
    method: &'a str,
    params: serde_json::Value,
}

#[derive(Deserialize)]
struct RpcResponse<T> {
    result: Option<T>,
    error: Option<RpcError>,
}

#[derive(Deserialize)]
struct RpcError {
    code: i64,
    message: String,
}

#[derive(Deserialize)]
struct StepProofResult {
    proof: Vec<u16>,
}

#[derive(Deserialize)]
struct RotateProofResult {
    proof: Vec<u16>,
    committee_poseidon: String,
}

fn light_client_update_payload(update: &LightClientUpdate) -> serde_json::Value {
    json!({
        "attested_header": update.attested_header,
        "next_sync_committee": update.next_sync_committee,
        "next_sync_committee_branch": update.next_sync_committee_branch,
        "finalized_header": update.finalized_header,
        "finality_branch": update.finality_branch,
        "sync_aggregate": update.sync_aggregate,
        "signature_slot": update.signature_slot,
    })
}

/// Talks JSON-RPC 2.0 to a single prover HTTP endpoint. The prover is
/// shared across every domain's listener loop, so calls must be safe to
/// issue concurrently; `reqwest::Client` is cheaply cloneable and
/// connection-pooled, so no internal locking is needed.
pub struct JsonRpcProverClient {
    http: reqwest::Client,
    url: String,
}

impl JsonRpcProverClient {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            url: url.into(),
        }
    }

    async fn call<T: for<'de> Deserialize<'de>>(
        &self,
        method: &str,
        params: serde_json::Value,
    ) -> Result<T, ProverRpcError> {
        let request = RpcRequest {
            jsonrpc: "2.0",
            id: 1,
            method,
            params,
        };
        let resp: RpcResponse<T> = self
            .http
            .post(&self.url)
            .json(&request)
            .send()
            .await
            .map_err(|e| ProverRpcError::Request {
                url: self.url.clone(),
                source: e,
            })?
            .json()
            .await
            .map_err(|e| ProverRpcError::Request {
                url: self.url.clone(),
                source: e,
            })?;

        if let Some(error) = resp.error {
            return Err(ProverRpcError::Rpc {
                code: error.code,
                message: error.message,
            });
        }
        resp.result
            .ok_or_else(|| ProverRpcError::Decode("response had neither result nor error".into()))
    }
}

#[async_trait]
impl ProverClient for JsonRpcProverClient {
    async fn gen_step_proof(
        &self,
        spec: SpecTag,
        pubkeys: &[BlsPublicKey],
        domain: [u8; 32],
        update: &LightClientUpdate,
    ) -> Result<StepProofResponse, WitnessError> {
        let pubkey_bytes: Vec<Vec<u16>> = pubkeys.iter().map(|k| encode_u16_bytes(&k.0)).collect();
        let params = json!({
            "spec": spec,
            "pubkeys": pubkey_bytes,
            "domain": encode_u16_bytes(&domain),
            "light_client_finality_update": light_client_update_payload(update),
        });

        let result: StepProofResult = self
            .call("genEvmProof_SyncStepCompressed", params)
            .await
            .map_err(ProverRpcError::from)
            .map_err(WitnessError::from)?;

        Ok(StepProofResponse {
            proof: decode_u16_bytes(&result.proof).map_err(WitnessError::from)?,
        })
    }

    async fn gen_rotate_proof(
        &self,
        spec: SpecTag,
        update: &LightClientUpdate,
    ) -> Result<RotateProofResponse, WitnessError> {
        let params = json!({
            "spec": spec,
            "light_client_update": light_client_update_payload(update),
        });

        let result: RotateProofResult = self
            .call("genEvmProof_CommitteeUpdateCompressed", params)
            .await
            .map_err(ProverRpcError::from)
            .map_err(WitnessError::from)?;

        Ok(RotateProofResponse {
            proof: decode_u16_bytes(&result.proof).map_err(WitnessError::from)?,
            committee_poseidon: parse_committee_poseidon(&result.committee_poseidon)
                .map_err(WitnessError::from)?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn u16_byte_encoding_round_trips() {
        let bytes = vec![0u8, 1, 255, 128, 42];
        let encoded = encode_u16_bytes(&bytes);
        let decoded = decode_u16_bytes(&encoded).unwrap();
        assert_eq!(decoded, bytes);
    }

    #[test]
    fn decode_rejects_out_of_range_values() {
        assert!(decode_u16_bytes(&[0, 300, 1]).is_err());
    }

    #[test]
    fn parse_committee_poseidon_accepts_hex() {
        let parsed = parse_committee_poseidon(&format!("0x{}", "ab".repeat(32))).unwrap();
        assert_eq!(parsed, [0xab; 32]);
    }

    #[test]
    fn parse_committee_poseidon_accepts_decimal_zero() {
        let parsed = parse_committee_poseidon("0").unwrap();
        assert_eq!(parsed, [0u8; 32]);
    }

    #[test]
    fn parse_committee_poseidon_decimal_matches_known_value() {
        // 256 == 0x0100
        let parsed = parse_committee_poseidon("256").unwrap();
        let mut expected = [0u8; 32];
        expected[30] = 1;
        assert_eq!(parsed, expected);
    }
}
