use serde::{Deserialize, Serialize};

/// Number of validators in the Ethereum beacon chain sync committee.
pub const SYNC_COMMITTEE_SIZE: usize = 512;

/// Number of bytes in a BLS12-381 public key (compressed).
pub const BLS_PUBKEY_LEN: usize = 48;

/// Number of bytes in a BLS12-381 signature (compressed).
pub const BLS_SIGNATURE_LEN: usize = 96;

/// Slots per epoch.
pub const SLOTS_PER_EPOCH: u64 = 32;

/// Epochs per sync committee period, default value (overridable per domain).
pub const DEFAULT_COMMITTEE_PERIOD_LENGTH: u64 = 256;

/// Domain type for sync committee signatures: `0x07000000`.
pub const SYNC_COMMITTEE_DOMAIN: [u8; 4] = [0x07, 0x00, 0x00, 0x00];

/// Unix timestamp epoch-numbering is anchored to, used by
/// `epoch_from_timestamp`.
pub const EPOCH_ANCHOR_TIME: u64 = 1_506_203_091;

/// Seconds per epoch used by `epoch_from_timestamp`.
pub const EPOCH_TIME_SECONDS: u64 = 432_000;

/// A BLS12-381 public key (48 bytes, compressed G1 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsPublicKey(pub [u8; BLS_PUBKEY_LEN]);

impl Serialize for BlsPublicKey {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsPublicKey {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsPublicKey {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_PUBKEY_LEN {
            return Err("invalid BLS public key length");
        }
        let mut arr = [0u8; BLS_PUBKEY_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A BLS12-381 signature (96 bytes, compressed G2 point).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlsSignature(pub [u8; BLS_SIGNATURE_LEN]);

impl Serialize for BlsSignature {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&format!("0x{}", hex::encode(self.0)))
    }
}

impl<'de> Deserialize<'de> for BlsSignature {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        let s = s.strip_prefix("0x").unwrap_or(&s);
        let bytes = hex::decode(s).map_err(serde::de::Error::custom)?;
        Self::from_bytes(&bytes).map_err(serde::de::Error::custom)
    }
}

impl BlsSignature {
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, &'static str> {
        if bytes.len() != BLS_SIGNATURE_LEN {
            return Err("invalid BLS signature length");
        }
        let mut arr = [0u8; BLS_SIGNATURE_LEN];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }
}

/// A beacon chain block header — the minimal view needed to build and
/// verify light-client witnesses.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconBlockHeader {
    pub slot: u64,
    pub proposer_index: u64,
    pub parent_root: [u8; 32],
    pub state_root: [u8; 32],
    pub body_root: [u8; 32],
}

/// The sync committee — 512 validators that sign off on the chain head.
/// Rotates every `committee_period_length` epochs (256 by default).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncCommittee {
    pub pubkeys: Vec<BlsPublicKey>,
    pub aggregate_pubkey: BlsPublicKey,
}

impl SyncCommittee {
    pub fn validate(&self) -> Result<(), &'static str> {
        if self.pubkeys.len() != SYNC_COMMITTEE_SIZE {
            return Err("sync committee must have exactly 512 members");
        }
        Ok(())
    }
}

/// The aggregate BLS signature from the sync committee, plus the 512-bit
/// participation bitmap (64 bytes, one bit per committee member).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncAggregate {
    pub sync_committee_bits: Vec<u8>,
    pub sync_committee_signature: BlsSignature,
}

impl SyncAggregate {
    /// Popcount over the 64-byte bitmap — the on-chain `participation` field.
    pub fn participation(&self) -> u64 {
        self.sync_committee_bits
            .iter()
            .map(|byte| byte.count_ones() as u64)
            .sum()
    }
}

/// A light-client finality update, optionally carrying the next sync
/// committee (in which case it is a full light-client *update*, sufficient
/// to rotate the committee).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientUpdate {
    pub attested_header: BeaconBlockHeader,
    pub next_sync_committee: Option<SyncCommittee>,
    pub next_sync_committee_branch: Vec<[u8; 32]>,
    pub finalized_header: BeaconBlockHeader,
    pub finalized_execution: Option<ExecutionPayloadHeader>,
    pub finality_branch: Vec<[u8; 32]>,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
}

/// A light-client bootstrap — the trusted checkpoint header plus the
/// current sync committee, used to seed `Step`/`Rotate` witnesses.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LightClientBootstrap {
    pub header: BeaconBlockHeader,
    pub current_sync_committee: SyncCommittee,
    pub current_sync_committee_branch: Vec<[u8; 32]>,
}

/// Execution payload header — the link between beacon and execution
/// layers. `state_root` is the leaf the relayer proves inclusion of at
/// generalized index 34.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionPayloadHeader {
    pub parent_hash: [u8; 32],
    pub fee_recipient: [u8; 20],
    pub state_root: [u8; 32],
    pub receipts_root: [u8; 32],
    pub block_number: u64,
    pub gas_limit: u64,
    pub gas_used: u64,
    pub timestamp: u64,
    pub base_fee_per_gas: u64,
    pub block_hash: [u8; 32],
    pub transactions_root: [u8; 32],
    pub withdrawals_root: [u8; 32],
}

/// Which network parameter set the prover should use. Carried verbatim
/// into every prover RPC call.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SpecTag {
    Mainnet,
    Testnet,
    Minimal,
}

impl std::str::FromStr for SpecTag {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "mainnet" => Ok(Self::Mainnet),
            "testnet" => Ok(Self::Testnet),
            "minimal" => Ok(Self::Minimal),
            other => Err(format!("unknown spec tag: {other}")),
        }
    }
}

impl Default for SpecTag {
    fn default() -> Self {
        Self::Mainnet
    }
}

/// Convert a unix timestamp to an epoch number. Not on the hot path —
/// used by callers (and tests) that need to reason about
/// epoch/timestamp relationships when building fixtures.
pub fn epoch_from_timestamp(timestamp: u64) -> u64 {
    timestamp.saturating_sub(EPOCH_ANCHOR_TIME) / EPOCH_TIME_SECONDS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bls_pubkey_round_trips_through_hex() {
        let key = BlsPublicKey([7u8; BLS_PUBKEY_LEN]);
        let json = serde_json::to_string(&key).unwrap();
        let back: BlsPublicKey = serde_json::from_str(&json).unwrap();
        assert_eq!(key, back);
    }

    #[test]
    fn sync_aggregate_participation_counts_bits() {
        let mut bits = vec![0u8; 64];
        bits[0] = 0b1111_1111;
        bits[1] = 0b0000_0001;
        let aggregate = SyncAggregate {
            sync_committee_bits: bits,
            sync_committee_signature: BlsSignature([0u8; BLS_SIGNATURE_LEN]),
        };
        assert_eq!(aggregate.participation(), 9);
    }

    #[test]
    fn spec_tag_parses_case_insensitively() {
        assert_eq!("Mainnet".parse::<SpecTag>().unwrap(), SpecTag::Mainnet);
        assert_eq!("MINIMAL".parse::<SpecTag>().unwrap(), SpecTag::Minimal);
        assert!("invalid".parse::<SpecTag>().is_err());
    }

    #[test]
    fn epoch_from_timestamp_is_monotonic() {
        let e1 = epoch_from_timestamp(EPOCH_ANCHOR_TIME + 1000);
        let e2 = epoch_from_timestamp(EPOCH_ANCHOR_TIME + EPOCH_TIME_SECONDS * 3);
        assert!(e2 > e1);
    }
}
