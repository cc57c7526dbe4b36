use serde::{Deserialize, Serialize};

use super::beacon::{
    BeaconBlockHeader, BlsPublicKey, ExecutionPayloadHeader, LightClientUpdate, SpecTag,
    SyncAggregate,
};

/// Everything the prover needs to produce a sync-step proof: the 512
/// current-committee pubkeys, the signing domain, and the finality update
/// being attested to.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepWitness {
    pub spec: SpecTag,
    pub pubkeys: Vec<BlsPublicKey>,
    pub domain: [u8; 32],
    pub attested_header: BeaconBlockHeader,
    pub finalized_header: BeaconBlockHeader,
    pub finalized_execution: Option<ExecutionPayloadHeader>,
    pub finality_branch: Vec<[u8; 32]>,
    pub sync_aggregate: SyncAggregate,
    pub signature_slot: u64,
}

impl StepWitness {
    /// Reconstruct the finality-update shape the prover RPC expects from
    /// the witness's flattened fields.
    pub fn to_light_client_update(&self) -> LightClientUpdate {
        LightClientUpdate {
            attested_header: self.attested_header.clone(),
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
            finalized_header: self.finalized_header.clone(),
            finalized_execution: self.finalized_execution.clone(),
            finality_branch: self.finality_branch.clone(),
            sync_aggregate: self.sync_aggregate.clone(),
            signature_slot: self.signature_slot,
        }
    }
}

/// Everything the prover needs to produce a committee-rotation proof.
///
/// Invariant: by the time this reaches `rotate_proof`, `attested_header`
/// equals `update.finalized_header` — the caller normalizes this before
/// calling the prover (see `witness_builder::rotate_proof`).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotateWitness {
    pub spec: SpecTag,
    pub update: LightClientUpdate,
    pub pubkeys: Vec<BlsPublicKey>,
    pub domain: [u8; 32],
}

/// On-chain `stepInput` tuple.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepInput {
    pub attested_slot: u64,
    pub finalized_slot: u64,
    pub participation: u64,
    pub finalized_header_root: [u8; 32],
    pub execution_payload_root: [u8; 32],
}

/// On-chain `rotateInput` tuple — the simpler `(syncCommitteeSSZ,
/// syncCommitteePoseidon)` shape (see DESIGN.md for why the 12-limb
/// accumulator variant is not implemented).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotateInput {
    pub sync_committee_ssz: [u8; 32],
    pub sync_committee_poseidon: [u8; 32],
}

/// A proof artifact paired with the on-chain tuple it accompanies.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Proof<T> {
    pub bytes: Vec<u8>,
    pub input: T,
}

/// The Step proof payload attached to a Step message, including the
/// destination-chain state-root inclusion proof.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StepPayload {
    pub step: Proof<StepInput>,
    pub state_root: [u8; 32],
    pub state_root_proof: Vec<[u8; 32]>,
}

/// The Rotate proof payload — always carries the companion Step proof for
/// the same finality checkpoint.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RotatePayload {
    pub rotate: Proof<RotateInput>,
    pub step: Proof<StepInput>,
}
