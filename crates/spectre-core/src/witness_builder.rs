//! Assembles Step and Rotate witnesses from beacon/light-client data, and
//! turns them into the on-chain tuples the verifier contract expects.
//!
//! The two trait boundaries here (`BeaconAdapter`, `ProverClient`) are the
//! entire surface this module touches the outside world through;
//! `spectre-client` supplies the real HTTP/JSON-RPC implementations, and
//! tests drive these functions against hand-written fakes.

use async_trait::async_trait;

use crate::error::WitnessError;
use crate::ssz::{hash_beacon_block_header, hash_tree_root_execution_payload_header,
    hash_tree_root_sync_committee_pubkeys};
use crate::types::beacon::{
    BlsPublicKey, LightClientBootstrap, LightClientUpdate, SpecTag, SYNC_COMMITTEE_DOMAIN,
};
use crate::types::witness::{Proof, RotateInput, RotateWitness, StepInput, StepWitness};

/// Typed view over the beacon chain HTTP API and its light-client
/// extension. All operations fail with `WitnessError::Transport` — the
/// listener treats every such failure as retryable.
#[async_trait]
pub trait BeaconAdapter: Send + Sync {
    /// The current `finalized` checkpoint: its beacon-block root and the
    /// full header at that slot.
    async fn finality_update(&self) -> Result<LightClientUpdate, WitnessError>;

    /// `beaconBlockRoot(slot)`.
    async fn beacon_block_root(&self, slot: u64) -> Result<[u8; 32], WitnessError>;

    /// `bootstrap(blockRoot)`.
    async fn bootstrap(&self, block_root: [u8; 32]) -> Result<LightClientBootstrap, WitnessError>;

    /// `updates(startPeriod, count)`.
    async fn updates(
        &self,
        start_period: u64,
        count: u8,
    ) -> Result<Vec<LightClientUpdate>, WitnessError>;

    /// `domain(domainType, epoch)`.
    async fn domain(&self, domain_type: [u8; 4], epoch: u64) -> Result<[u8; 32], WitnessError>;

    /// `signedBlock(blockIdentifier)`, narrowed to the one field callers
    /// need: the execution-payload block number carried by the signed
    /// beacon block at `slot`.
    async fn signed_block_number(&self, slot: u64) -> Result<u64, WitnessError>;
}

/// The response shape of `genEvmProof_SyncStepCompressed`.
#[derive(Clone, Debug)]
pub struct StepProofResponse {
    pub proof: Vec<u8>,
}

/// The response shape of `genEvmProof_CommitteeUpdateCompressed`.
#[derive(Clone, Debug)]
pub struct RotateProofResponse {
    pub proof: Vec<u8>,
    pub committee_poseidon: [u8; 32],
}

/// JSON-RPC prover client: two synchronous, potentially slow (seconds to
/// minutes) proof-generation methods.
#[async_trait]
pub trait ProverClient: Send + Sync {
    async fn gen_step_proof(
        &self,
        spec: SpecTag,
        pubkeys: &[BlsPublicKey],
        domain: [u8; 32],
        update: &LightClientUpdate,
    ) -> Result<StepProofResponse, WitnessError>;

    async fn gen_rotate_proof(
        &self,
        spec: SpecTag,
        update: &LightClientUpdate,
    ) -> Result<RotateProofResponse, WitnessError>;
}

fn epoch_of(slot: u64, slots_per_epoch: u64) -> u64 {
    slot / slots_per_epoch
}

/// Fetch the latest finality update and assemble a `StepWitness` from it.
pub async fn build_step_witness(
    beacon: &dyn BeaconAdapter,
    spec: SpecTag,
    slots_per_epoch: u64,
) -> Result<StepWitness, WitnessError> {
    let update = beacon.finality_update().await?;
    let root = beacon.beacon_block_root(update.finalized_header.slot).await?;
    let bootstrap = beacon.bootstrap(root).await?;
    let domain = beacon
        .domain(
            SYNC_COMMITTEE_DOMAIN,
            epoch_of(update.finalized_header.slot, slots_per_epoch),
        )
        .await?;

    Ok(StepWitness {
        spec,
        pubkeys: bootstrap.current_sync_committee.pubkeys,
        domain,
        attested_header: update.attested_header,
        finalized_header: update.finalized_header,
        finalized_execution: update.finalized_execution,
        finality_branch: update.finality_branch,
        sync_aggregate: update.sync_aggregate,
        signature_slot: update.signature_slot,
    })
}

/// Fetch the light-client update for `period` and assemble a
/// `RotateWitness` from it.
pub async fn build_rotate_witness(
    beacon: &dyn BeaconAdapter,
    spec: SpecTag,
    period: u64,
    slots_per_epoch: u64,
) -> Result<RotateWitness, WitnessError> {
    let mut updates = beacon.updates(period, 1).await?;
    if updates.is_empty() {
        return Err(WitnessError::MissingUpdate { period });
    }
    let mut update = updates.remove(0);

    let root = beacon.beacon_block_root(update.finalized_header.slot).await?;
    let bootstrap = beacon.bootstrap(root).await?;

    // Relocate the next-sync-committee inclusion proof from "attested" to
    // "finalized" state: keep the bootstrap's branch shape but graft in
    // the update's own branch[0], which reflects the finalized state.
    let mut next_branch = bootstrap.current_sync_committee_branch.clone();
    if let (Some(first), true) = (update.next_sync_committee_branch.first(), !next_branch.is_empty())
    {
        next_branch[0] = *first;
    }
    update.next_sync_committee_branch = next_branch;

    let domain = beacon
        .domain(
            SYNC_COMMITTEE_DOMAIN,
            epoch_of(update.finalized_header.slot, slots_per_epoch),
        )
        .await?;

    Ok(RotateWitness {
        spec,
        update,
        pubkeys: bootstrap.current_sync_committee.pubkeys,
        domain,
    })
}

/// Call the prover for a Step proof and assemble the on-chain `StepInput`.
pub async fn step_proof(
    prover: &dyn ProverClient,
    witness: &StepWitness,
) -> Result<Proof<StepInput>, WitnessError> {
    let update = witness.to_light_client_update();
    let response = prover
        .gen_step_proof(witness.spec, &witness.pubkeys, witness.domain, &update)
        .await?;

    let finalized_header_root = hash_beacon_block_header(&witness.finalized_header);
    let exec_header = witness
        .finalized_execution
        .as_ref()
        .ok_or(WitnessError::MissingExecutionPayload)?;
    let (execution_payload_root, _proof) = hash_tree_root_execution_payload_header(exec_header);

    let input = StepInput {
        attested_slot: witness.attested_header.slot,
        finalized_slot: witness.finalized_header.slot,
        participation: witness.sync_aggregate.participation(),
        finalized_header_root,
        execution_payload_root,
    };

    Ok(Proof {
        bytes: response.proof,
        input,
    })
}

/// Call the prover for a Rotate proof and assemble the on-chain
/// `RotateInput`. Normalizes `attested_header` to `finalized_header`
/// before invoking the prover, per the on-chain verifier's expectation.
pub async fn rotate_proof(
    prover: &dyn ProverClient,
    witness: &RotateWitness,
) -> Result<Proof<RotateInput>, WitnessError> {
    let next_committee = witness
        .update
        .next_sync_committee
        .as_ref()
        .ok_or_else(|| WitnessError::Decoding("rotate update missing next_sync_committee".into()))?;

    let mut normalized = witness.update.clone();
    normalized.attested_header = normalized.finalized_header.clone();

    let response = prover.gen_rotate_proof(witness.spec, &normalized).await?;

    let sync_committee_ssz = hash_tree_root_sync_committee_pubkeys(&next_committee.pubkeys);
    let input = RotateInput {
        sync_committee_ssz,
        sync_committee_poseidon: response.committee_poseidon,
    };

    Ok(Proof {
        bytes: response.proof,
        input,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::beacon::{
        BeaconBlockHeader, BlsSignature, ExecutionPayloadHeader, SyncAggregate, SyncCommittee,
    };
    use async_trait::async_trait;
    use std::sync::Mutex;

    fn header(slot: u64) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot,
            proposer_index: 1,
            parent_root: [1; 32],
            state_root: [2; 32],
            body_root: [3; 32],
        }
    }

    fn exec_header() -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: [0; 32],
            fee_recipient: [0; 20],
            state_root: [9; 32],
            receipts_root: [0; 32],
            block_number: 100,
            gas_limit: 1,
            gas_used: 1,
            timestamp: 1,
            base_fee_per_gas: 1,
            block_hash: [0; 32],
            transactions_root: [0; 32],
            withdrawals_root: [0; 32],
        }
    }

    fn committee() -> SyncCommittee {
        SyncCommittee {
            pubkeys: vec![BlsPublicKey([1; 48]); 512],
            aggregate_pubkey: BlsPublicKey([1; 48]),
        }
    }

    fn sync_aggregate() -> SyncAggregate {
        SyncAggregate {
            sync_committee_bits: vec![0xFF; 64],
            sync_committee_signature: BlsSignature([0; 96]),
        }
    }

    struct FakeBeacon {
        finality: LightClientUpdate,
        bootstrap: LightClientBootstrap,
        period_updates: Mutex<Vec<LightClientUpdate>>,
    }

    #[async_trait]
    impl BeaconAdapter for FakeBeacon {
        async fn finality_update(&self) -> Result<LightClientUpdate, WitnessError> {
            Ok(self.finality.clone())
        }

        async fn beacon_block_root(&self, _slot: u64) -> Result<[u8; 32], WitnessError> {
            Ok([7; 32])
        }

        async fn bootstrap(&self, _block_root: [u8; 32]) -> Result<LightClientBootstrap, WitnessError> {
            Ok(self.bootstrap.clone())
        }

        async fn updates(
            &self,
            _start_period: u64,
            _count: u8,
        ) -> Result<Vec<LightClientUpdate>, WitnessError> {
            Ok(self.period_updates.lock().unwrap().clone())
        }

        async fn domain(&self, _domain_type: [u8; 4], _epoch: u64) -> Result<[u8; 32], WitnessError> {
            Ok([4; 32])
        }

        async fn signed_block_number(&self, _slot: u64) -> Result<u64, WitnessError> {
            Ok(100)
        }
    }

    struct FakeProver;

    #[async_trait]
    impl ProverClient for FakeProver {
        async fn gen_step_proof(
            &self,
            _spec: SpecTag,
            _pubkeys: &[BlsPublicKey],
            _domain: [u8; 32],
            _update: &LightClientUpdate,
        ) -> Result<StepProofResponse, WitnessError> {
            Ok(StepProofResponse {
                proof: vec![1, 2, 3],
            })
        }

        async fn gen_rotate_proof(
            &self,
            _spec: SpecTag,
            _update: &LightClientUpdate,
        ) -> Result<RotateProofResponse, WitnessError> {
            Ok(RotateProofResponse {
                proof: vec![4, 5, 6],
                committee_poseidon: [8; 32],
            })
        }
    }

    fn finality_update() -> LightClientUpdate {
        LightClientUpdate {
            attested_header: header(101),
            next_sync_committee: None,
            next_sync_committee_branch: vec![],
            finalized_header: header(100),
            finalized_execution: Some(exec_header()),
            finality_branch: vec![[0; 32]; 6],
            sync_aggregate: sync_aggregate(),
            signature_slot: 102,
        }
    }

    #[tokio::test]
    async fn build_step_witness_carries_execution_header_through() {
        let beacon = FakeBeacon {
            finality: finality_update(),
            bootstrap: LightClientBootstrap {
                header: header(100),
                current_sync_committee: committee(),
                current_sync_committee_branch: vec![[0; 32]; 5],
            },
            period_updates: Mutex::new(vec![]),
        };

        let witness = build_step_witness(&beacon, SpecTag::Mainnet, 32).await.unwrap();
        assert_eq!(witness.pubkeys.len(), 512);
        assert!(witness.finalized_execution.is_some());

        let proof = step_proof(&FakeProver, &witness).await.unwrap();
        assert_eq!(proof.input.participation, 512);
        assert_eq!(proof.input.finalized_slot, 100);
    }

    #[tokio::test]
    async fn build_rotate_witness_fails_on_empty_updates() {
        let beacon = FakeBeacon {
            finality: finality_update(),
            bootstrap: LightClientBootstrap {
                header: header(100),
                current_sync_committee: committee(),
                current_sync_committee_branch: vec![[0; 32]; 5],
            },
            period_updates: Mutex::new(vec![]),
        };

        let err = build_rotate_witness(&beacon, SpecTag::Mainnet, 4, 32)
            .await
            .unwrap_err();
        assert!(matches!(err, WitnessError::MissingUpdate { period: 4 }));
    }

    #[tokio::test]
    async fn rotate_proof_normalizes_attested_header_and_roots_next_committee() {
        let mut update = finality_update();
        update.next_sync_committee = Some(committee());
        update.next_sync_committee_branch = vec![[1; 32]; 5];

        let beacon = FakeBeacon {
            finality: finality_update(),
            bootstrap: LightClientBootstrap {
                header: header(100),
                current_sync_committee: committee(),
                current_sync_committee_branch: vec![[2; 32]; 5],
            },
            period_updates: Mutex::new(vec![update]),
        };

        let witness = build_rotate_witness(&beacon, SpecTag::Mainnet, 4, 32)
            .await
            .unwrap();
        // branch[0] relocated from the update's own branch, rest from bootstrap.
        assert_eq!(witness.update.next_sync_committee_branch[0], [1; 32]);
        assert_eq!(witness.update.next_sync_committee_branch[1], [2; 32]);

        let proof = rotate_proof(&FakeProver, &witness).await.unwrap();
        assert_eq!(
            proof.input.sync_committee_ssz,
            hash_tree_root_sync_committee_pubkeys(&committee().pubkeys)
        );
        assert_eq!(proof.input.sync_committee_poseidon, [8; 32]);
    }
}
