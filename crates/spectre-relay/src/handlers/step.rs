//! Step Handler — §4.6: for a new finality checkpoint, decide which
//! destination domains need a step, build and prove the witness, and
//! enqueue one Step message per needing domain.

use std::collections::HashSet;
use std::sync::atomic::{AtomicU64, Ordering};

use spectre_core::types::message::Message;
use spectre_core::types::witness::StepPayload;
use spectre_core::witness_builder::{build_step_witness, step_proof, BeaconAdapter, ProverClient};
use spectre_core::ssz::hash_tree_root_execution_payload_header;
use spectre_core::types::beacon::SpecTag;

use crate::bus::MessageBus;
use crate::collector::DomainCollector;
use crate::error::RelayError;

/// Owns `latestBlock`, confined to the single listener task that drives
/// this domain — never read or written from any other task.
pub struct StepHandler {
    source_domain: u8,
    destination_domains: Vec<u8>,
    spec: SpecTag,
    slots_per_epoch: u64,
    latest_block: AtomicU64,
    collectors: Vec<Box<dyn DomainCollector>>,
}

impl StepHandler {
    pub fn new(
        source_domain: u8,
        destination_domains: Vec<u8>,
        spec: SpecTag,
        slots_per_epoch: u64,
        collectors: Vec<Box<dyn DomainCollector>>,
    ) -> Self {
        Self {
            source_domain,
            destination_domains,
            spec,
            slots_per_epoch,
            latest_block: AtomicU64::new(0),
            collectors,
        }
    }

    async fn needed_destinations(&self, end_block: u64) -> Result<HashSet<u8>, RelayError> {
        let latest_block = self.latest_block.load(Ordering::Acquire);
        if latest_block == 0 {
            // Cold start: all configured destinations except self.
            return Ok(self.destination_domains.iter().copied().collect());
        }

        let mut union = HashSet::new();
        for collector in &self.collectors {
            union.extend(collector.collect(latest_block, end_block).await?);
        }
        Ok(union.into_iter().filter(|d| *d != self.source_domain).collect())
    }

    /// Run one Step invocation for the current finality checkpoint.
    /// Never advances `latest_block` on failure.
    pub async fn handle(
        &self,
        beacon: &dyn BeaconAdapter,
        prover: &dyn ProverClient,
        bus: &MessageBus,
    ) -> Result<(), RelayError> {
        let witness = build_step_witness(beacon, self.spec, self.slots_per_epoch).await?;

        let exec_header = witness
            .finalized_execution
            .as_ref()
            .ok_or_else(|| RelayError::Protocol("finality update missing execution payload".into()))?;
        let end_block = beacon.signed_block_number(witness.finalized_header.slot).await?;

        let destinations = self.needed_destinations(end_block).await?;
        if destinations.is_empty() {
            self.latest_block.store(end_block, Ordering::Release);
            tracing::debug!(domain_id = self.source_domain, end_block, "step skipped: no destinations need it");
            return Ok(());
        }

        let proof = step_proof(prover, &witness).await?;
        let (_root, state_root_proof) = hash_tree_root_execution_payload_header(exec_header);
        let state_root = exec_header.state_root;

        for destination in &destinations {
            let message = Message::step(
                self.source_domain,
                *destination,
                StepPayload {
                    step: proof.clone(),
                    state_root,
                    state_root_proof: state_root_proof.clone(),
                },
            );
            bus.send(message).await?;
            tracing::info!(
                domain_id = self.source_domain,
                destination_domain = destination,
                slot = witness.finalized_header.slot,
                "step message enqueued"
            );
        }

        self.latest_block.store(end_block, Ordering::Release);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use spectre_core::types::beacon::{
        BeaconBlockHeader, BlsPublicKey, BlsSignature, ExecutionPayloadHeader, LightClientBootstrap,
        LightClientUpdate, SyncAggregate, SyncCommittee,
    };
    use spectre_core::witness_builder::{RotateProofResponse, StepProofResponse};
    use spectre_core::WitnessError;

    fn header(slot: u64) -> BeaconBlockHeader {
        BeaconBlockHeader {
            slot,
            proposer_index: 0,
            parent_root: [0; 32],
            state_root: [0; 32],
            body_root: [0; 32],
        }
    }

    fn exec_header(block_number: u64) -> ExecutionPayloadHeader {
        ExecutionPayloadHeader {
            parent_hash: [0; 32],
            fee_recipient: [0; 20],
            state_root: [9; 32],
            receipts_root: [0; 32],
            block_number,
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

    struct FakeBeacon {
        end_block: u64,
    }

    #[async_trait]
    impl BeaconAdapter for FakeBeacon {
        async fn finality_update(&self) -> Result<LightClientUpdate, WitnessError> {
            Ok(LightClientUpdate {
                attested_header: header(101),
                next_sync_committee: None,
                next_sync_committee_branch: vec![],
                finalized_header: header(100),
                finalized_execution: Some(exec_header(self.end_block)),
                finality_branch: vec![[0; 32]; 6],
                sync_aggregate: SyncAggregate {
                    sync_committee_bits: vec![0xFF; 64],
                    sync_committee_signature: BlsSignature([0; 96]),
                },
                signature_slot: 102,
            })
        }
        async fn beacon_block_root(&self, _slot: u64) -> Result<[u8; 32], WitnessError> {
            Ok([0; 32])
        }
        async fn bootstrap(&self, _block_root: [u8; 32]) -> Result<LightClientBootstrap, WitnessError> {
            Ok(LightClientBootstrap {
                header: header(100),
                current_sync_committee: committee(),
                current_sync_committee_branch: vec![[0; 32]; 5],
            })
        }
        async fn updates(&self, _start_period: u64, _count: u8) -> Result<Vec<LightClientUpdate>, WitnessError> {
            Ok(vec![])
        }
        async fn domain(&self, _domain_type: [u8; 4], _epoch: u64) -> Result<[u8; 32], WitnessError> {
            Ok([0; 32])
        }
        async fn signed_block_number(&self, _slot: u64) -> Result<u64, WitnessError> {
            Ok(self.end_block)
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
            Ok(StepProofResponse { proof: vec![1] })
        }
        async fn gen_rotate_proof(
            &self,
            _spec: SpecTag,
            _update: &LightClientUpdate,
        ) -> Result<RotateProofResponse, WitnessError> {
            Ok(RotateProofResponse { proof: vec![1], committee_poseidon: [0; 32] })
        }
    }

    #[tokio::test]
    async fn cold_start_emits_to_all_destinations_except_self() {
        let handler = StepHandler::new(1, vec![2, 3], SpecTag::Mainnet, 32, vec![]);
        let beacon = FakeBeacon { end_block: 100 };
        let (bus, mut receivers) = MessageBus::new(&[2, 3]);

        handler.handle(&beacon, &FakeProver, &bus).await.unwrap();

        assert!(receivers.get_mut(&2).unwrap().try_recv().is_ok());
        assert!(receivers.get_mut(&3).unwrap().try_recv().is_ok());
    }

    #[tokio::test]
    async fn no_needed_destinations_still_advances_latest_block() {
        let handler = StepHandler::new(1, vec![2], SpecTag::Mainnet, 32, vec![]);
        handler.latest_block.store(50, Ordering::Release);
        let beacon = FakeBeacon { end_block: 110 };
        let (bus, _receivers) = MessageBus::new(&[2]);

        handler.handle(&beacon, &FakeProver, &bus).await.unwrap();
        assert_eq!(handler.latest_block.load(Ordering::Acquire), 110);
    }
}
