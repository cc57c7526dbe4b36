//! Rotate Handler — §4.7: detect a committee period advance, build and
//! prove the paired Rotate+Step witnesses, fan out Rotate messages, then
//! commit the new period.

use std::sync::atomic::{AtomicU64, Ordering};

use spectre_core::types::beacon::SpecTag;
use spectre_core::types::message::Message;
use spectre_core::types::witness::{RotatePayload, StepWitness};
use spectre_core::witness_builder::{build_rotate_witness, rotate_proof, step_proof, BeaconAdapter, ProverClient};
use spectre_core::ssz::hash_beacon_block_header;

use crate::bus::MessageBus;
use crate::error::RelayError;
use crate::store::PeriodStore;

/// Owns `latest_period`, confined to the listener task for this domain.
pub struct RotateHandler {
    source_domain: u8,
    destination_domains: Vec<u8>,
    spec: SpecTag,
    slots_per_epoch: u64,
    committee_period_length: u64,
    latest_period: AtomicU64,
}

impl RotateHandler {
    /// `latest_period` is seeded at startup to `max(stored, starting_period)`,
    /// or exactly `starting_period` when `force_period` is set.
    pub async fn new(
        source_domain: u8,
        destination_domains: Vec<u8>,
        spec: SpecTag,
        slots_per_epoch: u64,
        committee_period_length: u64,
        starting_period: u64,
        force_period: bool,
        store: &dyn PeriodStore,
    ) -> Result<Self, RelayError> {
        let latest_period = if force_period {
            starting_period
        } else {
            let stored = store.period(source_domain).await?;
            stored.max(starting_period)
        };

        Ok(Self {
            source_domain,
            destination_domains,
            spec,
            slots_per_epoch,
            committee_period_length,
            latest_period: AtomicU64::new(latest_period),
        })
    }

    /// Run one Rotate invocation for a finality checkpoint at `finalized_epoch`.
    /// No-op (not an error) when `currentPeriod <= latestPeriod`.
    pub async fn handle(
        &self,
        finalized_epoch: u64,
        beacon: &dyn BeaconAdapter,
        prover: &dyn ProverClient,
        store: &dyn PeriodStore,
        bus: &MessageBus,
    ) -> Result<(), RelayError> {
        let current_period = finalized_epoch / self.committee_period_length;
        let latest_period = self.latest_period.load(Ordering::Acquire);
        if current_period <= latest_period {
            return Ok(());
        }
        let target_period = latest_period + 1;

        let witness = build_rotate_witness(beacon, self.spec, target_period, self.slots_per_epoch).await?;

        let step_witness = StepWitness {
            spec: witness.spec,
            pubkeys: witness.pubkeys.clone(),
            domain: witness.domain,
            attested_header: witness.update.attested_header.clone(),
            finalized_header: witness.update.finalized_header.clone(),
            finalized_execution: witness.update.finalized_execution.clone(),
            finality_branch: witness.update.finality_branch.clone(),
            sync_aggregate: witness.update.sync_aggregate.clone(),
            signature_slot: witness.update.signature_slot,
        };

        let rotate_result = rotate_proof(prover, &witness).await?;
        let step_result = step_proof(prover, &step_witness).await?;

        debug_assert_eq!(
            step_result.input.finalized_header_root,
            hash_beacon_block_header(&witness.update.finalized_header)
        );

        for destination in &self.destination_domains {
            if *destination == self.source_domain {
                continue;
            }
            let message = Message::rotate(
                self.source_domain,
                *destination,
                RotatePayload {
                    rotate: rotate_result.clone(),
                    step: step_result.clone(),
                },
            );
            bus.send(message).await?;
            tracing::info!(
                domain_id = self.source_domain,
                destination_domain = destination,
                period = target_period,
                "rotate message enqueued"
            );
        }

        self.latest_period.store(target_period, Ordering::Release);
        store.store_period(self.source_domain, target_period).await?;
        Ok(())
    }
}
