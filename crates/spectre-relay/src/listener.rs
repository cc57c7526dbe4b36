//! Listener Loop — §4.8: polls finality, and on a new checkpoint runs
//! Rotate then Step, in that order, advancing `latestCheckpoint` only on
//! full success of both.

use std::time::Duration;

use spectre_core::ssz::hash_beacon_block_header;
use spectre_core::witness_builder::{BeaconAdapter, ProverClient};

use crate::bus::MessageBus;
use crate::error::RelayError;
use crate::handlers::{RotateHandler, StepHandler};
use crate::store::PeriodStore;

pub struct Listener {
    pub domain_id: u8,
    pub retry_interval: Duration,
    pub slots_per_epoch: u64,
}

impl Listener {
    /// Run until `cancel` fires. Logs and retries on any handler failure;
    /// never returns `Err` — the caller's task join only signals
    /// cancellation or a panic, never a normal failure.
    pub async fn run(
        &self,
        beacon: &dyn BeaconAdapter,
        prover: &dyn ProverClient,
        store: &dyn PeriodStore,
        bus: &MessageBus,
        rotate: &RotateHandler,
        step: &StepHandler,
        cancel: &tokio_util::sync::CancellationToken,
    ) {
        let mut latest_checkpoint: Option<[u8; 32]> = None;

        loop {
            if cancel.is_cancelled() {
                tracing::info!(domain_id = self.domain_id, "listener cancelled");
                return;
            }

            let finality = match beacon.finality_update().await {
                Ok(f) => f,
                Err(e) => {
                    tracing::warn!(domain_id = self.domain_id, error = %e, "finality fetch failed, retrying");
                    tokio::select! {
                        _ = tokio::time::sleep(self.retry_interval) => {}
                        _ = cancel.cancelled() => return,
                    }
                    continue;
                }
            };

            let checkpoint_root = hash_beacon_block_header(&finality.finalized_header);
            if Some(checkpoint_root) == latest_checkpoint {
                tokio::select! {
                    _ = tokio::time::sleep(self.retry_interval) => {}
                    _ = cancel.cancelled() => return,
                }
                continue;
            }

            let finalized_epoch = finality.finalized_header.slot / self.slots_per_epoch;

            let outcome: Result<(), RelayError> = async {
                rotate.handle(finalized_epoch, beacon, prover, store, bus).await?;
                step.handle(beacon, prover, bus).await?;
                Ok(())
            }
            .await;

            match outcome {
                Ok(()) => {
                    latest_checkpoint = Some(checkpoint_root);
                }
                Err(e) => {
                    tracing::warn!(domain_id = self.domain_id, error = %e, "checkpoint handling failed, will retry");
                }
            }

            tokio::select! {
                _ = tokio::time::sleep(self.retry_interval) => {}
                _ = cancel.cancelled() => return,
            }
        }
    }
}
