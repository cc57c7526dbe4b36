//! Executor — §4.10: drains a destination domain's message queue and
//! submits each payload to that domain's verifier contract via the
//! `Transactor` collaborator (gas pricing, nonce management, and retry
//! under underpricing are the transactor's own responsibility — the
//! executor reports the resulting hash and does not retry beyond that).

use async_trait::async_trait;
use spectre_core::types::message::MessageKind;
use spectre_core::types::witness::{RotateInput, RotatePayload, StepInput, StepPayload};
use tokio::sync::mpsc;

use crate::error::RelayError;

/// Gas-pricing knobs threaded through from `DomainConfig`, mirroring the
/// original's `gas.NewLondonGasPriceClient` + `monitored.NewMonitoredTransactor`
/// wiring. This crate models only the shape; gas pricing itself is a
/// Non-goal.
#[derive(Clone, Debug)]
pub struct TransactorConfig {
    pub max_gas_price: u64,
    pub gas_multiplier: u64,
    pub gas_increase_percentage: u64,
}

/// Submits signed transactions to a verifier contract on one destination
/// domain. Implementations own nonce management and gas-price retries.
#[async_trait]
pub trait Transactor: Send + Sync {
    async fn submit_step(
        &self,
        source_domain: u8,
        input: &StepInput,
        proof: &[u8],
        state_root: [u8; 32],
        state_root_proof: &[[u8; 32]],
    ) -> Result<String, RelayError>;

    async fn submit_rotate(
        &self,
        source_domain: u8,
        rotate_input: &RotateInput,
        rotate_proof: &[u8],
        step_input: &StepInput,
        step_proof: &[u8],
    ) -> Result<String, RelayError>;
}

/// Drains one destination domain's channel, dispatching each message to
/// its `Transactor` by kind.
pub struct Executor {
    pub destination_domain: u8,
    pub transactor: Box<dyn Transactor>,
}

impl Executor {
    async fn submit(&self, message: spectre_core::types::message::Message) {
        let source = message.source;
        let result = match message.kind {
            MessageKind::Step(StepPayload { step, state_root, state_root_proof }) => {
                self.transactor
                    .submit_step(source, &step.input, &step.bytes, state_root, &state_root_proof)
                    .await
            }
            MessageKind::Rotate(RotatePayload { rotate, step }) => {
                self.transactor
                    .submit_rotate(source, &rotate.input, &rotate.bytes, &step.input, &step.bytes)
                    .await
            }
        };

        match result {
            Ok(tx_hash) => {
                tracing::info!(
                    domain_id = self.destination_domain,
                    source_domain = source,
                    tx_hash = %tx_hash,
                    "message submitted"
                );
            }
            Err(e) => {
                tracing::error!(
                    domain_id = self.destination_domain,
                    source_domain = source,
                    error = %e,
                    "message submission failed"
                );
            }
        }
    }

    /// Run until the channel closes (all producing handlers dropped) or
    /// cancellation fires.
    pub async fn run(&self, mut receiver: mpsc::Receiver<spectre_core::types::message::Message>, cancel: tokio_util::sync::CancellationToken) {
        loop {
            tokio::select! {
                message = receiver.recv() => {
                    match message {
                        Some(m) => self.submit(m).await,
                        None => return,
                    }
                }
                _ = cancel.cancelled() => return,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectre_core::types::message::Message;
    use spectre_core::types::witness::Proof;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct CountingTransactor(Arc<AtomicUsize>);

    #[async_trait]
    impl Transactor for CountingTransactor {
        async fn submit_step(&self, _source_domain: u8, _input: &StepInput, _proof: &[u8], _state_root: [u8; 32], _state_root_proof: &[[u8; 32]]) -> Result<String, RelayError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("0xdeadbeef".to_string())
        }
        async fn submit_rotate(&self, _source_domain: u8, _rotate_input: &RotateInput, _rotate_proof: &[u8], _step_input: &StepInput, _step_proof: &[u8]) -> Result<String, RelayError> {
            self.0.fetch_add(1, Ordering::SeqCst);
            Ok("0xfeedface".to_string())
        }
    }

    fn step_message() -> Message {
        Message::step(1, 2, StepPayload {
            step: Proof { bytes: vec![], input: StepInput { attested_slot: 1, finalized_slot: 1, participation: 1, finalized_header_root: [0; 32], execution_payload_root: [0; 32] } },
            state_root: [0; 32],
            state_root_proof: vec![],
        })
    }

    #[tokio::test]
    async fn drains_channel_until_closed() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = Executor {
            destination_domain: 2,
            transactor: Box::new(CountingTransactor(counter.clone())),
        };
        let (tx, rx) = mpsc::channel(8);
        tx.send(step_message()).await.unwrap();
        tx.send(step_message()).await.unwrap();
        drop(tx);

        let cancel = tokio_util::sync::CancellationToken::new();
        executor.run(rx, cancel).await;
        assert_eq!(counter.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn stops_on_cancellation() {
        let counter = Arc::new(AtomicUsize::new(0));
        let executor = Executor {
            destination_domain: 2,
            transactor: Box::new(CountingTransactor(counter.clone())),
        };
        let (_tx, rx) = mpsc::channel(8);
        let cancel = tokio_util::sync::CancellationToken::new();
        cancel.cancel();
        executor.run(rx, cancel).await;
        assert_eq!(counter.load(Ordering::SeqCst), 0);
    }
}
