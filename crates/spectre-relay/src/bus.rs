//! In-process message bus: one bounded `mpsc` channel per destination
//! domain. Handlers push `Message`s tagged with their destination; each
//! domain's Executor owns the receiving half of its own channel.

use std::collections::HashMap;

use spectre_core::Message;
use tokio::sync::mpsc;

use crate::error::RelayError;

const CHANNEL_CAPACITY: usize = 256;

/// The producing half, cloned into every listener/handler. Sending to a
/// domain with no registered receiver is a configuration error, not a
/// silent drop — every destination in `DOMAINS` must have an Executor.
#[derive(Clone)]
pub struct MessageBus {
    senders: HashMap<u8, mpsc::Sender<Message>>,
}

impl MessageBus {
    /// Build a bus with one channel per domain id in `domain_ids`,
    /// returning the bus and the receiving half for each domain.
    pub fn new(domain_ids: &[u8]) -> (Self, HashMap<u8, mpsc::Receiver<Message>>) {
        let mut senders = HashMap::new();
        let mut receivers = HashMap::new();
        for &id in domain_ids {
            let (tx, rx) = mpsc::channel(CHANNEL_CAPACITY);
            senders.insert(id, tx);
            receivers.insert(id, rx);
        }
        (Self { senders }, receivers)
    }

    pub async fn send(&self, message: Message) -> Result<(), RelayError> {
        let destination = message.destination;
        let sender = self.senders.get(&destination).ok_or_else(|| {
            RelayError::Configuration(format!("no executor registered for destination domain {destination}"))
        })?;
        sender
            .send(message)
            .await
            .map_err(|_| RelayError::Cancelled)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use spectre_core::types::message::{MessageKind, StepPayload};
    use spectre_core::types::witness::{Proof, StepInput};

    fn step_message(source: u8, destination: u8) -> Message {
        Message {
            source,
            destination,
            kind: MessageKind::Step(StepPayload {
                step: Proof {
                    bytes: vec![],
                    input: StepInput {
                        attested_slot: 1,
                        finalized_slot: 1,
                        participation: 1,
                        finalized_header_root: [0; 32],
                        execution_payload_root: [0; 32],
                    },
                },
                state_root: [0; 32],
                state_root_proof: vec![],
            }),
        }
    }

    #[tokio::test]
    async fn send_routes_by_destination() {
        let (bus, mut receivers) = MessageBus::new(&[1, 2]);
        bus.send(step_message(1, 2)).await.unwrap();
        let received = receivers.get_mut(&2).unwrap().recv().await.unwrap();
        assert_eq!(received.destination, 2);
        assert!(receivers.get_mut(&1).unwrap().try_recv().is_err());
    }

    #[tokio::test]
    async fn send_to_unregistered_domain_fails() {
        let (bus, _receivers) = MessageBus::new(&[1]);
        let err = bus.send(step_message(1, 9)).await.unwrap_err();
        assert!(matches!(err, RelayError::Configuration(_)));
    }
}
