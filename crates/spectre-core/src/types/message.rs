use serde::{Deserialize, Serialize};

use super::witness::{RotatePayload, StepPayload};

/// A small integer (0-255) that uniquely names a configured chain.
pub type DomainId = u8;

/// The tagged payload carried by a `Message` — the Rust analogue of the
/// original's "empty-interface" payload field.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum MessageKind {
    Step(StepPayload),
    Rotate(RotatePayload),
}

/// A unit of work produced by a handler and consumed by the destination
/// domain's Executor.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Message {
    pub source: DomainId,
    pub destination: DomainId,
    pub kind: MessageKind,
}

impl Message {
    pub fn step(source: DomainId, destination: DomainId, payload: StepPayload) -> Self {
        Self {
            source,
            destination,
            kind: MessageKind::Step(payload),
        }
    }

    pub fn rotate(source: DomainId, destination: DomainId, payload: RotatePayload) -> Self {
        Self {
            source,
            destination,
            kind: MessageKind::Rotate(payload),
        }
    }
}
