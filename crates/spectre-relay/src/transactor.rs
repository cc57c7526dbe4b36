//! Placeholder `Transactor` — the EVM transaction layer (gas pricing,
//! nonce management, mempool) is an external collaborator and a named
//! Non-goal. `LoggingTransactor` stands in for it so the Executor has a
//! concrete implementation to run against; wiring a real signer-backed
//! transactor means implementing `Transactor` against whatever EVM
//! client library the deployment already uses and passing it to
//! `Executor` instead.

use async_trait::async_trait;

use crate::error::RelayError;
use crate::executor::{Transactor, TransactorConfig};
use spectre_core::types::witness::{RotateInput, StepInput};

pub struct LoggingTransactor {
    config: TransactorConfig,
}

impl LoggingTransactor {
    pub fn new(config: TransactorConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Transactor for LoggingTransactor {
    async fn submit_step(
        &self,
        source_domain: u8,
        input: &StepInput,
        proof: &[u8],
        state_root: [u8; 32],
        _state_root_proof: &[[u8; 32]],
    ) -> Result<String, RelayError> {
        tracing::warn!(
            source_domain,
            finalized_slot = input.finalized_slot,
            proof_len = proof.len(),
            state_root = %hex::encode(state_root),
            max_gas_price = self.config.max_gas_price,
            "LoggingTransactor: no real EVM submission configured, dropping step"
        );
        Ok(format!("noop-step-{}-{}", source_domain, input.finalized_slot))
    }

    async fn submit_rotate(
        &self,
        source_domain: u8,
        rotate_input: &RotateInput,
        rotate_proof: &[u8],
        _step_input: &StepInput,
        _step_proof: &[u8],
    ) -> Result<String, RelayError> {
        tracing::warn!(
            source_domain,
            sync_committee_ssz = %hex::encode(rotate_input.sync_committee_ssz),
            proof_len = rotate_proof.len(),
            "LoggingTransactor: no real EVM submission configured, dropping rotate"
        );
        Ok(format!("noop-rotate-{}", source_domain))
    }
}
