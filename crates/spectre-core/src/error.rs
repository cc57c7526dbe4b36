use thiserror::Error;

/// Errors raised while assembling a Step or Rotate witness from beacon
/// data, or while calling the prover over it.
#[derive(Debug, Error)]
pub enum WitnessError {
    #[error("beacon adapter transport error: {0}")]
    Transport(String),

    #[error("light-client updates for period {period} were empty")]
    MissingUpdate { period: u64 },

    #[error("finality update is missing its execution payload header")]
    MissingExecutionPayload,

    #[error("sync committee has {got} pubkeys, expected {expected}")]
    InvalidCommitteeSize { got: usize, expected: usize },

    #[error("prover RPC error: {0}")]
    Prover(String),

    #[error("malformed prover response: {0}")]
    Decoding(String),
}

impl WitnessError {
    /// Transport failures and prover-RPC failures are retryable by the
    /// listener on the next poll; everything else indicates a protocol
    /// or decoding problem that a later checkpoint usually resolves too,
    /// but is logged at a different level upstream.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Prover(_))
    }
}
