use thiserror::Error;

/// The relayer's top-level error taxonomy. Every handler and listener
/// returns one of these so the listener can decide, by variant alone,
/// whether to retry on the next poll or treat a failure as fatal.
#[derive(Debug, Error)]
pub enum RelayError {
    #[error("transient I/O error: {0}")]
    Transient(String),

    #[error("protocol violation: {0}")]
    Protocol(String),

    #[error("decoding error: {0}")]
    Decoding(String),

    #[error("durability error: {0}")]
    Durability(String),

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("cancelled")]
    Cancelled,
}

impl RelayError {
    /// Transient and protocol failures are worth retrying on the next
    /// listener poll — a later checkpoint usually resolves a protocol
    /// violation (e.g. a light-client update that hasn't propagated yet).
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient(_) | Self::Protocol(_))
    }
}

impl From<spectre_core::WitnessError> for RelayError {
    fn from(e: spectre_core::WitnessError) -> Self {
        if e.is_retryable() {
            RelayError::Transient(e.to_string())
        } else {
            RelayError::Protocol(e.to_string())
        }
    }
}

impl From<sled::Error> for RelayError {
    fn from(e: sled::Error) -> Self {
        RelayError::Durability(e.to_string())
    }
}
