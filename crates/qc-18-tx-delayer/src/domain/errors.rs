//! Error types for the transaction delayer

use crate::domain::types::Hash;
use crate::ports::outbound::ClientError;
use std::time::Duration;
use thiserror::Error;

/// All errors that can occur while delaying or submitting transactions
#[derive(Debug, Error)]
pub enum DelayerError {
    /// Delayer built over an unsupported client or with an invalid config
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Condition waiter ran out of budget
    #[error("Timeout awaiting {condition} after {elapsed:?}")]
    WaitTimeout { condition: String, elapsed: Duration },

    /// Hash reported by the client differs from the precomputed one
    #[error("Tx hash returned by the client {client:?} does not match computed one {computed:?}")]
    IdentifierMismatch { client: Hash, computed: Hash },

    /// Raw payload could not be parsed for hashing
    #[error("Invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Underlying L1 client failure
    #[error("L1 client error: {0}")]
    Client(#[from] ClientError),
}

impl From<rlp::DecoderError> for DelayerError {
    fn from(e: rlp::DecoderError) -> Self {
        DelayerError::InvalidTransaction(format!("RLP decode error: {:?}", e))
    }
}
