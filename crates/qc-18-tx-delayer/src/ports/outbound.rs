//! Outbound Ports (Driven Ports / SPI)
//!
//! The L1 client the delayer wraps. Reads (block number, timestamps) and
//! signing are delegated as-is; only `send_raw_transaction` is intercepted.

use crate::domain::types::{BlockNumber, Bytes, Hash, SignerKind, Timestamp};
use async_trait::async_trait;

/// L1 client error types
#[derive(Debug, Clone, thiserror::Error)]
pub enum ClientError {
    #[error("RPC error: {0}")]
    Rpc(String),
    #[error("Transaction rejected: {0}")]
    Rejected(String),
    #[error("Block {0} not found")]
    BlockNotFound(BlockNumber),
    #[error("Unsupported operation: {0}")]
    Unsupported(String),
}

/// L1 (Ethereum) client used for submission and head queries.
#[async_trait]
pub trait L1Client: Send + Sync {
    /// Unsigned transaction request accepted by `sign_transaction`
    type Request: Send + Sync;

    /// How this client signs transactions.
    fn signer_kind(&self) -> SignerKind;

    /// Submit a signed, serialized transaction (`eth_sendRawTransaction`).
    async fn send_raw_transaction(&self, raw: Bytes) -> Result<Hash, ClientError>;

    /// Current head block number (`eth_blockNumber`, uncached).
    async fn block_number(&self) -> Result<BlockNumber, ClientError>;

    /// Timestamp of the given block.
    async fn block_timestamp(&self, number: BlockNumber) -> Result<Timestamp, ClientError>;

    /// Sign a transaction request with the local account.
    async fn sign_transaction(&self, request: &Self::Request) -> Result<Bytes, ClientError>;
}
