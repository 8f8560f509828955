//! Core value types shared by the delayer layers.

// Re-export primitive types for convenience
pub use bytes::Bytes;
pub use primitive_types::{H160 as Address, H256 as Hash};

/// L1 block number
pub type BlockNumber = u64;

/// L1 block timestamp (seconds since Unix epoch)
pub type Timestamp = u64;

/// How the wrapped client signs transactions.
///
/// Only transactions signed with a local key go through `send_raw_transaction`,
/// so only local signers can be delayed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignerKind {
    /// Private key held by the client (wallet client with a local account)
    Local,
    /// Key held by the node, transactions go out via `eth_sendTransaction`
    Remote,
}
