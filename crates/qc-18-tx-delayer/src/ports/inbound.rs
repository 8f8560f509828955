//! Inbound Ports (Driving Ports / API)

use crate::domain::types::{BlockNumber, Bytes, Hash, Timestamp};

/// Control surface for scheduling the next transaction.
///
/// Each `pause_*`/`cancel_*` call replaces any instruction that has not been
/// consumed yet. The instruction applies to the next transaction sent through
/// the delayed client only.
pub trait Delayer: Send + Sync {
    /// Returns the hashes of all effectively sent txs.
    fn sent_tx_hashes(&self) -> Vec<Hash>;

    /// Returns the raw payloads of all cancelled txs.
    fn cancelled_txs(&self) -> Vec<Bytes>;

    /// Delays the next tx to be sent so it lands on the given L1 block number.
    fn pause_next_tx_until_block(&self, block: BlockNumber);

    /// Delays the next tx to be sent so it lands on the given L1 timestamp.
    fn pause_next_tx_until_timestamp(&self, timestamp: Timestamp);

    /// Delays the next tx to be sent indefinitely.
    fn cancel_next_tx(&self);
}
