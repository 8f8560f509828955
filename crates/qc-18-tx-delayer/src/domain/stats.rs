//! Delivery counters for the interceptor.

use std::sync::atomic::{AtomicU64, Ordering};

/// Statistics for submissions flowing through the delayer
#[derive(Debug, Default)]
pub struct DeliveryStats {
    /// Sent on the spot (no instruction armed)
    pub immediate: AtomicU64,
    /// Handed to a background wait
    pub deferred: AtomicU64,
    /// Deferred txs that reached the L1 client
    pub delivered: AtomicU64,
    /// Dropped under a cancel instruction
    pub cancelled: AtomicU64,
    /// Deferred txs whose wait ran out of budget
    pub timed_out: AtomicU64,
    /// Deferred txs the L1 client failed to accept
    pub failed: AtomicU64,
    /// Client-reported hash differed from the precomputed one
    pub hash_mismatches: AtomicU64,
}

/// Point-in-time copy of [`DeliveryStats`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DeliveryStatsSnapshot {
    pub immediate: u64,
    pub deferred: u64,
    pub delivered: u64,
    pub cancelled: u64,
    pub timed_out: u64,
    pub failed: u64,
    pub hash_mismatches: u64,
}

impl DeliveryStats {
    pub fn snapshot(&self) -> DeliveryStatsSnapshot {
        DeliveryStatsSnapshot {
            immediate: self.immediate.load(Ordering::Relaxed),
            deferred: self.deferred.load(Ordering::Relaxed),
            delivered: self.delivered.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            timed_out: self.timed_out.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            hash_mismatches: self.hash_mismatches.load(Ordering::Relaxed),
        }
    }

    pub(crate) fn incr(counter: &AtomicU64) {
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

impl DeliveryStatsSnapshot {
    /// Deferred txs still waiting or in flight
    pub fn in_flight(&self) -> u64 {
        self.deferred
            .saturating_sub(self.delivered + self.timed_out + self.failed)
    }
}
