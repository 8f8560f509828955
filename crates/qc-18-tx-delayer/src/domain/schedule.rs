//! Schedule state: the single pending instruction plus the outcome ledgers.
//!
//! Shared between the control handle (which arms instructions) and the
//! interceptor (which consumes them). The instruction slot is taken in one
//! lock acquisition so two racing submissions can never both consume it.

use crate::domain::instruction::Instruction;
use crate::domain::types::{Bytes, Hash};
use parking_lot::{Mutex, RwLock};

/// Pending instruction and append-only ledgers for one delayer.
#[derive(Debug)]
pub struct ScheduleState {
    slot_duration_secs: u64,
    next_wait: Mutex<Option<Instruction>>,
    sent_tx_hashes: RwLock<Vec<Hash>>,
    cancelled_txs: RwLock<Vec<Bytes>>,
}

impl ScheduleState {
    pub fn new(slot_duration_secs: u64) -> Self {
        Self {
            slot_duration_secs,
            next_wait: Mutex::new(None),
            sent_tx_hashes: RwLock::new(Vec::new()),
            cancelled_txs: RwLock::new(Vec::new()),
        }
    }

    pub fn slot_duration_secs(&self) -> u64 {
        self.slot_duration_secs
    }

    /// Arm the next instruction. Overwrites any unconsumed one.
    pub fn arm(&self, instruction: Instruction) -> Option<Instruction> {
        self.next_wait.lock().replace(instruction)
    }

    /// Take the armed instruction, leaving the slot empty.
    pub fn take(&self) -> Option<Instruction> {
        self.next_wait.lock().take()
    }

    /// Peek at the armed instruction without consuming it
    pub fn armed(&self) -> Option<Instruction> {
        *self.next_wait.lock()
    }

    pub fn record_sent(&self, tx_hash: Hash) {
        self.sent_tx_hashes.write().push(tx_hash);
    }

    pub fn record_cancelled(&self, raw: Bytes) {
        self.cancelled_txs.write().push(raw);
    }

    /// Snapshot of all effectively sent tx hashes, in completion order
    pub fn sent_tx_hashes(&self) -> Vec<Hash> {
        self.sent_tx_hashes.read().clone()
    }

    /// Snapshot of the raw payloads of all cancelled txs
    pub fn cancelled_txs(&self) -> Vec<Bytes> {
        self.cancelled_txs.read().clone()
    }
}
