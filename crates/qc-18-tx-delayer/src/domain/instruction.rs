//! Scheduling instructions and their resolved wait targets.

use crate::domain::types::{BlockNumber, Bytes, Hash, Timestamp};
use std::fmt;

/// What to do with the next transaction sent through the delayer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Instruction {
    /// Hold the tx so it lands on the given L1 block
    UntilBlock(BlockNumber),
    /// Hold the tx so it lands on a block with at least the given timestamp
    UntilTimestamp(Timestamp),
    /// Never send the tx
    Indefinitely,
}

impl Instruction {
    /// Resolve the condition the waiter has to observe before forwarding.
    ///
    /// The L1 node mines a forwarded tx into the block after the observed
    /// head, so block targets wait for `block - 1` and timestamp targets for
    /// `timestamp - slot_duration`.
    pub fn resolve(&self, slot_duration_secs: u64) -> WaitTarget {
        match *self {
            Instruction::UntilBlock(block) => WaitTarget::Block(block.saturating_sub(1)),
            Instruction::UntilTimestamp(ts) => {
                WaitTarget::Timestamp(ts.saturating_sub(slot_duration_secs))
            }
            Instruction::Indefinitely => WaitTarget::Never,
        }
    }
}

impl fmt::Display for Instruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Instruction::UntilBlock(block) => write!(f, "L1 block {}", block),
            Instruction::UntilTimestamp(ts) => write!(f, "L1 timestamp {}", ts),
            Instruction::Indefinitely => write!(f, "indefinitely"),
        }
    }
}

/// Condition observed on the L1 head before a held tx is forwarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitTarget {
    Block(BlockNumber),
    Timestamp(Timestamp),
    Never,
}

/// A submission that consumed an instruction.
#[derive(Debug, Clone)]
pub struct PendingSubmission {
    pub raw: Bytes,
    pub tx_hash: Hash,
    pub instruction: Instruction,
    pub target: WaitTarget,
}

impl PendingSubmission {
    pub fn new(raw: Bytes, tx_hash: Hash, instruction: Instruction, slot_duration_secs: u64) -> Self {
        Self {
            raw,
            tx_hash,
            instruction,
            target: instruction.resolve(slot_duration_secs),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        self.target == WaitTarget::Never
    }
}
