//! # Domain Layer - Transaction Delayer
//!
//! ## Components
//!
//! - `instruction`: Instruction (what to do with the next tx), WaitTarget, PendingSubmission
//! - `schedule`: ScheduleState with the single instruction slot and outcome ledgers
//! - `transaction`: Hash precomputation (blob sidecar stripping) and TxSummary
//! - `stats`: DeliveryStats counters
//! - `errors`: DelayerError enumeration
//! - `types`: Hash, Address, Bytes, SignerKind

pub mod errors;
pub mod instruction;
pub mod schedule;
pub mod stats;
pub mod transaction;
pub mod types;

pub use errors::*;
pub use instruction::*;
pub use schedule::*;
pub use stats::*;
pub use transaction::*;
pub use types::*;
