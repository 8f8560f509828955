//! Algorithms module for the Transaction Delayer
//!
//! Contains:
//! - Condition waiter (poll the L1 head until a block or timestamp is reached)

pub mod wait;

pub use wait::{retry_until, wait_for_target, wait_until_block, wait_until_timestamp};
