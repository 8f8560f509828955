//! # QC-18: Transaction Delayer
//!
//! Wraps an L1 client so the next transaction it sends can be held back
//! until a given L1 block number or timestamp, or dropped altogether.
//! Used by test harnesses that need a transaction to land in a specific
//! L1 block.
//!
//! ## Architecture
//!
//! ```text
//!   caller ──send_raw_transaction──► DelayedClient ──────────► L1Client
//!                                       │    ▲                    ▲
//!                              take()   │    │ arm()              │ poll head
//!                                       ▼    │                    │
//!                                   ScheduleState ◄── DelayerHandle
//!                                       │
//!                                       └── spawned delivery ─────┘
//! ```
//!
//! - **Domain**: Instruction, ScheduleState, hash precomputation, DeliveryStats
//! - **Algorithms**: Condition waiter
//! - **Ports**: Inbound (Delayer) and Outbound (L1Client)
//! - **Service**: `with_delayer`, DelayedClient, DelayerHandle
//!
//! ## Example
//!
//! ```ignore
//! let (client, delayer) = with_delayer(Arc::new(wallet), DelayerConfig::default())?;
//! delayer.pause_next_tx_until_block(100);
//! let tx_hash = client.send_raw_transaction(raw).await?; // returns now
//! // ... forwarded once the L1 head reaches block 99
//! ```

pub mod algorithms;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod telemetry;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;

pub use config::{ConfigError, DelayerConfig, WaitConfig};
pub use domain::errors::DelayerError;
pub use domain::instruction::{Instruction, PendingSubmission, WaitTarget};
pub use domain::stats::{DeliveryStats, DeliveryStatsSnapshot};
pub use domain::transaction::{compute_tx_hash, keccak256, TxSummary, TxType};
pub use domain::types::*;
pub use ports::inbound::Delayer;
pub use ports::outbound::{ClientError, L1Client};
pub use service::{with_delayer, DelayedClient, DelayerHandle};
pub use telemetry::{init_logging, LoggingConfig, TelemetryError};
