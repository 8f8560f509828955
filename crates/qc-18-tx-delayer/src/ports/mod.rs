//! Ports layer - Hexagonal Architecture
//!
//! - `inbound`: Delayer control surface
//! - `outbound`: L1Client the delayer wraps

pub mod inbound;
pub mod outbound;

pub use inbound::Delayer;
pub use outbound::{ClientError, L1Client};
