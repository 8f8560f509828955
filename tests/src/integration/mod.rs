//! Integration flows
//!
//! - `delayer_flows`: DelayedClient in front of a simulated L1 that mines
//!   blocks on its own

pub mod delayer_flows;
