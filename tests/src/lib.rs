//! # Quantum-Chain Test Suite
//!
//! Unified test crate for cross-module flows.
//!
//! ## Structure
//!
//! ```text
//! tests/src/
//! └── integration/      # End-to-end delayer flows against a simulated L1
//!     └── delayer_flows.rs
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test -p qc-tests
//! cargo test -p qc-tests integration::
//! ```

#![allow(unused_variables)]
#![allow(unused_imports)]
#![allow(dead_code)]

pub mod integration;
