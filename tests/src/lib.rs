//! # Token Ledger Test Suite
//!
//! Unified test crate for behaviour that spans more than one crate.
//!
//! ## Structure
//!
//! ```text
//! tests/
//! ├── src/integration/   # Engine + event bus + telemetry flows
//! └── benches/           # Criterion benchmarks for the hot paths
//! ```
//!
//! ## Running Tests
//!
//! ```bash
//! # All tests
//! cargo test -p ledger-tests
//!
//! # Benchmarks
//! cargo bench -p ledger-tests
//! ```

#![allow(dead_code)]

pub mod integration;
