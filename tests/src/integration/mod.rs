//! # Integration Tests
//!
//! Cross-crate flows: the token engine publishing to the shared bus, and
//! configuration files driving a bootstrapped engine.

pub mod config_flows;
pub mod flows;
