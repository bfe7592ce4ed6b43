//! # Token Engine
//!
//! Partitioned, permissioned token ledger.
//!
//! **Architecture:** Hexagonal (DDD + Ports/Adapters)
//!
//! ## Purpose
//!
//! Balances live in named partitions ("tranches"), each with its own supply
//! cap, bounded by a global cap:
//! - Role based access control (ADMIN, CONTROLLER, MINTER, ...)
//! - Per-partition operator delegation with a controller override
//! - Transfer validation with stable status codes (`0xA0`..`0xAA`)
//! - Atomic repartitioning between two partitions
//! - Audit events for every accepted mutation
//!
//! ## Concurrency
//!
//! | Lock | Scope | Order |
//! |------|-------|-------|
//! | Partition registry | registration, caps | before any book |
//! | Book | one partition's balances | ascending partition key |
//! | Supply | global total | after every book |
//! | Roles, operators | membership sets | leaf |
//!
//! Hooks and the event sink never run while a book lock is held.
//!
//! ## Module Structure
//!
//! ```text
//! token-engine/
//! ├── domain/          # Ledger, registries, validator, invariants
//! ├── ports/           # TokenApi + hook, clock and sink traits
//! ├── adapters/        # Clock, sinks, stock hooks
//! ├── config.rs        # TokenConfig from env or TOML
//! ├── store.rs         # Bootstrapped registries + ledger
//! └── service.rs       # TokenEngine
//! ```

#![warn(clippy::all)]

pub mod adapters;
pub mod config;
pub mod domain;
pub mod ports;
pub mod service;
pub mod store;

// Re-exports
pub use adapters::{
    AtomicLogicalClock, BusEventSink, NullEventSink, ReceiverAllowList, RecordingEventSink,
    TransferLimit,
};
pub use config::{ConfigError, PartitionSeed, TokenConfig};
pub use domain::{
    repartition_data, AuditReport, Authority, Ledger, OperationReceipt, OperatorRegistry,
    PartitionBook, PartitionInfo, PartitionRegistry, RoleRegistry, TokenError, TokenMetadata,
    TransferOutcome, TransferRoute, TransferValidator, REPARTITION_FLAG,
};
pub use ports::{EventSink, HookContext, LogicalClock, MockTransferHook, TokenApi, TransferHook};
pub use service::TokenEngine;
pub use store::{GenesisEntry, TokenStore};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
