//! # Domain Module
//!
//! Core ledger types: registries, the ledger, and the transfer validator.

pub mod entities;
pub mod errors;
pub mod invariants;
pub mod ledger;
pub mod operators;
pub mod partitions;
pub mod roles;
pub mod validator;
pub mod value_objects;

pub use entities::*;
pub use errors::*;
pub use invariants::*;
pub use ledger::Ledger;
pub use operators::OperatorRegistry;
pub use partitions::PartitionRegistry;
pub use roles::RoleRegistry;
pub use validator::{TransferCheck, TransferValidator};
pub use value_objects::*;
