//! # Shared Types Crate
//!
//! Types shared by every crate of the partitioned token ledger.
//!
//! ## Design Principles
//!
//! - **Single Source of Truth**: identities, partition keys, roles and status
//!   codes are defined once here and re-used by the engine and the event bus.
//! - **Closed Enumerations**: `Role` and `StatusCode` have stable numeric and
//!   32-byte encodings. Raw byte strings are only a serialized form.

pub mod entities;
pub mod errors;
pub mod roles;
pub mod status;

pub use entities::*;
pub use errors::*;
pub use roles::Role;
pub use status::StatusCode;
