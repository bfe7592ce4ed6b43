//! # Ports
//!
//! Inbound API and outbound collaborator traits.

pub mod inbound;
pub mod outbound;

pub use inbound::TokenApi;
pub use outbound::{EventSink, HookContext, LogicalClock, MockTransferHook, TransferHook};
