//! # Adapters
//!
//! In-process implementations of the outbound ports.

mod clock;
mod event_sink;
mod hooks;

pub use clock::AtomicLogicalClock;
pub use event_sink::{BusEventSink, NullEventSink, RecordingEventSink};
pub use hooks::{ReceiverAllowList, TransferLimit};
