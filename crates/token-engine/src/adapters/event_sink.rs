//! Event sinks: the shared bus for hosts, a recorder for tests.

use crate::ports::outbound::EventSink;
use parking_lot::Mutex;
use shared_bus::{EventPublisher, LedgerEvent};
use std::sync::Arc;
use tracing::trace;

/// Publishes every event on a shared bus.
pub struct BusEventSink {
    bus: Arc<dyn EventPublisher>,
}

impl BusEventSink {
    pub fn new(bus: Arc<dyn EventPublisher>) -> Self {
        Self { bus }
    }
}

impl EventSink for BusEventSink {
    fn emit(&self, event: LedgerEvent) {
        let sequence = event.sequence();
        let receivers = self.bus.publish(event);
        trace!(sequence, receivers, "Ledger event published");
    }
}

/// Keeps every event in memory, in emission order.
#[derive(Debug, Default)]
pub struct RecordingEventSink {
    events: Mutex<Vec<LedgerEvent>>,
}

impl RecordingEventSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<LedgerEvent> {
        self.events.lock().clone()
    }

    pub fn take(&self) -> Vec<LedgerEvent> {
        std::mem::take(&mut *self.events.lock())
    }

    pub fn len(&self) -> usize {
        self.events.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.lock().is_empty()
    }
}

impl EventSink for RecordingEventSink {
    fn emit(&self, event: LedgerEvent) {
        self.events.lock().push(event);
    }
}

/// Drops every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullEventSink;

impl EventSink for NullEventSink {
    fn emit(&self, _event: LedgerEvent) {}
}
