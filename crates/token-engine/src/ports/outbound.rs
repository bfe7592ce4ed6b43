//! # Outbound Ports
//!
//! Collaborators the engine calls out to: partition handlers and global
//! modules, the logical clock, and the audit event sink.
//!
//! None of these are ever invoked while a ledger lock is held.

use parking_lot::Mutex;
use shared_bus::{LedgerEvent, Operation};
use shared_types::{Amount, Identity, PartitionId, Tick};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Facts about a transfer, handed to hooks.
#[derive(Debug, Clone, Copy)]
pub struct HookContext<'a> {
    pub operation: Operation,
    pub partition: PartitionId,
    /// Credited partition; differs from `partition` for repartitions.
    pub destination: PartitionId,
    pub operator: Identity,
    pub from: Identity,
    pub to: Identity,
    pub amount: Amount,
    pub data: &'a [u8],
    pub operator_data: &'a [u8],
}

/// Partition handler or global module consulted around transfers.
pub trait TransferHook: Send + Sync {
    /// Stable name, reported in events and partition listings.
    fn name(&self) -> &str;

    /// Approve or reject a transfer. Rejection yields `TransferFailure`.
    fn check(&self, ctx: &HookContext<'_>) -> Result<(), String>;

    /// Notification after the transfer was applied.
    fn after(&self, _ctx: &HookContext<'_>) {}
}

/// Monotonic logical clock used to order events.
pub trait LogicalClock: Send + Sync {
    /// Advance and return the new tick.
    fn tick(&self) -> Tick;

    /// Last tick handed out.
    fn now(&self) -> Tick;
}

/// Receiver of audit events.
pub trait EventSink: Send + Sync {
    fn emit(&self, event: LedgerEvent);
}

// =============================================================================
// Mock Implementations for Testing
// =============================================================================

/// Hook that counts calls and optionally rejects everything.
#[derive(Debug, Default)]
pub struct MockTransferHook {
    pub name: String,
    pub reject_with: Option<String>,
    checks: AtomicUsize,
    afters: AtomicUsize,
    seen: Mutex<Vec<(PartitionId, PartitionId, Amount)>>,
}

impl MockTransferHook {
    pub fn allowing(name: &str) -> Self {
        Self {
            name: name.to_string(),
            ..Self::default()
        }
    }

    pub fn rejecting(name: &str, reason: &str) -> Self {
        Self {
            name: name.to_string(),
            reject_with: Some(reason.to_string()),
            ..Self::default()
        }
    }

    pub fn checks(&self) -> usize {
        self.checks.load(Ordering::SeqCst)
    }

    pub fn afters(&self) -> usize {
        self.afters.load(Ordering::SeqCst)
    }

    /// `(partition, destination, amount)` of every checked transfer.
    pub fn seen(&self) -> Vec<(PartitionId, PartitionId, Amount)> {
        self.seen.lock().clone()
    }
}

impl TransferHook for MockTransferHook {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, ctx: &HookContext<'_>) -> Result<(), String> {
        self.checks.fetch_add(1, Ordering::SeqCst);
        self.seen
            .lock()
            .push((ctx.partition, ctx.destination, ctx.amount));
        match &self.reject_with {
            Some(reason) => Err(reason.clone()),
            None => Ok(()),
        }
    }

    fn after(&self, _ctx: &HookContext<'_>) {
        self.afters.fetch_add(1, Ordering::SeqCst);
    }
}
