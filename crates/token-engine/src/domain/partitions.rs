//! # Partition Registry
//!
//! Known partitions, their handlers and registration order. Caps live in the
//! ledger books; the registry enforces that the caps of all partitions fit
//! inside the global cap.
//!
//! Lock order: registry, then ledger.

use super::entities::PartitionInfo;
use super::errors::TokenError;
use super::ledger::Ledger;
use crate::ports::outbound::TransferHook;
use parking_lot::RwLock;
use shared_types::{Amount, PartitionId};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

struct PartitionEntry {
    ordinal: usize,
    handler: Option<Arc<dyn TransferHook>>,
}

#[derive(Default)]
struct RegistryState {
    order: Vec<PartitionId>,
    entries: HashMap<PartitionId, PartitionEntry>,
}

#[derive(Default)]
pub struct PartitionRegistry {
    state: RwLock<RegistryState>,
}

impl PartitionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a partition. `cap: None` allocates the whole remaining
    /// global budget. Returns the effective cap.
    pub(crate) fn register(
        &self,
        ledger: &Ledger,
        partition: PartitionId,
        cap: Option<Amount>,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<Amount, TokenError> {
        let mut state = self.state.write();
        if state.entries.contains_key(&partition) {
            return Err(TokenError::DuplicatePartition(partition));
        }

        let available = ledger.global_cap().saturating_sub(ledger.allocated_caps());
        let cap = cap.unwrap_or(available);
        if cap > available {
            return Err(TokenError::CapExceeded {
                requested: cap,
                available,
            });
        }

        ledger.open_book(partition, cap)?;
        let ordinal = state.order.len();
        state.order.push(partition);
        state
            .entries
            .insert(partition, PartitionEntry { ordinal, handler });

        info!(partition = %partition, cap, ordinal, "Partition registered");
        Ok(cap)
    }

    /// Change a partition cap. Returns the previous cap.
    pub(crate) fn update_cap(
        &self,
        ledger: &Ledger,
        partition: PartitionId,
        new_cap: Amount,
    ) -> Result<Amount, TokenError> {
        let state = self.state.write();
        if !state.entries.contains_key(&partition) {
            return Err(TokenError::UnknownPartition(partition));
        }

        let current = ledger.cap_of(partition)?;
        let others = ledger.allocated_caps().saturating_sub(current);
        let available = ledger.global_cap().saturating_sub(others);
        if new_cap > available {
            return Err(TokenError::CapExceeded {
                requested: new_cap,
                available,
            });
        }

        let old = ledger.set_cap(partition, new_cap)?;
        drop(state);
        info!(partition = %partition, old_cap = old, new_cap, "Partition cap updated");
        Ok(old)
    }

    /// Change the global cap. It may not drop below the caps already handed
    /// to partitions. Returns the previous global cap.
    pub(crate) fn update_global_cap(&self, ledger: &Ledger, new_cap: Amount) -> Result<Amount, TokenError> {
        let _state = self.state.write();
        let allocated = ledger.allocated_caps();
        if new_cap < allocated {
            return Err(TokenError::CapBelowAllocated {
                cap: new_cap,
                allocated,
            });
        }
        ledger.set_global_cap(new_cap)
    }

    /// Attach, replace or clear a partition handler. Returns the previous one.
    pub(crate) fn set_handler(
        &self,
        partition: PartitionId,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<Option<Arc<dyn TransferHook>>, TokenError> {
        let mut state = self.state.write();
        let entry = state
            .entries
            .get_mut(&partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        Ok(std::mem::replace(&mut entry.handler, handler))
    }

    pub fn handler(&self, partition: PartitionId) -> Option<Arc<dyn TransferHook>> {
        self.state
            .read()
            .entries
            .get(&partition)
            .and_then(|entry| entry.handler.clone())
    }

    pub fn contains(&self, partition: PartitionId) -> bool {
        self.state.read().entries.contains_key(&partition)
    }

    pub fn len(&self) -> usize {
        self.state.read().order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Partition keys in registration order.
    pub fn ids(&self) -> Vec<PartitionId> {
        self.state.read().order.clone()
    }

    pub fn get(&self, ledger: &Ledger, partition: PartitionId) -> Result<PartitionInfo, TokenError> {
        let state = self.state.read();
        let entry = state
            .entries
            .get(&partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        let (cap, supply, halted) = ledger
            .book_summary(partition)
            .ok_or(TokenError::UnknownPartition(partition))?;

        Ok(PartitionInfo {
            id: partition,
            cap,
            supply,
            ordinal: entry.ordinal,
            handler: entry.handler.as_ref().map(|h| h.name().to_string()),
            halted,
        })
    }

    /// Every partition, in registration order.
    pub fn list(&self, ledger: &Ledger) -> Vec<PartitionInfo> {
        self.ids()
            .into_iter()
            .filter_map(|id| self.get(ledger, id).ok())
            .collect()
    }
}
