//! # Operator Registry
//!
//! Per-partition delegation from holders to operators. Only the holder can
//! change its own delegations. The controller override is not stored here;
//! it is part of the transfer authority predicate.

use super::errors::TokenError;
use parking_lot::RwLock;
use shared_types::{Identity, PartitionId};
use std::collections::{BTreeSet, HashMap};

#[derive(Debug, Default)]
pub struct OperatorRegistry {
    delegations: RwLock<HashMap<(PartitionId, Identity), BTreeSet<Identity>>>,
}

impl OperatorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns `false` when the operator was already authorized.
    pub(crate) fn authorize(
        &self,
        caller: Identity,
        partition: PartitionId,
        holder: Identity,
        operator: Identity,
    ) -> Result<bool, TokenError> {
        Self::ensure_holder(caller, holder)?;
        Ok(self
            .delegations
            .write()
            .entry((partition, holder))
            .or_default()
            .insert(operator))
    }

    /// Returns `false` when the operator was not authorized.
    pub(crate) fn revoke(
        &self,
        caller: Identity,
        partition: PartitionId,
        holder: Identity,
        operator: Identity,
    ) -> Result<bool, TokenError> {
        Self::ensure_holder(caller, holder)?;
        Ok(self
            .delegations
            .write()
            .get_mut(&(partition, holder))
            .map(|operators| operators.remove(&operator))
            .unwrap_or(false))
    }

    pub fn is_operator(&self, partition: PartitionId, holder: &Identity, operator: &Identity) -> bool {
        self.delegations
            .read()
            .get(&(partition, *holder))
            .is_some_and(|operators| operators.contains(operator))
    }

    pub fn operators_of(&self, partition: PartitionId, holder: &Identity) -> Vec<Identity> {
        self.delegations
            .read()
            .get(&(partition, *holder))
            .map(|operators| operators.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ensure_holder(caller: Identity, holder: Identity) -> Result<(), TokenError> {
        if caller == holder {
            Ok(())
        } else {
            Err(TokenError::NotHolder { caller, holder })
        }
    }
}
