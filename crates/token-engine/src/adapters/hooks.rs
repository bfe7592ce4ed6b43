//! Ready-made transfer hooks.

use crate::ports::outbound::{HookContext, TransferHook};
use parking_lot::RwLock;
use shared_types::{Amount, Identity};
use std::collections::HashSet;

/// Only listed identities may receive transfers.
pub struct ReceiverAllowList {
    name: String,
    allowed: RwLock<HashSet<Identity>>,
}

impl ReceiverAllowList {
    pub fn new(name: &str, allowed: impl IntoIterator<Item = Identity>) -> Self {
        Self {
            name: name.to_string(),
            allowed: RwLock::new(allowed.into_iter().collect()),
        }
    }

    pub fn allow(&self, identity: Identity) -> bool {
        self.allowed.write().insert(identity)
    }

    pub fn disallow(&self, identity: &Identity) -> bool {
        self.allowed.write().remove(identity)
    }
}

impl TransferHook for ReceiverAllowList {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, ctx: &HookContext<'_>) -> Result<(), String> {
        if self.allowed.read().contains(&ctx.to) {
            Ok(())
        } else {
            Err(format!("receiver {} is not on the allow list", ctx.to))
        }
    }
}

/// Caps the amount of a single transfer.
pub struct TransferLimit {
    name: String,
    max_amount: Amount,
}

impl TransferLimit {
    pub fn new(name: &str, max_amount: Amount) -> Self {
        Self {
            name: name.to_string(),
            max_amount,
        }
    }
}

impl TransferHook for TransferLimit {
    fn name(&self) -> &str {
        &self.name
    }

    fn check(&self, ctx: &HookContext<'_>) -> Result<(), String> {
        if ctx.amount > self.max_amount {
            return Err(format!(
                "amount {} above per-transfer limit {}",
                ctx.amount, self.max_amount
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_bus::Operation;
    use shared_types::PartitionId;

    fn ctx(to: Identity, amount: Amount) -> HookContext<'static> {
        let p = PartitionId::from_label("p");
        HookContext {
            operation: Operation::Transfer,
            partition: p,
            destination: p,
            operator: Identity::new([1u8; 20]),
            from: Identity::new([1u8; 20]),
            to,
            amount,
            data: &[],
            operator_data: &[],
        }
    }

    #[test]
    fn test_allow_list() {
        let alice = Identity::new([0xA1; 20]);
        let bob = Identity::new([0xB0; 20]);
        let hook = ReceiverAllowList::new("whitelist", [alice]);

        assert!(hook.check(&ctx(alice, 1)).is_ok());
        assert!(hook.check(&ctx(bob, 1)).is_err());

        assert!(hook.allow(bob));
        assert!(hook.check(&ctx(bob, 1)).is_ok());
        assert!(hook.disallow(&alice));
        assert!(hook.check(&ctx(alice, 1)).is_err());
    }

    #[test]
    fn test_transfer_limit() {
        let hook = TransferLimit::new("limit", 100);
        let to = Identity::new([2u8; 20]);
        assert!(hook.check(&ctx(to, 100)).is_ok());
        assert!(hook.check(&ctx(to, 101)).is_err());
    }
}
