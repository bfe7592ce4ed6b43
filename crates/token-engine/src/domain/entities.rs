//! # Domain Entities
//!
//! Token metadata and the per-partition book that the ledger locks.

use super::errors::TokenError;
use serde::{Deserialize, Serialize};
use shared_types::{Amount, BalanceSnapshot, Identity, PartitionId, Tick};
use std::collections::HashMap;

/// Opaque descriptive metadata plus the global granularity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenMetadata {
    pub name: String,
    pub symbol: String,
    pub decimals: u8,
    /// Smallest indivisible unit. Always positive.
    pub granularity: Amount,
}

impl Default for TokenMetadata {
    fn default() -> Self {
        Self {
            name: "Partitioned Token".to_string(),
            symbol: "PTK".to_string(),
            decimals: 18,
            granularity: 1,
        }
    }
}

/// Balances, supply and cap of one partition.
///
/// Every field is guarded by the same lock, so the cap check and the
/// supply update can never be observed apart.
#[derive(Debug, Clone, Default)]
pub struct PartitionBook {
    cap: Amount,
    supply: Amount,
    balances: HashMap<Identity, Amount>,
    halted: Option<String>,
}

impl PartitionBook {
    pub fn new(cap: Amount) -> Self {
        Self {
            cap,
            ..Self::default()
        }
    }

    pub fn cap(&self) -> Amount {
        self.cap
    }

    pub fn supply(&self) -> Amount {
        self.supply
    }

    /// Credit still allowed before the cap is reached.
    pub fn headroom(&self) -> Amount {
        self.cap.saturating_sub(self.supply)
    }

    pub fn balance_of(&self, holder: &Identity) -> Amount {
        self.balances.get(holder).copied().unwrap_or(0)
    }

    /// Whether the holder ever received a credit here.
    pub fn has_entry(&self, holder: &Identity) -> bool {
        self.balances.contains_key(holder)
    }

    pub fn holders(&self) -> usize {
        self.balances.len()
    }

    /// Sum of all balances, recomputed. `None` on overflow.
    pub fn recomputed_supply(&self) -> Option<Amount> {
        self.balances
            .values()
            .try_fold(0u128, |acc, balance| acc.checked_add(*balance))
    }

    pub fn halted_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    /// Freeze the book. The first reason wins.
    pub(crate) fn halt(&mut self, reason: impl Into<String>) {
        if self.halted.is_none() {
            self.halted = Some(reason.into());
        }
    }

    pub(crate) fn set_cap(&mut self, cap: Amount) {
        self.cap = cap;
    }

    /// Validation facts for a transfer debiting `holder`.
    pub fn state_for(&self, holder: &Identity) -> BookState {
        BookState {
            halted: self.is_halted(),
            holder_balance: self.balance_of(holder),
            headroom: self.headroom(),
        }
    }

    /// Add to a holder and to the partition supply, respecting the cap.
    pub(crate) fn deposit(
        &mut self,
        partition: PartitionId,
        holder: Identity,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        if self.is_halted() {
            return Err(TokenError::PartitionHalted(partition));
        }
        let available = self.headroom();
        if amount > available {
            return Err(TokenError::CapExceeded {
                requested: amount,
                available,
            });
        }
        self.supply += amount;
        let balance = self.balances.entry(holder).or_insert(0);
        *balance += amount;
        Ok(*balance)
    }

    /// Remove from a holder and from the partition supply.
    pub(crate) fn withdraw(
        &mut self,
        partition: PartitionId,
        holder: Identity,
        amount: Amount,
    ) -> Result<Amount, TokenError> {
        if self.is_halted() {
            return Err(TokenError::PartitionHalted(partition));
        }
        let available = self.balance_of(&holder);
        if available < amount {
            return Err(TokenError::InsufficientBalance {
                holder,
                partition,
                required: amount,
                available,
            });
        }
        self.supply -= amount;
        let balance = self.balances.entry(holder).or_insert(0);
        *balance -= amount;
        Ok(*balance)
    }

    /// Undo a successful `withdraw`. Never checks the cap: the amount was
    /// inside the book a moment ago.
    pub(crate) fn restore(&mut self, holder: Identity, amount: Amount) {
        self.supply += amount;
        *self.balances.entry(holder).or_insert(0) += amount;
    }
}

/// Snapshot of the facts the validator needs from one book.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BookState {
    pub halted: bool,
    /// Balance of the debited holder.
    pub holder_balance: Amount,
    /// Remaining room under the partition cap.
    pub headroom: Amount,
}

/// Public view of a registered partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartitionInfo {
    pub id: PartitionId,
    pub cap: Amount,
    pub supply: Amount,
    /// Position in registration order, starting at 0.
    pub ordinal: usize,
    /// Name of the attached handler, if any.
    pub handler: Option<String>,
    pub halted: Option<String>,
}

/// Result of a successful mutating operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OperationReceipt {
    pub sequence: Tick,
    /// Partition that was credited (the target, for repartitions).
    pub destination: PartitionId,
    pub balances: Vec<BalanceSnapshot>,
}

impl OperationReceipt {
    /// Resulting balance of a holder in a partition, if it was touched.
    pub fn balance(&self, partition: PartitionId, holder: Identity) -> Option<Amount> {
        self.balances
            .iter()
            .find(|s| s.partition == partition && s.holder == holder)
            .map(|s| s.balance)
    }
}

/// Outcome of a read-only transfer check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferOutcome {
    pub status: shared_types::StatusCode,
    /// Partition that would be credited.
    pub destination: PartitionId,
}

/// Result of recomputing one partition book.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuditReport {
    pub partition: PartitionId,
    pub cap: Amount,
    pub supply: Amount,
    pub holders: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn alice() -> Identity {
        Identity::new([0xA1; 20])
    }

    #[test]
    fn test_deposit_respects_cap() {
        let p = PartitionId::from_label("p");
        let mut book = PartitionBook::new(100);

        assert_eq!(book.deposit(p, alice(), 60).unwrap(), 60);
        let err = book.deposit(p, alice(), 41).unwrap_err();
        assert_eq!(
            err,
            TokenError::CapExceeded {
                requested: 41,
                available: 40
            }
        );
        assert_eq!(book.supply(), 60);
    }

    #[test]
    fn test_withdraw_keeps_zero_entry() {
        let p = PartitionId::from_label("p");
        let mut book = PartitionBook::new(100);
        book.deposit(p, alice(), 10).unwrap();

        assert_eq!(book.withdraw(p, alice(), 10).unwrap(), 0);
        assert!(book.has_entry(&alice()));
        assert_eq!(book.supply(), 0);
        assert!(matches!(
            book.withdraw(p, alice(), 1),
            Err(TokenError::InsufficientBalance { available: 0, .. })
        ));
    }

    #[test]
    fn test_halted_book_rejects_mutation() {
        let p = PartitionId::from_label("p");
        let mut book = PartitionBook::new(100);
        book.halt("audit mismatch");
        book.halt("second reason");

        assert_eq!(book.halted_reason(), Some("audit mismatch"));
        assert_eq!(
            book.deposit(p, alice(), 1).unwrap_err(),
            TokenError::PartitionHalted(p)
        );
    }

    #[test]
    fn test_restore_undoes_withdraw() {
        let p = PartitionId::from_label("p");
        let mut book = PartitionBook::new(10);
        book.deposit(p, alice(), 10).unwrap();
        book.withdraw(p, alice(), 4).unwrap();
        book.restore(alice(), 4);

        assert_eq!(book.balance_of(&alice()), 10);
        assert_eq!(book.recomputed_supply(), Some(book.supply()));
    }
}
