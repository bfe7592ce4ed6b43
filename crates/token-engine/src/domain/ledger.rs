//! # Ledger
//!
//! Owns every partition book, the total supply and the global cap.
//!
//! ## Locking
//!
//! - One `RwLock` per partition book.
//! - Several books are always locked in ascending `PartitionId` order.
//! - The supply mutex is taken last, after any book lock.
//!
//! Mutations happen inside `with_book` / `with_books` (crate-internal)
//! closures, so a caller can re-validate and apply under the same locks.

use super::entities::{AuditReport, PartitionBook};
use super::errors::TokenError;
use super::invariants::{
    invariant_supply_matches_balances, invariant_within_cap, invariant_within_global_cap,
};
use parking_lot::{Mutex, RwLock, RwLockReadGuard};
use shared_types::{Amount, Identity, PartitionId};
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error};

type SharedBook = Arc<RwLock<PartitionBook>>;

#[derive(Debug, Clone, Copy)]
struct SupplyState {
    total: Amount,
    global_cap: Amount,
}

pub struct Ledger {
    books: RwLock<BTreeMap<PartitionId, SharedBook>>,
    supply: Mutex<SupplyState>,
}

impl Ledger {
    pub fn new(global_cap: Amount) -> Self {
        Self {
            books: RwLock::new(BTreeMap::new()),
            supply: Mutex::new(SupplyState {
                total: 0,
                global_cap,
            }),
        }
    }

    fn book(&self, partition: PartitionId) -> Option<SharedBook> {
        self.books.read().get(&partition).cloned()
    }

    /// Every book, in ascending key order.
    fn all_books(&self) -> Vec<(PartitionId, SharedBook)> {
        self.books
            .read()
            .iter()
            .map(|(id, book)| (*id, Arc::clone(book)))
            .collect()
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Create an empty book. Only the partition registry calls this.
    pub(crate) fn open_book(&self, partition: PartitionId, cap: Amount) -> Result<(), TokenError> {
        let mut books = self.books.write();
        if books.contains_key(&partition) {
            return Err(TokenError::DuplicatePartition(partition));
        }
        books.insert(partition, Arc::new(RwLock::new(PartitionBook::new(cap))));
        debug!(partition = %partition.short(), cap, "Partition book opened");
        Ok(())
    }

    /// Replace a partition cap. Returns the previous cap.
    pub(crate) fn set_cap(&self, partition: PartitionId, cap: Amount) -> Result<Amount, TokenError> {
        let book = self
            .book(partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        let mut book = book.write();
        if cap < book.supply() {
            return Err(TokenError::CapBelowSupply {
                partition,
                cap,
                supply: book.supply(),
            });
        }
        let old = book.cap();
        book.set_cap(cap);
        Ok(old)
    }

    /// Replace the global cap. Returns the previous cap.
    pub(crate) fn set_global_cap(&self, cap: Amount) -> Result<Amount, TokenError> {
        let mut supply = self.supply.lock();
        if cap < supply.total {
            return Err(TokenError::CapBelowAllocated {
                cap,
                allocated: supply.total,
            });
        }
        let old = supply.global_cap;
        supply.global_cap = cap;
        Ok(old)
    }

    /// Freeze a partition. Returns `false` if it was already halted.
    pub(crate) fn halt(&self, partition: PartitionId, reason: &str) -> Result<bool, TokenError> {
        let book = self
            .book(partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        let mut book = book.write();
        let fresh = !book.is_halted();
        book.halt(reason);
        Ok(fresh)
    }

    /// Overwrite the running total without touching any book.
    #[cfg(test)]
    pub(crate) fn force_total_supply(&self, total: Amount) {
        self.supply.lock().total = total;
    }

    // =========================================================================
    // TRANSACTIONS
    // =========================================================================

    /// Run `f` with the partition book write-locked.
    pub(crate) fn with_book<R>(
        &self,
        partition: PartitionId,
        f: impl FnOnce(&mut BookTxn<'_>) -> Result<R, TokenError>,
    ) -> Result<R, TokenError> {
        let book = self
            .book(partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        let mut guard = book.write();
        let mut txn = BookTxn {
            partition,
            book: &mut *guard,
            supply: &self.supply,
        };
        f(&mut txn)
    }

    /// Run `f` with the source and target books write-locked. `target` may
    /// equal `source`.
    pub(crate) fn with_books<R>(
        &self,
        source: PartitionId,
        target: PartitionId,
        f: impl FnOnce(&mut PairTxn<'_>) -> Result<R, TokenError>,
    ) -> Result<R, TokenError> {
        let source_book = self
            .book(source)
            .ok_or(TokenError::UnknownPartition(source))?;

        if source == target {
            let mut guard = source_book.write();
            let mut txn = PairTxn {
                source,
                target,
                source_book: &mut *guard,
                target_book: None,
            };
            return f(&mut txn);
        }

        let target_book = self
            .book(target)
            .ok_or(TokenError::UnknownPartition(target))?;

        // Fixed global order: lower key first
        let (mut source_guard, mut target_guard) = if source < target {
            let s = source_book.write();
            (s, target_book.write())
        } else {
            let t = target_book.write();
            (source_book.write(), t)
        };
        let mut txn = PairTxn {
            source,
            target,
            source_book: &mut *source_guard,
            target_book: Some(&mut *target_guard),
        };
        f(&mut txn)
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    /// Run `f` with the source (and optional target) books read-locked.
    /// Unknown partitions are passed as `None`.
    pub fn view<R>(
        &self,
        source: PartitionId,
        target: Option<PartitionId>,
        f: impl FnOnce(Option<&PartitionBook>, Option<&PartitionBook>) -> R,
    ) -> R {
        let source_book = self.book(source);
        let target_book = target.filter(|t| *t != source).and_then(|t| self.book(t));

        let target_first = target.is_some_and(|t| t < source);
        let (source_guard, target_guard) = if target_first {
            let t = target_book.as_ref().map(|b| b.read());
            (source_book.as_ref().map(|b| b.read()), t)
        } else {
            let s = source_book.as_ref().map(|b| b.read());
            (s, target_book.as_ref().map(|b| b.read()))
        };

        let source_ref = source_guard.as_deref();
        let target_ref = match target {
            Some(t) if t == source => source_ref,
            _ => target_guard.as_deref(),
        };
        f(source_ref, target_ref)
    }

    /// Run `f` over every book, all read-locked at once in key order.
    fn view_all<R>(&self, f: impl FnOnce(&[(PartitionId, RwLockReadGuard<'_, PartitionBook>)]) -> R) -> R {
        let books = self.all_books();
        let guards: Vec<_> = books.iter().map(|(id, book)| (*id, book.read())).collect();
        f(&guards)
    }

    pub fn contains(&self, partition: PartitionId) -> bool {
        self.books.read().contains_key(&partition)
    }

    pub fn partition_count(&self) -> usize {
        self.books.read().len()
    }

    pub fn balance_of_by_partition(&self, partition: PartitionId, holder: &Identity) -> Amount {
        self.book(partition)
            .map(|book| book.read().balance_of(holder))
            .unwrap_or(0)
    }

    /// Aggregate balance across partitions, from one consistent snapshot.
    pub fn balance_of(&self, holder: &Identity) -> Amount {
        self.view_all(|books| {
            books
                .iter()
                .map(|(_, book)| book.balance_of(holder))
                .fold(0u128, |acc, b| acc.saturating_add(b))
        })
    }

    /// Partitions in which the holder currently has a positive balance.
    pub fn partitions_of(&self, holder: &Identity) -> Vec<PartitionId> {
        self.view_all(|books| {
            books
                .iter()
                .filter(|(_, book)| book.balance_of(holder) > 0)
                .map(|(id, _)| *id)
                .collect()
        })
    }

    pub fn total_supply(&self) -> Amount {
        self.supply.lock().total
    }

    pub fn global_cap(&self) -> Amount {
        self.supply.lock().global_cap
    }

    pub fn total_supply_by_partition(&self, partition: PartitionId) -> Result<Amount, TokenError> {
        self.book(partition)
            .map(|book| book.read().supply())
            .ok_or(TokenError::UnknownPartition(partition))
    }

    pub fn cap_of(&self, partition: PartitionId) -> Result<Amount, TokenError> {
        self.book(partition)
            .map(|book| book.read().cap())
            .ok_or(TokenError::UnknownPartition(partition))
    }

    /// `(cap, supply, halted reason)` of a partition.
    pub fn book_summary(
        &self,
        partition: PartitionId,
    ) -> Option<(Amount, Amount, Option<String>)> {
        self.book(partition).map(|book| {
            let book = book.read();
            (
                book.cap(),
                book.supply(),
                book.halted_reason().map(str::to_string),
            )
        })
    }

    /// Sum of every partition cap.
    pub fn allocated_caps(&self) -> Amount {
        self.view_all(|books| {
            books
                .iter()
                .fold(0u128, |acc, (_, book)| acc.saturating_add(book.cap()))
        })
    }

    /// Recompute a book and halt it on any mismatch.
    pub fn audit(&self, partition: PartitionId) -> Result<AuditReport, TokenError> {
        let book = self
            .book(partition)
            .ok_or(TokenError::UnknownPartition(partition))?;
        let mut book = book.write();

        let checked = invariant_supply_matches_balances(partition, &book)
            .and_then(|()| invariant_within_cap(partition, &book));
        if let Err(e) = checked {
            halt_on_violation(&mut book, &e);
            return Err(e);
        }

        Ok(AuditReport {
            partition,
            cap: book.cap(),
            supply: book.supply(),
            holders: book.holders(),
        })
    }

    /// Check that the global total equals the sum of partition supplies.
    pub fn audit_total(&self) -> Result<Amount, String> {
        self.view_all(|books| {
            let sum = books
                .iter()
                .try_fold(0u128, |acc, (_, book)| acc.checked_add(book.supply()))
                .ok_or_else(|| "partition supplies overflow".to_string())?;
            let supply = self.supply.lock();
            if sum != supply.total {
                return Err(format!(
                    "partitions hold {} but total supply is {}",
                    sum, supply.total
                ));
            }
            Ok(sum)
        })
    }
}

fn halt_on_violation(book: &mut PartitionBook, err: &TokenError) {
    if let TokenError::InvariantViolation { partition, reason } = err {
        error!(partition = %partition, reason = %reason, "Invariant violated, halting partition");
        book.halt(reason.clone());
    }
}

/// One write-locked book plus access to the global supply.
pub(crate) struct BookTxn<'a> {
    partition: PartitionId,
    book: &'a mut PartitionBook,
    supply: &'a Mutex<SupplyState>,
}

impl BookTxn<'_> {
    /// Issue new supply to `holder`. Returns the holder's new balance.
    pub(crate) fn credit(&mut self, holder: Identity, amount: Amount) -> Result<Amount, TokenError> {
        if self.book.is_halted() {
            return Err(TokenError::PartitionHalted(self.partition));
        }
        let headroom = self.book.headroom();
        if amount > headroom {
            return Err(TokenError::CapExceeded {
                requested: amount,
                available: headroom,
            });
        }

        let mut supply = self.supply.lock();
        let available = supply.global_cap.saturating_sub(supply.total);
        if amount > available {
            return Err(TokenError::CapExceeded {
                requested: amount,
                available,
            });
        }

        let balance = self.book.deposit(self.partition, holder, amount)?;
        supply.total += amount;
        let total = supply.total;
        let global_cap = supply.global_cap;
        drop(supply);

        self.verify(total, global_cap)?;
        Ok(balance)
    }

    /// Destroy supply held by `holder`. Returns the holder's new balance.
    pub(crate) fn debit(&mut self, holder: Identity, amount: Amount) -> Result<Amount, TokenError> {
        let balance = self.book.withdraw(self.partition, holder, amount)?;

        let mut supply = self.supply.lock();
        supply.total = supply.total.saturating_sub(amount);
        let total = supply.total;
        let global_cap = supply.global_cap;
        drop(supply);

        self.verify(total, global_cap)?;
        Ok(balance)
    }

    fn verify(&mut self, total: Amount, global_cap: Amount) -> Result<(), TokenError> {
        let checked = invariant_within_cap(self.partition, &*self.book)
            .and_then(|()| invariant_within_global_cap(self.partition, total, global_cap));
        if let Err(e) = checked {
            halt_on_violation(&mut *self.book, &e);
            return Err(e);
        }
        Ok(())
    }
}

/// Source and target books write-locked together.
pub(crate) struct PairTxn<'a> {
    source: PartitionId,
    target: PartitionId,
    source_book: &'a mut PartitionBook,
    /// `None` when target == source.
    target_book: Option<&'a mut PartitionBook>,
}

impl PairTxn<'_> {
    pub(crate) fn source(&self) -> &PartitionBook {
        &*self.source_book
    }

    pub(crate) fn target(&self) -> &PartitionBook {
        match self.target_book.as_deref() {
            Some(book) => book,
            None => &*self.source_book,
        }
    }

    /// Debit `from` in the source book and credit `to` in the target book.
    ///
    /// If the credit leg fails the debit is restored before returning.
    /// Returns `(from_balance, to_balance)` after the move.
    pub(crate) fn move_balance(
        &mut self,
        from: Identity,
        to: Identity,
        amount: Amount,
    ) -> Result<(Amount, Amount), TokenError> {
        self.source_book.withdraw(self.source, from, amount)?;

        let target_book = match self.target_book.as_deref_mut() {
            Some(book) => book,
            None => &mut *self.source_book,
        };
        if let Err(e) = target_book.deposit(self.target, to, amount) {
            self.source_book.restore(from, amount);
            debug!(error = %e, "Credit leg failed, debit rolled back");
            return Err(e);
        }

        if let Err(e) = invariant_within_cap(self.source, &*self.source_book) {
            halt_on_violation(&mut *self.source_book, &e);
            return Err(e);
        }
        if let Some(book) = self.target_book.as_deref_mut() {
            if let Err(e) = invariant_within_cap(self.target, &*book) {
                halt_on_violation(book, &e);
                return Err(e);
            }
        }

        Ok((
            self.source_book.balance_of(&from),
            self.target().balance_of(&to),
        ))
    }
}
