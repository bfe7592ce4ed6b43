//! # Domain Invariants
//!
//! Supply rules that must hold after every mutation. A violation means the
//! ledger itself is wrong; callers halt the affected partition.

use super::entities::PartitionBook;
use super::errors::TokenError;
use shared_types::{Amount, PartitionId};

/// Invariant: partition supply never exceeds the partition cap.
pub fn invariant_within_cap(partition: PartitionId, book: &PartitionBook) -> Result<(), TokenError> {
    if book.supply() > book.cap() {
        return Err(TokenError::InvariantViolation {
            partition,
            reason: format!("supply {} above cap {}", book.supply(), book.cap()),
        });
    }
    Ok(())
}

/// Invariant: the stored supply equals the sum of balances.
pub fn invariant_supply_matches_balances(
    partition: PartitionId,
    book: &PartitionBook,
) -> Result<(), TokenError> {
    match book.recomputed_supply() {
        Some(sum) if sum == book.supply() => Ok(()),
        Some(sum) => Err(TokenError::InvariantViolation {
            partition,
            reason: format!("balances sum to {} but supply is {}", sum, book.supply()),
        }),
        None => Err(TokenError::InvariantViolation {
            partition,
            reason: "balance sum overflows".to_string(),
        }),
    }
}

/// Invariant: total supply never exceeds the global cap.
pub fn invariant_within_global_cap(
    partition: PartitionId,
    total: Amount,
    global_cap: Amount,
) -> Result<(), TokenError> {
    if total > global_cap {
        return Err(TokenError::InvariantViolation {
            partition,
            reason: format!("total supply {} above global cap {}", total, global_cap),
        });
    }
    Ok(())
}
