//! # Transfer Validator
//!
//! Pure decision function over a snapshot of ledger state. The engine builds
//! the snapshot under read locks for dry runs and again under write locks
//! right before applying a transfer.
//!
//! ## Precedence
//!
//! The first failing check wins:
//!
//! 1. null receiver, `InvalidReceiver`
//! 2. amount not a positive multiple of granularity, `InvalidGranularity`
//! 3. unknown source, unknown or malformed target, `InvalidPartition`
//! 4. token paused or a touched partition halted, `TransfersHalted`
//! 5. holder balance short, `InsufficientBalance`
//! 6. operator call without authority, `Unauthorized`
//! 7. repartition credit above the target cap, `CapExceeded`

use super::entities::BookState;
use super::value_objects::{Authority, MalformedRoute, TransferRoute};
use shared_types::{Amount, Identity, StatusCode};

/// Everything the validator looks at.
#[derive(Debug, Clone, Copy)]
pub struct TransferCheck {
    pub to: Identity,
    pub amount: Amount,
    pub route: Result<TransferRoute, MalformedRoute>,
    pub paused: bool,
    /// `None` when the source partition is not registered.
    pub source: Option<BookState>,
    /// `None` when the repartition target is not registered. Ignored for
    /// simple routes.
    pub target: Option<BookState>,
    pub authority: Authority,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransferValidator {
    granularity: Amount,
}

impl TransferValidator {
    pub fn new(granularity: Amount) -> Self {
        Self { granularity }
    }

    pub fn granularity(&self) -> Amount {
        self.granularity
    }

    /// Amount is positive and a whole number of granules.
    pub fn is_granular(&self, amount: Amount) -> bool {
        amount > 0 && self.granularity > 0 && amount % self.granularity == 0
    }

    pub fn check(&self, input: &TransferCheck) -> StatusCode {
        if input.to.is_zero() {
            return StatusCode::InvalidReceiver;
        }

        if !self.is_granular(input.amount) {
            return StatusCode::InvalidGranularity;
        }

        let Some(source) = input.source else {
            return StatusCode::InvalidPartition;
        };
        let target = match input.route {
            Err(MalformedRoute) => return StatusCode::InvalidPartition,
            Ok(TransferRoute::Simple) => None,
            Ok(TransferRoute::Repartition { .. }) => match input.target {
                Some(target) => Some(target),
                None => return StatusCode::InvalidPartition,
            },
        };

        if input.paused || source.halted || target.is_some_and(|t| t.halted) {
            return StatusCode::TransfersHalted;
        }

        if source.holder_balance < input.amount {
            return StatusCode::InsufficientBalance;
        }

        if !input.authority.is_authorized() {
            return StatusCode::Unauthorized;
        }

        if target.is_some_and(|t| input.amount > t.headroom) {
            return StatusCode::CapExceeded;
        }

        StatusCode::Success
    }
}
