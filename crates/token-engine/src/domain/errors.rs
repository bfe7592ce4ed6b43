//! # Token Errors
//!
//! Authorization and precondition failures. Transfer validity failures are
//! carried as a [`StatusCode`] inside [`TokenError::TransferRejected`].

use crate::config::ConfigError;
use shared_types::{Amount, Identity, PartitionId, Role, StatusCode};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenError {
    #[error("Caller {caller} holds none of the required roles {roles:?}")]
    MissingRole { caller: Identity, roles: Vec<Role> },

    #[error("Caller {caller} is not the holder {holder}")]
    NotHolder { caller: Identity, holder: Identity },

    #[error("Caller {caller} is not an operator for {holder} in partition {partition}")]
    NotOperator {
        caller: Identity,
        holder: Identity,
        partition: PartitionId,
    },

    #[error("Unknown partition {0}")]
    UnknownPartition(PartitionId),

    #[error("Partition {0} is already registered")]
    DuplicatePartition(PartitionId),

    #[error("Cap exceeded: requested {requested}, available {available}")]
    CapExceeded { requested: Amount, available: Amount },

    #[error("Cap {cap} is below the current supply {supply} of partition {partition}")]
    CapBelowSupply {
        partition: PartitionId,
        cap: Amount,
        supply: Amount,
    },

    #[error("Global cap {cap} is below the {allocated} already allocated to partitions")]
    CapBelowAllocated { cap: Amount, allocated: Amount },

    #[error("Insufficient balance for {holder} in {partition}: required {required}, available {available}")]
    InsufficientBalance {
        holder: Identity,
        partition: PartitionId,
        required: Amount,
        available: Amount,
    },

    #[error("Amount {amount} is not a positive multiple of granularity {granularity}")]
    InvalidGranularity { amount: Amount, granularity: Amount },

    #[error("Receiver is the null identity")]
    InvalidReceiver,

    #[error("Transfer rejected in partition {partition}: {status}")]
    TransferRejected {
        status: StatusCode,
        partition: PartitionId,
    },

    #[error("Token is paused")]
    Paused,

    #[error("Partition {0} is halted")]
    PartitionHalted(PartitionId),

    #[error("Invariant violated in partition {partition}: {reason}")]
    InvariantViolation {
        partition: PartitionId,
        reason: String,
    },

    #[error("Ledger halted, total supply mismatch: {reason}")]
    SupplyMismatch { reason: String },

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl TokenError {
    /// Status code equivalent of this failure, where one exists.
    pub fn status_code(&self) -> Option<StatusCode> {
        match self {
            Self::MissingRole { .. } | Self::NotHolder { .. } | Self::NotOperator { .. } => {
                Some(StatusCode::Unauthorized)
            }
            Self::UnknownPartition(_) => Some(StatusCode::InvalidPartition),
            Self::CapExceeded { .. } => Some(StatusCode::CapExceeded),
            Self::InsufficientBalance { .. } => Some(StatusCode::InsufficientBalance),
            Self::InvalidGranularity { .. } => Some(StatusCode::InvalidGranularity),
            Self::InvalidReceiver => Some(StatusCode::InvalidReceiver),
            Self::TransferRejected { status, .. } => Some(*status),
            Self::Paused
            | Self::PartitionHalted(_)
            | Self::InvariantViolation { .. }
            | Self::SupplyMismatch { .. } => Some(StatusCode::TransfersHalted),
            Self::DuplicatePartition(_)
            | Self::CapBelowSupply { .. }
            | Self::CapBelowAllocated { .. }
            | Self::Config(_) => None,
        }
    }

    /// Whether the caller lacked permission.
    pub fn is_authorization(&self) -> bool {
        self.status_code() == Some(StatusCode::Unauthorized)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_code_mapping() {
        let p = PartitionId::from_label("locked");
        assert_eq!(
            TokenError::UnknownPartition(p).status_code(),
            Some(StatusCode::InvalidPartition)
        );
        assert_eq!(
            TokenError::TransferRejected {
                status: StatusCode::InsufficientBalance,
                partition: p,
            }
            .status_code(),
            Some(StatusCode::InsufficientBalance)
        );
        assert_eq!(TokenError::DuplicatePartition(p).status_code(), None);
    }

    #[test]
    fn test_authorization_predicate() {
        let err = TokenError::MissingRole {
            caller: Identity::new([1u8; 20]),
            roles: vec![Role::Minter, Role::Issuer],
        };
        assert!(err.is_authorization());
        assert!(!TokenError::InvalidReceiver.is_authorization());
    }

    #[test]
    fn test_display_mentions_roles() {
        let err = TokenError::MissingRole {
            caller: Identity::new([1u8; 20]),
            roles: vec![Role::Pauser],
        };
        assert!(err.to_string().contains("Pauser"));
    }
}
