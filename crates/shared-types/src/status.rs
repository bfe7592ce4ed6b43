//! # Transfer Status Codes
//!
//! Non-failing result of transfer validation. Values follow the
//! `0xA?` application range seen on the wire:
//!
//! | Code | Byte | Meaning |
//! |------|------|---------|
//! | `TransferFailure` | `0xA0` | An external hook rejected the transfer |
//! | `Success` | `0xA1` | Transfer would succeed |
//! | `TransfersHalted` | `0xA2` | Engine paused or partition halted |
//! | `InvalidPartition` | `0xA3` | Source or target partition unknown |
//! | `InsufficientBalance` | `0xA4` | Holder lacks balance in the partition |
//! | `InvalidReceiver` | `0xA6` | Receiver is the null identity |
//! | `Unauthorized` | `0xA8` | Caller is not holder, operator or controller |
//! | `InvalidGranularity` | `0xA9` | Amount is not a positive multiple of granularity |
//! | `CapExceeded` | `0xAA` | Credit would exceed the partition cap |

use crate::errors::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Outcome of `can_transfer` style checks.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum StatusCode {
    TransferFailure = 0xA0,
    Success = 0xA1,
    TransfersHalted = 0xA2,
    InvalidPartition = 0xA3,
    InsufficientBalance = 0xA4,
    InvalidReceiver = 0xA6,
    Unauthorized = 0xA8,
    InvalidGranularity = 0xA9,
    CapExceeded = 0xAA,
}

impl StatusCode {
    /// Every code.
    pub const ALL: [StatusCode; 9] = [
        StatusCode::TransferFailure,
        StatusCode::Success,
        StatusCode::TransfersHalted,
        StatusCode::InvalidPartition,
        StatusCode::InsufficientBalance,
        StatusCode::InvalidReceiver,
        StatusCode::Unauthorized,
        StatusCode::InvalidGranularity,
        StatusCode::CapExceeded,
    ];

    /// Wire byte.
    pub fn as_byte(self) -> u8 {
        self as u8
    }

    /// Decode a wire byte.
    pub fn from_byte(byte: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .iter()
            .copied()
            .find(|code| code.as_byte() == byte)
            .ok_or(DecodeError::UnknownStatus(byte))
    }

    pub fn is_success(self) -> bool {
        self == StatusCode::Success
    }

    /// Stable lower-case label, used as a metric label.
    pub fn label(self) -> &'static str {
        match self {
            StatusCode::TransferFailure => "transfer_failure",
            StatusCode::Success => "success",
            StatusCode::TransfersHalted => "transfers_halted",
            StatusCode::InvalidPartition => "invalid_partition",
            StatusCode::InsufficientBalance => "insufficient_balance",
            StatusCode::InvalidReceiver => "invalid_receiver",
            StatusCode::Unauthorized => "unauthorized",
            StatusCode::InvalidGranularity => "invalid_granularity",
            StatusCode::CapExceeded => "cap_exceeded",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{:02x} ({})", self.as_byte(), self.label())
    }
}
