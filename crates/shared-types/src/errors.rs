//! # Error Types
//!
//! Decoding errors for the fixed-width encodings defined in this crate.

use thiserror::Error;

/// Errors raised while decoding identities, partitions, roles or status codes.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    /// Input had the wrong number of bytes.
    #[error("Invalid length: expected {expected} bytes, got {actual}")]
    InvalidLength { expected: usize, actual: usize },

    /// Input was not valid hexadecimal.
    #[error("Invalid hex: {0}")]
    InvalidHex(String),

    /// Numeric or byte form does not name a known role.
    #[error("Unknown role: {0}")]
    UnknownRole(String),

    /// Byte does not name a known status code.
    #[error("Unknown status code: 0x{0:02x}")]
    UnknownStatus(u8),
}
