//! # Core Ledger Entities
//!
//! Fixed-width identifiers used as map keys throughout the ledger.
//!
//! ## Type Decisions
//!
//! - `Amount = u128` - covers any practical supply without a big-integer
//!   dependency, same trade-off as the account state balance type.
//! - `Identity` is 20 bytes, `PartitionId` is 32 bytes. Both order
//!   lexicographically, which gives the global lock order for two-partition
//!   moves.

use crate::errors::DecodeError;
use serde::{Deserialize, Serialize};
use sha3::{Digest, Keccak256};
use std::fmt;
use std::str::FromStr;

/// Token amount in base units.
pub type Amount = u128;

/// Logical timestamp handed out by the host clock.
pub type Tick = u64;

/// Opaque 20-byte account identifier.
///
/// The all-zero value is the null identity: it can never receive tokens.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct Identity(pub [u8; 20]);

impl Identity {
    /// The null identity.
    pub const ZERO: Identity = Identity([0u8; 20]);

    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }

    /// True for the null identity.
    pub fn is_zero(&self) -> bool {
        self.0 == [0u8; 20]
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..3]))
    }
}

impl From<[u8; 20]> for Identity {
    fn from(bytes: [u8; 20]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Identity({})", self)
    }
}

impl FromStr for Identity {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_fixed::<20>(s)?;
        Ok(Self(bytes))
    }
}

/// 32-byte partition key.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize)]
pub struct PartitionId(pub [u8; 32]);

impl PartitionId {
    /// Create from raw bytes.
    pub const fn new(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Derive a partition key from a human-readable label (keccak-256).
    pub fn from_label(label: &str) -> Self {
        let digest = Keccak256::digest(label.as_bytes());
        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&digest);
        Self(bytes)
    }

    /// Build from a slice that must be exactly 32 bytes long.
    pub fn from_slice(slice: &[u8]) -> Result<Self, DecodeError> {
        let bytes: [u8; 32] = slice.try_into().map_err(|_| DecodeError::InvalidLength {
            expected: 32,
            actual: slice.len(),
        })?;
        Ok(Self(bytes))
    }

    /// Raw bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Short prefix for log lines.
    pub fn short(&self) -> String {
        format!("0x{}..", hex::encode(&self.0[..4]))
    }
}

impl From<[u8; 32]> for PartitionId {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl fmt::Debug for PartitionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PartitionId({})", self.short())
    }
}

impl FromStr for PartitionId {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let bytes = decode_fixed::<32>(s)?;
        Ok(Self(bytes))
    }
}

/// Balance of one identity inside one partition, captured at a point in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    pub partition: PartitionId,
    pub holder: Identity,
    pub balance: Amount,
}

fn decode_fixed<const N: usize>(s: &str) -> Result<[u8; N], DecodeError> {
    let trimmed = s.strip_prefix("0x").unwrap_or(s);
    let raw = hex::decode(trimmed).map_err(|e| DecodeError::InvalidHex(e.to_string()))?;
    raw.as_slice()
        .try_into()
        .map_err(|_| DecodeError::InvalidLength {
            expected: N,
            actual: raw.len(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_identity() {
        assert!(Identity::ZERO.is_zero());
        assert!(!Identity::new([1u8; 20]).is_zero());
    }

    #[test]
    fn test_identity_hex_parse() {
        let id: Identity = "0xe375639d0fa6fec13e6f00a09a3d3bacf18a354f".parse().unwrap();
        assert_eq!(id.0[0], 0xe3);
        assert_eq!(id.to_string(), "0xe375639d0fa6fec13e6f00a09a3d3bacf18a354f");
    }

    #[test]
    fn test_identity_parse_wrong_length() {
        let err = "0x0102".parse::<Identity>().unwrap_err();
        assert_eq!(
            err,
            DecodeError::InvalidLength {
                expected: 20,
                actual: 2
            }
        );
    }

    #[test]
    fn test_partition_from_label_is_keccak() {
        // keccak256("") is a well-known constant
        let empty = PartitionId::from_label("");
        assert_eq!(
            empty.to_string(),
            "0xc5d2460186f7233c927e7db2dcc703c0e500b653ca82273b7bfad8045d85a470"
        );
        assert_eq!(
            PartitionId::from_label("newPartition"),
            PartitionId::from_label("newPartition")
        );
    }

    #[test]
    fn test_partition_from_slice() {
        assert!(PartitionId::from_slice(&[7u8; 32]).is_ok());
        assert!(PartitionId::from_slice(&[7u8; 31]).is_err());
    }

    #[test]
    fn test_partition_ordering_is_lexicographic() {
        let low = PartitionId::new([0x01; 32]);
        let high = PartitionId::new([0x02; 32]);
        assert!(low < high);
    }
}
