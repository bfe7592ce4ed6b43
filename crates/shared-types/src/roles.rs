//! # Roles
//!
//! Closed set of access-control roles.
//!
//! ## Encodings
//!
//! | Role | `u8` | 32-byte form (ASCII, zero padded) |
//! |------|------|-----------------------------------|
//! | Admin | 0 | `ADMIN` |
//! | Controller | 1 | `CONTROLLER` |
//! | Minter | 2 | `MINTER` |
//! | Pauser | 3 | `PAUSER` |
//! | Burner | 4 | `BURNER` |
//! | CapEditor | 5 | `CAP_EDITOR` |
//! | ConstraintsEditor | 6 | `CONSTRAINTS_EDITOR` |
//! | DocumentEditor | 7 | `DOCUMENT_EDITOR` |
//! | WhitelistEditor | 8 | `WHITELIST_EDITOR` |
//! | ModuleEditor | 9 | `MODULE_EDITOR` |
//! | Issuer | 10 | `ISSUER` |
//! | Redeemer | 11 | `REDEEMER` |
//! | TimelockEditor | 12 | `TIME_LOCK_EDITOR` |
//!
//! Roles are flat: holding one never implies another.

use crate::errors::DecodeError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Access-control role.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(u8)]
pub enum Role {
    Admin = 0,
    Controller = 1,
    Minter = 2,
    Pauser = 3,
    Burner = 4,
    CapEditor = 5,
    ConstraintsEditor = 6,
    DocumentEditor = 7,
    WhitelistEditor = 8,
    ModuleEditor = 9,
    Issuer = 10,
    Redeemer = 11,
    TimelockEditor = 12,
}

impl Role {
    /// Every role, in numeric order.
    pub const ALL: [Role; 13] = [
        Role::Admin,
        Role::Controller,
        Role::Minter,
        Role::Pauser,
        Role::Burner,
        Role::CapEditor,
        Role::ConstraintsEditor,
        Role::DocumentEditor,
        Role::WhitelistEditor,
        Role::ModuleEditor,
        Role::Issuer,
        Role::Redeemer,
        Role::TimelockEditor,
    ];

    /// Stable numeric form.
    pub fn as_u8(self) -> u8 {
        self as u8
    }

    /// Decode the numeric form.
    pub fn from_u8(value: u8) -> Result<Self, DecodeError> {
        Self::ALL
            .get(value as usize)
            .copied()
            .ok_or_else(|| DecodeError::UnknownRole(value.to_string()))
    }

    /// Canonical name, also the ASCII payload of the 32-byte form.
    pub fn name(self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Controller => "CONTROLLER",
            Role::Minter => "MINTER",
            Role::Pauser => "PAUSER",
            Role::Burner => "BURNER",
            Role::CapEditor => "CAP_EDITOR",
            Role::ConstraintsEditor => "CONSTRAINTS_EDITOR",
            Role::DocumentEditor => "DOCUMENT_EDITOR",
            Role::WhitelistEditor => "WHITELIST_EDITOR",
            Role::ModuleEditor => "MODULE_EDITOR",
            Role::Issuer => "ISSUER",
            Role::Redeemer => "REDEEMER",
            Role::TimelockEditor => "TIME_LOCK_EDITOR",
        }
    }

    /// 32-byte serialized form: ASCII name, right-padded with zeros.
    pub fn to_bytes32(self) -> [u8; 32] {
        let mut out = [0u8; 32];
        let name = self.name().as_bytes();
        out[..name.len()].copy_from_slice(name);
        out
    }

    /// Decode the 32-byte serialized form.
    pub fn from_bytes32(bytes: &[u8; 32]) -> Result<Self, DecodeError> {
        let end = bytes.iter().position(|b| *b == 0).unwrap_or(32);
        if bytes[end..].iter().any(|b| *b != 0) {
            return Err(DecodeError::UnknownRole(hex::encode(bytes)));
        }
        let name = std::str::from_utf8(&bytes[..end])
            .map_err(|_| DecodeError::UnknownRole(hex::encode(bytes)))?;
        name.parse()
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Role {
    type Err = DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .iter()
            .copied()
            .find(|role| role.name() == s)
            .ok_or_else(|| DecodeError::UnknownRole(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_round_trip_is_total() {
        for role in Role::ALL {
            assert_eq!(Role::from_u8(role.as_u8()).unwrap(), role);
        }
        assert!(Role::from_u8(13).is_err());
    }

    #[test]
    fn test_bytes32_matches_deployment_constants() {
        let whitelist =
            hex::decode("57484954454c4953545f454449544f5200000000000000000000000000000000").unwrap();
        assert_eq!(Role::WhitelistEditor.to_bytes32().as_slice(), whitelist.as_slice());

        let timelock =
            hex::decode("54494d455f4c4f434b5f454449544f5200000000000000000000000000000000").unwrap();
        assert_eq!(Role::TimelockEditor.to_bytes32().as_slice(), timelock.as_slice());
    }

    #[test]
    fn test_bytes32_decode() {
        let bytes = Role::Controller.to_bytes32();
        assert_eq!(Role::from_bytes32(&bytes).unwrap(), Role::Controller);

        let mut junk = [0u8; 32];
        junk[..4].copy_from_slice(b"NOPE");
        assert!(Role::from_bytes32(&junk).is_err());
    }

    #[test]
    fn test_bytes32_rejects_interior_garbage() {
        let mut bytes = Role::Issuer.to_bytes32();
        bytes[31] = 1;
        assert!(Role::from_bytes32(&bytes).is_err());
    }
}
