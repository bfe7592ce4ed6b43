//! # Value Objects
//!
//! Transfer routing and caller authority.
//!
//! ## Repartition encoding
//!
//! ```text
//! data = [0xFF; 32] ++ target_partition[32] ++ anything
//! ```
//!
//! Any other `data` is opaque and the transfer stays in its source partition.

use shared_types::PartitionId;

/// Reserved prefix that marks `data` as a repartition request.
pub const REPARTITION_FLAG: [u8; 32] = [0xFF; 32];

/// Destination of a transfer, decoded once from `data`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferRoute {
    /// Debit and credit in the source partition.
    Simple,
    /// Debit in the source partition, credit in `target`.
    Repartition { target: PartitionId },
}

/// `data` carries the repartition flag but no complete target key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MalformedRoute;

impl TransferRoute {
    /// Decode `data` for a transfer out of `source`.
    ///
    /// A target equal to `source` collapses to [`TransferRoute::Simple`].
    pub fn decode(source: PartitionId, data: &[u8]) -> Result<Self, MalformedRoute> {
        if data.len() < REPARTITION_FLAG.len() || data[..32] != REPARTITION_FLAG {
            return Ok(Self::Simple);
        }
        let target = data
            .get(32..64)
            .map(PartitionId::from_slice)
            .and_then(Result::ok)
            .ok_or(MalformedRoute)?;

        if target == source {
            Ok(Self::Simple)
        } else {
            Ok(Self::Repartition { target })
        }
    }

    /// Partition credited by this route.
    pub fn destination(&self, source: PartitionId) -> PartitionId {
        match self {
            Self::Simple => source,
            Self::Repartition { target } => *target,
        }
    }

    pub fn is_repartition(&self) -> bool {
        matches!(self, Self::Repartition { .. })
    }
}

/// Build the `data` payload that moves a transfer into `target`.
pub fn repartition_data(target: PartitionId) -> Vec<u8> {
    let mut data = Vec::with_capacity(64);
    data.extend_from_slice(&REPARTITION_FLAG);
    data.extend_from_slice(target.as_bytes());
    data
}

/// Who is moving the funds, relative to the debited holder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authority {
    /// The caller is the holder.
    Holder,
    /// Operator-initiated call. Authorized when any predicate holds.
    Operator {
        caller_is_holder: bool,
        is_operator: bool,
        is_controller: bool,
    },
}

impl Authority {
    pub fn is_authorized(&self) -> bool {
        match *self {
            Self::Holder => true,
            Self::Operator {
                caller_is_holder,
                is_operator,
                is_controller,
            } => caller_is_holder || is_operator || is_controller,
        }
    }

    pub fn is_operator_call(&self) -> bool {
        matches!(self, Self::Operator { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_data_is_simple() {
        let p = PartitionId::from_label("default");
        assert_eq!(TransferRoute::decode(p, b"").unwrap(), TransferRoute::Simple);
        assert_eq!(
            TransferRoute::decode(p, &[0xFF; 31]).unwrap(),
            TransferRoute::Simple
        );
        let mut almost = vec![0xFF; 64];
        almost[5] = 0;
        assert_eq!(TransferRoute::decode(p, &almost).unwrap(), TransferRoute::Simple);
    }

    #[test]
    fn test_flag_with_target_decodes() {
        let source = PartitionId::from_label("locked");
        let target = PartitionId::from_label("unlocked");
        let mut data = repartition_data(target);
        data.extend_from_slice(b"trailing");

        let route = TransferRoute::decode(source, &data).unwrap();
        assert_eq!(route, TransferRoute::Repartition { target });
        assert_eq!(route.destination(source), target);
    }

    #[test]
    fn test_truncated_target_is_malformed() {
        let p = PartitionId::from_label("locked");
        let mut data = REPARTITION_FLAG.to_vec();
        data.extend_from_slice(&[1u8; 10]);
        assert_eq!(TransferRoute::decode(p, &data), Err(MalformedRoute));
    }

    #[test]
    fn test_self_target_collapses() {
        let p = PartitionId::from_label("locked");
        let route = TransferRoute::decode(p, &repartition_data(p)).unwrap();
        assert!(!route.is_repartition());
    }

    #[test]
    fn test_operator_authority() {
        let denied = Authority::Operator {
            caller_is_holder: false,
            is_operator: false,
            is_controller: false,
        };
        assert!(!denied.is_authorized());

        let controller = Authority::Operator {
            caller_is_holder: false,
            is_operator: false,
            is_controller: true,
        };
        assert!(controller.is_authorized());
        assert!(Authority::Holder.is_authorized());
    }
}
