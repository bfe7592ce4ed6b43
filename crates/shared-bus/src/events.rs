//! # Ledger Events
//!
//! Audit records emitted by the token engine after every mutating operation.
//! Indexers and auditors consume them from the bus; the transport beyond the
//! in-memory broadcast channel is up to the host.

use serde::{Deserialize, Serialize};
use shared_types::{Amount, BalanceSnapshot, Identity, PartitionId, Role, Tick};

/// Kind of balance-moving operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operation {
    /// New supply credited to a holder.
    Issue,
    /// Supply debited from a holder and destroyed.
    Redeem,
    /// Holder-initiated transfer inside one partition.
    Transfer,
    /// Operator or controller initiated transfer inside one partition.
    OperatorTransfer,
    /// Transfer whose credit leg lands in a different partition.
    Repartition,
}

impl Operation {
    /// Stable lower-case label (metric label, log field).
    #[must_use]
    pub fn label(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::Redeem => "redeem",
            Self::Transfer => "transfer",
            Self::OperatorTransfer => "operator_transfer",
            Self::Repartition => "repartition",
        }
    }
}

/// Structured record of one balance-moving operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferRecord {
    /// Logical clock tick at which the mutation was applied.
    pub sequence: Tick,
    pub operation: Operation,
    /// Partition that was debited (or credited, for issuance).
    pub partition: PartitionId,
    /// Partition that was credited when different from `partition`.
    pub target_partition: Option<PartitionId>,
    /// Identity that invoked the operation.
    pub operator: Identity,
    /// Debited holder. `None` for issuance.
    pub from: Option<Identity>,
    /// Credited holder. `None` for redemption.
    pub to: Option<Identity>,
    pub amount: Amount,
    pub data: Vec<u8>,
    pub operator_data: Vec<u8>,
    /// Balances of every touched (holder, partition) pair after the mutation.
    pub resulting_balances: Vec<BalanceSnapshot>,
}

/// All events that can be published to the bus.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedgerEvent {
    // =========================================================================
    // BALANCES
    // =========================================================================
    /// Balances moved (issue, redeem, transfer, repartition).
    BalanceChanged(TransferRecord),

    // =========================================================================
    // ACCESS CONTROL
    // =========================================================================
    RoleGranted {
        sequence: Tick,
        role: Role,
        identity: Identity,
        /// `None` for bootstrap grants.
        granted_by: Option<Identity>,
    },

    RoleRevoked {
        sequence: Tick,
        role: Role,
        identity: Identity,
        revoked_by: Identity,
    },

    // =========================================================================
    // DELEGATION
    // =========================================================================
    OperatorAuthorized {
        sequence: Tick,
        partition: PartitionId,
        holder: Identity,
        operator: Identity,
    },

    OperatorRevoked {
        sequence: Tick,
        partition: PartitionId,
        holder: Identity,
        operator: Identity,
    },

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================
    PartitionRegistered {
        sequence: Tick,
        partition: PartitionId,
        cap: Amount,
        has_handler: bool,
    },

    PartitionCapUpdated {
        sequence: Tick,
        partition: PartitionId,
        old_cap: Amount,
        new_cap: Amount,
    },

    /// Partition handler attached, replaced or cleared.
    HandlerUpdated {
        sequence: Tick,
        partition: PartitionId,
        handler: Option<String>,
    },

    GlobalCapUpdated {
        sequence: Tick,
        old_cap: Amount,
        new_cap: Amount,
    },

    ModulesUpdated {
        sequence: Tick,
        modules: Vec<String>,
    },

    Paused {
        sequence: Tick,
        by: Identity,
    },

    Unpaused {
        sequence: Tick,
        by: Identity,
    },

    // =========================================================================
    // ALERTS
    // =========================================================================
    /// A partition stopped accepting mutations after an invariant violation.
    PartitionHalted {
        sequence: Tick,
        partition: PartitionId,
        reason: String,
    },
}

impl LedgerEvent {
    /// Get the topic for this event (for filtering).
    #[must_use]
    pub fn topic(&self) -> EventTopic {
        match self {
            Self::BalanceChanged(record) => match record.operation {
                Operation::Issue => EventTopic::Issuance,
                Operation::Redeem => EventTopic::Redemption,
                Operation::Transfer | Operation::OperatorTransfer | Operation::Repartition => {
                    EventTopic::Transfer
                }
            },
            Self::RoleGranted { .. } | Self::RoleRevoked { .. } => EventTopic::AccessControl,
            Self::OperatorAuthorized { .. } | Self::OperatorRevoked { .. } => {
                EventTopic::Delegation
            }
            Self::PartitionRegistered { .. }
            | Self::PartitionCapUpdated { .. }
            | Self::HandlerUpdated { .. }
            | Self::GlobalCapUpdated { .. }
            | Self::ModulesUpdated { .. }
            | Self::Paused { .. }
            | Self::Unpaused { .. } => EventTopic::Administration,
            Self::PartitionHalted { .. } => EventTopic::Alert,
        }
    }

    /// Logical clock tick of the event.
    #[must_use]
    pub fn sequence(&self) -> Tick {
        match self {
            Self::BalanceChanged(record) => record.sequence,
            Self::RoleGranted { sequence, .. }
            | Self::RoleRevoked { sequence, .. }
            | Self::OperatorAuthorized { sequence, .. }
            | Self::OperatorRevoked { sequence, .. }
            | Self::PartitionRegistered { sequence, .. }
            | Self::PartitionCapUpdated { sequence, .. }
            | Self::HandlerUpdated { sequence, .. }
            | Self::GlobalCapUpdated { sequence, .. }
            | Self::ModulesUpdated { sequence, .. }
            | Self::Paused { sequence, .. }
            | Self::Unpaused { sequence, .. }
            | Self::PartitionHalted { sequence, .. } => *sequence,
        }
    }

    /// Partitions this event concerns. Empty for token-wide events.
    #[must_use]
    pub fn partitions(&self) -> Vec<PartitionId> {
        match self {
            Self::BalanceChanged(record) => {
                let mut out = vec![record.partition];
                if let Some(target) = record.target_partition {
                    out.push(target);
                }
                out
            }
            Self::OperatorAuthorized { partition, .. }
            | Self::OperatorRevoked { partition, .. }
            | Self::PartitionRegistered { partition, .. }
            | Self::PartitionCapUpdated { partition, .. }
            | Self::HandlerUpdated { partition, .. }
            | Self::PartitionHalted { partition, .. } => vec![*partition],
            _ => Vec::new(),
        }
    }
}

/// Event topics for subscription filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EventTopic {
    Issuance,
    Redemption,
    Transfer,
    AccessControl,
    Delegation,
    Administration,
    /// Invariant violations and halts.
    Alert,
    /// All events (no filtering).
    All,
}

/// Filter for subscribing to specific events.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    /// Topics to include. Empty means all topics.
    pub topics: Vec<EventTopic>,
    /// Partitions to include. Empty means all partitions, including
    /// token-wide events.
    pub partitions: Vec<PartitionId>,
}

impl EventFilter {
    /// Create a filter that accepts all events.
    #[must_use]
    pub fn all() -> Self {
        Self::default()
    }

    /// Create a filter for specific topics.
    #[must_use]
    pub fn topics(topics: Vec<EventTopic>) -> Self {
        Self {
            topics,
            partitions: Vec::new(),
        }
    }

    /// Create a filter for events touching specific partitions.
    #[must_use]
    pub fn for_partitions(partitions: Vec<PartitionId>) -> Self {
        Self {
            topics: Vec::new(),
            partitions,
        }
    }

    /// Check if an event matches this filter.
    #[must_use]
    pub fn matches(&self, event: &LedgerEvent) -> bool {
        let topic_match = self.topics.is_empty()
            || self.topics.contains(&EventTopic::All)
            || self.topics.contains(&event.topic());

        let partition_match = self.partitions.is_empty()
            || event
                .partitions()
                .iter()
                .any(|p| self.partitions.contains(p));

        topic_match && partition_match
    }
}
