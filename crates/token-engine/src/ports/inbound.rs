//! # Inbound Ports
//!
//! API trait defining what the token engine can do. Every mutating call takes
//! the caller identity explicitly; the engine never infers it.

use crate::domain::{
    AuditReport, OperationReceipt, PartitionInfo, TokenError, TransferOutcome,
};
use crate::ports::outbound::TransferHook;
use shared_types::{Amount, Identity, PartitionId, Role};
use std::sync::Arc;

/// Token engine API - inbound port.
#[allow(clippy::too_many_arguments)]
pub trait TokenApi: Send + Sync {
    // =========================================================================
    // SUPPLY
    // =========================================================================

    /// Mint into a partition. Requires MINTER or ISSUER.
    fn issue_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError>;

    /// Burn from a partition. Requires BURNER or REDEEMER, or `caller == from`.
    fn redeem_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError>;

    /// Burn on behalf of a holder. Requires an operator or CONTROLLER.
    fn operator_redeem_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<OperationReceipt, TokenError>;

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    /// Move the caller's own balance. `data` may request a repartition.
    fn transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError>;

    /// Move `from`'s balance as an operator or CONTROLLER.
    fn operator_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        to: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<OperationReceipt, TokenError>;

    /// Dry run of `transfer_by_partition`. Never mutates.
    fn can_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> TransferOutcome;

    /// Dry run of `operator_transfer_by_partition`. Never mutates.
    fn can_operator_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        to: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> TransferOutcome;

    // =========================================================================
    // DELEGATION
    // =========================================================================

    fn authorize_operator_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        operator: Identity,
    ) -> Result<bool, TokenError>;

    fn revoke_operator_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        operator: Identity,
    ) -> Result<bool, TokenError>;

    /// Explicit delegation only; see `is_authorized_operator` for the
    /// controller override.
    fn is_operator_for_partition(
        &self,
        partition: PartitionId,
        operator: Identity,
        holder: Identity,
    ) -> bool;

    /// Delegated operator or CONTROLLER.
    fn is_authorized_operator(
        &self,
        partition: PartitionId,
        operator: Identity,
        holder: Identity,
    ) -> bool;

    fn operators_of(&self, partition: PartitionId, holder: Identity) -> Vec<Identity>;

    // =========================================================================
    // ACCESS CONTROL
    // =========================================================================

    fn add_role(&self, caller: Identity, role: Role, identity: Identity) -> Result<bool, TokenError>;

    fn remove_role(&self, caller: Identity, role: Role, identity: Identity)
        -> Result<bool, TokenError>;

    fn renounce_role(&self, caller: Identity, role: Role) -> bool;

    fn has_role(&self, role: Role, identity: Identity) -> bool;

    fn roles_of(&self, identity: Identity) -> Vec<Role>;

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    /// Register a partition. Requires CAP_EDITOR or ADMIN.
    fn add_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        cap: Option<Amount>,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<Amount, TokenError>;

    /// Requires CAP_EDITOR or ADMIN. Returns the previous cap.
    fn set_partition_cap(
        &self,
        caller: Identity,
        partition: PartitionId,
        cap: Amount,
    ) -> Result<Amount, TokenError>;

    /// Requires CAP_EDITOR or ADMIN.
    fn set_partition_handler(
        &self,
        caller: Identity,
        partition: PartitionId,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<(), TokenError>;

    /// Global cap. Requires CAP_EDITOR. Returns the previous cap.
    fn set_cap(&self, caller: Identity, cap: Amount) -> Result<Amount, TokenError>;

    /// Replace the global transfer modules. Requires MODULE_EDITOR.
    fn set_modules(
        &self,
        caller: Identity,
        modules: Vec<Arc<dyn TransferHook>>,
    ) -> Result<(), TokenError>;

    /// Requires PAUSER. Returns `false` if already paused.
    fn pause(&self, caller: Identity) -> Result<bool, TokenError>;

    /// Requires PAUSER. Returns `false` if not paused.
    fn unpause(&self, caller: Identity) -> Result<bool, TokenError>;

    /// Recompute a partition book; halts it on mismatch.
    fn audit(&self, partition: PartitionId) -> Result<AuditReport, TokenError>;

    // =========================================================================
    // QUERIES
    // =========================================================================

    fn name(&self) -> String;
    fn symbol(&self) -> String;
    fn decimals(&self) -> u8;
    fn granularity(&self) -> Amount;
    /// Global cap.
    fn cap(&self) -> Amount;
    fn is_paused(&self) -> bool;
    fn modules(&self) -> Vec<String>;

    fn total_supply(&self) -> Amount;
    fn total_supply_by_partition(&self, partition: PartitionId) -> Result<Amount, TokenError>;
    fn balance_of(&self, holder: Identity) -> Amount;
    fn balance_of_by_partition(&self, partition: PartitionId, holder: Identity) -> Amount;
    fn partitions_of(&self, holder: Identity) -> Vec<PartitionId>;

    fn partition(&self, partition: PartitionId) -> Result<PartitionInfo, TokenError>;
    /// Registered partitions, in registration order.
    fn partitions(&self) -> Vec<PartitionInfo>;
}
