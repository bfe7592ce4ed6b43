//! # Token Engine Service
//!
//! Composes the registries, the ledger and the validator behind [`TokenApi`].
//!
//! ## Call flow
//!
//! 1. Authorization (roles, operators)
//! 2. Validation against a read-locked snapshot, then hooks with no lock held
//! 3. Re-validation and mutation under the book write locks
//! 4. Hook notifications and the audit event, again with no lock held
//!
//! Every call is synchronous; its effects are visible when it returns.

use crate::config::TokenConfig;
use crate::domain::{
    AuditReport, Authority, MalformedRoute, OperationReceipt, PartitionBook, PartitionInfo,
    TokenError, TokenMetadata, TransferCheck, TransferOutcome, TransferRoute, TransferValidator,
};
use crate::ports::inbound::TokenApi;
use crate::ports::outbound::{EventSink, HookContext, LogicalClock, TransferHook};
use crate::store::{GenesisEntry, TokenStore};
use ledger_telemetry::metrics;
use parking_lot::RwLock;
use shared_bus::{LedgerEvent, Operation, TransferRecord};
use shared_types::{Amount, BalanceSnapshot, Identity, PartitionId, Role, StatusCode, Tick};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

const ISSUE_ROLES: &[Role] = &[Role::Minter, Role::Issuer];
const REDEEM_ROLES: &[Role] = &[Role::Burner, Role::Redeemer];
const PARTITION_ROLES: &[Role] = &[Role::CapEditor, Role::Admin];

/// Balance-moving call, before routing.
struct TransferIntent<'a> {
    operation: Operation,
    caller: Identity,
    partition: PartitionId,
    from: Identity,
    to: Identity,
    amount: Amount,
    data: &'a [u8],
    operator_data: &'a [u8],
}

impl TransferIntent<'_> {
    fn is_operator_call(&self) -> bool {
        self.operation == Operation::OperatorTransfer
    }

    fn hook_context(&self, destination: PartitionId) -> HookContext<'_> {
        HookContext {
            operation: self.operation,
            partition: self.partition,
            destination,
            operator: self.caller,
            from: self.from,
            to: self.to,
            amount: self.amount,
            data: self.data,
            operator_data: self.operator_data,
        }
    }
}

pub struct TokenEngine {
    metadata: TokenMetadata,
    store: TokenStore,
    validator: TransferValidator,
    clock: Arc<dyn LogicalClock>,
    sink: Arc<dyn EventSink>,
    modules: RwLock<Vec<Arc<dyn TransferHook>>>,
    paused: AtomicBool,
}

impl TokenEngine {
    /// Wrap an already bootstrapped store. Bootstrap grants and partitions
    /// are reported to the sink here.
    pub fn new(
        metadata: TokenMetadata,
        mut store: TokenStore,
        clock: Arc<dyn LogicalClock>,
        sink: Arc<dyn EventSink>,
    ) -> Self {
        let genesis = store.take_genesis();
        let engine = Self {
            validator: TransferValidator::new(metadata.granularity),
            metadata,
            store,
            clock,
            sink,
            modules: RwLock::new(Vec::new()),
            paused: AtomicBool::new(false),
        };

        for entry in genesis {
            let sequence = engine.clock.tick();
            engine.sink.emit(match entry {
                GenesisEntry::RoleGranted { role, identity } => LedgerEvent::RoleGranted {
                    sequence,
                    role,
                    identity,
                    granted_by: None,
                },
                GenesisEntry::PartitionRegistered { partition, cap } => {
                    LedgerEvent::PartitionRegistered {
                        sequence,
                        partition,
                        cap,
                        has_handler: false,
                    }
                }
            });
        }
        metrics::set_partition_count(engine.store.partitions.len());
        metrics::set_total_supply(engine.store.ledger.total_supply());

        info!(
            name = %engine.metadata.name,
            symbol = %engine.metadata.symbol,
            granularity = engine.metadata.granularity,
            "Token engine ready"
        );
        engine
    }

    /// Validate `config`, bootstrap a store and wrap it.
    pub fn bootstrap(
        config: &TokenConfig,
        clock: Arc<dyn LogicalClock>,
        sink: Arc<dyn EventSink>,
    ) -> Result<Self, TokenError> {
        let store = TokenStore::bootstrap(config)?;
        let metadata = TokenMetadata {
            name: config.name.clone(),
            symbol: config.symbol.clone(),
            decimals: config.decimals,
            granularity: config.granularity,
        };
        Ok(Self::new(metadata, store, clock, sink))
    }

    pub fn metadata(&self) -> &TokenMetadata {
        &self.metadata
    }

    pub fn store(&self) -> &TokenStore {
        &self.store
    }

    /// Last tick handed out by the engine's clock.
    pub fn now(&self) -> Tick {
        self.clock.now()
    }

    /// Tear down the engine and keep its state.
    pub fn into_store(self) -> TokenStore {
        self.store
    }

    /// Audit every partition and the global total.
    ///
    /// A total that disagrees with the partition supplies cannot be pinned on
    /// one book, so every book is halted.
    pub fn audit_all(&self) -> Result<Vec<AuditReport>, TokenError> {
        let partitions = self.store.partitions.ids();
        let reports = partitions
            .iter()
            .map(|partition| self.audit(*partition))
            .collect::<Result<Vec<_>, _>>()?;

        if let Err(reason) = self.store.ledger.audit_total() {
            error!(reason = %reason, "Total supply does not match partition supplies");
            for partition in partitions {
                if self.store.ledger.halt(partition, &reason)? {
                    self.on_halt(partition, &reason);
                }
            }
            return Err(TokenError::SupplyMismatch { reason });
        }
        Ok(reports)
    }

    // =========================================================================
    // AUTHORIZATION HELPERS
    // =========================================================================

    fn require_roles(
        &self,
        caller: Identity,
        roles: &[Role],
        action: &str,
    ) -> Result<(), TokenError> {
        self.store
            .roles
            .require_any(caller, roles)
            .map_err(|e| self.fail(e, action))
    }

    fn ensure_transferable(&self, to: Option<Identity>, amount: Amount) -> Result<(), TokenError> {
        if to.is_some_and(|to| to.is_zero()) {
            return Err(TokenError::InvalidReceiver);
        }
        if !self.validator.is_granular(amount) {
            return Err(TokenError::InvalidGranularity {
                amount,
                granularity: self.validator.granularity(),
            });
        }
        Ok(())
    }

    fn ensure_running(&self) -> Result<(), TokenError> {
        if self.paused.load(Ordering::SeqCst) {
            return Err(TokenError::Paused);
        }
        Ok(())
    }

    fn authority(&self, intent: &TransferIntent<'_>) -> Authority {
        if !intent.is_operator_call() {
            return Authority::Holder;
        }
        Authority::Operator {
            caller_is_holder: intent.caller == intent.from,
            is_operator: self.store.operators.is_operator(
                intent.partition,
                &intent.from,
                &intent.caller,
            ),
            is_controller: self.store.roles.has(Role::Controller, &intent.caller),
        }
    }

    // =========================================================================
    // FAILURE HANDLING
    // =========================================================================

    /// Count and log a failure, halting its partition on invariant violations.
    fn fail(&self, err: TokenError, action: &str) -> TokenError {
        match &err {
            TokenError::InvariantViolation { partition, reason } => {
                self.on_halt(*partition, reason);
            }
            e if e.is_authorization() => {
                metrics::record_authorization_failure(action);
                warn!(action, error = %e, "Authorization failed");
            }
            e => {
                if let Some(status) = e.status_code() {
                    metrics::record_rejection(status.label());
                }
                debug!(action, error = %e, "Operation rejected");
            }
        }
        err
    }

    fn on_halt(&self, partition: PartitionId, reason: &str) {
        metrics::record_invariant_violation();
        error!(partition = %partition, reason, "Partition halted");
        self.sink.emit(LedgerEvent::PartitionHalted {
            sequence: self.clock.tick(),
            partition,
            reason: reason.to_string(),
        });
    }

    fn rejected(&self, partition: PartitionId, status: StatusCode, action: &str) -> TokenError {
        self.fail(TokenError::TransferRejected { status, partition }, action)
    }

    // =========================================================================
    // TRANSFER PIPELINE
    // =========================================================================

    fn snapshot(
        &self,
        intent: &TransferIntent<'_>,
        route: Result<TransferRoute, MalformedRoute>,
        source: Option<&PartitionBook>,
        target: Option<&PartitionBook>,
    ) -> TransferCheck {
        TransferCheck {
            to: intent.to,
            amount: intent.amount,
            route,
            paused: self.paused.load(Ordering::SeqCst),
            source: source.map(|book| book.state_for(&intent.from)),
            target: target.map(|book| book.state_for(&intent.from)),
            authority: self.authority(intent),
        }
    }

    /// Handler of the source, handler of the target, then global modules.
    fn hooks_for(
        &self,
        source: PartitionId,
        destination: PartitionId,
    ) -> Vec<Arc<dyn TransferHook>> {
        let mut hooks: Vec<_> = self.store.partitions.handler(source).into_iter().collect();
        if destination != source {
            hooks.extend(self.store.partitions.handler(destination));
        }
        hooks.extend(self.modules.read().iter().cloned());
        hooks
    }

    fn consult_hooks(&self, hooks: &[Arc<dyn TransferHook>], ctx: &HookContext<'_>) -> StatusCode {
        for hook in hooks {
            if let Err(reason) = hook.check(ctx) {
                debug!(hook = hook.name(), reason = %reason, "Transfer rejected by hook");
                return StatusCode::TransferFailure;
            }
        }
        StatusCode::Success
    }

    /// Full read-only evaluation, hooks included.
    fn evaluate(
        &self,
        intent: &TransferIntent<'_>,
    ) -> (Result<TransferRoute, MalformedRoute>, TransferOutcome) {
        let route = TransferRoute::decode(intent.partition, intent.data);
        let destination = route
            .map(|r| r.destination(intent.partition))
            .unwrap_or(intent.partition);
        let target = match route {
            Ok(TransferRoute::Repartition { target }) => Some(target),
            _ => None,
        };

        let mut status = self.store.ledger.view(intent.partition, target, |source, target| {
            self.validator
                .check(&self.snapshot(intent, route, source, target))
        });

        if status.is_success() {
            let hooks = self.hooks_for(intent.partition, destination);
            status = self.consult_hooks(&hooks, &intent.hook_context(destination));
        }

        (route, TransferOutcome { status, destination })
    }

    fn execute_transfer(&self, intent: TransferIntent<'_>) -> Result<OperationReceipt, TokenError> {
        let _timer = ledger_telemetry::time_histogram!(ledger_telemetry::TRANSFER_DURATION);
        let action = intent.operation.label();

        let (route, outcome) = self.evaluate(&intent);
        if !outcome.status.is_success() {
            return Err(self.rejected(intent.partition, outcome.status, action));
        }
        let destination = outcome.destination;

        let applied = self
            .store
            .ledger
            .with_books(intent.partition, destination, |txn| {
                // State may have moved since the snapshot
                let check = self.snapshot(&intent, route, Some(txn.source()), Some(txn.target()));
                let status = self.validator.check(&check);
                if !status.is_success() {
                    return Err(TokenError::TransferRejected {
                        status,
                        partition: intent.partition,
                    });
                }
                let balances = txn.move_balance(intent.from, intent.to, intent.amount)?;
                Ok((self.clock.tick(), balances))
            })
            .map_err(|e| self.fail(e, action))?;
        let (sequence, (from_balance, to_balance)) = applied;

        let operation = if destination != intent.partition {
            Operation::Repartition
        } else {
            intent.operation
        };

        let ctx = intent.hook_context(destination);
        for hook in self.hooks_for(intent.partition, destination) {
            hook.after(&ctx);
        }

        let mut balances = vec![BalanceSnapshot {
            partition: intent.partition,
            holder: intent.from,
            balance: from_balance,
        }];
        if destination != intent.partition || intent.to != intent.from {
            balances.push(BalanceSnapshot {
                partition: destination,
                holder: intent.to,
                balance: to_balance,
            });
        }

        self.emit_balance_change(TransferRecord {
            sequence,
            operation,
            partition: intent.partition,
            target_partition: (destination != intent.partition).then_some(destination),
            operator: intent.caller,
            from: Some(intent.from),
            to: Some(intent.to),
            amount: intent.amount,
            data: intent.data.to_vec(),
            operator_data: intent.operator_data.to_vec(),
            resulting_balances: balances.clone(),
        });

        info!(
            operation = operation.label(),
            partition = %intent.partition.short(),
            destination = %destination.short(),
            from = %intent.from.short(),
            to = %intent.to.short(),
            amount = intent.amount,
            sequence,
            "Transfer applied"
        );

        Ok(OperationReceipt {
            sequence,
            destination,
            balances,
        })
    }

    fn emit_balance_change(&self, record: TransferRecord) {
        metrics::record_operation(record.operation.label());
        self.sink.emit(LedgerEvent::BalanceChanged(record));
    }

    /// Shared tail of issue, redeem and operator redeem.
    #[allow(clippy::too_many_arguments)]
    fn apply_supply_change(
        &self,
        operation: Operation,
        caller: Identity,
        partition: PartitionId,
        holder: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
        authorize: impl Fn() -> Result<(), TokenError>,
    ) -> Result<OperationReceipt, TokenError> {
        let action = operation.label();
        let issuing = operation == Operation::Issue;

        let (sequence, balance) = self
            .store
            .ledger
            .with_book(partition, |txn| {
                // Re-read authorization and pause under the book lock
                authorize()?;
                self.ensure_running()?;
                let balance = if issuing {
                    txn.credit(holder, amount)?
                } else {
                    txn.debit(holder, amount)?
                };
                Ok((self.clock.tick(), balance))
            })
            .map_err(|e| self.fail(e, action))?;

        let balances = vec![BalanceSnapshot {
            partition,
            holder,
            balance,
        }];
        self.emit_balance_change(TransferRecord {
            sequence,
            operation,
            partition,
            target_partition: None,
            operator: caller,
            from: (!issuing).then_some(holder),
            to: issuing.then_some(holder),
            amount,
            data: data.to_vec(),
            operator_data: operator_data.to_vec(),
            resulting_balances: balances.clone(),
        });
        metrics::set_total_supply(self.store.ledger.total_supply());

        info!(
            operation = action,
            partition = %partition.short(),
            holder = %holder.short(),
            amount,
            balance,
            sequence,
            "Supply changed"
        );

        Ok(OperationReceipt {
            sequence,
            destination: partition,
            balances,
        })
    }

    fn may_redeem_for(&self, caller: Identity, partition: PartitionId, holder: Identity) -> bool {
        caller == holder
            || self.store.operators.is_operator(partition, &holder, &caller)
            || self.store.roles.has(Role::Controller, &caller)
    }
}

impl TokenApi for TokenEngine {
    // =========================================================================
    // SUPPLY
    // =========================================================================

    #[instrument(skip_all, fields(caller = %caller, partition = %partition.short(), amount = amount))]
    fn issue_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError> {
        self.require_roles(caller, ISSUE_ROLES, "issue")?;
        self.ensure_transferable(Some(to), amount)
            .map_err(|e| self.fail(e, "issue"))?;

        self.apply_supply_change(
            Operation::Issue,
            caller,
            partition,
            to,
            amount,
            data,
            &[],
            || self.store.roles.require_any(caller, ISSUE_ROLES),
        )
    }

    #[instrument(skip_all, fields(caller = %caller, partition = %partition.short(), amount = amount))]
    fn redeem_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError> {
        let authorize = || {
            if caller == from {
                Ok(())
            } else {
                self.store.roles.require_any(caller, REDEEM_ROLES)
            }
        };
        authorize().map_err(|e| self.fail(e, "redeem"))?;
        self.ensure_transferable(None, amount)
            .map_err(|e| self.fail(e, "redeem"))?;

        self.apply_supply_change(
            Operation::Redeem,
            caller,
            partition,
            from,
            amount,
            data,
            &[],
            authorize,
        )
    }

    #[instrument(skip_all, fields(caller = %caller, partition = %partition.short(), amount = amount))]
    fn operator_redeem_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<OperationReceipt, TokenError> {
        let authorize = || {
            if self.may_redeem_for(caller, partition, from) {
                Ok(())
            } else {
                Err(TokenError::NotOperator {
                    caller,
                    holder: from,
                    partition,
                })
            }
        };
        authorize().map_err(|e| self.fail(e, "operator_redeem"))?;
        self.ensure_transferable(None, amount)
            .map_err(|e| self.fail(e, "operator_redeem"))?;

        self.apply_supply_change(
            Operation::Redeem,
            caller,
            partition,
            from,
            amount,
            data,
            operator_data,
            authorize,
        )
    }

    // =========================================================================
    // TRANSFERS
    // =========================================================================

    #[instrument(skip_all, fields(caller = %caller, partition = %partition.short(), amount = amount))]
    fn transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> Result<OperationReceipt, TokenError> {
        self.execute_transfer(TransferIntent {
            operation: Operation::Transfer,
            caller,
            partition,
            from: caller,
            to,
            amount,
            data,
            operator_data: &[],
        })
    }

    #[instrument(skip_all, fields(caller = %caller, partition = %partition.short(), amount = amount))]
    fn operator_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        to: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> Result<OperationReceipt, TokenError> {
        self.execute_transfer(TransferIntent {
            operation: Operation::OperatorTransfer,
            caller,
            partition,
            from,
            to,
            amount,
            data,
            operator_data,
        })
    }

    fn can_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        to: Identity,
        amount: Amount,
        data: &[u8],
    ) -> TransferOutcome {
        self.evaluate(&TransferIntent {
            operation: Operation::Transfer,
            caller,
            partition,
            from: caller,
            to,
            amount,
            data,
            operator_data: &[],
        })
        .1
    }

    fn can_operator_transfer_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        from: Identity,
        to: Identity,
        amount: Amount,
        data: &[u8],
        operator_data: &[u8],
    ) -> TransferOutcome {
        self.evaluate(&TransferIntent {
            operation: Operation::OperatorTransfer,
            caller,
            partition,
            from,
            to,
            amount,
            data,
            operator_data,
        })
        .1
    }

    // =========================================================================
    // DELEGATION
    // =========================================================================

    fn authorize_operator_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        operator: Identity,
    ) -> Result<bool, TokenError> {
        let changed = self
            .store
            .operators
            .authorize(caller, partition, caller, operator)
            .map_err(|e| self.fail(e, "authorize_operator"))?;
        if changed {
            self.sink.emit(LedgerEvent::OperatorAuthorized {
                sequence: self.clock.tick(),
                partition,
                holder: caller,
                operator,
            });
        }
        Ok(changed)
    }

    fn revoke_operator_by_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        operator: Identity,
    ) -> Result<bool, TokenError> {
        let changed = self
            .store
            .operators
            .revoke(caller, partition, caller, operator)
            .map_err(|e| self.fail(e, "revoke_operator"))?;
        if changed {
            self.sink.emit(LedgerEvent::OperatorRevoked {
                sequence: self.clock.tick(),
                partition,
                holder: caller,
                operator,
            });
        }
        Ok(changed)
    }

    fn is_operator_for_partition(
        &self,
        partition: PartitionId,
        operator: Identity,
        holder: Identity,
    ) -> bool {
        self.store.operators.is_operator(partition, &holder, &operator)
    }

    fn is_authorized_operator(
        &self,
        partition: PartitionId,
        operator: Identity,
        holder: Identity,
    ) -> bool {
        self.is_operator_for_partition(partition, operator, holder)
            || self.store.roles.has(Role::Controller, &operator)
    }

    fn operators_of(&self, partition: PartitionId, holder: Identity) -> Vec<Identity> {
        self.store.operators.operators_of(partition, &holder)
    }

    // =========================================================================
    // ACCESS CONTROL
    // =========================================================================

    #[instrument(skip(self))]
    fn add_role(&self, caller: Identity, role: Role, identity: Identity) -> Result<bool, TokenError> {
        let changed = self
            .store
            .roles
            .grant(caller, role, identity)
            .map_err(|e| self.fail(e, "add_role"))?;
        if changed {
            self.sink.emit(LedgerEvent::RoleGranted {
                sequence: self.clock.tick(),
                role,
                identity,
                granted_by: Some(caller),
            });
        }
        Ok(changed)
    }

    #[instrument(skip(self))]
    fn remove_role(
        &self,
        caller: Identity,
        role: Role,
        identity: Identity,
    ) -> Result<bool, TokenError> {
        let changed = self
            .store
            .roles
            .revoke(caller, role, identity)
            .map_err(|e| self.fail(e, "remove_role"))?;
        if changed {
            self.sink.emit(LedgerEvent::RoleRevoked {
                sequence: self.clock.tick(),
                role,
                identity,
                revoked_by: caller,
            });
        }
        Ok(changed)
    }

    fn renounce_role(&self, caller: Identity, role: Role) -> bool {
        let changed = self.store.roles.renounce(caller, role);
        if changed {
            self.sink.emit(LedgerEvent::RoleRevoked {
                sequence: self.clock.tick(),
                role,
                identity: caller,
                revoked_by: caller,
            });
        }
        changed
    }

    fn has_role(&self, role: Role, identity: Identity) -> bool {
        self.store.roles.has(role, &identity)
    }

    fn roles_of(&self, identity: Identity) -> Vec<Role> {
        self.store.roles.roles_of(&identity)
    }

    // =========================================================================
    // ADMINISTRATION
    // =========================================================================

    #[instrument(skip(self, handler), fields(partition = %partition.short()))]
    fn add_partition(
        &self,
        caller: Identity,
        partition: PartitionId,
        cap: Option<Amount>,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<Amount, TokenError> {
        self.require_roles(caller, PARTITION_ROLES, "add_partition")?;
        let has_handler = handler.is_some();
        let cap = self
            .store
            .partitions
            .register(&self.store.ledger, partition, cap, handler)
            .map_err(|e| self.fail(e, "add_partition"))?;

        self.sink.emit(LedgerEvent::PartitionRegistered {
            sequence: self.clock.tick(),
            partition,
            cap,
            has_handler,
        });
        metrics::set_partition_count(self.store.partitions.len());
        Ok(cap)
    }

    #[instrument(skip(self), fields(partition = %partition.short()))]
    fn set_partition_cap(
        &self,
        caller: Identity,
        partition: PartitionId,
        cap: Amount,
    ) -> Result<Amount, TokenError> {
        self.require_roles(caller, PARTITION_ROLES, "set_partition_cap")?;
        let old_cap = self
            .store
            .partitions
            .update_cap(&self.store.ledger, partition, cap)
            .map_err(|e| self.fail(e, "set_partition_cap"))?;

        self.sink.emit(LedgerEvent::PartitionCapUpdated {
            sequence: self.clock.tick(),
            partition,
            old_cap,
            new_cap: cap,
        });
        Ok(old_cap)
    }

    fn set_partition_handler(
        &self,
        caller: Identity,
        partition: PartitionId,
        handler: Option<Arc<dyn TransferHook>>,
    ) -> Result<(), TokenError> {
        self.require_roles(caller, PARTITION_ROLES, "set_partition_handler")?;
        let name = handler.as_ref().map(|h| h.name().to_string());
        self.store
            .partitions
            .set_handler(partition, handler)
            .map_err(|e| self.fail(e, "set_partition_handler"))?;

        self.sink.emit(LedgerEvent::HandlerUpdated {
            sequence: self.clock.tick(),
            partition,
            handler: name,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    fn set_cap(&self, caller: Identity, cap: Amount) -> Result<Amount, TokenError> {
        self.require_roles(caller, &[Role::CapEditor], "set_cap")?;
        let old_cap = self
            .store
            .partitions
            .update_global_cap(&self.store.ledger, cap)
            .map_err(|e| self.fail(e, "set_cap"))?;

        self.sink.emit(LedgerEvent::GlobalCapUpdated {
            sequence: self.clock.tick(),
            old_cap,
            new_cap: cap,
        });
        Ok(old_cap)
    }

    #[instrument(skip(self, modules), fields(count = modules.len()))]
    fn set_modules(
        &self,
        caller: Identity,
        modules: Vec<Arc<dyn TransferHook>>,
    ) -> Result<(), TokenError> {
        self.require_roles(caller, &[Role::ModuleEditor], "set_modules")?;
        let names: Vec<String> = modules.iter().map(|m| m.name().to_string()).collect();
        *self.modules.write() = modules;

        self.sink.emit(LedgerEvent::ModulesUpdated {
            sequence: self.clock.tick(),
            modules: names,
        });
        Ok(())
    }

    #[instrument(skip(self))]
    fn pause(&self, caller: Identity) -> Result<bool, TokenError> {
        self.require_roles(caller, &[Role::Pauser], "pause")?;
        let changed = !self.paused.swap(true, Ordering::SeqCst);
        if changed {
            warn!(by = %caller, "Token paused");
            self.sink.emit(LedgerEvent::Paused {
                sequence: self.clock.tick(),
                by: caller,
            });
        }
        Ok(changed)
    }

    #[instrument(skip(self))]
    fn unpause(&self, caller: Identity) -> Result<bool, TokenError> {
        self.require_roles(caller, &[Role::Pauser], "unpause")?;
        let changed = self.paused.swap(false, Ordering::SeqCst);
        if changed {
            info!(by = %caller, "Token unpaused");
            self.sink.emit(LedgerEvent::Unpaused {
                sequence: self.clock.tick(),
                by: caller,
            });
        }
        Ok(changed)
    }

    fn audit(&self, partition: PartitionId) -> Result<AuditReport, TokenError> {
        self.store
            .ledger
            .audit(partition)
            .map_err(|e| self.fail(e, "audit"))
    }

    // =========================================================================
    // QUERIES
    // =========================================================================

    fn name(&self) -> String {
        self.metadata.name.clone()
    }

    fn symbol(&self) -> String {
        self.metadata.symbol.clone()
    }

    fn decimals(&self) -> u8 {
        self.metadata.decimals
    }

    fn granularity(&self) -> Amount {
        self.metadata.granularity
    }

    fn cap(&self) -> Amount {
        self.store.ledger.global_cap()
    }

    fn is_paused(&self) -> bool {
        self.paused.load(Ordering::SeqCst)
    }

    fn modules(&self) -> Vec<String> {
        self.modules
            .read()
            .iter()
            .map(|m| m.name().to_string())
            .collect()
    }

    fn total_supply(&self) -> Amount {
        self.store.ledger.total_supply()
    }

    fn total_supply_by_partition(&self, partition: PartitionId) -> Result<Amount, TokenError> {
        self.store.ledger.total_supply_by_partition(partition)
    }

    fn balance_of(&self, holder: Identity) -> Amount {
        self.store.ledger.balance_of(&holder)
    }

    fn balance_of_by_partition(&self, partition: PartitionId, holder: Identity) -> Amount {
        self.store.ledger.balance_of_by_partition(partition, &holder)
    }

    fn partitions_of(&self, holder: Identity) -> Vec<PartitionId> {
        self.store.ledger.partitions_of(&holder)
    }

    fn partition(&self, partition: PartitionId) -> Result<PartitionInfo, TokenError> {
        self.store.partitions.get(&self.store.ledger, partition)
    }

    fn partitions(&self) -> Vec<PartitionInfo> {
        self.store.partitions.list(&self.store.ledger)
    }
}
