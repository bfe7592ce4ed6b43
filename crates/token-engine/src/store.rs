//! # Token Store
//!
//! Registries and ledger behind one value. Built once by [`TokenStore::bootstrap`],
//! handed to the engine, and recovered with [`crate::TokenEngine::into_store`].
//!
//! Outside this crate the store is read-only. Every mutation goes through
//! [`crate::TokenApi`], where roles are checked and events emitted:
//!
//! ```compile_fail
//! # use std::sync::Arc;
//! # use shared_types::{Identity, PartitionId};
//! # use token_engine::{AtomicLogicalClock, NullEventSink, TokenConfig, TokenEngine};
//! let config = TokenConfig::with_admin(Identity::new([1; 20]));
//! let engine = TokenEngine::bootstrap(
//!     &config,
//!     Arc::new(AtomicLogicalClock::new()),
//!     Arc::new(NullEventSink),
//! )
//! .unwrap();
//! let store = engine.store();
//! store
//!     .partitions()
//!     .register(store.ledger(), PartitionId::from_label("p"), None, None)
//!     .unwrap();
//! ```

use crate::config::TokenConfig;
use crate::domain::{Ledger, OperatorRegistry, PartitionRegistry, RoleRegistry, TokenError};
use shared_types::{Amount, Identity, PartitionId, Role};
use tracing::info;

/// State created during bootstrap, reported as events once an engine exists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GenesisEntry {
    RoleGranted { role: Role, identity: Identity },
    PartitionRegistered { partition: PartitionId, cap: Amount },
}

pub struct TokenStore {
    pub(crate) roles: RoleRegistry,
    pub(crate) operators: OperatorRegistry,
    pub(crate) partitions: PartitionRegistry,
    pub(crate) ledger: Ledger,
    genesis: Vec<GenesisEntry>,
}

impl TokenStore {
    /// Empty store with nobody holding any role.
    fn empty(global_cap: Amount) -> Self {
        Self {
            roles: RoleRegistry::new(),
            operators: OperatorRegistry::new(),
            partitions: PartitionRegistry::new(),
            ledger: Ledger::new(global_cap),
            genesis: Vec::new(),
        }
    }

    /// Apply the one-time bootstrap grants and partitions from `config`.
    pub fn bootstrap(config: &TokenConfig) -> Result<Self, TokenError> {
        config.validate()?;
        let mut store = Self::empty(config.global_cap);

        let grants = config
            .admins
            .iter()
            .map(|id| (Role::Admin, *id))
            .chain(config.controllers.iter().map(|id| (Role::Controller, *id)));
        for (role, identity) in grants {
            if store.roles.bootstrap_grant(role, identity) {
                store.genesis.push(GenesisEntry::RoleGranted { role, identity });
            }
        }

        for seed in &config.partitions {
            let cap = store
                .partitions
                .register(&store.ledger, seed.id, seed.cap, None)?;
            store.genesis.push(GenesisEntry::PartitionRegistered {
                partition: seed.id,
                cap,
            });
        }

        info!(
            admins = config.admins.len(),
            controllers = config.controllers.len(),
            partitions = config.partitions.len(),
            global_cap = config.global_cap,
            "Token store bootstrapped"
        );
        Ok(store)
    }

    pub fn roles(&self) -> &RoleRegistry {
        &self.roles
    }

    pub fn operators(&self) -> &OperatorRegistry {
        &self.operators
    }

    pub fn partitions(&self) -> &PartitionRegistry {
        &self.partitions
    }

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    /// Bootstrap records not yet reported.
    pub fn genesis(&self) -> &[GenesisEntry] {
        &self.genesis
    }

    pub(crate) fn take_genesis(&mut self) -> Vec<GenesisEntry> {
        std::mem::take(&mut self.genesis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PartitionSeed;

    fn admin() -> Identity {
        Identity::new([0xAD; 20])
    }

    #[test]
    fn test_bootstrap_grants_admin_and_controller() {
        let controller = Identity::new([0xC0; 20]);
        let config = TokenConfig {
            controllers: vec![controller],
            ..TokenConfig::with_admin(admin())
        };
        let store = TokenStore::bootstrap(&config).unwrap();

        assert!(store.roles.has(Role::Admin, &admin()));
        assert!(store.roles.has(Role::Controller, &controller));
        assert!(!store.roles.has(Role::Controller, &admin()));
        assert_eq!(store.genesis().len(), 2);
    }

    #[test]
    fn test_bootstrap_registers_partitions() {
        let config = TokenConfig {
            global_cap: 1_000,
            partitions: vec![
                PartitionSeed {
                    id: PartitionId::from_label("locked"),
                    cap: Some(400),
                },
                PartitionSeed {
                    id: PartitionId::from_label("unlocked"),
                    cap: None,
                },
            ],
            ..TokenConfig::with_admin(admin())
        };
        let store = TokenStore::bootstrap(&config).unwrap();

        assert_eq!(
            store.ledger.cap_of(PartitionId::from_label("unlocked")),
            Ok(600)
        );
        assert_eq!(store.partitions.len(), 2);
    }

    #[test]
    fn test_bootstrap_rejects_over_allocation() {
        let config = TokenConfig {
            global_cap: 100,
            partitions: vec![PartitionSeed {
                id: PartitionId::from_label("locked"),
                cap: Some(101),
            }],
            ..TokenConfig::with_admin(admin())
        };
        assert!(matches!(
            TokenStore::bootstrap(&config),
            Err(TokenError::CapExceeded { .. })
        ));
    }

    #[test]
    fn test_bootstrap_rejects_invalid_config() {
        assert!(matches!(
            TokenStore::bootstrap(&TokenConfig::default()),
            Err(TokenError::Config(_))
        ));
    }
}
