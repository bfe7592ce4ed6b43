//! # Role Registry
//!
//! Set of (identity, role) grants. Roles are flat; an operation that accepts
//! two roles says so explicitly through [`RoleRegistry::require_any`].

use super::errors::TokenError;
use parking_lot::RwLock;
use shared_types::{Identity, Role};
use std::collections::{BTreeSet, HashMap};
use tracing::debug;

#[derive(Debug, Default)]
pub struct RoleRegistry {
    grants: RwLock<HashMap<Role, BTreeSet<Identity>>>,
}

impl RoleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Unauthenticated grant. Only store bootstrap uses this.
    pub(crate) fn bootstrap_grant(&self, role: Role, identity: Identity) -> bool {
        self.grants.write().entry(role).or_default().insert(identity)
    }

    /// Grant `role` to `identity`. The caller must hold ADMIN.
    ///
    /// Returns `false` when the grant already existed.
    pub(crate) fn grant(&self, caller: Identity, role: Role, identity: Identity) -> Result<bool, TokenError> {
        let mut grants = self.grants.write();
        Self::ensure_admin(&grants, caller)?;
        let changed = grants.entry(role).or_default().insert(identity);
        debug!(%caller, %role, %identity, changed, "Role grant");
        Ok(changed)
    }

    /// Revoke `role` from `identity`. The caller must hold ADMIN.
    ///
    /// Returns `false` when there was nothing to revoke.
    pub(crate) fn revoke(&self, caller: Identity, role: Role, identity: Identity) -> Result<bool, TokenError> {
        let mut grants = self.grants.write();
        Self::ensure_admin(&grants, caller)?;
        let changed = grants
            .get_mut(&role)
            .map(|members| members.remove(&identity))
            .unwrap_or(false);
        debug!(%caller, %role, %identity, changed, "Role revoke");
        Ok(changed)
    }

    /// Drop one of the caller's own roles.
    pub(crate) fn renounce(&self, caller: Identity, role: Role) -> bool {
        self.grants
            .write()
            .get_mut(&role)
            .map(|members| members.remove(&caller))
            .unwrap_or(false)
    }

    pub fn has(&self, role: Role, identity: &Identity) -> bool {
        self.grants
            .read()
            .get(&role)
            .is_some_and(|members| members.contains(identity))
    }

    pub fn has_any(&self, roles: &[Role], identity: &Identity) -> bool {
        let grants = self.grants.read();
        roles.iter().any(|role| {
            grants
                .get(role)
                .is_some_and(|members| members.contains(identity))
        })
    }

    /// Fail with `MissingRole` unless the caller holds one of `roles`.
    pub fn require_any(&self, caller: Identity, roles: &[Role]) -> Result<(), TokenError> {
        if self.has_any(roles, &caller) {
            Ok(())
        } else {
            Err(TokenError::MissingRole {
                caller,
                roles: roles.to_vec(),
            })
        }
    }

    /// Roles held by an identity, in numeric order.
    pub fn roles_of(&self, identity: &Identity) -> Vec<Role> {
        let grants = self.grants.read();
        Role::ALL
            .iter()
            .copied()
            .filter(|role| {
                grants
                    .get(role)
                    .is_some_and(|members| members.contains(identity))
            })
            .collect()
    }

    /// Holders of a role, sorted.
    pub fn members(&self, role: Role) -> Vec<Identity> {
        self.grants
            .read()
            .get(&role)
            .map(|members| members.iter().copied().collect())
            .unwrap_or_default()
    }

    fn ensure_admin(
        grants: &HashMap<Role, BTreeSet<Identity>>,
        caller: Identity,
    ) -> Result<(), TokenError> {
        let is_admin = grants
            .get(&Role::Admin)
            .is_some_and(|admins| admins.contains(&caller));
        if is_admin {
            Ok(())
        } else {
            Err(TokenError::MissingRole {
                caller,
                roles: vec![Role::Admin],
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn admin() -> Identity {
        Identity::new([0xAD; 20])
    }

    fn user() -> Identity {
        Identity::new([0x05; 20])
    }

    fn registry() -> RoleRegistry {
        let roles = RoleRegistry::new();
        roles.bootstrap_grant(Role::Admin, admin());
        roles
    }

    #[test]
    fn test_grant_is_idempotent() {
        let roles = registry();
        assert_eq!(roles.grant(admin(), Role::Minter, user()), Ok(true));
        assert_eq!(roles.grant(admin(), Role::Minter, user()), Ok(false));
        assert!(roles.has(Role::Minter, &user()));
        assert_eq!(roles.members(Role::Minter), vec![user()]);
    }

    #[test]
    fn test_revoke_is_idempotent() {
        let roles = registry();
        roles.grant(admin(), Role::Pauser, user()).unwrap();
        assert_eq!(roles.revoke(admin(), Role::Pauser, user()), Ok(true));
        assert_eq!(roles.revoke(admin(), Role::Pauser, user()), Ok(false));
        assert!(!roles.has(Role::Pauser, &user()));
    }

    #[test]
    fn test_non_admin_cannot_grant() {
        let roles = registry();
        let err = roles.grant(user(), Role::Minter, user()).unwrap_err();
        assert_eq!(
            err,
            TokenError::MissingRole {
                caller: user(),
                roles: vec![Role::Admin]
            }
        );
        assert!(!roles.has(Role::Minter, &user()));
    }

    #[test]
    fn test_roles_are_flat() {
        let roles = registry();
        assert!(!roles.has(Role::Minter, &admin()));
        assert!(!roles.has(Role::Controller, &admin()));
    }

    #[test]
    fn test_require_any_accepts_either() {
        let roles = registry();
        roles.grant(admin(), Role::Issuer, user()).unwrap();
        assert!(roles.require_any(user(), &[Role::Minter, Role::Issuer]).is_ok());
        assert!(roles.require_any(user(), &[Role::Burner]).is_err());
    }

    #[test]
    fn test_renounce_and_roles_of() {
        let roles = registry();
        roles.grant(admin(), Role::Redeemer, user()).unwrap();
        roles.grant(admin(), Role::Burner, user()).unwrap();
        assert_eq!(roles.roles_of(&user()), vec![Role::Burner, Role::Redeemer]);

        assert!(roles.renounce(user(), Role::Burner));
        assert!(!roles.renounce(user(), Role::Burner));
        assert_eq!(roles.roles_of(&user()), vec![Role::Redeemer]);
    }
}
