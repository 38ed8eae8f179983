//! # Access Gate
//!
//! The guard a privileged component carries around. It answers "may this
//! account do this?" against the shared registry and offers a delegated
//! grant/revoke path for components that administer roles themselves.
//!
//! A gate is bound to its *holder*: the address of the component it guards.
//! Delegated mutations are checked twice. First the gate checks that the
//! outside caller is admin of the role, then the registry checks that the
//! holder is. A component that was never made admin of a role cannot be used
//! as a back door to it, and an admin component cannot be driven by callers
//! who are not admins themselves.

use tracing::debug;

use super::registry::SharedRegistry;
use super::role::Role;
use super::AccessError;
use crate::types::Address;

/// Role guard backed by a shared [`RoleRegistry`](super::RoleRegistry).
#[derive(Debug, Clone)]
pub struct AccessGate {
    registry: SharedRegistry,
    holder: Address,
}

impl AccessGate {
    /// Creates a gate for the component at `holder`.
    pub fn new(registry: SharedRegistry, holder: Address) -> Self {
        Self { registry, holder }
    }

    /// Address of the component this gate guards.
    pub fn holder(&self) -> Address {
        self.holder
    }

    /// The registry behind this gate.
    pub fn registry(&self) -> &SharedRegistry {
        &self.registry
    }

    /// Live membership lookup.
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.registry.read().has_role(role, account)
    }

    /// Fails with [`AccessError::MissingRole`] unless `account` holds `role`.
    pub fn require_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            Ok(())
        } else {
            debug!(role = %role, account = %account, "required role missing");
            Err(AccessError::MissingRole {
                account: *account,
                role,
            })
        }
    }

    /// Fails with [`AccessError::ForbiddenRole`] if `account` holds `role`.
    pub fn require_not_role(&self, role: Role, account: &Address) -> Result<(), AccessError> {
        if self.has_role(role, account) {
            debug!(role = %role, account = %account, "forbidden role present");
            Err(AccessError::ForbiddenRole {
                account: *account,
                role,
            })
        } else {
            Ok(())
        }
    }

    /// Grants `role` to `account` on behalf of `caller`, through the holder.
    ///
    /// # Errors
    ///
    /// [`AccessError::Unauthorized`] if `caller` is not admin of `role`, or if
    /// the holder itself is not.
    pub fn grant_role_guarded(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), AccessError> {
        let mut registry = self.registry.write();
        Self::check_caller(&registry, caller, role)?;
        registry.grant_role(&self.holder, role, account)
    }

    /// Revokes `role` from `account` on behalf of `caller`, through the holder.
    ///
    /// # Errors
    ///
    /// Same as [`grant_role_guarded`](Self::grant_role_guarded).
    pub fn revoke_role_guarded(
        &self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), AccessError> {
        let mut registry = self.registry.write();
        Self::check_caller(&registry, caller, role)?;
        registry.revoke_role(&self.holder, role, account)
    }

    fn check_caller(
        registry: &super::RoleRegistry,
        caller: &Address,
        role: Role,
    ) -> Result<(), AccessError> {
        let admin = registry.get_role_admin(role);
        if registry.has_role(admin, caller) {
            Ok(())
        } else {
            Err(AccessError::Unauthorized {
                account: *caller,
                needed_role: admin,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::access::RoleRegistry;

    struct Fixture {
        gate: AccessGate,
        owner: Address,
        component: Address,
    }

    fn fixture() -> Fixture {
        let owner = Address::derive("owner");
        let component = Address::derive("component");
        let mut registry = RoleRegistry::new();
        registry.initialize(owner).unwrap();
        let gate = AccessGate::new(registry.into_shared(), component);
        Fixture { gate, owner, component }
    }

    #[test]
    fn require_role_checks_membership() {
        let f = fixture();
        let stranger = Address::derive("stranger");
        f.gate.require_role(Role::BlacklistedOperator, &f.owner).unwrap();
        let err = f.gate.require_role(Role::Blacklisted, &stranger).unwrap_err();
        assert_eq!(
            err,
            AccessError::MissingRole { account: stranger, role: Role::Blacklisted }
        );
    }

    #[test]
    fn require_not_role_checks_absence() {
        let f = fixture();
        let stranger = Address::derive("stranger");
        f.gate.require_not_role(Role::Blacklisted, &stranger).unwrap();
        let err = f
            .gate
            .require_not_role(Role::BlacklistedOperator, &f.owner)
            .unwrap_err();
        assert!(matches!(err, AccessError::ForbiddenRole { .. }));
    }

    #[test]
    fn guarded_grant_fails_when_holder_is_not_admin() {
        let f = fixture();
        let target = Address::derive("target");

        // Owner is an admin of Blacklisted, the component is not.
        let err = f
            .gate
            .grant_role_guarded(&f.owner, Role::Blacklisted, target)
            .unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { account, .. } if account == f.component));
        assert!(!f.gate.has_role(Role::Blacklisted, &target));
    }

    #[test]
    fn guarded_grant_fails_when_caller_is_not_admin() {
        let f = fixture();
        let target = Address::derive("target");
        let stranger = Address::derive("stranger");
        f.gate
            .registry()
            .write()
            .grant_role(&f.owner, Role::BlacklistedOperator, f.component)
            .unwrap();

        let err = f
            .gate
            .grant_role_guarded(&stranger, Role::Blacklisted, target)
            .unwrap_err();
        assert!(matches!(err, AccessError::Unauthorized { account, .. } if account == stranger));
    }

    #[test]
    fn guarded_grant_and_revoke_from_role_admin() {
        let f = fixture();
        let target = Address::derive("target");
        f.gate
            .registry()
            .write()
            .grant_role(&f.owner, Role::BlacklistedOperator, f.component)
            .unwrap();

        f.gate
            .grant_role_guarded(&f.owner, Role::Blacklisted, target)
            .unwrap();
        assert!(f.gate.has_role(Role::Blacklisted, &target));

        f.gate
            .revoke_role_guarded(&f.owner, Role::Blacklisted, target)
            .unwrap();
        assert!(!f.gate.has_role(Role::Blacklisted, &target));
    }
}
