//! # Role Registry
//!
//! Owns the role-admin map and the role-assignment relation. Every privileged
//! action in Atrium is ultimately answered by a lookup in here.
//!
//! ## Authorization Model
//!
//! The hierarchy is flat: each role has exactly one admin role, and holding
//! that admin role is what lets an account grant or revoke the role. There is
//! no traversal. If `A` administers `B` and `B` administers `C`, holding `A`
//! says nothing about `C`.
//!
//! ```text
//!   DefaultAdmin ──administers──► every role without an override (itself included)
//!   BlacklistedOperator ────────► Blacklisted
//!   GreenlistedOperator ────────► Greenlisted
//! ```
//!
//! ## Batches
//!
//! Batch grants/revokes are all-or-nothing. The whole batch is authorized in
//! a first pass and only then applied, so a caller who is admin for some of
//! the roles and not others changes nothing.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::sync::Arc;
use tracing::{debug, info, warn};

use super::role::Role;
use super::AccessError;
use crate::types::Address;

/// A registry shared between every component that guards privileged calls.
pub type SharedRegistry = Arc<RwLock<RoleRegistry>>;

/// The access-control registry.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RoleRegistry {
    /// One-shot initialization flag.
    initialized: bool,
    /// `role -> admin role`. Filled once by [`initialize`](Self::initialize).
    admins: BTreeMap<Role, Role>,
    /// `role -> holders`. Absent or empty means nobody holds the role.
    members: BTreeMap<Role, BTreeSet<Address>>,
}

impl RoleRegistry {
    /// Creates an empty, uninitialized registry.
    ///
    /// Nobody holds any role until [`initialize`](Self::initialize) runs, so
    /// every grant or revoke against a fresh registry is unauthorized.
    pub fn new() -> Self {
        Self::default()
    }

    /// Wraps the registry in the shared handle used by access gates.
    pub fn into_shared(self) -> SharedRegistry {
        Arc::new(RwLock::new(self))
    }

    /// Initializes the admin map and hands every operational role to
    /// `deployer`.
    ///
    /// The deployer receives `DefaultAdmin` and every other role except the
    /// two list roles (`Blacklisted`, `Greenlisted`).
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::AlreadyInitialized`] on every call after the first.
    pub fn initialize(&mut self, deployer: Address) -> Result<(), AccessError> {
        if self.initialized {
            warn!(deployer = %deployer, "registry re-initialization rejected");
            return Err(AccessError::AlreadyInitialized);
        }

        for role in Role::ALL {
            self.admins.insert(role, role.initial_admin());
        }
        for role in Role::ALL.iter().filter(|r| !r.is_list_role()) {
            self.members.entry(*role).or_default().insert(deployer);
        }
        self.initialized = true;

        info!(deployer = %deployer, "role registry initialized");
        Ok(())
    }

    /// Returns `true` once [`initialize`](Self::initialize) has run.
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Returns `true` if `account` holds `role`.
    pub fn has_role(&self, role: Role, account: &Address) -> bool {
        self.members
            .get(&role)
            .map(|holders| holders.contains(account))
            .unwrap_or(false)
    }

    /// Returns the admin role of `role`, `DefaultAdmin` if none is configured.
    pub fn get_role_admin(&self, role: Role) -> Role {
        self.admins.get(&role).copied().unwrap_or(Role::DefaultAdmin)
    }

    /// Every holder of `role`, in address order.
    pub fn members(&self, role: Role) -> Vec<Address> {
        self.members
            .get(&role)
            .map(|holders| holders.iter().copied().collect())
            .unwrap_or_default()
    }

    /// Every role `account` holds, in declaration order.
    pub fn roles_of(&self, account: &Address) -> Vec<Role> {
        Role::ALL
            .iter()
            .copied()
            .filter(|role| self.has_role(*role, account))
            .collect()
    }

    /// Grants `role` to `account`. Granting a held role is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds the role's admin.
    pub fn grant_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), AccessError> {
        self.check_admin(caller, role)?;
        self.apply(caller, role, account, true);
        Ok(())
    }

    /// Revokes `role` from `account`. Revoking an unheld role is a no-op.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::Unauthorized`] unless `caller` holds the role's admin.
    pub fn revoke_role(
        &mut self,
        caller: &Address,
        role: Role,
        account: Address,
    ) -> Result<(), AccessError> {
        self.check_admin(caller, role)?;
        self.apply(caller, role, account, false);
        Ok(())
    }

    /// Grants `roles[i]` to `accounts[i]` for every `i`, or nothing at all.
    ///
    /// # Errors
    ///
    /// Returns [`AccessError::ArityMismatch`] if the slices differ in length,
    /// and [`AccessError::Unauthorized`] if the caller is not admin of any
    /// one of the roles (or, for an empty batch, does not hold `DefaultAdmin`).
    pub fn grant_role_multiple(
        &mut self,
        caller: &Address,
        roles: &[Role],
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        self.check_batch(caller, roles, accounts)?;
        for (role, account) in roles.iter().zip(accounts) {
            self.apply(caller, *role, *account, true);
        }
        Ok(())
    }

    /// Revokes `roles[i]` from `accounts[i]` for every `i`, or nothing at all.
    ///
    /// # Errors
    ///
    /// Same as [`grant_role_multiple`](Self::grant_role_multiple).
    pub fn revoke_role_multiple(
        &mut self,
        caller: &Address,
        roles: &[Role],
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        self.check_batch(caller, roles, accounts)?;
        for (role, account) in roles.iter().zip(accounts) {
            self.apply(caller, *role, *account, false);
        }
        Ok(())
    }

    /// Post-deployment wiring: gives the vaults and the token the roles they
    /// need to operate, as a single all-or-nothing batch.
    ///
    /// - deposit vault: `GreenlistedOperator`, `Minter`
    /// - redemption vault: `GreenlistedOperator`, `Minter`, `Burner`
    /// - token: `BlacklistedOperator`
    pub fn wire_vault_roles(
        &mut self,
        caller: &Address,
        deposit_vault: Address,
        redemption_vault: Address,
        token: Address,
    ) -> Result<(), AccessError> {
        let (roles, accounts): (Vec<Role>, Vec<Address>) = [
            (Role::BlacklistedOperator, token),
            (Role::GreenlistedOperator, deposit_vault),
            (Role::GreenlistedOperator, redemption_vault),
            (Role::Minter, deposit_vault),
            (Role::Minter, redemption_vault),
            (Role::Burner, redemption_vault),
        ]
        .into_iter()
        .unzip();

        self.grant_role_multiple(caller, &roles, &accounts)
    }

    // -----------------------------------------------------------------------
    // Internals
    // -----------------------------------------------------------------------

    fn check_admin(&self, caller: &Address, role: Role) -> Result<(), AccessError> {
        let admin = self.get_role_admin(role);
        if self.has_role(admin, caller) {
            Ok(())
        } else {
            warn!(caller = %caller, role = %role, admin = %admin, "unauthorized role mutation");
            Err(AccessError::Unauthorized {
                account: *caller,
                needed_role: admin,
            })
        }
    }

    /// First pass of a batch: arity, then every pair's authorization.
    fn check_batch(
        &self,
        caller: &Address,
        roles: &[Role],
        accounts: &[Address],
    ) -> Result<(), AccessError> {
        if roles.len() != accounts.len() {
            return Err(AccessError::ArityMismatch {
                roles: roles.len(),
                accounts: accounts.len(),
            });
        }
        if roles.is_empty() && !self.has_role(Role::DefaultAdmin, caller) {
            return Err(AccessError::Unauthorized {
                account: *caller,
                needed_role: Role::DefaultAdmin,
            });
        }
        roles
            .iter()
            .try_for_each(|role| self.check_admin(caller, *role))
    }

    fn apply(&mut self, caller: &Address, role: Role, account: Address, granted: bool) {
        let changed = if granted {
            self.members.entry(role).or_default().insert(account)
        } else {
            self.members
                .get_mut(&role)
                .map(|holders| holders.remove(&account))
                .unwrap_or(false)
        };

        match (changed, granted) {
            (true, true) => info!(role = %role, account = %account, sender = %caller, "role granted"),
            (true, false) => info!(role = %role, account = %account, sender = %caller, "role revoked"),
            (false, _) => debug!(role = %role, account = %account, granted, "role unchanged"),
        }
    }
}
