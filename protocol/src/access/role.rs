//! # Roles
//!
//! The closed set of roles Atrium knows about. Roles are fixed at compile
//! time: the registry can hand them out and take them back, but it cannot
//! invent new ones.
//!
//! Every role also has an opaque 32-byte [`RoleId`]. The default admin role
//! is all zeros; every other id is `BLAKE3(role_name)`. Ids are what external
//! tooling stores and queries by, so they must never change for a given role.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config;

/// Opaque 32-byte role identifier.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RoleId([u8; 32]);

impl RoleId {
    /// Creates a `RoleId` from raw bytes.
    pub fn from_bytes(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }

    /// Returns the raw identifier.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }

    /// Returns the `0x`-prefixed hex encoding.
    pub fn to_hex(&self) -> String {
        format!("0x{}", hex::encode(self.0))
    }

    /// Parses a hex role id, with or without the `0x` prefix.
    pub fn from_hex(s: &str) -> Result<Self, hex::FromHexError> {
        let bytes = hex::decode(s.strip_prefix("0x").unwrap_or(s))?;
        if bytes.len() != 32 {
            return Err(hex::FromHexError::InvalidStringLength);
        }
        let mut arr = [0u8; 32];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl fmt::Debug for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "RoleId({}...)", &self.to_hex()[..12])
    }
}

impl fmt::Display for RoleId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

/// A role in the access-control registry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Role {
    /// Admin of every role without an explicit override, including itself.
    DefaultAdmin,
    /// Deny-list. Holders can never use the vaults.
    Blacklisted,
    /// Allow-list. Only holders can use the vaults.
    Greenlisted,
    /// Admin of `Blacklisted`.
    BlacklistedOperator,
    /// Admin of `Greenlisted`.
    GreenlistedOperator,
    /// May mint the managed token.
    Minter,
    /// May burn the managed token.
    Burner,
    /// May reconfigure the deposit vault.
    DepositVaultAdmin,
    /// May reconfigure the redemption vault and settle its requests.
    RedemptionVaultAdmin,
}

impl Role {
    /// Every role, in declaration order.
    pub const ALL: [Role; 9] = [
        Role::DefaultAdmin,
        Role::Blacklisted,
        Role::Greenlisted,
        Role::BlacklistedOperator,
        Role::GreenlistedOperator,
        Role::Minter,
        Role::Burner,
        Role::DepositVaultAdmin,
        Role::RedemptionVaultAdmin,
    ];

    /// Canonical constant name of the role.
    pub fn name(&self) -> &'static str {
        match self {
            Role::DefaultAdmin => config::DEFAULT_ADMIN_ROLE_NAME,
            Role::Blacklisted => config::BLACKLISTED_ROLE_NAME,
            Role::Greenlisted => config::GREENLISTED_ROLE_NAME,
            Role::BlacklistedOperator => config::BLACKLIST_OPERATOR_ROLE_NAME,
            Role::GreenlistedOperator => config::GREENLIST_OPERATOR_ROLE_NAME,
            Role::Minter => config::MINTER_ROLE_NAME,
            Role::Burner => config::BURNER_ROLE_NAME,
            Role::DepositVaultAdmin => config::DEPOSIT_VAULT_ADMIN_ROLE_NAME,
            Role::RedemptionVaultAdmin => config::REDEMPTION_VAULT_ADMIN_ROLE_NAME,
        }
    }

    /// The role's 32-byte identifier.
    pub fn id(&self) -> RoleId {
        match self {
            Role::DefaultAdmin => RoleId([0u8; 32]),
            other => RoleId(*blake3::hash(other.name().as_bytes()).as_bytes()),
        }
    }

    /// Resolves an identifier back to its role. Exact match only.
    pub fn from_id(id: &RoleId) -> Option<Role> {
        Role::ALL.iter().copied().find(|role| role.id() == *id)
    }

    /// Resolves a canonical constant name back to its role.
    pub fn from_name(name: &str) -> Option<Role> {
        Role::ALL.iter().copied().find(|role| role.name() == name)
    }

    /// Roles that describe *who an account is* rather than what it may do.
    /// The deployer is never granted these at initialization.
    pub fn is_list_role(&self) -> bool {
        matches!(self, Role::Blacklisted | Role::Greenlisted)
    }

    /// Admin role this role is configured with at initialization.
    pub(crate) fn initial_admin(&self) -> Role {
        match self {
            Role::Blacklisted => Role::BlacklistedOperator,
            Role::Greenlisted => Role::GreenlistedOperator,
            _ => Role::DefaultAdmin,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_admin_id_is_zero() {
        assert_eq!(Role::DefaultAdmin.id().as_bytes(), &[0u8; 32]);
    }

    #[test]
    fn ids_are_unique_and_resolvable() {
        for (i, a) in Role::ALL.iter().enumerate() {
            assert_eq!(Role::from_id(&a.id()), Some(*a));
            for b in &Role::ALL[i + 1..] {
                assert_ne!(a.id(), b.id());
            }
        }
    }

    #[test]
    fn unknown_id_does_not_resolve() {
        let bogus = RoleId::from_bytes([0xAB; 32]);
        assert_eq!(Role::from_id(&bogus), None);
    }

    #[test]
    fn id_hex_roundtrip() {
        let id = Role::Minter.id();
        assert_eq!(RoleId::from_hex(&id.to_hex()).unwrap(), id);
        assert!(RoleId::from_hex("0x1234").is_err());
    }

    #[test]
    fn names_resolve() {
        assert_eq!(Role::from_name("BURNER_ROLE"), Some(Role::Burner));
        assert_eq!(Role::from_name("burner"), None);
    }

    #[test]
    fn only_list_roles_have_operator_admins() {
        assert_eq!(Role::Blacklisted.initial_admin(), Role::BlacklistedOperator);
        assert_eq!(Role::Greenlisted.initial_admin(), Role::GreenlistedOperator);
        for role in Role::ALL.iter().filter(|r| !r.is_list_role()) {
            assert_eq!(role.initial_admin(), Role::DefaultAdmin);
        }
    }
}
