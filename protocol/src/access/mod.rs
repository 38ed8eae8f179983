//! # Access Control
//!
//! Who may do what. Three pieces:
//!
//! ```text
//! role.rs     : the closed set of roles and their 32-byte identifiers
//! registry.rs : role-admin map and role assignments (the source of truth)
//! gate.rs     : guard held by privileged components, backed by the registry
//! ```
//!
//! The registry is shared, never owned by a single component: vaults hold an
//! [`AccessGate`] pointing at the same [`SharedRegistry`], and every check
//! reads the live registry. Nothing caches membership across calls.

pub mod gate;
pub mod registry;
pub mod role;

pub use gate::AccessGate;
pub use registry::{RoleRegistry, SharedRegistry};
pub use role::{Role, RoleId};

use thiserror::Error;

use crate::types::Address;

/// Errors raised by the registry and the access gate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AccessError {
    /// The caller does not hold the admin role required for a mutation.
    #[error("unauthorized: {account} lacks {needed_role}")]
    Unauthorized {
        /// The rejected caller.
        account: Address,
        /// The role the caller would need.
        needed_role: Role,
    },

    /// Paired role/account slices of a batch call differ in length.
    #[error("arity mismatch: {roles} roles vs {accounts} accounts")]
    ArityMismatch {
        /// Length of the roles slice.
        roles: usize,
        /// Length of the accounts slice.
        accounts: usize,
    },

    /// The registry was already initialized.
    #[error("registry already initialized")]
    AlreadyInitialized,

    /// An account was required to hold a role and does not.
    #[error("{account} is missing role {role}")]
    MissingRole {
        /// The account that was checked.
        account: Address,
        /// The required role.
        role: Role,
    },

    /// An account was required *not* to hold a role and does.
    #[error("{account} holds forbidden role {role}")]
    ForbiddenRole {
        /// The account that was checked.
        account: Address,
        /// The forbidden role.
        role: Role,
    },
}
