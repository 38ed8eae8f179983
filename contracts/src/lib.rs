//! # Atrium Vault Contracts
//!
//! The two state machines that move value into and out of the managed token:
//!
//! - **Deposit Vault**: greenlisted accounts deposit, the vault values the
//!   deposit through the price feeds and mints the token net of a fee.
//! - **Redemption Vault**: greenlisted accounts burn the token and open a
//!   redemption request that an operator later fulfills or cancels.
//!
//! Both build on [`vault::VaultCore`], which owns the wiring (registry, token,
//! primary feed), the participant gate and the fee math.
//!
//! ## Design Principles
//!
//! 1. Validate first, call the token second, commit local state last. A
//!    failed mint or burn leaves nothing behind.
//! 2. Request status is an enum with explicit transitions.
//! 3. Every privileged operation goes through the role registry.
//! 4. Every public type is serializable (serde) for audit output.

pub mod deposit_vault;
pub mod redemption_vault;
pub mod vault;

pub use deposit_vault::{DepositReceipt, DepositVault};
pub use redemption_vault::{PayoutInstruction, RedemptionVault, RequestStatus};
pub use vault::{SettlementPath, VaultError, VaultParams, VaultWiring};
