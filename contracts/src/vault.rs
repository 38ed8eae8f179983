//! # Vault Core
//!
//! Everything the deposit and redemption vaults have in common: wiring to the
//! registry, the token and the primary price feed, the participant gate, fee
//! math, the settlement-path switch and the admin-only setters.
//!
//! ## Participant Gate
//!
//! Blacklist and greenlist are checked independently and both must pass. A
//! blacklisted account is refused even if it is greenlisted; an account that
//! is not greenlisted is refused even if it is not blacklisted.
//!
//! ## Settlement Paths
//!
//! A vault is configured with a *manual-fulfillment token*. Settling in that
//! token means the value moves outside the engine (wire transfer, custodian
//! reconciliation) and the vault only records what happened. Every other
//! token settles automatically. The comparison happens once, in
//! [`VaultCore::settlement_path`], and the rest of the code branches on the
//! resulting [`SettlementPath`].

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;
use tracing::info;

use atrium_protocol::access::{AccessError, AccessGate, Role, SharedRegistry};
use atrium_protocol::config;
use atrium_protocol::oracle::{OracleError, PriceOracleAdapter};
use atrium_protocol::token::{TokenCapability, TokenError};
use atrium_protocol::{Address, Amount};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors that can occur during vault operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum VaultError {
    /// A role check failed.
    #[error(transparent)]
    Access(#[from] AccessError),

    /// The price feed could not be read or applied.
    #[error(transparent)]
    Oracle(#[from] OracleError),

    /// The operation's value is below the configured minimum.
    #[error("below minimum: value {value} is less than minimum {minimum}")]
    BelowMinimum {
        /// Value of the operation in quote currency.
        value: Amount,
        /// Configured minimum in quote currency.
        minimum: Amount,
    },

    /// Zero-amount operations are rejected.
    #[error("invalid amount: must be greater than zero")]
    InvalidAmount,

    /// Fee above 10_000 bps.
    #[error("invalid fee: {0} bps exceeds the maximum of 10000")]
    InvalidFee(u16),

    /// Fee or payout arithmetic overflowed.
    #[error("amount overflow")]
    Overflow,

    /// The managed token is paused.
    #[error("token is paused")]
    Paused,

    /// The token refused to mint.
    #[error("mint failed: {0}")]
    MintFailed(TokenError),

    /// The token refused to burn.
    #[error("burn failed: {0}")]
    BurnFailed(TokenError),

    /// No redemption request has this id.
    #[error("redemption request {0} not found")]
    RequestNotFound(u64),

    /// The request is not in a state that allows this operation.
    #[error("invalid state transition: request {id} is {current}, expected {expected}")]
    InvalidState {
        /// The request id.
        id: u64,
        /// The request's current status.
        current: String,
        /// The status required for this operation.
        expected: String,
    },
}

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// How value moves for a given operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SettlementPath {
    /// The engine moves tokens itself.
    Automatic,
    /// Value moves out of band; the engine only records the operation.
    Manual,
}

impl fmt::Display for SettlementPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SettlementPath::Automatic => write!(f, "Automatic"),
            SettlementPath::Manual => write!(f, "Manual"),
        }
    }
}

/// Policy knobs shared by both vaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VaultParams {
    /// Fee in basis points.
    pub fee_bps: u16,
    /// Minimum operation value in quote currency. Zero disables the check.
    pub min_amount: Amount,
    /// Settling in this token takes the manual path.
    pub manual_fulfillment_token: Address,
}

impl Default for VaultParams {
    fn default() -> Self {
        Self {
            fee_bps: config::DEFAULT_FEE_BPS,
            min_amount: config::DEFAULT_MIN_AMOUNT,
            manual_fulfillment_token: Address::ZERO,
        }
    }
}

/// External collaborators a vault is built from.
#[derive(Clone)]
pub struct VaultWiring {
    /// Address of the vault itself. Its identity in the registry.
    pub address: Address,
    /// The shared role registry.
    pub registry: SharedRegistry,
    /// The managed token.
    pub token: Arc<dyn TokenCapability>,
    /// Address of the managed token.
    pub token_address: Address,
    /// Feed pricing the managed asset in the reference currency.
    pub primary_feed: PriceOracleAdapter,
}

// ---------------------------------------------------------------------------
// Core
// ---------------------------------------------------------------------------

/// State and checks shared by both vaults.
pub struct VaultCore {
    address: Address,
    gate: AccessGate,
    token: Arc<dyn TokenCapability>,
    token_address: Address,
    primary_feed: PriceOracleAdapter,
    admin_role: Role,
    params: VaultParams,
}

impl fmt::Debug for VaultCore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VaultCore")
            .field("address", &self.address)
            .field("token_address", &self.token_address)
            .field("primary_feed", &self.primary_feed)
            .field("admin_role", &self.admin_role)
            .field("params", &self.params)
            .finish()
    }
}

impl VaultCore {
    /// Validates `params` and binds the vault to its collaborators.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidFee`] if the fee exceeds 10_000 bps.
    pub fn new(wiring: VaultWiring, admin_role: Role, params: VaultParams) -> Result<Self, VaultError> {
        if !config::is_valid_fee(params.fee_bps) {
            return Err(VaultError::InvalidFee(params.fee_bps));
        }

        Ok(Self {
            address: wiring.address,
            gate: AccessGate::new(wiring.registry, wiring.address),
            token: wiring.token,
            token_address: wiring.token_address,
            primary_feed: wiring.primary_feed,
            admin_role,
            params,
        })
    }

    pub fn address(&self) -> Address {
        self.address
    }

    pub fn gate(&self) -> &AccessGate {
        &self.gate
    }

    pub fn token_address(&self) -> Address {
        self.token_address
    }

    pub fn primary_feed(&self) -> &PriceOracleAdapter {
        &self.primary_feed
    }

    /// The role allowed to reconfigure this vault.
    pub fn admin_role(&self) -> Role {
        self.admin_role
    }

    pub fn params(&self) -> &VaultParams {
        &self.params
    }

    // -----------------------------------------------------------------------
    // Checks
    // -----------------------------------------------------------------------

    /// Blacklist, then greenlist.
    pub fn check_participant(&self, account: &Address) -> Result<(), VaultError> {
        self.gate.require_not_role(Role::Blacklisted, account)?;
        self.gate.require_role(Role::Greenlisted, account)?;
        Ok(())
    }

    pub fn check_amount(amount: Amount) -> Result<(), VaultError> {
        if amount == 0 {
            Err(VaultError::InvalidAmount)
        } else {
            Ok(())
        }
    }

    pub fn check_not_paused(&self) -> Result<(), VaultError> {
        if self.token.paused() {
            Err(VaultError::Paused)
        } else {
            Ok(())
        }
    }

    pub fn require_admin(&self, caller: &Address) -> Result<(), VaultError> {
        self.gate.require_role(self.admin_role, caller)?;
        Ok(())
    }

    /// Fails with [`VaultError::BelowMinimum`] if `value < min_amount`.
    pub fn check_minimum(&self, value: Amount) -> Result<(), VaultError> {
        if value < self.params.min_amount {
            Err(VaultError::BelowMinimum {
                value,
                minimum: self.params.min_amount,
            })
        } else {
            Ok(())
        }
    }

    // -----------------------------------------------------------------------
    // Policy
    // -----------------------------------------------------------------------

    pub fn settlement_path(&self, token: &Address) -> SettlementPath {
        if *token == self.params.manual_fulfillment_token {
            SettlementPath::Manual
        } else {
            SettlementPath::Automatic
        }
    }

    /// `floor(amount * fee_bps / 10_000)`. The remainder stays with the user.
    pub fn fee_for(&self, amount: Amount) -> Result<Amount, VaultError> {
        amount
            .checked_mul(u128::from(self.params.fee_bps))
            .map(|scaled| scaled / config::BPS_DENOMINATOR)
            .ok_or(VaultError::Overflow)
    }

    /// `floor(amount * (10_000 - fee_bps) / 10_000)`.
    pub fn amount_after_fee(&self, amount: Amount) -> Result<Amount, VaultError> {
        let keep = config::BPS_DENOMINATOR - u128::from(self.params.fee_bps);
        amount
            .checked_mul(keep)
            .map(|scaled| scaled / config::BPS_DENOMINATOR)
            .ok_or(VaultError::Overflow)
    }

    /// Value of `amount` in the primary feed's quote currency.
    pub fn primary_value(&self, amount: Amount) -> Result<Amount, VaultError> {
        let reading = self.primary_feed.latest_price()?;
        Ok(PriceOracleAdapter::convert(amount, &reading)?)
    }

    // -----------------------------------------------------------------------
    // Token calls
    // -----------------------------------------------------------------------

    /// Mints through the token. The vault itself must hold `Minter`.
    pub fn mint(&self, to: &Address, amount: Amount) -> Result<(), VaultError> {
        self.gate.require_role(Role::Minter, &self.address)?;
        self.token.mint(to, amount).map_err(VaultError::MintFailed)
    }

    /// Burns through the token. The vault itself must hold `Burner`.
    pub fn burn(&self, from: &Address, amount: Amount) -> Result<(), VaultError> {
        self.gate.require_role(Role::Burner, &self.address)?;
        self.token.burn(from, amount).map_err(VaultError::BurnFailed)
    }

    // -----------------------------------------------------------------------
    // Admin setters
    // -----------------------------------------------------------------------

    pub fn set_fee_bps(&mut self, caller: &Address, fee_bps: u16) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        if !config::is_valid_fee(fee_bps) {
            return Err(VaultError::InvalidFee(fee_bps));
        }
        self.params.fee_bps = fee_bps;
        info!(vault = %self.address, fee_bps, "fee updated");
        Ok(())
    }

    pub fn set_min_amount(&mut self, caller: &Address, min_amount: Amount) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        self.params.min_amount = min_amount;
        info!(vault = %self.address, min_amount, "minimum updated");
        Ok(())
    }

    pub fn set_manual_fulfillment_token(
        &mut self,
        caller: &Address,
        token: Address,
    ) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        self.params.manual_fulfillment_token = token;
        info!(vault = %self.address, token = %token, "manual-fulfillment token updated");
        Ok(())
    }

    pub fn set_primary_feed(
        &mut self,
        caller: &Address,
        feed: PriceOracleAdapter,
    ) -> Result<(), VaultError> {
        self.require_admin(caller)?;
        info!(vault = %self.address, feed = %feed.feed(), "primary feed updated");
        self.primary_feed = feed;
        Ok(())
    }
}
