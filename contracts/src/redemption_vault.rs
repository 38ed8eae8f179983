//! # Redemption Vault
//!
//! Burns the managed token up front and tracks a redemption request until the
//! payout has been made out of band.
//!
//! ## Lifecycle
//!
//! ```text
//!   request_redemption()          fulfill_redemption()
//!  ──────────────────▶ Pending ────────────────────────▶ Fulfilled
//!                         │
//!                         │ cancel_redemption()
//!                         ▼
//!                     Cancelled   (burned tokens re-minted)
//! ```
//!
//! Fulfilled and Cancelled are terminal. Request ids start at 1, grow by one
//! per accepted request and are never reused. A rejected request consumes no
//! id.
//!
//! The vault never moves the payout token. Fulfilling a request yields a
//! [`PayoutInstruction`] for whoever settles it: the settlement desk on the
//! automatic path, off-core reconciliation on the manual path.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use tracing::{debug, info, warn};

use atrium_protocol::access::Role;
use atrium_protocol::oracle::PriceOracleAdapter;
use atrium_protocol::{Address, Amount};

use crate::vault::{SettlementPath, VaultCore, VaultError, VaultParams, VaultWiring};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Status of a redemption request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequestStatus {
    /// Tokens burned, payout outstanding.
    Pending,
    /// Payout handed off for settlement.
    Fulfilled,
    /// Request withdrawn; tokens returned to the requester.
    Cancelled,
}

impl fmt::Display for RequestStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestStatus::Pending => write!(f, "Pending"),
            RequestStatus::Fulfilled => write!(f, "Fulfilled"),
            RequestStatus::Cancelled => write!(f, "Cancelled"),
        }
    }
}

/// A stored redemption request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionRequest {
    pub id: u64,
    pub requester: Address,
    /// Managed-token amount burned when the request was accepted.
    pub token_amount_in: Amount,
    /// `token_amount_in` net of the fee at request time.
    pub expected_payout: Amount,
    /// Token the requester wants to be paid in.
    pub token_out: Address,
    pub path: SettlementPath,
    pub status: RequestStatus,
    pub created_at: DateTime<Utc>,
    /// Set when the request leaves `Pending`.
    pub settled_at: Option<DateTime<Utc>>,
}

/// What the settling party must pay for a fulfilled request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutInstruction {
    pub request_id: u64,
    pub recipient: Address,
    pub token_out: Address,
    pub amount: Amount,
    pub path: SettlementPath,
}

/// Snapshot of a redemption vault's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedemptionVaultConfig {
    pub address: Address,
    pub token: Address,
    pub primary_feed: Address,
    pub fee_bps: u16,
    pub min_redeem_in_quote: Amount,
    pub manual_fulfillment_token: Address,
    pub last_request_id: u64,
}

/// The redemption vault.
#[derive(Debug)]
pub struct RedemptionVault {
    core: VaultCore,
    last_request_id: u64,
    requests: BTreeMap<u64, RedemptionRequest>,
}

impl RedemptionVault {
    /// Builds a redemption vault with no requests.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidFee`] if `params.fee_bps` exceeds 10_000.
    pub fn initialize(wiring: VaultWiring, params: VaultParams) -> Result<Self, VaultError> {
        let core = VaultCore::new(wiring, Role::RedemptionVaultAdmin, params)?;
        info!(
            vault = %core.address(),
            token = %core.token_address(),
            fee_bps = params.fee_bps,
            "redemption vault initialized"
        );
        Ok(Self {
            core,
            last_request_id: 0,
            requests: BTreeMap::new(),
        })
    }

    // -----------------------------------------------------------------------
    // Lifecycle
    // -----------------------------------------------------------------------

    /// Burns `amount` from `requester` and opens a `Pending` request.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Access`]: requester blacklisted, not greenlisted, or
    ///   the vault lacks `Burner`.
    /// - [`VaultError::InvalidAmount`] / [`VaultError::Paused`].
    /// - [`VaultError::Oracle`] / [`VaultError::BelowMinimum`].
    /// - [`VaultError::BurnFailed`]: no id is consumed.
    pub fn request_redemption(
        &mut self,
        requester: &Address,
        amount: Amount,
        token_out: &Address,
    ) -> Result<u64, VaultError> {
        self.core.check_participant(requester)?;
        VaultCore::check_amount(amount)?;
        self.core.check_not_paused()?;

        let value = self.core.primary_value(amount)?;
        self.core.check_minimum(value)?;

        let expected_payout = self.core.amount_after_fee(amount)?;
        let path = self.core.settlement_path(token_out);

        self.core.burn(requester, amount).map_err(|e| {
            warn!(requester = %requester, amount, error = %e, "redemption burn failed");
            e
        })?;

        self.last_request_id += 1;
        let id = self.last_request_id;
        self.requests.insert(
            id,
            RedemptionRequest {
                id,
                requester: *requester,
                token_amount_in: amount,
                expected_payout,
                token_out: *token_out,
                path,
                status: RequestStatus::Pending,
                created_at: Utc::now(),
                settled_at: None,
            },
        );

        info!(
            request = id,
            requester = %requester,
            amount,
            expected_payout,
            path = %path,
            "redemption requested"
        );
        Ok(id)
    }

    /// Marks a pending request fulfilled and returns what must be paid.
    pub fn fulfill_redemption(
        &mut self,
        caller: &Address,
        id: u64,
    ) -> Result<PayoutInstruction, VaultError> {
        self.core.require_admin(caller)?;
        let request = self.pending_mut(id)?;

        request.status = RequestStatus::Fulfilled;
        request.settled_at = Some(Utc::now());

        let instruction = PayoutInstruction {
            request_id: id,
            recipient: request.requester,
            token_out: request.token_out,
            amount: request.expected_payout,
            path: request.path,
        };
        info!(
            request = id,
            recipient = %instruction.recipient,
            amount = instruction.amount,
            path = %instruction.path,
            "redemption fulfilled"
        );
        Ok(instruction)
    }

    /// Cancels a pending request and re-mints the burned amount to the
    /// requester. A failed re-mint leaves the request `Pending`.
    pub fn cancel_redemption(&mut self, caller: &Address, id: u64) -> Result<(), VaultError> {
        self.core.require_admin(caller)?;
        let (requester, amount) = {
            let request = self.pending(id)?;
            (request.requester, request.token_amount_in)
        };
        self.core.check_not_paused()?;

        self.core.mint(&requester, amount).map_err(|e| {
            warn!(request = id, error = %e, "cancellation re-mint failed");
            e
        })?;

        let request = self.pending_mut(id)?;
        request.status = RequestStatus::Cancelled;
        request.settled_at = Some(Utc::now());
        info!(request = id, requester = %requester, amount, "redemption cancelled");
        Ok(())
    }

    fn pending(&self, id: u64) -> Result<&RedemptionRequest, VaultError> {
        let request = self.requests.get(&id).ok_or(VaultError::RequestNotFound(id))?;
        if request.status != RequestStatus::Pending {
            debug!(request = id, status = %request.status, "request not pending");
            return Err(VaultError::InvalidState {
                id,
                current: request.status.to_string(),
                expected: RequestStatus::Pending.to_string(),
            });
        }
        Ok(request)
    }

    fn pending_mut(&mut self, id: u64) -> Result<&mut RedemptionRequest, VaultError> {
        self.pending(id)?;
        self.requests.get_mut(&id).ok_or(VaultError::RequestNotFound(id))
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.core.address()
    }

    pub fn request(&self, id: u64) -> Option<&RedemptionRequest> {
        self.requests.get(&id)
    }

    /// Id of the most recently accepted request, 0 if none.
    pub fn last_request_id(&self) -> u64 {
        self.last_request_id
    }

    /// Id the next accepted request will receive.
    pub fn next_request_id(&self) -> u64 {
        self.last_request_id + 1
    }

    /// Pending requests in id order.
    pub fn pending_requests(&self) -> Vec<&RedemptionRequest> {
        self.requests
            .values()
            .filter(|r| r.status == RequestStatus::Pending)
            .collect()
    }

    pub fn config(&self) -> RedemptionVaultConfig {
        let params = self.core.params();
        RedemptionVaultConfig {
            address: self.core.address(),
            token: self.core.token_address(),
            primary_feed: self.core.primary_feed().feed(),
            fee_bps: params.fee_bps,
            min_redeem_in_quote: params.min_amount,
            manual_fulfillment_token: params.manual_fulfillment_token,
            last_request_id: self.last_request_id,
        }
    }

    /// The role allowed to fulfill, cancel and reconfigure.
    pub fn vault_role(&self) -> Role {
        self.core.admin_role()
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    pub fn set_fee_bps(&mut self, caller: &Address, fee_bps: u16) -> Result<(), VaultError> {
        self.core.set_fee_bps(caller, fee_bps)
    }

    pub fn set_min_redeem(&mut self, caller: &Address, minimum: Amount) -> Result<(), VaultError> {
        self.core.set_min_amount(caller, minimum)
    }

    pub fn set_feed(&mut self, caller: &Address, feed: PriceOracleAdapter) -> Result<(), VaultError> {
        self.core.set_primary_feed(caller, feed)
    }

    pub fn set_manual_fulfillment_token(
        &mut self,
        caller: &Address,
        token: Address,
    ) -> Result<(), VaultError> {
        self.core.set_manual_fulfillment_token(caller, token)
    }
}
