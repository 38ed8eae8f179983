//! # Deposit Vault
//!
//! Accepts value from greenlisted accounts and mints the managed token in
//! return, minus a basis-point fee. The vault has no per-deposit state
//! machine: every call runs to completion or changes nothing.
//!
//! ## Deposit Flow
//!
//! 1. **Gate**: payer must not be blacklisted and must be greenlisted.
//! 2. **Sanity**: non-zero amount, token not paused.
//! 3. **Path**: depositing the manual-fulfillment token records the deposit
//!    for off-core reconciliation and stops there. No conversion, no mint.
//! 4. **Price**: the amount is valued through the primary feed and, when
//!    configured, a secondary currency feed (asset → reference → quote).
//! 5. **Minimum**: the quote value must reach the configured minimum.
//! 6. **Mint**: `amount - floor(amount * fee_bps / 10_000)` to the payer.
//! 7. **Commit**: local accounting is updated only after the mint succeeded.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};
use uuid::Uuid;

use atrium_protocol::access::Role;
use atrium_protocol::oracle::PriceOracleAdapter;
use atrium_protocol::{Address, Amount};

use crate::vault::{SettlementPath, VaultCore, VaultError, VaultParams, VaultWiring};

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Snapshot of a deposit vault's configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositVaultConfig {
    /// Vault address.
    pub address: Address,
    /// Managed token address.
    pub token: Address,
    /// Asset → reference feed.
    pub primary_feed: Address,
    /// Reference → quote feed, if deposits are valued in another currency.
    pub secondary_feed: Option<Address>,
    /// Fee in basis points.
    pub fee_bps: u16,
    /// Minimum deposit value in quote currency.
    pub min_deposit_in_quote: Amount,
    /// Depositing this token takes the manual path.
    pub manual_fulfillment_token: Address,
}

/// Outcome of a successful deposit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DepositReceipt {
    /// Unique receipt id.
    pub receipt_id: Uuid,
    /// Depositing account.
    pub payer: Address,
    /// Token the payer settled in.
    pub token_in: Address,
    /// Amount deposited.
    pub amount: Amount,
    /// Fee withheld.
    pub fee: Amount,
    /// Amount minted to the payer. Zero on the manual path.
    pub minted: Amount,
    /// Value of the deposit in quote currency. `None` on the manual path.
    pub quote_value: Option<Amount>,
    /// How the deposit settled.
    pub path: SettlementPath,
    /// When the deposit was accepted.
    pub settled_at: DateTime<Utc>,
}

/// A deposit awaiting off-core reconciliation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ManualDeposit {
    /// Receipt id shared with the [`DepositReceipt`].
    pub receipt_id: Uuid,
    /// Depositing account.
    pub payer: Address,
    /// Token the payer settled in.
    pub token_in: Address,
    /// Amount deposited.
    pub amount: Amount,
    /// Fee to withhold.
    pub fee: Amount,
    /// Amount to mint once the deposit is reconciled.
    pub mintable: Amount,
    /// When the deposit was recorded.
    pub recorded_at: DateTime<Utc>,
}

/// Running totals of automatic deposits.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct DepositStats {
    /// Sum of accepted deposit amounts.
    pub total_deposited: Amount,
    /// Sum of minted amounts.
    pub total_minted: Amount,
    /// Sum of withheld fees.
    pub total_fees: Amount,
    /// Number of automatic deposits.
    pub deposit_count: u64,
}

/// The deposit vault.
#[derive(Debug)]
pub struct DepositVault {
    core: VaultCore,
    secondary_feed: Option<PriceOracleAdapter>,
    stats: DepositStats,
    manual_deposits: Vec<ManualDeposit>,
}

impl DepositVault {
    /// Builds a deposit vault. This is the only way to obtain one, so its
    /// wiring is fixed once constructed; only the admin setters change it.
    ///
    /// # Errors
    ///
    /// [`VaultError::InvalidFee`] if `params.fee_bps` exceeds 10_000.
    pub fn initialize(
        wiring: VaultWiring,
        secondary_feed: Option<PriceOracleAdapter>,
        params: VaultParams,
    ) -> Result<Self, VaultError> {
        let core = VaultCore::new(wiring, Role::DepositVaultAdmin, params)?;
        info!(
            vault = %core.address(),
            token = %core.token_address(),
            fee_bps = params.fee_bps,
            "deposit vault initialized"
        );
        Ok(Self {
            core,
            secondary_feed,
            stats: DepositStats::default(),
            manual_deposits: Vec::new(),
        })
    }

    /// Deposits `amount` of `token_in` on behalf of `payer`.
    ///
    /// # Errors
    ///
    /// - [`VaultError::Access`]: payer blacklisted, not greenlisted, or the
    ///   vault lacks `Minter`.
    /// - [`VaultError::InvalidAmount`] / [`VaultError::Paused`].
    /// - [`VaultError::Oracle`]: a feed is unavailable or conversion overflowed.
    /// - [`VaultError::BelowMinimum`]: quote value under the minimum.
    /// - [`VaultError::MintFailed`]: the token refused; nothing was recorded.
    pub fn deposit(
        &mut self,
        payer: &Address,
        amount: Amount,
        token_in: &Address,
    ) -> Result<DepositReceipt, VaultError> {
        self.core.check_participant(payer)?;
        VaultCore::check_amount(amount)?;
        self.core.check_not_paused()?;

        let fee = self.core.fee_for(amount)?;
        let mintable = amount - fee;

        match self.core.settlement_path(token_in) {
            SettlementPath::Manual => Ok(self.record_manual(payer, token_in, amount, fee, mintable)),
            SettlementPath::Automatic => {
                let quote_value = self.quote_value(amount)?;
                self.core.check_minimum(quote_value)?;

                self.core.mint(payer, mintable).map_err(|e| {
                    warn!(payer = %payer, amount, error = %e, "deposit mint failed");
                    e
                })?;

                // Mint went through; only now touch local accounting.
                self.stats.total_deposited = self.stats.total_deposited.saturating_add(amount);
                self.stats.total_minted = self.stats.total_minted.saturating_add(mintable);
                self.stats.total_fees = self.stats.total_fees.saturating_add(fee);
                self.stats.deposit_count += 1;

                let receipt = DepositReceipt {
                    receipt_id: Uuid::new_v4(),
                    payer: *payer,
                    token_in: *token_in,
                    amount,
                    fee,
                    minted: mintable,
                    quote_value: Some(quote_value),
                    path: SettlementPath::Automatic,
                    settled_at: Utc::now(),
                };
                info!(
                    receipt = %receipt.receipt_id,
                    payer = %payer,
                    amount,
                    minted = mintable,
                    fee,
                    "deposit settled"
                );
                Ok(receipt)
            }
        }
    }

    /// Value of `amount` in quote currency, via one or two feeds.
    pub fn quote_value(&self, amount: Amount) -> Result<Amount, VaultError> {
        let reference = self.core.primary_value(amount)?;
        match &self.secondary_feed {
            Some(feed) => {
                let reading = feed.latest_price()?;
                Ok(PriceOracleAdapter::convert(reference, &reading)?)
            }
            None => Ok(reference),
        }
    }

    fn record_manual(
        &mut self,
        payer: &Address,
        token_in: &Address,
        amount: Amount,
        fee: Amount,
        mintable: Amount,
    ) -> DepositReceipt {
        let now = Utc::now();
        let record = ManualDeposit {
            receipt_id: Uuid::new_v4(),
            payer: *payer,
            token_in: *token_in,
            amount,
            fee,
            mintable,
            recorded_at: now,
        };
        info!(
            receipt = %record.receipt_id,
            payer = %payer,
            amount,
            mintable,
            "manual deposit recorded for reconciliation"
        );

        let receipt = DepositReceipt {
            receipt_id: record.receipt_id,
            payer: *payer,
            token_in: *token_in,
            amount,
            fee,
            minted: 0,
            quote_value: None,
            path: SettlementPath::Manual,
            settled_at: now,
        };
        self.manual_deposits.push(record);
        receipt
    }

    // -----------------------------------------------------------------------
    // Queries
    // -----------------------------------------------------------------------

    pub fn address(&self) -> Address {
        self.core.address()
    }

    pub fn config(&self) -> DepositVaultConfig {
        let params = self.core.params();
        DepositVaultConfig {
            address: self.core.address(),
            token: self.core.token_address(),
            primary_feed: self.core.primary_feed().feed(),
            secondary_feed: self.secondary_feed.as_ref().map(|f| f.feed()),
            fee_bps: params.fee_bps,
            min_deposit_in_quote: params.min_amount,
            manual_fulfillment_token: params.manual_fulfillment_token,
        }
    }

    /// The role allowed to reconfigure this vault.
    pub fn vault_role(&self) -> Role {
        self.core.admin_role()
    }

    pub fn stats(&self) -> DepositStats {
        self.stats
    }

    /// Manual deposits recorded so far, oldest first.
    pub fn manual_deposits(&self) -> &[ManualDeposit] {
        &self.manual_deposits
    }

    // -----------------------------------------------------------------------
    // Admin
    // -----------------------------------------------------------------------

    pub fn set_fee_bps(&mut self, caller: &Address, fee_bps: u16) -> Result<(), VaultError> {
        self.core.set_fee_bps(caller, fee_bps)
    }

    pub fn set_min_deposit(&mut self, caller: &Address, minimum: Amount) -> Result<(), VaultError> {
        self.core.set_min_amount(caller, minimum)
    }

    pub fn set_manual_fulfillment_token(
        &mut self,
        caller: &Address,
        token: Address,
    ) -> Result<(), VaultError> {
        self.core.set_manual_fulfillment_token(caller, token)
    }

    /// Replaces both feeds. `secondary = None` values deposits in the
    /// primary feed's currency.
    pub fn set_feeds(
        &mut self,
        caller: &Address,
        primary: PriceOracleAdapter,
        secondary: Option<PriceOracleAdapter>,
    ) -> Result<(), VaultError> {
        self.core.set_primary_feed(caller, primary)?;
        self.secondary_feed = secondary;
        Ok(())
    }
}
