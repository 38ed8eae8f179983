//! # Replay
//!
//! Builds a fresh in-memory deployment from a [`DeploymentConfig`] and runs a
//! script of operations against it, one outcome per operation. A failed
//! operation is reported and the replay carries on with the next one, so a
//! script can probe the rejection paths as easily as the happy path.
//!
//! Scripts are JSON arrays of externally tagged operations:
//!
//! ```json
//! [
//!   { "deposit": { "payer": "alice", "amount": 10000, "token_in": "usdc" } },
//!   { "request_redemption": { "requester": "alice", "amount": 500, "token_out": "usdc" } },
//!   { "fulfill_redemption": { "caller": "deployer", "id": 1 } },
//!   "pause_token"
//! ]
//! ```

use anyhow::{bail, Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info, warn};

use atrium_contracts::deposit_vault::{DepositReceipt, DepositStats, DepositVault};
use atrium_contracts::redemption_vault::{PayoutInstruction, RedemptionVault};
use atrium_contracts::vault::VaultWiring;
use atrium_protocol::access::{Role, RoleRegistry, SharedRegistry};
use atrium_protocol::oracle::{PriceOracleAdapter, StaticAggregator};
use atrium_protocol::token::{InMemoryToken, TokenSnapshot};
use atrium_protocol::{Address, Amount};

use crate::config::{Account, DeploymentConfig, FeedConfig};

// ---------------------------------------------------------------------------
// Script
// ---------------------------------------------------------------------------

/// Which vault an admin operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VaultKind {
    Deposit,
    Redemption,
}

/// Which feed a price operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedKind {
    Primary,
    Secondary,
}

/// One scripted operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operation {
    GrantRole { caller: Account, role: Role, account: Account },
    RevokeRole { caller: Account, role: Role, account: Account },
    GrantRoleMultiple { caller: Account, roles: Vec<Role>, accounts: Vec<Account> },
    RevokeRoleMultiple { caller: Account, roles: Vec<Role>, accounts: Vec<Account> },
    Deposit { payer: Account, amount: Amount, token_in: Account },
    RequestRedemption { requester: Account, amount: Amount, token_out: Account },
    FulfillRedemption { caller: Account, id: u64 },
    CancelRedemption { caller: Account, id: u64 },
    SetFee { caller: Account, vault: VaultKind, fee_bps: u16 },
    SetMinimum { caller: Account, vault: VaultKind, amount: Amount },
    SetManualToken { caller: Account, vault: VaultKind, token: Account },
    SetPrice { feed: FeedKind, answer: i128 },
    FailFeed { feed: FeedKind, reason: String },
    PauseToken,
    UnpauseToken,
}

impl Operation {
    /// Script name of the operation.
    pub fn name(&self) -> &'static str {
        match self {
            Operation::GrantRole { .. } => "grant_role",
            Operation::RevokeRole { .. } => "revoke_role",
            Operation::GrantRoleMultiple { .. } => "grant_role_multiple",
            Operation::RevokeRoleMultiple { .. } => "revoke_role_multiple",
            Operation::Deposit { .. } => "deposit",
            Operation::RequestRedemption { .. } => "request_redemption",
            Operation::FulfillRedemption { .. } => "fulfill_redemption",
            Operation::CancelRedemption { .. } => "cancel_redemption",
            Operation::SetFee { .. } => "set_fee",
            Operation::SetMinimum { .. } => "set_minimum",
            Operation::SetManualToken { .. } => "set_manual_token",
            Operation::SetPrice { .. } => "set_price",
            Operation::FailFeed { .. } => "fail_feed",
            Operation::PauseToken => "pause_token",
            Operation::UnpauseToken => "unpause_token",
        }
    }
}

/// Reads and parses an operation script.
pub fn load_script(path: &Path) -> Result<Vec<Operation>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read script {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("failed to parse script {}", path.display()))
}

// ---------------------------------------------------------------------------
// Outcomes
// ---------------------------------------------------------------------------

/// Payload of a successful operation, when it has one.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum OpResult {
    Deposit(DepositReceipt),
    Request { request_id: u64 },
    Payout(PayoutInstruction),
}

/// Result of one scripted operation.
#[derive(Debug, Clone, Serialize)]
pub struct Outcome {
    pub step: usize,
    pub op: &'static str,
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<OpResult>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// State of the deployment after a replay.
#[derive(Debug, Clone, Serialize)]
pub struct ReplaySummary {
    pub operations: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub token: TokenSnapshot,
    pub deposits: DepositStats,
    pub manual_deposits: usize,
    pub last_request_id: u64,
    pub pending_requests: Vec<u64>,
    pub finished_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Deployment
// ---------------------------------------------------------------------------

/// A complete in-memory deployment.
#[derive(Debug)]
pub struct Deployment {
    pub registry: SharedRegistry,
    pub token: Arc<InMemoryToken>,
    pub primary: Arc<StaticAggregator>,
    pub secondary: Option<Arc<StaticAggregator>>,
    pub deposit_vault: DepositVault,
    pub redemption_vault: RedemptionVault,
}

impl Deployment {
    /// Deploys everything `config` describes, in the order a live deployment
    /// would: registry, role wiring, initial lists, token, feeds, vaults.
    pub fn build(config: &DeploymentConfig) -> Result<Self> {
        let deployer = config.deployer.address();
        let token_address = config.token.address.address();
        let deposit_address = config.deposit_vault.address.address();
        let redemption_address = config.redemption_vault.address.address();

        let mut registry = RoleRegistry::new();
        registry
            .initialize(deployer)
            .context("failed to initialize role registry")?;
        registry
            .wire_vault_roles(&deployer, deposit_address, redemption_address, token_address)
            .context("failed to wire vault roles")?;
        grant_list(&mut registry, &deployer, Role::Greenlisted, &config.greenlist)
            .context("failed to apply initial greenlist")?;
        grant_list(&mut registry, &deployer, Role::Blacklisted, &config.blacklist)
            .context("failed to apply initial blacklist")?;
        let registry = registry.into_shared();

        let token = Arc::new(InMemoryToken::new(token_address, config.token.symbol.clone()));
        let (primary, primary_feed) = static_feed(&config.primary_feed);
        let secondary = config.secondary_feed.as_ref().map(static_feed);

        let wiring = |address| VaultWiring {
            address,
            registry: registry.clone(),
            token: token.clone(),
            token_address,
            primary_feed: primary_feed.clone(),
        };
        let deposit_vault = DepositVault::initialize(
            wiring(deposit_address),
            secondary.as_ref().map(|(_, feed)| feed.clone()),
            config.deposit_vault.params(),
        )
        .context("failed to initialize deposit vault")?;
        let redemption_vault =
            RedemptionVault::initialize(wiring(redemption_address), config.redemption_vault.params())
                .context("failed to initialize redemption vault")?;

        info!(
            deployer = %deployer,
            token = %token_address,
            deposit_vault = %deposit_address,
            redemption_vault = %redemption_address,
            "deployment built"
        );

        Ok(Self {
            registry,
            token,
            primary,
            secondary: secondary.map(|(agg, _)| agg),
            deposit_vault,
            redemption_vault,
        })
    }

    /// Runs every operation in order. Failures are recorded, never fatal.
    pub fn replay(&mut self, operations: &[Operation]) -> Vec<Outcome> {
        operations
            .iter()
            .enumerate()
            .map(|(i, op)| {
                let step = i + 1;
                match self.apply(op) {
                    Ok(result) => {
                        debug!(step, op = op.name(), "operation succeeded");
                        Outcome { step, op: op.name(), ok: true, result, error: None }
                    }
                    Err(e) => {
                        warn!(step, op = op.name(), error = %format!("{e:#}"), "operation failed");
                        Outcome {
                            step,
                            op: op.name(),
                            ok: false,
                            result: None,
                            error: Some(format!("{e:#}")),
                        }
                    }
                }
            })
            .collect()
    }

    /// Applies a single operation.
    pub fn apply(&mut self, op: &Operation) -> Result<Option<OpResult>> {
        match op {
            Operation::GrantRole { caller, role, account } => {
                self.registry
                    .write()
                    .grant_role(&caller.address(), *role, account.address())?;
                Ok(None)
            }
            Operation::RevokeRole { caller, role, account } => {
                self.registry
                    .write()
                    .revoke_role(&caller.address(), *role, account.address())?;
                Ok(None)
            }
            Operation::GrantRoleMultiple { caller, roles, accounts } => {
                let accounts = addresses(accounts);
                self.registry
                    .write()
                    .grant_role_multiple(&caller.address(), roles, &accounts)?;
                Ok(None)
            }
            Operation::RevokeRoleMultiple { caller, roles, accounts } => {
                let accounts = addresses(accounts);
                self.registry
                    .write()
                    .revoke_role_multiple(&caller.address(), roles, &accounts)?;
                Ok(None)
            }
            Operation::Deposit { payer, amount, token_in } => {
                let receipt =
                    self.deposit_vault
                        .deposit(&payer.address(), *amount, &token_in.address())?;
                Ok(Some(OpResult::Deposit(receipt)))
            }
            Operation::RequestRedemption { requester, amount, token_out } => {
                let request_id = self.redemption_vault.request_redemption(
                    &requester.address(),
                    *amount,
                    &token_out.address(),
                )?;
                Ok(Some(OpResult::Request { request_id }))
            }
            Operation::FulfillRedemption { caller, id } => {
                let payout = self.redemption_vault.fulfill_redemption(&caller.address(), *id)?;
                Ok(Some(OpResult::Payout(payout)))
            }
            Operation::CancelRedemption { caller, id } => {
                self.redemption_vault.cancel_redemption(&caller.address(), *id)?;
                Ok(Some(OpResult::Request { request_id: *id }))
            }
            Operation::SetFee { caller, vault, fee_bps } => {
                match vault {
                    VaultKind::Deposit => self.deposit_vault.set_fee_bps(&caller.address(), *fee_bps)?,
                    VaultKind::Redemption => {
                        self.redemption_vault.set_fee_bps(&caller.address(), *fee_bps)?
                    }
                }
                Ok(None)
            }
            Operation::SetMinimum { caller, vault, amount } => {
                match vault {
                    VaultKind::Deposit => {
                        self.deposit_vault.set_min_deposit(&caller.address(), *amount)?
                    }
                    VaultKind::Redemption => {
                        self.redemption_vault.set_min_redeem(&caller.address(), *amount)?
                    }
                }
                Ok(None)
            }
            Operation::SetManualToken { caller, vault, token } => {
                match vault {
                    VaultKind::Deposit => self
                        .deposit_vault
                        .set_manual_fulfillment_token(&caller.address(), token.address())?,
                    VaultKind::Redemption => self
                        .redemption_vault
                        .set_manual_fulfillment_token(&caller.address(), token.address())?,
                }
                Ok(None)
            }
            Operation::SetPrice { feed, answer } => {
                self.aggregator(*feed)?.set_answer(*answer);
                Ok(None)
            }
            Operation::FailFeed { feed, reason } => {
                self.aggregator(*feed)?.fail(reason.clone());
                Ok(None)
            }
            Operation::PauseToken => {
                self.token.pause();
                Ok(None)
            }
            Operation::UnpauseToken => {
                self.token.unpause();
                Ok(None)
            }
        }
    }

    /// Snapshot of the deployment after `outcomes`.
    pub fn summary(&self, outcomes: &[Outcome]) -> ReplaySummary {
        let succeeded = outcomes.iter().filter(|o| o.ok).count();
        ReplaySummary {
            operations: outcomes.len(),
            succeeded,
            failed: outcomes.len() - succeeded,
            token: self.token.snapshot(),
            deposits: self.deposit_vault.stats(),
            manual_deposits: self.deposit_vault.manual_deposits().len(),
            last_request_id: self.redemption_vault.last_request_id(),
            pending_requests: self
                .redemption_vault
                .pending_requests()
                .iter()
                .map(|r| r.id)
                .collect(),
            finished_at: Utc::now(),
        }
    }

    fn aggregator(&self, feed: FeedKind) -> Result<&StaticAggregator> {
        match feed {
            FeedKind::Primary => Ok(&*self.primary),
            FeedKind::Secondary => match &self.secondary {
                Some(agg) => Ok(&**agg),
                None => bail!("deployment has no secondary feed"),
            },
        }
    }
}

fn addresses(accounts: &[Account]) -> Vec<Address> {
    accounts.iter().map(Account::address).collect()
}

fn grant_list(
    registry: &mut RoleRegistry,
    deployer: &Address,
    role: Role,
    accounts: &[Account],
) -> Result<()> {
    if accounts.is_empty() {
        return Ok(());
    }
    let roles = vec![role; accounts.len()];
    registry.grant_role_multiple(deployer, &roles, &addresses(accounts))?;
    Ok(())
}

fn static_feed(config: &FeedConfig) -> (Arc<StaticAggregator>, PriceOracleAdapter) {
    let aggregator = Arc::new(StaticAggregator::new(config.answer, config.decimals));
    let adapter = PriceOracleAdapter::new(config.address.address(), aggregator.clone());
    (aggregator, adapter)
}
