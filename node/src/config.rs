//! # Deployment Configuration
//!
//! The JSON file that describes one Atrium deployment: who deploys it, where
//! the token and vaults live, what the feeds answer and what the vault
//! policies are. The replay tool builds a fresh in-memory deployment from it.
//!
//! Accounts may be written either as `0x`-prefixed hex addresses or as plain
//! labels (`"alice"`, `"deposit-vault"`). A label stands for the address
//! derived from it, so scripts stay readable without hard-coding hex.
//!
//! ```json
//! {
//!   "deployer": "deployer",
//!   "token": { "address": "stUSD", "symbol": "stUSD" },
//!   "primary_feed": { "address": "etf-feed", "answer": 100000000 },
//!   "deposit_vault": { "address": "deposit-vault" },
//!   "redemption_vault": { "address": "redemption-vault", "min_amount": 100 },
//!   "greenlist": ["alice", "bob"]
//! }
//! ```

use anyhow::{Context, Result};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::path::Path;

use atrium_contracts::vault::VaultParams;
use atrium_protocol::{config, Address, Amount};

/// An account reference: hex address or label.
#[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(transparent)]
pub struct Account(pub Address);

impl Account {
    /// Resolves `s` as a hex address when it starts with `0x`, otherwise as a
    /// label.
    pub fn resolve(s: &str) -> Result<Self, hex::FromHexError> {
        if s.starts_with("0x") {
            Address::from_hex(s).map(Account)
        } else {
            Ok(Account(Address::derive(s)))
        }
    }

    pub fn address(&self) -> Address {
        self.0
    }
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.0, f)
    }
}

impl<'de> Deserialize<'de> for Account {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Account::resolve(&s).map_err(serde::de::Error::custom)
    }
}

/// The managed token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TokenConfig {
    pub address: Account,
    #[serde(default = "default_symbol")]
    pub symbol: String,
}

/// A static price feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FeedConfig {
    pub address: Account,
    /// Raw aggregator answer.
    pub answer: i128,
    #[serde(default = "default_decimals")]
    pub decimals: u8,
}

/// Policy of one vault.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct VaultConfig {
    pub address: Account,
    #[serde(default = "default_fee_bps")]
    pub fee_bps: u16,
    /// Minimum operation value in quote currency.
    #[serde(default)]
    pub min_amount: Amount,
    /// Settling in this token takes the manual path. Defaults to the zero address.
    #[serde(default)]
    pub manual_fulfillment_token: Option<Account>,
}

impl VaultConfig {
    pub fn params(&self) -> VaultParams {
        VaultParams {
            fee_bps: self.fee_bps,
            min_amount: self.min_amount,
            manual_fulfillment_token: self
                .manual_fulfillment_token
                .map(|a| a.address())
                .unwrap_or(Address::ZERO),
        }
    }
}

/// A complete deployment description.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeploymentConfig {
    /// Receives `DefaultAdmin` and every operational role.
    pub deployer: Account,
    pub token: TokenConfig,
    /// Managed asset priced in the reference currency.
    pub primary_feed: FeedConfig,
    /// Reference currency priced in the deposit quote currency, if different.
    #[serde(default)]
    pub secondary_feed: Option<FeedConfig>,
    pub deposit_vault: VaultConfig,
    pub redemption_vault: VaultConfig,
    /// Accounts greenlisted at deployment.
    #[serde(default)]
    pub greenlist: Vec<Account>,
    /// Accounts blacklisted at deployment.
    #[serde(default)]
    pub blacklist: Vec<Account>,
}

impl DeploymentConfig {
    /// Reads and parses a deployment file.
    pub fn load(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read deployment file {}", path.display()))?;
        let config: Self = serde_json::from_str(&raw)
            .with_context(|| format!("failed to parse deployment file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    /// Checks what the vault constructors cannot: feed precision and
    /// distinct component addresses.
    pub fn validate(&self) -> Result<()> {
        for feed in std::iter::once(&self.primary_feed).chain(self.secondary_feed.as_ref()) {
            if config::price_scale(feed.decimals).is_none() {
                anyhow::bail!(
                    "feed {} has {} decimals, at most {} are supported",
                    feed.address.address(),
                    feed.decimals,
                    config::MAX_PRICE_DECIMALS
                );
            }
        }

        let components = [
            self.token.address,
            self.deposit_vault.address,
            self.redemption_vault.address,
        ];
        for (i, a) in components.iter().enumerate() {
            if components[i + 1..].contains(a) {
                anyhow::bail!("component address {} is used twice", a.address());
            }
        }
        Ok(())
    }
}

fn default_symbol() -> String {
    "ATRM".to_string()
}

fn default_decimals() -> u8 {
    config::DEFAULT_PRICE_DECIMALS
}

fn default_fee_bps() -> u16 {
    config::DEFAULT_FEE_BPS
}
