//! # Token Capability
//!
//! The managed token is an external collaborator. Vaults only need four
//! things from it: mint, burn, a balance lookup and the pause switch. This
//! module defines that capability and an in-memory ledger implementing it.
//!
//! ## In-Memory Ledger
//!
//! [`InMemoryToken`] keeps per-address balances and total supply behind a
//! lock. Supply and balances move together on every mint and burn, overflow is
//! checked on every operation, and a paused token refuses both.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use thiserror::Error;
use tracing::{debug, info};

use crate::types::{Address, Amount};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Errors reported by a token capability.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// The token is paused.
    #[error("token is paused")]
    Paused,

    /// Insufficient balance for a burn.
    #[error("insufficient balance: account has {balance}, tried to burn {amount}")]
    InsufficientBalance {
        /// Current balance of the account.
        balance: Amount,
        /// Amount the caller tried to burn.
        amount: Amount,
    },

    /// A supply or balance overflow would occur.
    #[error("supply overflow: minting {amount} would exceed u128::MAX")]
    Overflow {
        /// The amount that was attempted.
        amount: Amount,
    },

    /// The token rejected the call for its own reasons.
    #[error("token rejected call: {0}")]
    Rejected(String),
}

// ---------------------------------------------------------------------------
// Capability
// ---------------------------------------------------------------------------

/// What a vault may ask of the managed token.
pub trait TokenCapability: Send + Sync {
    /// Creates `amount` new tokens owned by `to`.
    fn mint(&self, to: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Destroys `amount` tokens owned by `from`.
    fn burn(&self, from: &Address, amount: Amount) -> Result<(), TokenError>;

    /// Current balance of `account`.
    fn balance_of(&self, account: &Address) -> Amount;

    /// Whether the token is paused.
    fn paused(&self) -> bool;
}

// ---------------------------------------------------------------------------
// In-memory ledger
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
struct Ledger {
    total_supply: Amount,
    balances: BTreeMap<Address, Amount>,
    paused: bool,
}

/// Snapshot of an [`InMemoryToken`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenSnapshot {
    /// Token contract address.
    pub address: Address,
    /// Ticker symbol.
    pub symbol: String,
    /// Current total supply.
    pub total_supply: Amount,
    /// Non-zero balances.
    pub balances: BTreeMap<Address, Amount>,
    /// Pause switch.
    pub paused: bool,
}

/// An in-memory managed token.
#[derive(Debug)]
pub struct InMemoryToken {
    address: Address,
    symbol: String,
    ledger: RwLock<Ledger>,
}

impl InMemoryToken {
    /// Creates an unpaused token with zero supply.
    pub fn new(address: Address, symbol: impl Into<String>) -> Self {
        Self {
            address,
            symbol: symbol.into(),
            ledger: RwLock::new(Ledger::default()),
        }
    }

    /// Token contract address.
    pub fn address(&self) -> Address {
        self.address
    }

    /// Ticker symbol.
    pub fn symbol(&self) -> &str {
        &self.symbol
    }

    /// Current total supply.
    pub fn total_supply(&self) -> Amount {
        self.ledger.read().total_supply
    }

    /// Pauses mint and burn.
    pub fn pause(&self) {
        self.ledger.write().paused = true;
        info!(token = %self.address, "token paused");
    }

    /// Resumes mint and burn.
    pub fn unpause(&self) {
        self.ledger.write().paused = false;
        info!(token = %self.address, "token unpaused");
    }

    /// Copies out the current ledger.
    pub fn snapshot(&self) -> TokenSnapshot {
        let ledger = self.ledger.read();
        TokenSnapshot {
            address: self.address,
            symbol: self.symbol.clone(),
            total_supply: ledger.total_supply,
            balances: ledger
                .balances
                .iter()
                .filter(|(_, balance)| **balance > 0)
                .map(|(account, balance)| (*account, *balance))
                .collect(),
            paused: ledger.paused,
        }
    }
}

impl TokenCapability for InMemoryToken {
    fn mint(&self, to: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut ledger = self.ledger.write();
        if ledger.paused {
            return Err(TokenError::Paused);
        }

        let new_supply = ledger
            .total_supply
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;
        let current = ledger.balances.get(to).copied().unwrap_or(0);
        let new_balance = current
            .checked_add(amount)
            .ok_or(TokenError::Overflow { amount })?;

        ledger.total_supply = new_supply;
        ledger.balances.insert(*to, new_balance);
        debug!(token = %self.address, to = %to, amount, "minted");
        Ok(())
    }

    fn burn(&self, from: &Address, amount: Amount) -> Result<(), TokenError> {
        let mut ledger = self.ledger.write();
        if ledger.paused {
            return Err(TokenError::Paused);
        }

        let balance = ledger.balances.get(from).copied().unwrap_or(0);
        if balance < amount {
            return Err(TokenError::InsufficientBalance { balance, amount });
        }

        ledger.balances.insert(*from, balance - amount);
        ledger.total_supply = ledger.total_supply.saturating_sub(amount);
        debug!(token = %self.address, from = %from, amount, "burned");
        Ok(())
    }

    fn balance_of(&self, account: &Address) -> Amount {
        self.ledger
            .read()
            .balances
            .get(account)
            .copied()
            .unwrap_or(0)
    }

    fn paused(&self) -> bool {
        self.ledger.read().paused
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token() -> InMemoryToken {
        InMemoryToken::new(Address::derive("stUSD"), "stUSD")
    }

    #[test]
    fn mint_increases_supply_and_balance() {
        let token = token();
        let alice = Address::derive("alice");
        token.mint(&alice, 1_000_000).unwrap();
        assert_eq!(token.total_supply(), 1_000_000);
        assert_eq!(token.balance_of(&alice), 1_000_000);
    }

    #[test]
    fn burn_decreases_supply_and_balance() {
        let token = token();
        let alice = Address::derive("alice");
        token.mint(&alice, 1_000_000).unwrap();
        token.burn(&alice, 400_000).unwrap();
        assert_eq!(token.total_supply(), 600_000);
        assert_eq!(token.balance_of(&alice), 600_000);
    }

    #[test]
    fn burn_more_than_balance_rejected() {
        let token = token();
        let alice = Address::derive("alice");
        token.mint(&alice, 100).unwrap();
        assert_eq!(
            token.burn(&alice, 200),
            Err(TokenError::InsufficientBalance { balance: 100, amount: 200 })
        );
        assert_eq!(token.balance_of(&alice), 100);
    }

    #[test]
    fn mint_overflow_rejected_without_side_effects() {
        let token = token();
        let alice = Address::derive("alice");
        token.mint(&alice, u128::MAX).unwrap();
        assert!(matches!(token.mint(&alice, 1), Err(TokenError::Overflow { .. })));
        assert_eq!(token.total_supply(), u128::MAX);
    }

    #[test]
    fn paused_token_refuses_mint_and_burn() {
        let token = token();
        let alice = Address::derive("alice");
        token.mint(&alice, 10).unwrap();
        token.pause();
        assert!(token.paused());
        assert_eq!(token.mint(&alice, 1), Err(TokenError::Paused));
        assert_eq!(token.burn(&alice, 1), Err(TokenError::Paused));
        token.unpause();
        token.burn(&alice, 10).unwrap();
    }

    #[test]
    fn snapshot_omits_empty_balances() {
        let token = token();
        let alice = Address::derive("alice");
        let bob = Address::derive("bob");
        token.mint(&alice, 5).unwrap();
        token.mint(&bob, 5).unwrap();
        token.burn(&bob, 5).unwrap();
        let snap = token.snapshot();
        assert_eq!(snap.total_supply, 5);
        assert_eq!(snap.balances.len(), 1);
        assert_eq!(snap.balances.get(&alice), Some(&5));
    }
}
