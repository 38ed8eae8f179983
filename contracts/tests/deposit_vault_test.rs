//! Integration tests for the deposit vault.
//!
//! Each test builds a full deployment (registry initialized by the deployer,
//! post-deploy role wiring, in-memory token, static feeds) and drives deposits
//! through it the way an operator would.

use std::sync::Arc;

use atrium_contracts::deposit_vault::{DepositStats, DepositVault};
use atrium_contracts::vault::{SettlementPath, VaultError, VaultParams, VaultWiring};
use atrium_protocol::access::{AccessError, Role, RoleRegistry, SharedRegistry};
use atrium_protocol::oracle::{OracleError, PriceOracleAdapter, StaticAggregator};
use atrium_protocol::token::{InMemoryToken, TokenCapability};
use atrium_protocol::Address;

/// 1.0 at 8 decimals.
const ONE: i128 = 100_000_000;

struct Deployment {
    registry: SharedRegistry,
    token: Arc<InMemoryToken>,
    primary: Arc<StaticAggregator>,
    vault: DepositVault,
    deployer: Address,
    usdc: Address,
}

fn deploy(params: VaultParams, secondary: Option<Arc<StaticAggregator>>) -> Deployment {
    let deployer = Address::derive("deployer");
    let vault_address = Address::derive("deposit-vault");
    let token_address = Address::derive("stUSD");

    let mut registry = RoleRegistry::new();
    registry.initialize(deployer).unwrap();
    registry
        .wire_vault_roles(&deployer, vault_address, Address::derive("redemption-vault"), token_address)
        .unwrap();
    let registry = registry.into_shared();

    let token = Arc::new(InMemoryToken::new(token_address, "stUSD"));
    let primary = Arc::new(StaticAggregator::new(ONE, 8));
    let wiring = VaultWiring {
        address: vault_address,
        registry: registry.clone(),
        token: token.clone(),
        token_address,
        primary_feed: PriceOracleAdapter::new(Address::derive("primary-feed"), primary.clone()),
    };
    let secondary = secondary.map(|agg| PriceOracleAdapter::new(Address::derive("secondary-feed"), agg));
    let vault = DepositVault::initialize(wiring, secondary, params).unwrap();

    Deployment {
        registry,
        token,
        primary,
        vault,
        deployer,
        usdc: Address::derive("usdc"),
    }
}

fn greenlisted(d: &Deployment, label: &str) -> Address {
    let account = Address::derive(label);
    d.registry
        .write()
        .grant_role(&d.deployer, Role::Greenlisted, account)
        .unwrap();
    account
}

// ---------------------------------------------------------------------------
// Fees
// ---------------------------------------------------------------------------

#[test]
fn default_fee_mints_amount_minus_one_percent() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");

    for amount in [1u128, 99, 100, 12_345, 1_000_000_000] {
        let before = d.token.balance_of(&alice);
        let receipt = d.vault.deposit(&alice, amount, &d.usdc).unwrap();
        let expected = amount - amount * 100 / 10_000;
        assert_eq!(receipt.minted, expected);
        assert_eq!(d.token.balance_of(&alice) - before, expected);
    }
}

#[test]
fn zero_fee_mints_full_amount() {
    let params = VaultParams { fee_bps: 0, ..VaultParams::default() };
    let mut d = deploy(params, None);
    let alice = greenlisted(&d, "alice");

    d.vault.deposit(&alice, 777, &d.usdc).unwrap();
    assert_eq!(d.token.balance_of(&alice), 777);
}

#[test]
fn full_fee_mints_nothing() {
    let params = VaultParams { fee_bps: 10_000, ..VaultParams::default() };
    let mut d = deploy(params, None);
    let alice = greenlisted(&d, "alice");

    let receipt = d.vault.deposit(&alice, 500, &d.usdc).unwrap();
    assert_eq!(receipt.fee, 500);
    assert_eq!(receipt.minted, 0);
}

#[test]
fn fee_above_ten_thousand_bps_rejected() {
    let params = VaultParams { fee_bps: 10_001, ..VaultParams::default() };
    let deployer = Address::derive("deployer");
    let mut registry = RoleRegistry::new();
    registry.initialize(deployer).unwrap();
    let token_address = Address::derive("stUSD");
    let wiring = VaultWiring {
        address: Address::derive("deposit-vault"),
        registry: registry.into_shared(),
        token: Arc::new(InMemoryToken::new(token_address, "stUSD")),
        token_address,
        primary_feed: PriceOracleAdapter::new(Address::derive("feed"), Arc::new(StaticAggregator::unit())),
    };
    let err = DepositVault::initialize(wiring, None, params).unwrap_err();
    assert_eq!(err, VaultError::InvalidFee(10_001));
}

// ---------------------------------------------------------------------------
// Participant gate
// ---------------------------------------------------------------------------

#[test]
fn blacklisted_account_cannot_deposit_even_if_greenlisted() {
    let mut d = deploy(VaultParams::default(), None);
    let mallory = greenlisted(&d, "mallory");
    d.registry
        .write()
        .grant_role(&d.deployer, Role::Blacklisted, mallory)
        .unwrap();

    let err = d.vault.deposit(&mallory, 1_000, &d.usdc).unwrap_err();
    assert!(matches!(
        err,
        VaultError::Access(AccessError::ForbiddenRole { role: Role::Blacklisted, .. })
    ));
    assert_eq!(d.token.total_supply(), 0);
}

#[test]
fn non_greenlisted_account_cannot_deposit() {
    let mut d = deploy(VaultParams::default(), None);
    let bob = Address::derive("bob");

    let err = d.vault.deposit(&bob, 1_000, &d.usdc).unwrap_err();
    assert!(matches!(
        err,
        VaultError::Access(AccessError::MissingRole { role: Role::Greenlisted, .. })
    ));
}

#[test]
fn removing_from_greenlist_takes_effect_immediately() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");
    d.vault.deposit(&alice, 1_000, &d.usdc).unwrap();

    d.registry
        .write()
        .revoke_role(&d.deployer, Role::Greenlisted, alice)
        .unwrap();
    assert!(d.vault.deposit(&alice, 1_000, &d.usdc).is_err());
}

// ---------------------------------------------------------------------------
// Pricing and minimums
// ---------------------------------------------------------------------------

#[test]
fn secondary_feed_converts_reference_into_quote() {
    // asset = 2.0 reference, reference = 0.9 quote
    let secondary = Arc::new(StaticAggregator::new(90_000_000, 8));
    let params = VaultParams { min_amount: 1_801, ..VaultParams::default() };
    let mut d = deploy(params, Some(secondary));
    d.primary.set_answer(2 * ONE);
    let alice = greenlisted(&d, "alice");

    assert_eq!(d.vault.quote_value(1_000).unwrap(), 1_800);
    let err = d.vault.deposit(&alice, 1_000, &d.usdc).unwrap_err();
    assert_eq!(err, VaultError::BelowMinimum { value: 1_800, minimum: 1_801 });

    let receipt = d.vault.deposit(&alice, 1_001, &d.usdc).unwrap();
    assert_eq!(receipt.quote_value, Some(1_801));
}

#[test]
fn zero_minimum_always_passes() {
    let mut d = deploy(VaultParams::default(), None);
    d.primary.set_answer(1);
    let alice = greenlisted(&d, "alice");

    // quote value rounds down to zero
    let receipt = d.vault.deposit(&alice, 10, &d.usdc).unwrap();
    assert_eq!(receipt.quote_value, Some(0));
}

#[test]
fn unavailable_feed_blocks_automatic_deposit() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");

    d.primary.fail("round not complete");
    let err = d.vault.deposit(&alice, 1_000, &d.usdc).unwrap_err();
    assert!(matches!(err, VaultError::Oracle(OracleError::Unavailable(_))));

    d.primary.set_answer(0);
    let err = d.vault.deposit(&alice, 1_000, &d.usdc).unwrap_err();
    assert!(matches!(err, VaultError::Oracle(OracleError::Unavailable(_))));
    assert_eq!(d.vault.stats(), DepositStats::default());
}

// ---------------------------------------------------------------------------
// Settlement paths
// ---------------------------------------------------------------------------

#[test]
fn manual_path_skips_feed_and_minimum() {
    let params = VaultParams { min_amount: 1_000_000, ..VaultParams::default() };
    let mut d = deploy(params, None);
    let alice = greenlisted(&d, "alice");
    d.primary.fail("offline");

    let receipt = d.vault.deposit(&alice, 50, &Address::ZERO).unwrap();
    assert_eq!(receipt.path, SettlementPath::Manual);
    assert_eq!(receipt.quote_value, None);
    assert_eq!(d.token.total_supply(), 0);
    assert_eq!(d.vault.manual_deposits().len(), 1);
}

#[test]
fn manual_token_can_be_reconfigured() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");
    let usdc = d.usdc;
    d.vault.set_manual_fulfillment_token(&d.deployer, usdc).unwrap();

    let receipt = d.vault.deposit(&alice, 1_000, &usdc).unwrap();
    assert_eq!(receipt.path, SettlementPath::Manual);
    let receipt = d.vault.deposit(&alice, 1_000, &Address::ZERO).unwrap();
    assert_eq!(receipt.path, SettlementPath::Automatic);
}

// ---------------------------------------------------------------------------
// Token interaction
// ---------------------------------------------------------------------------

#[test]
fn paused_token_rejects_deposit() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");
    d.token.pause();

    assert_eq!(d.vault.deposit(&alice, 1_000, &d.usdc).unwrap_err(), VaultError::Paused);
    d.token.unpause();
    d.vault.deposit(&alice, 1_000, &d.usdc).unwrap();
}

#[test]
fn vault_without_minter_role_cannot_mint() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");
    let vault = d.vault.address();
    d.registry
        .write()
        .revoke_role(&d.deployer, Role::Minter, vault)
        .unwrap();

    let err = d.vault.deposit(&alice, 1_000, &d.usdc).unwrap_err();
    assert!(matches!(
        err,
        VaultError::Access(AccessError::MissingRole { role: Role::Minter, .. })
    ));
    assert_eq!(d.vault.stats().deposit_count, 0);
}

// ---------------------------------------------------------------------------
// Admin
// ---------------------------------------------------------------------------

#[test]
fn feeds_are_replaceable_by_admin_only() {
    let mut d = deploy(VaultParams::default(), None);
    let alice = greenlisted(&d, "alice");
    let doubled = Arc::new(StaticAggregator::new(2 * ONE, 8));
    let feed = PriceOracleAdapter::new(Address::derive("new-feed"), doubled);

    assert!(d.vault.set_feeds(&alice, feed.clone(), None).is_err());
    d.vault.set_feeds(&d.deployer, feed, None).unwrap();

    assert_eq!(d.vault.config().primary_feed, Address::derive("new-feed"));
    assert_eq!(d.vault.quote_value(100).unwrap(), 200);
}

#[test]
fn admin_role_can_be_delegated() {
    let mut d = deploy(VaultParams::default(), None);
    let ops = Address::derive("ops");
    d.registry
        .write()
        .grant_role(&d.deployer, Role::DepositVaultAdmin, ops)
        .unwrap();

    d.vault.set_min_deposit(&ops, 42).unwrap();
    assert_eq!(d.vault.config().min_deposit_in_quote, 42);
}
