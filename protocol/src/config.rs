//! # Protocol Configuration & Constants
//!
//! Every magic number in Atrium lives here. Fee math, deployment defaults,
//! role constant names and price scaling all come from this module; if you
//! find a literal `10_000` somewhere else, it is a bug waiting to happen.

// ---------------------------------------------------------------------------
// Protocol Version
// ---------------------------------------------------------------------------

/// The full protocol version string.
pub const PROTOCOL_VERSION: &str = "0.1.0";

// ---------------------------------------------------------------------------
// Fee Parameters
// ---------------------------------------------------------------------------

/// Basis-point denominator. 1 bps = 0.01%, so 10_000 bps = 100%.
pub const BPS_DENOMINATOR: u128 = 10_000;

/// Highest fee a vault accepts. A 100% fee is legal (and useless), anything
/// above it would mint or pay out negative amounts.
pub const MAX_FEE_BPS: u16 = 10_000;

/// Fee configured by the reference deployment: 1%.
pub const DEFAULT_FEE_BPS: u16 = 100;

// ---------------------------------------------------------------------------
// Vault Defaults
// ---------------------------------------------------------------------------

/// Default minimum deposit / redemption value in quote currency.
///
/// Zero disables the minimum check. The reference deployment ships with this
/// value, so the permissive behavior is the documented default rather than an
/// oversight.
pub const DEFAULT_MIN_AMOUNT: u128 = 0;

/// The first id handed out by a redemption vault. Id 0 means "unassigned".
pub const FIRST_REQUEST_ID: u64 = 1;

// ---------------------------------------------------------------------------
// Price Feeds
// ---------------------------------------------------------------------------

/// Decimal precision used by the reference aggregators (Chainlink-style).
pub const DEFAULT_PRICE_DECIMALS: u8 = 8;

/// Largest `decimals` value for which `10^decimals` fits in a `u128`.
pub const MAX_PRICE_DECIMALS: u8 = 38;

// ---------------------------------------------------------------------------
// Role Names
// ---------------------------------------------------------------------------
//
// Role identifiers are BLAKE3 digests of these names. The default admin role
// is the all-zero identifier and has no name digest.

pub const DEFAULT_ADMIN_ROLE_NAME: &str = "DEFAULT_ADMIN_ROLE";
pub const BLACKLISTED_ROLE_NAME: &str = "BLACKLISTED_ROLE";
pub const GREENLISTED_ROLE_NAME: &str = "GREENLISTED_ROLE";
pub const BLACKLIST_OPERATOR_ROLE_NAME: &str = "BLACKLIST_OPERATOR_ROLE";
pub const GREENLIST_OPERATOR_ROLE_NAME: &str = "GREENLIST_OPERATOR_ROLE";
pub const MINTER_ROLE_NAME: &str = "MINTER_ROLE";
pub const BURNER_ROLE_NAME: &str = "BURNER_ROLE";
pub const DEPOSIT_VAULT_ADMIN_ROLE_NAME: &str = "DEPOSIT_VAULT_ADMIN_ROLE";
pub const REDEMPTION_VAULT_ADMIN_ROLE_NAME: &str = "REDEMPTION_VAULT_ADMIN_ROLE";

// ---------------------------------------------------------------------------
// Utility
// ---------------------------------------------------------------------------

/// Returns `10^decimals`, or `None` if it does not fit in a `u128`.
pub fn price_scale(decimals: u8) -> Option<u128> {
    10u128.checked_pow(u32::from(decimals))
}

/// Returns `true` if `fee_bps` is a valid vault fee.
pub fn is_valid_fee(fee_bps: u16) -> bool {
    fee_bps <= MAX_FEE_BPS
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_fee_is_valid() {
        assert!(is_valid_fee(DEFAULT_FEE_BPS));
        assert!(is_valid_fee(MAX_FEE_BPS));
        assert!(!is_valid_fee(MAX_FEE_BPS + 1));
    }

    #[test]
    fn test_bps_denominator_matches_max_fee() {
        assert_eq!(BPS_DENOMINATOR, u128::from(MAX_FEE_BPS));
    }

    #[test]
    fn test_price_scale_bounds() {
        assert_eq!(price_scale(0), Some(1));
        assert_eq!(price_scale(DEFAULT_PRICE_DECIMALS), Some(100_000_000));
        assert!(price_scale(MAX_PRICE_DECIMALS).is_some());
        assert!(price_scale(MAX_PRICE_DECIMALS + 1).is_none());
    }

    #[test]
    fn test_role_names_are_distinct() {
        let names = [
            DEFAULT_ADMIN_ROLE_NAME,
            BLACKLISTED_ROLE_NAME,
            GREENLISTED_ROLE_NAME,
            BLACKLIST_OPERATOR_ROLE_NAME,
            GREENLIST_OPERATOR_ROLE_NAME,
            MINTER_ROLE_NAME,
            BURNER_ROLE_NAME,
            DEPOSIT_VAULT_ADMIN_ROLE_NAME,
            REDEMPTION_VAULT_ADMIN_ROLE_NAME,
        ];
        for (i, a) in names.iter().enumerate() {
            for b in &names[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
