//! # Price Oracle Adapter
//!
//! Turns a raw aggregator answer into a [`PriceReading`] the vaults can do
//! arithmetic with, and does that arithmetic.
//!
//! The adapter is deliberately dumb: one aggregator call per query, no cache,
//! no retry, no staleness policy. A reading carries its `updated_at` so the
//! caller can apply whatever freshness rule it wants.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::warn;

use super::aggregator::Aggregator;
use super::OracleError;
use crate::config;
use crate::types::{Address, Amount};

/// A normalized price: `value / 10^decimals` units of quote per unit of base.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceReading {
    /// Fixed-point price, always positive.
    pub value: u128,
    /// Decimal places in `value`.
    pub decimals: u8,
    /// When the aggregator last updated this answer.
    pub updated_at: DateTime<Utc>,
}

impl PriceReading {
    /// How old the reading is at `now`. Negative if the feed is ahead of us.
    pub fn age(&self, now: DateTime<Utc>) -> Duration {
        now - self.updated_at
    }

    /// Returns `true` if the reading is older than `max_age` at `now`.
    pub fn is_stale(&self, now: DateTime<Utc>, max_age: Duration) -> bool {
        self.age(now) > max_age
    }
}

/// Wraps one aggregator, identified by its feed address.
#[derive(Clone)]
pub struct PriceOracleAdapter {
    feed: Address,
    aggregator: Arc<dyn Aggregator>,
}

impl fmt::Debug for PriceOracleAdapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PriceOracleAdapter")
            .field("feed", &self.feed)
            .field("decimals", &self.aggregator.decimals())
            .finish()
    }
}

impl PriceOracleAdapter {
    /// Creates an adapter for the aggregator published at `feed`.
    pub fn new(feed: Address, aggregator: Arc<dyn Aggregator>) -> Self {
        Self { feed, aggregator }
    }

    /// Address of the wrapped feed.
    pub fn feed(&self) -> Address {
        self.feed
    }

    /// Queries the aggregator once.
    ///
    /// # Errors
    ///
    /// [`OracleError::Unavailable`] if the aggregator errors or answers a
    /// non-positive value.
    pub fn latest_price(&self) -> Result<PriceReading, OracleError> {
        let (raw, updated_at) = self.aggregator.latest_answer().map_err(|e| {
            warn!(feed = %self.feed, error = %e, "aggregator query failed");
            OracleError::Unavailable(e.to_string())
        })?;

        if raw <= 0 {
            warn!(feed = %self.feed, answer = raw, "aggregator returned non-positive answer");
            return Err(OracleError::Unavailable(format!(
                "non-positive answer {raw} from feed {}",
                self.feed
            )));
        }

        Ok(PriceReading {
            value: raw as u128,
            decimals: self.aggregator.decimals(),
            updated_at,
        })
    }

    /// Converts `amount` of base into quote: `amount * value / 10^decimals`.
    ///
    /// The division floors. Nothing else is truncated.
    ///
    /// # Errors
    ///
    /// [`OracleError::Overflow`] if the product or the scale overflows `u128`.
    pub fn convert(amount: Amount, reading: &PriceReading) -> Result<Amount, OracleError> {
        let scale = config::price_scale(reading.decimals).ok_or(OracleError::Overflow)?;
        let product = amount
            .checked_mul(reading.value)
            .ok_or(OracleError::Overflow)?;
        Ok(product / scale)
    }
}
