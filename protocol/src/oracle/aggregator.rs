//! # Aggregator Capability
//!
//! The read-only price source Atrium consumes. Real deployments put a
//! Chainlink-style aggregator behind this trait; the engine only ever asks for
//! the latest answer and its precision.

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use thiserror::Error;

use crate::config;

/// Failure reported by an aggregator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("aggregator error: {0}")]
pub struct AggregatorError(pub String);

/// A price source.
pub trait Aggregator: Send + Sync {
    /// Latest raw answer and the time it was last updated.
    fn latest_answer(&self) -> Result<(i128, DateTime<Utc>), AggregatorError>;

    /// Number of decimals in the raw answer.
    fn decimals(&self) -> u8;
}

#[derive(Debug)]
struct Answer {
    value: i128,
    updated_at: DateTime<Utc>,
    failing: Option<String>,
}

/// An aggregator whose answer is set by hand.
///
/// Used by tests and by the replay tool, where prices are part of the script
/// rather than of the outside world.
#[derive(Debug)]
pub struct StaticAggregator {
    decimals: u8,
    answer: RwLock<Answer>,
}

impl StaticAggregator {
    /// Creates an aggregator answering `value` with `decimals` precision.
    pub fn new(value: i128, decimals: u8) -> Self {
        Self {
            decimals,
            answer: RwLock::new(Answer {
                value,
                updated_at: Utc::now(),
                failing: None,
            }),
        }
    }

    /// An aggregator quoting exactly 1.0 at the default precision.
    pub fn unit() -> Self {
        let one = config::price_scale(config::DEFAULT_PRICE_DECIMALS).unwrap_or(1) as i128;
        Self::new(one, config::DEFAULT_PRICE_DECIMALS)
    }

    /// Publishes a new answer, stamped now. Clears any failure.
    pub fn set_answer(&self, value: i128) {
        self.set_answer_at(value, Utc::now());
    }

    /// Publishes a new answer with an explicit update time. Clears any failure.
    pub fn set_answer_at(&self, value: i128, updated_at: DateTime<Utc>) {
        let mut answer = self.answer.write();
        answer.value = value;
        answer.updated_at = updated_at;
        answer.failing = None;
    }

    /// Makes every subsequent query fail with `reason`.
    pub fn fail(&self, reason: impl Into<String>) {
        self.answer.write().failing = Some(reason.into());
    }
}

impl Aggregator for StaticAggregator {
    fn latest_answer(&self) -> Result<(i128, DateTime<Utc>), AggregatorError> {
        let answer = self.answer.read();
        match &answer.failing {
            Some(reason) => Err(AggregatorError(reason.clone())),
            None => Ok((answer.value, answer.updated_at)),
        }
    }

    fn decimals(&self) -> u8 {
        self.decimals
    }
}
