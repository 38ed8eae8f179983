//! # Price Oracle
//!
//! ```text
//! aggregator.rs : the external price source capability (+ a settable stand-in)
//! adapter.rs    : normalization into PriceReading and fixed-point conversion
//! ```

pub mod adapter;
pub mod aggregator;

pub use adapter::{PriceOracleAdapter, PriceReading};
pub use aggregator::{Aggregator, AggregatorError, StaticAggregator};

use thiserror::Error;

/// Errors raised while reading or applying a price.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum OracleError {
    /// The aggregator failed or returned a non-positive answer.
    #[error("oracle unavailable: {0}")]
    Unavailable(String),

    /// Fixed-point arithmetic overflowed.
    #[error("price conversion overflow")]
    Overflow,
}
