//! Quorum price oracle boundary
//!
//! The governance engine never talks to an exchange directly; it consumes a
//! `PriceFeed` and validates every quote for staleness before using it.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Maximum quote age the core accepts (1 hour)
pub const MAX_PRICE_AGE: u64 = 3600;

/// A USD-per-token quote, price at 8-decimal scale.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct PriceQuote {
    pub value: u64,
    pub updated_at: u64,
}

pub trait PriceFeed {
    fn latest_price(&self) -> PriceQuote;
}

#[derive(Error, Debug, PartialEq, Eq)]
pub enum OracleError {
    #[error("Price quote is stale: {age}s old, max {max}s")]
    Stale { age: u64, max: u64 },

    #[error("Price quote is non-positive")]
    InvalidPrice,
}

/// Validate a quote against the supplied current time, returning the price.
pub fn validate(quote: PriceQuote, now: u64) -> Result<u64, OracleError> {
    if quote.value == 0 {
        return Err(OracleError::InvalidPrice);
    }
    let age = now.saturating_sub(quote.updated_at);
    if age > MAX_PRICE_AGE {
        return Err(OracleError::Stale {
            age,
            max: MAX_PRICE_AGE,
        });
    }
    Ok(quote.value)
}

/// Constant-rate feed for tests and the CLI.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct FixedPriceFeed {
    pub quote: PriceQuote,
}

impl FixedPriceFeed {
    pub fn new(value: u64, updated_at: u64) -> Self {
        FixedPriceFeed {
            quote: PriceQuote { value, updated_at },
        }
    }
}

impl PriceFeed for FixedPriceFeed {
    fn latest_price(&self) -> PriceQuote {
        self.quote
    }
}
