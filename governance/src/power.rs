//! Voting-power calculation
//!
//! Pure functions over explicit inputs (balance, age, price) so the formula
//! is testable in isolation and can be replayed exactly.
//!
//! Funding votes are time-weighted: the rate climbs linearly from the base
//! to the ceiling over the maturation period, and the resulting value is
//! capped at a tenth of the request. CEO and endorser votes read the current
//! balance at the flat ceiling rate, uncapped — the asymmetry is deliberate.

use crate::config::{
    BASE_RATE_BPS, MATURATION_PERIOD, MAX_RATE_BPS, REQUEST_CAP_DIVISOR,
};
use quorum_ledger::constants::COIN;

/// Rate in basis points for a balance held `holding_secs` seconds.
pub fn rate_bps(holding_secs: u64) -> u64 {
    if holding_secs >= MATURATION_PERIOD {
        return MAX_RATE_BPS;
    }
    BASE_RATE_BPS + (MAX_RATE_BPS - BASE_RATE_BPS) * holding_secs / MATURATION_PERIOD
}

/// USD-equivalent of a token balance at the given price (both 8-decimal).
pub fn usd_value(balance: u64, price: u64) -> u64 {
    ((balance as u128 * price as u128) / COIN as u128) as u64
}

/// Time-weighted, capped weight of a single funding vote.
pub fn funding_vote_weight(
    balance: u64,
    balance_age: u64,
    now: u64,
    price: u64,
    request_amount: u64,
) -> u64 {
    let holding = now.saturating_sub(balance_age);
    let raw =
        (usd_value(balance, price) as u128 * rate_bps(holding) as u128 / 10_000) as u64;
    raw.min(request_amount / REQUEST_CAP_DIVISOR)
}

/// Flat-rate weight used for CEO and endorser votes.
pub fn role_vote_weight(balance: u64, price: u64) -> u64 {
    (usd_value(balance, price) as u128 * MAX_RATE_BPS as u128 / 10_000) as u64
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_ledger::constants::USD;

    const PRICE_ONE_USD: u64 = USD;

    #[test]
    fn test_rate_interpolation() {
        assert_eq!(rate_bps(0), BASE_RATE_BPS);
        assert_eq!(rate_bps(MATURATION_PERIOD), MAX_RATE_BPS);
        assert_eq!(rate_bps(MATURATION_PERIOD * 2), MAX_RATE_BPS);
        // Halfway through maturation the rate sits midway
        assert_eq!(
            rate_bps(MATURATION_PERIOD / 2),
            BASE_RATE_BPS + (MAX_RATE_BPS - BASE_RATE_BPS) / 2
        );
    }

    #[test]
    fn test_fresh_balance_uses_base_rate() {
        // 1000 tokens at $1, just acquired: 1000 * 0.05% = 0.5 USD
        let weight = funding_vote_weight(1000 * COIN, 5000, 5000, PRICE_ONE_USD, u64::MAX);
        assert_eq!(weight, USD / 2);
    }

    #[test]
    fn test_request_cap_wins() {
        // Same 0.5 USD raw weight, but a 1 USD request caps a vote at 0.1 USD
        let weight = funding_vote_weight(1000 * COIN, 5000, 5000, PRICE_ONE_USD, USD);
        assert_eq!(weight, USD / 10);
    }

    #[test]
    fn test_matured_balance_uses_max_rate() {
        let now = MATURATION_PERIOD + 100;
        let weight = funding_vote_weight(1000 * COIN, 100, now, PRICE_ONE_USD, u64::MAX);
        // 1000 * 0.5% = 5 USD
        assert_eq!(weight, 5 * USD);
    }

    #[test]
    fn test_role_weight_is_flat_and_uncapped() {
        assert_eq!(role_vote_weight(1000 * COIN, PRICE_ONE_USD), 5 * USD);
        assert_eq!(
            role_vote_weight(1_000_000 * COIN, PRICE_ONE_USD),
            5_000 * USD
        );
    }

    #[test]
    fn test_zero_balance_has_no_weight() {
        assert_eq!(funding_vote_weight(0, 0, 1000, PRICE_ONE_USD, USD), 0);
        assert_eq!(role_vote_weight(0, PRICE_ONE_USD), 0);
    }
}
