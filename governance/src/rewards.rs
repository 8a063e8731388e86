//! Reward payout math
//!
//! Rewards replay the vote weights frozen at cast time — never current
//! power. A vote cast via delegation splits its reward 90% to the holder
//! and 10% to the delegatee; the delegatee's own portion pays in full.

use crate::config::{DELEGATEE_CUT_PCT, DELEGATOR_SHARE_PCT, REWARD_BPS};
use crate::proposal::VoteRecord;
use quorum_ledger::constants::COIN;

/// Base reward on a frozen weight, USD.
pub fn reward_usd(weight: u64) -> u64 {
    (weight as u128 * REWARD_BPS as u128 / 10_000) as u64
}

/// USD owed to `claimant` for its own vote record.
pub fn claimant_usd(claimant: &str, record: &VoteRecord) -> u64 {
    let own = reward_usd(record.weight);
    if record.delegate != claimant {
        // Cast via delegation: the holder keeps 90% of its portion
        own * DELEGATOR_SHARE_PCT / 100
    } else {
        // Direct vote: full own portion plus 10% of what was delegated in
        own + reward_usd(record.delegated_weight) * DELEGATEE_CUT_PCT / 100
    }
}

/// Convert a USD reward to governance tokens at the current price.
pub fn usd_to_tokens(usd: u64, price: u64) -> u64 {
    (usd as u128 * COIN as u128 / price as u128) as u64
}
