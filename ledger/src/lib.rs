//! Quorum Balance & Lock Ledger
//!
//! Per-account token balances with two independent stake-lock categories
//! (election and funding). Stake reserved under one category can never be
//! re-used to back a claim in the other, and transfers refuse to move funds
//! below the currently active lock requirement.

pub mod error;
pub mod state;

pub use error::{LedgerError, Result};
pub use state::{Account, Ledger, Lock, LockCategory};

/// Ledger constants
pub mod constants {
    /// Token base unit (8 decimal places)
    pub const COIN: u64 = 100_000_000;

    /// USD-like values share the 8-decimal scale
    pub const USD: u64 = 100_000_000;

    /// Hard supply ceiling (1 billion tokens)
    pub const MAX_SUPPLY: u64 = 1_000_000_000 * COIN;

    /// How long a counted vote keeps stake reserved (14 days)
    pub const LOCK_DURATION: u64 = 14 * 86400;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ledger_constants() {
        assert_eq!(constants::COIN, 100_000_000);
        assert_eq!(constants::LOCK_DURATION, 14 * 86400);
    }
}
