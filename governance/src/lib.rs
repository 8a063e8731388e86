//! Quorum Governance Module
//!
//! Implements the voting, lock and reward engine: CEO elections, funding
//! requests, the bounded endorser board, one-hop delegation, and the
//! proportional reward payout replayed from weights frozen at cast time.

pub mod delegation;
pub mod endorser;
pub mod engine;
pub mod error;
pub mod power;
pub mod proposal;
pub mod rewards;

pub use delegation::DelegationRegistry;
pub use endorser::{EndorserBoard, EndorserCandidate};
pub use engine::{
    Admission, AdmissionList, GovernanceState, MemoryVoucherLedger, OpenAdmission, VoucherLedger,
};
pub use error::{GovernanceError, Result};
pub use proposal::{CeoApplication, FundingRequest, ProposalStatus, VoteRecord};

/// Governance configuration constants
pub mod config {
    use quorum_ledger::constants::{COIN, USD};

    /// Window a pending proposal has to collect endorser quorum (7 days)
    pub const PENDING_PERIOD: u64 = 7 * 86400;

    /// Voting window granted when a proposal goes active (14 days)
    pub const VOTING_PERIOD: u64 = 14 * 86400;

    /// Endorser votes required to move a proposal from Pending to Active
    pub const ENDORSER_QUORUM: usize = 3;

    /// Maximum number of simultaneously active endorsers
    pub const MAX_ENDORSERS: usize = 21;

    /// Funding-vote rate floor for a freshly acquired balance (0.05%)
    pub const BASE_RATE_BPS: u64 = 5;

    /// Funding-vote rate ceiling for a fully matured balance (0.5%);
    /// also the flat rate for CEO and endorser votes
    pub const MAX_RATE_BPS: u64 = 50;

    /// Holding period at which the funding rate reaches its ceiling (12 months)
    pub const MATURATION_PERIOD: u64 = 12 * 30 * 86400;

    /// A single funding vote carries at most request / 10
    pub const REQUEST_CAP_DIVISOR: u64 = 10;

    /// Reward paid on a frozen vote weight (22%)
    pub const REWARD_BPS: u64 = 2_200;

    /// Holder share of a reward on a vote cast via delegation (90%)
    pub const DELEGATOR_SHARE_PCT: u64 = 90;

    /// Delegatee cut of each delegated reward portion (10%)
    pub const DELEGATEE_CUT_PCT: u64 = 10;

    /// Minimum USD-equivalent balance to register as an endorser candidate
    pub const ENDORSER_MIN_USD: u64 = 10_000 * USD;

    /// One-time endorser registration fee, burned
    pub const ENDORSER_FEE: u64 = 100 * COIN;

    /// Daily voucher exchange allowance seeded on execution (1% of funding)
    pub const EXCHANGE_DAILY_BPS: u64 = 100;
}
