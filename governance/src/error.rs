//! Governance error types
//!
//! Errors are categorical: every failure names the precondition it violated,
//! and the operation that raised it leaves the ledger untouched.

use quorum_ledger::LedgerError;
use quorum_oracle::OracleError;
use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum GovernanceError {
    #[error("Voting on one's own proposal is forbidden")]
    SelfVoting,

    #[error("Already voted on this proposal")]
    AlreadyVoted,

    #[error("Tokens are locked")]
    TokensLocked,

    #[error("No voting power")]
    NoVotingPower,

    #[error("Voting power is delegated away")]
    DelegationInEffect,

    #[error("Proposal is not pending")]
    ProposalNotPending,

    #[error("Proposal is not active")]
    ProposalNotActive,

    #[error("Proposal did not succeed")]
    ProposalNotSucceeded,

    #[error("Voting period has ended")]
    VotingEnded,

    #[error("Voting period is still active")]
    VotingStillActive,

    #[error("Price quote is stale")]
    OracleStale,

    #[error("Price quote is invalid")]
    OraclePriceInvalid,

    #[error("Reward already claimed")]
    RewardAlreadyClaimed,

    #[error("Not eligible for a reward on this proposal")]
    RewardNotEligible,

    #[error("This role may not delegate its voting power away")]
    DelegationRestricted,

    #[error("Invalid caps: soft cap must be non-zero and not exceed the hard cap")]
    InvalidCaps,

    #[error("Support does not exceed the weakest active endorser")]
    NotEnoughVotes,

    #[error("Account is not admitted")]
    NotAdmitted,

    #[error("Caller is not the chief executive")]
    NotCeo,

    #[error("Caller is not an active endorser")]
    NotEndorser,

    #[error("Candidate is not registered")]
    CandidateNotFound,

    #[error("Already registered")]
    AlreadyRegistered,

    #[error("Endorser candidate is already active")]
    AlreadyActive,

    #[error("Already approved by the chief executive")]
    AlreadyApproved,

    #[error("Approval by the chief executive is missing")]
    ApprovalMissing,

    #[error("Proposal already executed")]
    AlreadyExecuted,

    #[error("Proposal not found: {0}")]
    ProposalNotFound(u64),

    #[error("Account not found: {0}")]
    AccountNotFound(String),

    #[error("Insufficient balance: requested {requested}, spendable {spendable}")]
    InsufficientBalance { requested: u64, spendable: u64 },

    #[error("Balance below the required stake: required {required_usd} USD, actual {actual_usd} USD")]
    InsufficientStake { required_usd: u64, actual_usd: u64 },

    #[error("Amount must be non-zero")]
    ZeroAmount,

    #[error("Amount overflow")]
    AmountOverflow,

    #[error("Max supply exceeded")]
    MaxSupplyExceeded,
}

impl From<LedgerError> for GovernanceError {
    fn from(err: LedgerError) -> Self {
        match err {
            LedgerError::AccountNotFound(addr) => GovernanceError::AccountNotFound(addr),
            LedgerError::ZeroAmount => GovernanceError::ZeroAmount,
            LedgerError::InsufficientBalance {
                requested,
                spendable,
            } => GovernanceError::InsufficientBalance {
                requested,
                spendable,
            },
            LedgerError::TokensLocked => GovernanceError::TokensLocked,
            LedgerError::AmountOverflow => GovernanceError::AmountOverflow,
            LedgerError::MaxSupplyExceeded => GovernanceError::MaxSupplyExceeded,
        }
    }
}

impl From<OracleError> for GovernanceError {
    fn from(err: OracleError) -> Self {
        match err {
            OracleError::Stale { .. } => GovernanceError::OracleStale,
            OracleError::InvalidPrice => GovernanceError::OraclePriceInvalid,
        }
    }
}

pub type Result<T> = std::result::Result<T, GovernanceError>;
