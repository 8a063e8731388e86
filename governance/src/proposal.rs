//! Proposal state machines
//!
//! CEO applications and funding requests share one forward-only status
//! progression: Pending -> Active -> {Succeeded | Defeated}, with funding
//! requests additionally reaching Executed after approval by the elected
//! chief executive. Terminal states never transition again, and deadlines
//! only ever move forward.

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::config::{
    ENDORSER_QUORUM, EXCHANGE_DAILY_BPS, PENDING_PERIOD, VOTING_PERIOD,
};
use crate::error::{GovernanceError, Result};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum ProposalStatus {
    Pending,
    Active,
    Succeeded,
    Defeated,
    Executed,
}

impl ProposalStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            ProposalStatus::Succeeded | ProposalStatus::Defeated | ProposalStatus::Executed
        )
    }
}

/// Per-voter record on a funding request, frozen at cast time and replayed
/// for the reward payout instead of re-reading current power.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoteRecord {
    pub support: bool,
    /// The account's own weight at cast time
    pub weight: u64,
    /// Sum of delegators' frozen weights, non-zero only on the caster's record
    pub delegated_weight: u64,
    /// Delegatee at cast time; equals the account itself for a direct vote
    pub delegate: String,
    pub reward_claimed: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CeoApplication {
    pub id: u64,
    pub applicant: String,
    pub endorsements: HashSet<String>,
    pub votes_for: u64,
    pub votes_against: u64,
    /// voter -> support direction, kept for vote idempotence
    pub voters: HashMap<String, bool>,
    pub deadline: u64,
    pub status: ProposalStatus,
}

impl CeoApplication {
    pub fn new(id: u64, applicant: String, now: u64) -> Self {
        CeoApplication {
            id,
            applicant,
            endorsements: HashSet::new(),
            votes_for: 0,
            votes_against: 0,
            voters: HashMap::new(),
            deadline: now + PENDING_PERIOD,
            status: ProposalStatus::Pending,
        }
    }

    /// Record an endorser vote; returns true when quorum is reached and the
    /// application goes active with a fresh voting window.
    pub fn endorse(&mut self, endorser: &str, now: u64) -> Result<bool> {
        if self.status != ProposalStatus::Pending {
            return Err(GovernanceError::ProposalNotPending);
        }
        if now > self.deadline {
            return Err(GovernanceError::VotingEnded);
        }
        if endorser == self.applicant {
            return Err(GovernanceError::SelfVoting);
        }
        if !self.endorsements.insert(endorser.to_string()) {
            return Err(GovernanceError::AlreadyVoted);
        }
        if self.endorsements.len() >= ENDORSER_QUORUM {
            self.status = ProposalStatus::Active;
            self.deadline = now + VOTING_PERIOD;
            return Ok(true);
        }
        Ok(false)
    }

    /// Validate a user vote without recording it.
    pub fn check_vote(&self, voter: &str, now: u64) -> Result<()> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive);
        }
        if now > self.deadline {
            return Err(GovernanceError::VotingEnded);
        }
        if voter == self.applicant {
            return Err(GovernanceError::SelfVoting);
        }
        if self.voters.contains_key(voter) {
            return Err(GovernanceError::AlreadyVoted);
        }
        Ok(())
    }

    pub fn record_vote(&mut self, voter: &str, support: bool, weight: u64) {
        self.voters.insert(voter.to_string(), support);
        if support {
            self.votes_for += weight;
        } else {
            self.votes_against += weight;
        }
    }

    /// Pending application whose deadline passed without quorum. Callable by
    /// anyone.
    pub fn expire(&mut self, now: u64) -> Result<()> {
        if self.status != ProposalStatus::Pending {
            return Err(GovernanceError::ProposalNotPending);
        }
        if now <= self.deadline {
            return Err(GovernanceError::VotingStillActive);
        }
        self.status = ProposalStatus::Defeated;
        Ok(())
    }

    /// Settle an active application after its deadline. Strictly more weight
    /// for than against is required to pass. Returns whether it passed.
    pub fn finalize(&mut self, now: u64) -> Result<bool> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive);
        }
        if now <= self.deadline {
            return Err(GovernanceError::VotingStillActive);
        }
        let passed = self.votes_for > self.votes_against;
        self.status = if passed {
            ProposalStatus::Succeeded
        } else {
            ProposalStatus::Defeated
        };
        Ok(passed)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FundingRequest {
    pub id: u64,
    pub proposer: String,
    pub title: String,
    pub description: String,
    /// Project valuation, USD
    pub valuation: u64,
    /// Minimum the request must raise, USD
    pub soft_cap: u64,
    /// Maximum the request may raise, USD
    pub hard_cap: u64,
    pub endorsements: HashSet<String>,
    pub weight_for: u64,
    pub weight_against: u64,
    pub votes: HashMap<String, VoteRecord>,
    pub deadline: u64,
    pub status: ProposalStatus,
    pub ceo_approved: bool,
    /// Voucher tokens minted on execution
    pub funded_amount: u64,
    /// Per-day voucher-to-token exchange allowance seeded on execution
    pub daily_exchange_allowance: u64,
}

impl FundingRequest {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: u64,
        proposer: String,
        title: String,
        description: String,
        valuation: u64,
        soft_cap: u64,
        hard_cap: u64,
        now: u64,
    ) -> Result<Self> {
        if soft_cap == 0 || hard_cap == 0 || soft_cap > hard_cap {
            return Err(GovernanceError::InvalidCaps);
        }
        Ok(FundingRequest {
            id,
            proposer,
            title,
            description,
            valuation,
            soft_cap,
            hard_cap,
            endorsements: HashSet::new(),
            weight_for: 0,
            weight_against: 0,
            votes: HashMap::new(),
            deadline: now + PENDING_PERIOD,
            status: ProposalStatus::Pending,
            ceo_approved: false,
            funded_amount: 0,
            daily_exchange_allowance: 0,
        })
    }

    pub fn endorse(&mut self, endorser: &str, now: u64) -> Result<bool> {
        if self.status != ProposalStatus::Pending {
            return Err(GovernanceError::ProposalNotPending);
        }
        if now > self.deadline {
            return Err(GovernanceError::VotingEnded);
        }
        if endorser == self.proposer {
            return Err(GovernanceError::SelfVoting);
        }
        if !self.endorsements.insert(endorser.to_string()) {
            return Err(GovernanceError::AlreadyVoted);
        }
        if self.endorsements.len() >= ENDORSER_QUORUM {
            self.status = ProposalStatus::Active;
            self.deadline = now + VOTING_PERIOD;
            return Ok(true);
        }
        Ok(false)
    }

    pub fn check_vote(&self, voter: &str, now: u64) -> Result<()> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive);
        }
        if now > self.deadline {
            return Err(GovernanceError::VotingEnded);
        }
        if voter == self.proposer {
            return Err(GovernanceError::SelfVoting);
        }
        if self.votes.contains_key(voter) {
            return Err(GovernanceError::AlreadyVoted);
        }
        Ok(())
    }

    /// Record one ballot. Only `record.weight` counts toward the totals:
    /// each delegator carries its own record, and the caster's
    /// `delegated_weight` exists solely for the reward split.
    pub fn record_vote(&mut self, account: &str, record: VoteRecord) {
        if record.support {
            self.weight_for += record.weight;
        } else {
            self.weight_against += record.weight;
        }
        self.votes.insert(account.to_string(), record);
    }

    /// Derived raised amount: the for-weight clamped to the hard cap, zero
    /// unless for strictly exceeds against.
    pub fn raised_amount(&self) -> u64 {
        if self.weight_for > self.weight_against {
            self.weight_for.min(self.hard_cap)
        } else {
            0
        }
    }

    pub fn expire(&mut self, now: u64) -> Result<()> {
        if self.status != ProposalStatus::Pending {
            return Err(GovernanceError::ProposalNotPending);
        }
        if now <= self.deadline {
            return Err(GovernanceError::VotingStillActive);
        }
        self.status = ProposalStatus::Defeated;
        Ok(())
    }

    /// Settle after the voting deadline: passing requires strictly more
    /// weight for than against and a raise meeting the soft cap.
    pub fn finalize(&mut self, now: u64) -> Result<ProposalStatus> {
        if self.status != ProposalStatus::Active {
            return Err(GovernanceError::ProposalNotActive);
        }
        if now <= self.deadline {
            return Err(GovernanceError::VotingStillActive);
        }
        let raised = self.raised_amount();
        self.status = if raised >= self.soft_cap {
            ProposalStatus::Succeeded
        } else {
            ProposalStatus::Defeated
        };
        Ok(self.status)
    }

    /// Approval flag set by the elected chief executive after success.
    pub fn approve(&mut self) -> Result<()> {
        match self.status {
            ProposalStatus::Executed => Err(GovernanceError::AlreadyExecuted),
            ProposalStatus::Succeeded if self.ceo_approved => {
                Err(GovernanceError::AlreadyApproved)
            }
            ProposalStatus::Succeeded => {
                self.ceo_approved = true;
                Ok(())
            }
            _ => Err(GovernanceError::ProposalNotSucceeded),
        }
    }

    /// Final execution step: fixes the funded amount and the daily exchange
    /// allowance. The voucher mint itself happens in the engine.
    pub fn execute(&mut self) -> Result<u64> {
        match self.status {
            ProposalStatus::Executed => return Err(GovernanceError::AlreadyExecuted),
            ProposalStatus::Succeeded => {}
            _ => return Err(GovernanceError::ProposalNotSucceeded),
        }
        if !self.ceo_approved {
            return Err(GovernanceError::ApprovalMissing);
        }
        let raised = self.raised_amount();
        self.funded_amount = raised;
        self.daily_exchange_allowance =
            (raised as u128 * EXCHANGE_DAILY_BPS as u128 / 10_000) as u64;
        self.status = ProposalStatus::Executed;
        Ok(raised)
    }

    /// Whether a recorded direction matches the final outcome: for-voters
    /// are rewarded on success, against-voters on defeat.
    pub fn outcome_matches(&self, support: bool) -> bool {
        match self.status {
            ProposalStatus::Succeeded | ProposalStatus::Executed => support,
            ProposalStatus::Defeated => !support,
            _ => false,
        }
    }
}
