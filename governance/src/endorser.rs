//! Endorser leaderboard
//!
//! A bounded set of active endorsers with challenge-based churn. Support
//! weight is independent of delegation: it accrues when an account backs a
//! candidate with its current balance and follows that account's balance
//! from then on. Eviction scans the active list linearly — the set is small
//! and fixed-size, and the scan keeps the first-encountered minimum as the
//! eviction target on ties.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::config::MAX_ENDORSERS;
use crate::error::{GovernanceError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EndorserCandidate {
    pub address: String,
    pub name: String,
    pub manifesto: String,
    pub active: bool,
    /// Aggregate balance of the accounts currently backing this candidate
    pub support: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EndorserBoard {
    candidates: HashMap<String, EndorserCandidate>,
    /// voter -> backed candidate
    votes: HashMap<String, String>,
    /// Active members, bounded by MAX_ENDORSERS
    active: Vec<String>,
}

impl EndorserBoard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn candidate(&self, address: &str) -> Option<&EndorserCandidate> {
        self.candidates.get(address)
    }

    pub fn is_registered(&self, address: &str) -> bool {
        self.candidates.contains_key(address)
    }

    pub fn is_active(&self, address: &str) -> bool {
        self.candidates
            .get(address)
            .map(|c| c.active)
            .unwrap_or(false)
    }

    pub fn active_members(&self) -> &[String] {
        &self.active
    }

    pub fn support_of(&self, address: &str) -> u64 {
        self.candidates
            .get(address)
            .map(|c| c.support)
            .unwrap_or(0)
    }

    pub fn backed_candidate(&self, voter: &str) -> Option<&str> {
        self.votes.get(voter).map(|s| s.as_str())
    }

    pub fn register(&mut self, address: &str, name: String, manifesto: String) -> Result<()> {
        if self.candidates.contains_key(address) {
            return Err(GovernanceError::AlreadyRegistered);
        }
        self.candidates.insert(
            address.to_string(),
            EndorserCandidate {
                address: address.to_string(),
                name,
                manifesto,
                active: false,
                support: 0,
            },
        );
        Ok(())
    }

    /// Back a candidate with the voter's current balance, withdrawing any
    /// support previously given to another candidate.
    pub fn vote(&mut self, voter: &str, candidate: &str, balance: u64) -> Result<()> {
        if !self.candidates.contains_key(candidate) {
            return Err(GovernanceError::CandidateNotFound);
        }
        if voter == candidate {
            return Err(GovernanceError::SelfVoting);
        }
        if let Some(previous) = self.votes.get(voter) {
            if previous == candidate {
                return Err(GovernanceError::AlreadyVoted);
            }
            if let Some(c) = self.candidates.get_mut(previous) {
                c.support = c.support.saturating_sub(balance);
            }
        }
        self.votes.insert(voter.to_string(), candidate.to_string());
        if let Some(c) = self.candidates.get_mut(candidate) {
            c.support += balance;
        }
        Ok(())
    }

    /// Claim a board seat: free capacity admits directly, otherwise the
    /// challenger must strictly out-support the weakest active member.
    pub fn challenge(&mut self, challenger: &str) -> Result<Option<String>> {
        let candidate = self
            .candidates
            .get(challenger)
            .ok_or(GovernanceError::CandidateNotFound)?;
        if candidate.active {
            return Err(GovernanceError::AlreadyActive);
        }
        let support = candidate.support;

        if self.active.len() < MAX_ENDORSERS {
            self.candidates.get_mut(challenger).unwrap().active = true;
            self.active.push(challenger.to_string());
            return Ok(None);
        }

        let mut min_index = 0;
        let mut min_support = u64::MAX;
        for (i, member) in self.active.iter().enumerate() {
            let member_support = self.support_of(member);
            if member_support < min_support {
                min_support = member_support;
                min_index = i;
            }
        }
        if support <= min_support {
            return Err(GovernanceError::NotEnoughVotes);
        }

        let evicted = std::mem::replace(&mut self.active[min_index], challenger.to_string());
        self.candidates.get_mut(&evicted).unwrap().active = false;
        self.candidates.get_mut(challenger).unwrap().active = true;
        Ok(Some(evicted))
    }

    /// Follow a backer's balance change into its candidate's support.
    pub fn on_balance_change(&mut self, account: &str, old_balance: u64, new_balance: u64) {
        if let Some(candidate) = self.votes.get(account) {
            if let Some(c) = self.candidates.get_mut(candidate) {
                c.support = c.support.saturating_sub(old_balance) + new_balance;
            }
        }
    }
}
