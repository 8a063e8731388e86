//! Governance engine
//!
//! One explicit state struct ties the ledger, delegation registry, endorser
//! board and proposal books together. Every public operation is a single
//! atomic transition: preconditions are checked up front, against an
//! externally supplied `now`, and any failure leaves the state untouched.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use tracing::{debug, info};

use crate::config::{ENDORSER_FEE, ENDORSER_MIN_USD};
use crate::delegation::DelegationRegistry;
use crate::endorser::EndorserBoard;
use crate::error::{GovernanceError, Result};
use crate::power;
use crate::proposal::{CeoApplication, FundingRequest, VoteRecord};
use crate::rewards;
use quorum_ledger::{Ledger, LockCategory};
use quorum_oracle::{self as oracle, PriceFeed};

/// Whitelist gate consulted on proposal creation and endorser registration.
pub trait Admission {
    fn is_admitted(&self, account: &str) -> bool;
}

/// Admits everyone; useful for tests and local runs.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpenAdmission;

impl Admission for OpenAdmission {
    fn is_admitted(&self, _account: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AdmissionList {
    admitted: HashSet<String>,
}

impl AdmissionList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn admit(&mut self, account: &str) {
        self.admitted.insert(account.to_string());
    }

    pub fn revoke(&mut self, account: &str) {
        self.admitted.remove(account);
    }
}

impl Admission for AdmissionList {
    fn is_admitted(&self, account: &str) -> bool {
        self.admitted.contains(account)
    }
}

/// Payout rail credited when a funding request executes. The core only
/// mints into it and records the daily exchange allowance on the request.
pub trait VoucherLedger {
    fn mint(&mut self, account: &str, amount: u64);
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MemoryVoucherLedger {
    balances: HashMap<String, u64>,
}

impl MemoryVoucherLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn balance_of(&self, account: &str) -> u64 {
        self.balances.get(account).copied().unwrap_or(0)
    }
}

impl VoucherLedger for MemoryVoucherLedger {
    fn mint(&mut self, account: &str, amount: u64) {
        *self.balances.entry(account.to_string()).or_default() += amount;
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GovernanceState {
    ledger: Ledger,
    delegation: DelegationRegistry,
    board: EndorserBoard,
    ceo: Option<String>,
    ceo_applications: BTreeMap<u64, CeoApplication>,
    funding_requests: BTreeMap<u64, FundingRequest>,
    next_application_id: u64,
    next_request_id: u64,
}

impl Default for GovernanceState {
    fn default() -> Self {
        Self::new()
    }
}

impl GovernanceState {
    pub fn new() -> Self {
        GovernanceState {
            ledger: Ledger::new(),
            delegation: DelegationRegistry::new(),
            board: EndorserBoard::new(),
            ceo: None,
            ceo_applications: BTreeMap::new(),
            funding_requests: BTreeMap::new(),
            next_application_id: 1,
            next_request_id: 1,
        }
    }

    // ---- read-only surface ----

    pub fn ledger(&self) -> &Ledger {
        &self.ledger
    }

    pub fn delegation(&self) -> &DelegationRegistry {
        &self.delegation
    }

    pub fn board(&self) -> &EndorserBoard {
        &self.board
    }

    pub fn ceo(&self) -> Option<&str> {
        self.ceo.as_deref()
    }

    pub fn application(&self, id: u64) -> Option<&CeoApplication> {
        self.ceo_applications.get(&id)
    }

    pub fn request(&self, id: u64) -> Option<&FundingRequest> {
        self.funding_requests.get(&id)
    }

    pub fn applications(&self) -> impl Iterator<Item = &CeoApplication> {
        self.ceo_applications.values()
    }

    pub fn requests(&self) -> impl Iterator<Item = &FundingRequest> {
        self.funding_requests.values()
    }

    pub fn raised_amount(&self, id: u64) -> Result<u64> {
        Ok(self
            .funding_requests
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?
            .raised_amount())
    }

    /// Flat-rate power an account would vote with in a role election right
    /// now, including power delegated to it.
    pub fn role_voting_power(
        &self,
        account: &str,
        now: u64,
        feed: &impl PriceFeed,
    ) -> Result<u64> {
        let price = oracle::validate(feed.latest_price(), now)?;
        let combined = self.ledger.balance_of(account)
            + self.delegation.delegated_power_of(account);
        Ok(power::role_vote_weight(combined, price))
    }

    /// Preview of what claim_reward would pay, without mutating anything.
    pub fn pending_reward(
        &self,
        account: &str,
        id: u64,
        now: u64,
        feed: &impl PriceFeed,
    ) -> Result<u64> {
        let price = oracle::validate(feed.latest_price(), now)?;
        let request = self
            .funding_requests
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if !request.status.is_terminal() {
            return Err(GovernanceError::VotingStillActive);
        }
        let record = request
            .votes
            .get(account)
            .ok_or(GovernanceError::RewardNotEligible)?;
        if record.reward_claimed {
            return Err(GovernanceError::RewardAlreadyClaimed);
        }
        if !request.outcome_matches(record.support) {
            return Err(GovernanceError::RewardNotEligible);
        }
        Ok(rewards::usd_to_tokens(
            rewards::claimant_usd(account, record),
            price,
        ))
    }

    // ---- balance operations ----

    fn apply_balance_change(&mut self, account: &str, old: u64, new: u64) {
        if old == new {
            return;
        }
        self.delegation.on_balance_change(account, old, new);
        self.board.on_balance_change(account, old, new);
    }

    pub fn transfer(&mut self, from: &str, to: &str, amount: u64, now: u64) -> Result<()> {
        let old_from = self.ledger.balance_of(from);
        let old_to = self.ledger.balance_of(to);
        self.ledger.transfer(from, to, amount, now)?;
        self.apply_balance_change(from, old_from, self.ledger.balance_of(from));
        if to != from {
            self.apply_balance_change(to, old_to, self.ledger.balance_of(to));
        }
        Ok(())
    }

    pub fn mint(&mut self, to: &str, amount: u64, now: u64) -> Result<()> {
        let old = self.ledger.balance_of(to);
        self.ledger.mint(to, amount, now)?;
        self.apply_balance_change(to, old, self.ledger.balance_of(to));
        Ok(())
    }

    pub fn burn(&mut self, from: &str, amount: u64, now: u64) -> Result<()> {
        let old = self.ledger.balance_of(from);
        self.ledger.burn(from, amount, now)?;
        self.apply_balance_change(from, old, self.ledger.balance_of(from));
        Ok(())
    }

    pub fn release_expired_locks(&mut self, account: &str, now: u64) -> Result<u64> {
        Ok(self.ledger.release_expired_locks(account, now)?)
    }

    // ---- delegation ----

    fn holds_restricted_role(&self, account: &str) -> bool {
        self.ceo.as_deref() == Some(account) || self.board.is_active(account)
    }

    pub fn set_delegate(&mut self, delegator: &str, delegatee: &str, now: u64) -> Result<()> {
        if self.ledger.has_active_lock(delegator, now) {
            return Err(GovernanceError::TokensLocked);
        }
        if self.holds_restricted_role(delegator) && delegator != delegatee {
            return Err(GovernanceError::DelegationRestricted);
        }
        let balance = self.ledger.balance_of(delegator);
        self.delegation.set_delegate(delegator, delegatee, balance);
        debug!(delegator, delegatee, "delegation updated");
        Ok(())
    }

    // ---- CEO elections ----

    pub fn apply_for_ceo(
        &mut self,
        applicant: &str,
        now: u64,
        admission: &impl Admission,
    ) -> Result<u64> {
        if !admission.is_admitted(applicant) {
            return Err(GovernanceError::NotAdmitted);
        }
        let id = self.next_application_id;
        self.next_application_id += 1;
        self.ceo_applications
            .insert(id, CeoApplication::new(id, applicant.to_string(), now));
        info!(id, applicant, "CEO application submitted");
        Ok(id)
    }

    pub fn endorse_ceo_application(&mut self, endorser: &str, id: u64, now: u64) -> Result<()> {
        if !self.board.is_active(endorser) {
            return Err(GovernanceError::NotEndorser);
        }
        let application = self
            .ceo_applications
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if application.endorse(endorser, now)? {
            info!(id, "CEO application reached endorser quorum");
        }
        Ok(())
    }

    pub fn vote_on_ceo_application(
        &mut self,
        voter: &str,
        id: u64,
        support: bool,
        now: u64,
        feed: &impl PriceFeed,
    ) -> Result<()> {
        let price = oracle::validate(feed.latest_price(), now)?;
        if self.delegation.has_delegated_away(voter) {
            return Err(GovernanceError::DelegationInEffect);
        }
        let application = self
            .ceo_applications
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        application.check_vote(voter, now)?;
        let applicant = application.applicant.clone();

        let own_balance = self.ledger.balance_of(voter);
        let own_weight = power::role_vote_weight(own_balance, price);

        // A delegator whose stake is already reserved elsewhere sits out;
        // only ballots that can commit stake right now are counted.
        let mut raw_total = own_weight;
        let mut delegator_ballots: Vec<(String, u64)> = Vec::new();
        for delegator in self.delegation.delegators_of(voter) {
            if delegator == &applicant || application.voters.contains_key(delegator) {
                continue;
            }
            let weight = power::role_vote_weight(self.ledger.balance_of(delegator), price);
            if weight == 0 {
                continue;
            }
            raw_total += weight;
            if self.ledger.lockable(delegator, now) > 0 {
                delegator_ballots.push((delegator.clone(), weight));
            }
        }

        if raw_total == 0 {
            return Err(GovernanceError::NoVotingPower);
        }
        if own_balance > 0 && self.ledger.lockable(voter, now) == 0 {
            return Err(GovernanceError::TokensLocked);
        }
        let counted: u64 =
            own_weight + delegator_ballots.iter().map(|(_, w)| w).sum::<u64>();
        if counted == 0 {
            // Nothing left to count: every contributing stake is reserved
            return Err(GovernanceError::TokensLocked);
        }

        if own_balance > 0 {
            self.ledger
                .lock(voter, LockCategory::Election, own_balance, now)?;
        }
        let mut ballots = vec![(voter.to_string(), own_weight)];
        for (delegator, weight) in delegator_ballots {
            let balance = self.ledger.balance_of(&delegator);
            self.ledger
                .lock(&delegator, LockCategory::Election, balance, now)?;
            ballots.push((delegator, weight));
        }
        let application = self
            .ceo_applications
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        for (account, weight) in ballots {
            application.record_vote(&account, support, weight);
        }
        debug!(id, voter, support, "CEO vote recorded");
        Ok(())
    }

    pub fn expire_ceo_application(&mut self, id: u64, now: u64) -> Result<()> {
        self.ceo_applications
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?
            .expire(now)
    }

    pub fn finalize_ceo_application(&mut self, id: u64, now: u64) -> Result<bool> {
        let application = self
            .ceo_applications
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let passed = application.finalize(now)?;
        if passed {
            let applicant = application.applicant.clone();
            // The chief executive may not hold an outgoing delegation
            let balance = self.ledger.balance_of(&applicant);
            self.delegation.clear_delegate(&applicant, balance);
            info!(id, applicant, "new chief executive elected");
            self.ceo = Some(applicant);
        }
        Ok(passed)
    }

    // ---- funding requests ----

    #[allow(clippy::too_many_arguments)]
    pub fn submit_funding_request(
        &mut self,
        proposer: &str,
        title: String,
        description: String,
        valuation: u64,
        soft_cap: u64,
        hard_cap: u64,
        now: u64,
        admission: &impl Admission,
    ) -> Result<u64> {
        if !admission.is_admitted(proposer) {
            return Err(GovernanceError::NotAdmitted);
        }
        let id = self.next_request_id;
        let request = FundingRequest::new(
            id,
            proposer.to_string(),
            title,
            description,
            valuation,
            soft_cap,
            hard_cap,
            now,
        )?;
        self.next_request_id += 1;
        self.funding_requests.insert(id, request);
        info!(id, proposer, "funding request submitted");
        Ok(id)
    }

    pub fn endorse_funding_request(&mut self, endorser: &str, id: u64, now: u64) -> Result<()> {
        if !self.board.is_active(endorser) {
            return Err(GovernanceError::NotEndorser);
        }
        let request = self
            .funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        if request.endorse(endorser, now)? {
            info!(id, "funding request reached endorser quorum");
        }
        Ok(())
    }

    pub fn vote_on_funding_request(
        &mut self,
        voter: &str,
        id: u64,
        support: bool,
        now: u64,
        feed: &impl PriceFeed,
    ) -> Result<()> {
        let price = oracle::validate(feed.latest_price(), now)?;
        if self.delegation.has_delegated_away(voter) {
            return Err(GovernanceError::DelegationInEffect);
        }
        let request = self
            .funding_requests
            .get(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        request.check_vote(voter, now)?;
        let proposer = request.proposer.clone();
        let hard_cap = request.hard_cap;

        let own_balance = self.ledger.balance_of(voter);
        let own_weight = power::funding_vote_weight(
            own_balance,
            self.ledger.balance_age_of(voter),
            now,
            price,
            hard_cap,
        );

        // Same sit-out rule as CEO votes: a delegator whose stake is already
        // reserved elsewhere contributes no ballot.
        let mut raw_total = own_weight;
        let mut delegator_ballots: Vec<(String, u64)> = Vec::new();
        for delegator in self.delegation.delegators_of(voter) {
            if delegator == &proposer || request.votes.contains_key(delegator) {
                continue;
            }
            let weight = power::funding_vote_weight(
                self.ledger.balance_of(delegator),
                self.ledger.balance_age_of(delegator),
                now,
                price,
                hard_cap,
            );
            if weight == 0 {
                continue;
            }
            raw_total += weight;
            if self.ledger.lockable(delegator, now) > 0 {
                delegator_ballots.push((delegator.clone(), weight));
            }
        }

        if raw_total == 0 {
            return Err(GovernanceError::NoVotingPower);
        }
        if own_balance > 0 && self.ledger.lockable(voter, now) == 0 {
            return Err(GovernanceError::TokensLocked);
        }
        let delegated_total: u64 = delegator_ballots.iter().map(|(_, w)| w).sum();
        if own_weight + delegated_total == 0 {
            // Nothing left to count: every contributing stake is reserved
            return Err(GovernanceError::TokensLocked);
        }

        if own_balance > 0 {
            self.ledger
                .lock(voter, LockCategory::Funding, own_balance, now)?;
        }
        for (delegator, _) in &delegator_ballots {
            let balance = self.ledger.balance_of(delegator);
            self.ledger
                .lock(delegator, LockCategory::Funding, balance, now)?;
        }

        let request = self
            .funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        for (delegator, weight) in delegator_ballots {
            request.record_vote(
                &delegator,
                VoteRecord {
                    support,
                    weight,
                    delegated_weight: 0,
                    delegate: voter.to_string(),
                    reward_claimed: false,
                },
            );
        }
        request.record_vote(
            voter,
            VoteRecord {
                support,
                weight: own_weight,
                delegated_weight: delegated_total,
                delegate: voter.to_string(),
                reward_claimed: false,
            },
        );
        debug!(id, voter, support, own_weight, delegated_total, "funding vote recorded");
        Ok(())
    }

    pub fn expire_funding_request(&mut self, id: u64, now: u64) -> Result<()> {
        self.funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?
            .expire(now)
    }

    pub fn finalize_funding_request(&mut self, id: u64, now: u64) -> Result<()> {
        let request = self
            .funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let status = request.finalize(now)?;
        info!(id, ?status, "funding request finalized");
        Ok(())
    }

    pub fn approve_funding_request(&mut self, caller: &str, id: u64) -> Result<()> {
        if self.ceo.as_deref() != Some(caller) {
            return Err(GovernanceError::NotCeo);
        }
        self.funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?
            .approve()?;
        info!(id, caller, "funding request approved by chief executive");
        Ok(())
    }

    /// Mint the raised amount into the voucher rail and seed the request's
    /// daily exchange allowance.
    pub fn execute_funding_request(
        &mut self,
        id: u64,
        voucher: &mut impl VoucherLedger,
    ) -> Result<u64> {
        let request = self
            .funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?;
        let raised = request.execute()?;
        let proposer = request.proposer.clone();
        voucher.mint(&proposer, raised);
        info!(id, proposer, raised, "funding request executed");
        Ok(raised)
    }

    // ---- rewards ----

    pub fn claim_reward(
        &mut self,
        account: &str,
        id: u64,
        now: u64,
        feed: &impl PriceFeed,
    ) -> Result<u64> {
        let tokens = self.pending_reward(account, id, now, feed)?;
        self.mint(account, tokens, now)?;
        self.funding_requests
            .get_mut(&id)
            .ok_or(GovernanceError::ProposalNotFound(id))?
            .votes
            .get_mut(account)
            .ok_or(GovernanceError::RewardNotEligible)?
            .reward_claimed = true;
        info!(id, account, tokens, "reward claimed");
        Ok(tokens)
    }

    // ---- endorser board ----

    pub fn register_endorser(
        &mut self,
        account: &str,
        name: String,
        manifesto: String,
        now: u64,
        feed: &impl PriceFeed,
        admission: &impl Admission,
    ) -> Result<()> {
        if !admission.is_admitted(account) {
            return Err(GovernanceError::NotAdmitted);
        }
        let price = oracle::validate(feed.latest_price(), now)?;
        if self.board.is_registered(account) {
            return Err(GovernanceError::AlreadyRegistered);
        }
        let usd = power::usd_value(self.ledger.balance_of(account), price);
        if usd < ENDORSER_MIN_USD {
            return Err(GovernanceError::InsufficientStake {
                required_usd: ENDORSER_MIN_USD,
                actual_usd: usd,
            });
        }
        // One-time registration fee, burned
        self.burn(account, ENDORSER_FEE, now)?;
        self.board.register(account, name, manifesto)?;
        info!(account, "endorser candidate registered");
        Ok(())
    }

    pub fn vote_for_endorser(&mut self, voter: &str, candidate: &str) -> Result<()> {
        let balance = self.ledger.balance_of(voter);
        self.board.vote(voter, candidate, balance)?;
        debug!(voter, candidate, "endorser support moved");
        Ok(())
    }

    pub fn challenge_endorser(&mut self, challenger: &str) -> Result<Option<String>> {
        let evicted = self.board.challenge(challenger)?;
        // Active endorsers may not hold an outgoing delegation
        let balance = self.ledger.balance_of(challenger);
        self.delegation.clear_delegate(challenger, balance);
        info!(challenger, ?evicted, "endorser board challenge succeeded");
        Ok(evicted)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quorum_ledger::constants::COIN;
    use quorum_oracle::FixedPriceFeed;

    fn feed_at(now: u64) -> FixedPriceFeed {
        FixedPriceFeed::new(quorum_ledger::constants::USD, now)
    }

    #[test]
    fn test_set_delegate_blocked_while_locked() {
        let mut state = GovernanceState::new();
        state.mint("alice", 100 * COIN, 0).unwrap();
        state.mint("endorser", 100 * COIN, 0).unwrap();

        state.set_delegate("alice", "bob", 10).unwrap();
        assert_eq!(state.delegation().delegate_of("alice"), Some("bob"));

        // Reset, lock, and try again
        state.set_delegate("alice", "alice", 10).unwrap();
        state
            .ledger
            .lock("alice", LockCategory::Funding, 50 * COIN, 10)
            .unwrap();
        assert_eq!(
            state.set_delegate("alice", "bob", 20),
            Err(GovernanceError::TokensLocked)
        );
    }

    #[test]
    fn test_restricted_roles_cannot_delegate_away() {
        let mut state = GovernanceState::new();
        state.mint("ceo", 100 * COIN, 0).unwrap();
        state.ceo = Some("ceo".to_string());

        assert_eq!(
            state.set_delegate("ceo", "bob", 10),
            Err(GovernanceError::DelegationRestricted)
        );
        // Self-delegation stays allowed
        state.set_delegate("ceo", "ceo", 10).unwrap();
    }

    #[test]
    fn test_transfer_propagates_to_delegatee_power() {
        let mut state = GovernanceState::new();
        state.mint("alice", 100 * COIN, 0).unwrap();
        state.mint("carol", 50 * COIN, 0).unwrap();
        state.set_delegate("alice", "bob", 0).unwrap();
        assert_eq!(state.delegation().delegated_power_of("bob"), 100 * COIN);

        state.transfer("carol", "alice", 50 * COIN, 10).unwrap();
        assert_eq!(state.delegation().delegated_power_of("bob"), 150 * COIN);
    }

    #[test]
    fn test_admission_gates_submission() {
        let mut state = GovernanceState::new();
        let mut list = AdmissionList::new();

        let result = state.submit_funding_request(
            "alice",
            "t".into(),
            "d".into(),
            0,
            100,
            1000,
            0,
            &list,
        );
        assert_eq!(result, Err(GovernanceError::NotAdmitted));

        list.admit("alice");
        state
            .submit_funding_request("alice", "t".into(), "d".into(), 0, 100, 1000, 0, &list)
            .unwrap();
    }

    #[test]
    fn test_stale_price_rejected() {
        let mut state = GovernanceState::new();
        state.mint("alice", 100 * COIN, 0).unwrap();
        let id = state
            .submit_funding_request(
                "bob",
                "t".into(),
                "d".into(),
                0,
                100,
                1000,
                0,
                &OpenAdmission,
            )
            .unwrap();

        let stale = FixedPriceFeed::new(quorum_ledger::constants::USD, 0);
        let result = state.vote_on_funding_request(
            "alice",
            id,
            true,
            quorum_oracle::MAX_PRICE_AGE + 1,
            &stale,
        );
        assert_eq!(result, Err(GovernanceError::OracleStale));
    }

    #[test]
    fn test_voucher_ledger_credited_on_execute() {
        let mut voucher = MemoryVoucherLedger::new();
        voucher.mint("p", 5);
        assert_eq!(voucher.balance_of("p"), 5);
        assert_eq!(voucher.balance_of("unknown"), 0);
    }

    #[test]
    fn test_feed_helper_fresh() {
        let feed = feed_at(100);
        assert!(oracle::validate(feed.latest_price(), 100).is_ok());
    }
}
