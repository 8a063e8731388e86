//! Balance and lock state management

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::constants::{LOCK_DURATION, MAX_SUPPLY};
use crate::error::{LedgerError, Result};

/// Stake reservation categories. Each account carries one lock per category,
/// so election stake and funding stake never double-count against the same
/// balance.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LockCategory {
    Election,
    Funding,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Lock {
    pub unlock_time: u64,
    pub amount: u64,
}

impl Lock {
    pub fn is_active(&self, now: u64) -> bool {
        self.amount > 0 && self.unlock_time > now
    }

    fn is_expired(&self, now: u64) -> bool {
        self.amount > 0 && self.unlock_time <= now
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub address: String,
    pub balance: u64,
    /// Weighted-average acquisition timestamp of the current balance.
    /// Zero means the balance has not been non-zero since the last full spend.
    pub balance_age: u64,
    pub election_lock: Lock,
    pub funding_lock: Lock,
}

impl Account {
    pub fn new(address: &str) -> Self {
        Account {
            address: address.to_string(),
            balance: 0,
            balance_age: 0,
            election_lock: Lock::default(),
            funding_lock: Lock::default(),
        }
    }

    pub fn lock(&self, category: LockCategory) -> &Lock {
        match category {
            LockCategory::Election => &self.election_lock,
            LockCategory::Funding => &self.funding_lock,
        }
    }

    fn lock_mut(&mut self, category: LockCategory) -> &mut Lock {
        match category {
            LockCategory::Election => &mut self.election_lock,
            LockCategory::Funding => &mut self.funding_lock,
        }
    }

    /// Sum of still-active (non-expired) locks across both categories.
    pub fn active_locked(&self, now: u64) -> u64 {
        let mut total = 0;
        if self.election_lock.is_active(now) {
            total += self.election_lock.amount;
        }
        if self.funding_lock.is_active(now) {
            total += self.funding_lock.amount;
        }
        total
    }

    /// Clear expired locks, returning the amount released.
    fn purge_expired(&mut self, now: u64) -> u64 {
        let mut released = 0;
        for category in [LockCategory::Election, LockCategory::Funding] {
            let lock = self.lock_mut(category);
            if lock.is_expired(now) {
                released += lock.amount;
                *lock = Lock::default();
            }
        }
        released
    }

    /// Credit an incoming amount, recomputing the weighted balance age.
    fn credit(&mut self, amount: u64, now: u64) {
        let new_balance = self.balance + amount;
        if new_balance > 0 {
            let weighted = self.balance_age as u128 * self.balance as u128
                + now as u128 * amount as u128;
            self.balance_age = (weighted / new_balance as u128) as u64;
        }
        self.balance = new_balance;
    }

    /// Debit an outgoing amount. A balance reaching zero resets the age, so
    /// the next non-zero balance starts unaged.
    fn debit(&mut self, amount: u64) {
        self.balance -= amount;
        if self.balance == 0 {
            self.balance_age = 0;
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ledger {
    accounts: HashMap<String, Account>,
    total_supply: u64,
    /// Running aggregate of every recorded category lock. Decreases only when
    /// a lock is purged (lazily at lock time, or via release_expired_locks).
    total_locked: u64,
}

impl Ledger {
    pub fn new() -> Self {
        Ledger {
            accounts: HashMap::new(),
            total_supply: 0,
            total_locked: 0,
        }
    }

    pub fn account(&self, address: &str) -> Option<&Account> {
        self.accounts.get(address)
    }

    pub fn balance_of(&self, address: &str) -> u64 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance)
            .unwrap_or(0)
    }

    pub fn balance_age_of(&self, address: &str) -> u64 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance_age)
            .unwrap_or(0)
    }

    pub fn total_supply(&self) -> u64 {
        self.total_supply
    }

    pub fn total_locked(&self) -> u64 {
        self.total_locked
    }

    /// Total issued minus everything currently reserved under a lock.
    pub fn circulating_supply(&self) -> u64 {
        self.total_supply.saturating_sub(self.total_locked)
    }

    /// Whether either lock category is still active for the account.
    pub fn has_active_lock(&self, address: &str, now: u64) -> bool {
        self.accounts
            .get(address)
            .map(|acc| acc.active_locked(now) > 0)
            .unwrap_or(false)
    }

    /// Balance not reserved under a still-active lock. This is what a new
    /// lock request would be clamped to.
    pub fn lockable(&self, address: &str, now: u64) -> u64 {
        self.accounts
            .get(address)
            .map(|acc| acc.balance.saturating_sub(acc.active_locked(now)))
            .unwrap_or(0)
    }

    /// Mint new tokens. Minting to the empty address is a defined no-op.
    pub fn mint(&mut self, to: &str, amount: u64, now: u64) -> Result<()> {
        if to.is_empty() || amount == 0 {
            return Ok(());
        }
        let new_supply = self
            .total_supply
            .checked_add(amount)
            .ok_or(LedgerError::AmountOverflow)?;
        if new_supply > MAX_SUPPLY {
            return Err(LedgerError::MaxSupplyExceeded);
        }
        let account = self
            .accounts
            .entry(to.to_string())
            .or_insert_with(|| Account::new(to));
        account.credit(amount, now);
        self.total_supply = new_supply;
        Ok(())
    }

    /// Burn tokens. Refuses to burn into the active lock requirement.
    pub fn burn(&mut self, from: &str, amount: u64, now: u64) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let account = self
            .accounts
            .get_mut(from)
            .ok_or_else(|| LedgerError::AccountNotFound(from.to_string()))?;
        let spendable = account.balance.saturating_sub(account.active_locked(now));
        if spendable < amount {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                spendable,
            });
        }
        account.debit(amount);
        self.total_supply -= amount;
        Ok(())
    }

    /// Move tokens between accounts. The sender may not move funds below the
    /// sum of its currently-active locks; the check happens here, at transfer
    /// time, since a lock started during a vote must hold through settlement.
    pub fn transfer(&mut self, from: &str, to: &str, amount: u64, now: u64) -> Result<()> {
        if amount == 0 {
            return Err(LedgerError::ZeroAmount);
        }
        let sender = self
            .accounts
            .get_mut(from)
            .ok_or_else(|| LedgerError::AccountNotFound(from.to_string()))?;
        let spendable = sender.balance.saturating_sub(sender.active_locked(now));
        if spendable < amount {
            return Err(LedgerError::InsufficientBalance {
                requested: amount,
                spendable,
            });
        }
        sender.debit(amount);
        let recipient = self
            .accounts
            .entry(to.to_string())
            .or_insert_with(|| Account::new(to));
        recipient.credit(amount, now);
        Ok(())
    }

    /// Reserve stake against an account under a category.
    ///
    /// Expired locks of either category are purged first. The request is then
    /// clamped to the balance not covered by a still-active lock; a clamp to
    /// zero fails with `TokensLocked` so a zero-effect reservation is never
    /// silently accepted. Returns the amount actually reserved.
    pub fn lock(
        &mut self,
        address: &str,
        category: LockCategory,
        amount: u64,
        now: u64,
    ) -> Result<u64> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))?;
        let released = account.purge_expired(now);
        self.total_locked -= released;

        let available = account.balance.saturating_sub(account.active_locked(now));
        let clamped = amount.min(available);
        if clamped == 0 {
            return Err(LedgerError::TokensLocked);
        }

        let lock = account.lock_mut(category);
        lock.unlock_time = now + LOCK_DURATION;
        lock.amount += clamped;
        self.total_locked += clamped;
        Ok(clamped)
    }

    /// Clear any expired locks for an account, restoring transferability.
    /// Callable by anyone; returns the amount released.
    pub fn release_expired_locks(&mut self, address: &str, now: u64) -> Result<u64> {
        let account = self
            .accounts
            .get_mut(address)
            .ok_or_else(|| LedgerError::AccountNotFound(address.to_string()))?;
        let released = account.purge_expired(now);
        self.total_locked -= released;
        Ok(released)
    }
}

impl Default for Ledger {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::{COIN, LOCK_DURATION};

    #[test]
    fn test_mint_and_balance() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 1000 * COIN, 100).unwrap();
        assert_eq!(ledger.balance_of("alice"), 1000 * COIN);
        assert_eq!(ledger.total_supply(), 1000 * COIN);
        assert_eq!(ledger.balance_age_of("alice"), 100);
    }

    #[test]
    fn test_mint_to_empty_address_is_noop() {
        let mut ledger = Ledger::new();

        ledger.mint("", 1000, 100).unwrap();
        assert_eq!(ledger.total_supply(), 0);
    }

    #[test]
    fn test_transfer_updates_weighted_age() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 1000).unwrap();
        ledger.mint("bob", 100 * COIN, 1000).unwrap();

        // Bob receives 100 more at t=3000: age = (1000*100 + 3000*100) / 200
        ledger.transfer("alice", "bob", 100 * COIN, 3000).unwrap();
        assert_eq!(ledger.balance_age_of("bob"), 2000);
    }

    #[test]
    fn test_full_spend_resets_age() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 1000).unwrap();
        ledger.transfer("alice", "bob", 100 * COIN, 2000).unwrap();
        assert_eq!(ledger.balance_of("alice"), 0);
        assert_eq!(ledger.balance_age_of("alice"), 0);

        // The next incoming balance starts fresh from its transfer time
        ledger.transfer("bob", "alice", 50 * COIN, 5000).unwrap();
        assert_eq!(ledger.balance_age_of("alice"), 5000);
    }

    #[test]
    fn test_lock_clamps_to_available() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        let locked = ledger
            .lock("alice", LockCategory::Election, 60 * COIN, 10)
            .unwrap();
        assert_eq!(locked, 60 * COIN);

        // Funding lock can only take what the election lock left over
        let locked = ledger
            .lock("alice", LockCategory::Funding, 100 * COIN, 10)
            .unwrap();
        assert_eq!(locked, 40 * COIN);
        assert_eq!(ledger.total_locked(), 100 * COIN);
    }

    #[test]
    fn test_lock_fails_when_fully_reserved() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        ledger
            .lock("alice", LockCategory::Election, 100 * COIN, 10)
            .unwrap();

        let result = ledger.lock("alice", LockCategory::Funding, 1, 10);
        assert_eq!(result, Err(LedgerError::TokensLocked));
    }

    #[test]
    fn test_lock_purges_expired_before_reserving() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        ledger
            .lock("alice", LockCategory::Election, 100 * COIN, 10)
            .unwrap();

        // After expiry the same stake is reservable again
        let later = 10 + LOCK_DURATION;
        let locked = ledger
            .lock("alice", LockCategory::Funding, 100 * COIN, later)
            .unwrap();
        assert_eq!(locked, 100 * COIN);
        assert_eq!(ledger.total_locked(), 100 * COIN);
    }

    #[test]
    fn test_transfer_blocked_by_active_lock() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        ledger
            .lock("alice", LockCategory::Funding, 70 * COIN, 10)
            .unwrap();

        let result = ledger.transfer("alice", "bob", 50 * COIN, 20);
        assert_eq!(
            result,
            Err(LedgerError::InsufficientBalance {
                requested: 50 * COIN,
                spendable: 30 * COIN,
            })
        );

        // The unreserved remainder still moves
        ledger.transfer("alice", "bob", 30 * COIN, 20).unwrap();
    }

    #[test]
    fn test_release_expired_locks() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        ledger
            .lock("alice", LockCategory::Election, 100 * COIN, 10)
            .unwrap();
        assert_eq!(ledger.circulating_supply(), 0);

        let released = ledger
            .release_expired_locks("alice", 10 + LOCK_DURATION)
            .unwrap();
        assert_eq!(released, 100 * COIN);
        assert_eq!(ledger.total_locked(), 0);
        assert_eq!(ledger.circulating_supply(), 100 * COIN);
    }

    #[test]
    fn test_burn_respects_locks() {
        let mut ledger = Ledger::new();

        ledger.mint("alice", 100 * COIN, 0).unwrap();
        ledger
            .lock("alice", LockCategory::Election, 80 * COIN, 10)
            .unwrap();

        assert!(ledger.burn("alice", 50 * COIN, 20).is_err());
        ledger.burn("alice", 20 * COIN, 20).unwrap();
        assert_eq!(ledger.total_supply(), 80 * COIN);
    }
}
