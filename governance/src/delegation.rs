//! One-hop delegation registry
//!
//! Stores only direct `delegator -> delegatee` edges — no chains, so no
//! cycle handling. The aggregate power per delegatee is maintained
//! incrementally on every balance or edge change, making power lookup O(1),
//! and a reverse index lets a delegatee's vote freeze each delegator's own
//! weight without walking the graph.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DelegationRegistry {
    /// delegator -> delegatee; self-delegation is the absence of an edge
    edges: HashMap<String, String>,
    /// Sum of delegator balances currently pointed at each delegatee
    delegated_power: HashMap<String, u64>,
    /// delegatee -> delegators, kept in sync with `edges`
    delegators_of: HashMap<String, Vec<String>>,
}

impl DelegationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// The recorded delegatee, if the account has delegated away.
    pub fn delegate_of(&self, delegator: &str) -> Option<&str> {
        self.edges.get(delegator).map(|s| s.as_str())
    }

    pub fn has_delegated_away(&self, account: &str) -> bool {
        self.edges.contains_key(account)
    }

    pub fn delegated_power_of(&self, delegatee: &str) -> u64 {
        self.delegated_power
            .get(delegatee)
            .copied()
            .unwrap_or(0)
    }

    pub fn delegators_of(&self, delegatee: &str) -> &[String] {
        self.delegators_of
            .get(delegatee)
            .map(|v| v.as_slice())
            .unwrap_or(&[])
    }

    /// Point the delegator's power at a delegatee. `balance` is the
    /// delegator's current balance, moved between aggregates. A delegatee
    /// equal to the delegator clears the edge (self-delegation).
    pub fn set_delegate(&mut self, delegator: &str, delegatee: &str, balance: u64) {
        self.clear_delegate(delegator, balance);
        if delegator != delegatee {
            self.edges
                .insert(delegator.to_string(), delegatee.to_string());
            *self
                .delegated_power
                .entry(delegatee.to_string())
                .or_default() += balance;
            self.delegators_of
                .entry(delegatee.to_string())
                .or_default()
                .push(delegator.to_string());
        }
    }

    /// Remove any outgoing edge for the delegator.
    pub fn clear_delegate(&mut self, delegator: &str, balance: u64) {
        if let Some(old) = self.edges.remove(delegator) {
            if let Some(power) = self.delegated_power.get_mut(&old) {
                *power = power.saturating_sub(balance);
            }
            if let Some(list) = self.delegators_of.get_mut(&old) {
                list.retain(|a| a != delegator);
            }
        }
    }

    /// Propagate a balance change to the current delegatee's aggregate.
    pub fn on_balance_change(&mut self, account: &str, old_balance: u64, new_balance: u64) {
        if let Some(delegatee) = self.edges.get(account) {
            let power = self
                .delegated_power
                .entry(delegatee.clone())
                .or_default();
            *power = power.saturating_sub(old_balance) + new_balance;
        }
    }
}
