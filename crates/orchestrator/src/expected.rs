//! Expected balance bookkeeping
//!
//! `ExpectedBalances` is owned by the coordinating path of a run. It is
//! seeded from pre-run balances, credited after the submit phase barrier and
//! then frozen into an `ExpectedSnapshot` that verification tasks share
//! read-only.

use bridge_probe_types::{Account, Uint256};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

use crate::OrchestratorError;

/// A (receiver, destination chain) verification target
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
pub struct PairKey {
    pub receiver: Account,
    pub chain_id: String,
}

impl PairKey {
    pub fn new(receiver: Account, chain_id: impl Into<String>) -> Self {
        Self {
            receiver,
            chain_id: chain_id.into(),
        }
    }
}

impl std::fmt::Display for PairKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "receiver {} on {}", self.receiver, self.chain_id)
    }
}

/// Mutable expected amounts, in each destination ledger's smallest unit
#[derive(Debug, Default)]
pub struct ExpectedBalances {
    amounts: BTreeMap<PairKey, Uint256>,
}

impl ExpectedBalances {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the observed pre-run balance of a pair
    pub fn seed(&mut self, key: PairKey, observed: Uint256) {
        self.amounts.insert(key, observed);
    }

    /// Add a settled-transfer amount to a seeded pair
    pub fn credit(&mut self, key: &PairKey, amount: Uint256) -> Result<(), OrchestratorError> {
        let current = self
            .amounts
            .get_mut(key)
            .ok_or_else(|| OrchestratorError::UnknownPair { pair: key.to_string() })?;

        *current = current
            .checked_add(amount)
            .map_err(|_| OrchestratorError::ExpectedOverflow { pair: key.to_string() })?;

        Ok(())
    }

    pub fn get(&self, key: &PairKey) -> Option<Uint256> {
        self.amounts.get(key).copied()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }

    /// End the write phase; no further credits are possible
    pub fn freeze(self) -> ExpectedSnapshot {
        ExpectedSnapshot {
            amounts: Arc::new(self.amounts),
        }
    }
}

/// Read-only expected amounts shared by verification tasks
#[derive(Debug, Clone)]
pub struct ExpectedSnapshot {
    amounts: Arc<BTreeMap<PairKey, Uint256>>,
}

impl ExpectedSnapshot {
    pub fn get(&self, key: &PairKey) -> Option<Uint256> {
        self.amounts.get(key).copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PairKey, &Uint256)> {
        self.amounts.iter()
    }

    pub fn len(&self) -> usize {
        self.amounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.amounts.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(receiver: &str, chain: &str) -> PairKey {
        PairKey::new(Account::new(receiver), chain)
    }

    #[test]
    fn test_seed_and_credit() {
        let mut expected = ExpectedBalances::new();
        expected.seed(key("bob", "vector"), Uint256::from(5u128));

        expected
            .credit(&key("bob", "vector"), Uint256::from(10u128))
            .unwrap();
        expected
            .credit(&key("bob", "vector"), Uint256::from(10u128))
            .unwrap();

        assert_eq!(expected.get(&key("bob", "vector")), Some(Uint256::from(25u128)));
    }

    #[test]
    fn test_credit_unknown_pair_rejected() {
        let mut expected = ExpectedBalances::new();
        let result = expected.credit(&key("bob", "nexus"), Uint256::from(1u128));
        assert!(matches!(result, Err(OrchestratorError::UnknownPair { .. })));
    }

    #[test]
    fn test_credit_overflow_rejected() {
        let mut expected = ExpectedBalances::new();
        expected.seed(key("bob", "nexus"), Uint256::MAX);

        let result = expected.credit(&key("bob", "nexus"), Uint256::from(1u128));
        assert!(matches!(result, Err(OrchestratorError::ExpectedOverflow { .. })));
        assert_eq!(expected.get(&key("bob", "nexus")), Some(Uint256::MAX));
    }

    #[test]
    fn test_freeze_keeps_amounts() {
        let mut expected = ExpectedBalances::new();
        expected.seed(key("alice", "prime"), Uint256::zero());
        expected.seed(key("bob", "prime"), Uint256::from(7u128));

        let snapshot = expected.freeze();
        let shared = snapshot.clone();

        assert_eq!(shared.len(), 2);
        assert_eq!(shared.get(&key("bob", "prime")), Some(Uint256::from(7u128)));
        let keys: Vec<_> = snapshot.iter().map(|(k, _)| k.receiver.id.clone()).collect();
        assert_eq!(keys, vec!["alice".to_string(), "bob".to_string()]);
    }

    #[test]
    fn test_pair_key_display() {
        assert_eq!(key("bob", "nexus").to_string(), "receiver bob on nexus");
    }
}
