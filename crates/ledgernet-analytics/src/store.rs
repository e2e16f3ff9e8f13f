//! Record access boundary.
//!
//! The analysis layers never touch a database directly; they read
//! through [`RecordStore`], and handlers wire in whatever backs it.

use ledgernet_core::{DateRange, Goal, Institution, Transaction};
use thiserror::Error;

/// A record fetch failed in the backing store.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("store error: {0}")]
pub struct StoreError(pub String);

// ─────────────────────────────────────────────
// RecordStore
// ─────────────────────────────────────────────

/// Read access to one user's financial records.
pub trait RecordStore: Send + Sync {
    /// Every institution the user has linked.
    fn institutions(&self, user_id: &str) -> Result<Vec<Institution>, StoreError>;

    /// Every goal the user has created, active or not.
    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError>;

    /// The user's transactions, optionally restricted to a window
    /// (inclusive on both ends).
    fn transactions(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<Transaction>, StoreError>;
}

// ─────────────────────────────────────────────
// MemoryStore  (tests / local dev)
// ─────────────────────────────────────────────

/// In-memory record store used in tests and offline development.
#[derive(Debug, Default, Clone)]
pub struct MemoryStore {
    institutions: Vec<Institution>,
    goals: Vec<Goal>,
    transactions: Vec<Transaction>,
}

impl MemoryStore {
    pub fn new(
        institutions: Vec<Institution>,
        goals: Vec<Goal>,
        transactions: Vec<Transaction>,
    ) -> Self {
        Self {
            institutions,
            goals,
            transactions,
        }
    }

    pub fn push_institution(&mut self, institution: Institution) {
        self.institutions.push(institution);
    }

    pub fn push_goal(&mut self, goal: Goal) {
        self.goals.push(goal);
    }

    pub fn push_transaction(&mut self, transaction: Transaction) {
        self.transactions.push(transaction);
    }
}

impl RecordStore for MemoryStore {
    fn institutions(&self, user_id: &str) -> Result<Vec<Institution>, StoreError> {
        Ok(self
            .institutions
            .iter()
            .filter(|inst| inst.user_id == user_id)
            .cloned()
            .collect())
    }

    fn goals(&self, user_id: &str) -> Result<Vec<Goal>, StoreError> {
        Ok(self
            .goals
            .iter()
            .filter(|goal| goal.user_id == user_id)
            .cloned()
            .collect())
    }

    fn transactions(
        &self,
        user_id: &str,
        range: Option<&DateRange>,
    ) -> Result<Vec<Transaction>, StoreError> {
        Ok(self
            .transactions
            .iter()
            .filter(|txn| txn.user_id == user_id)
            .filter(|txn| range.map_or(true, |r| r.contains(txn.occurred_at)))
            .cloned()
            .collect())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use ledgernet_core::TransactionKind;

    use super::*;

    fn txn(id: &str, user: &str, occurred_at: i64) -> Transaction {
        Transaction::new(id, "inst-1", user, TransactionKind::Deposit, 100.0, occurred_at)
    }

    fn seeded() -> MemoryStore {
        let mut store = MemoryStore::default();
        store.push_institution(Institution::new("user-1", "inst-1", "Checking", 1_000.0));
        store.push_institution(Institution::new("user-2", "inst-9", "Other", 500.0));
        store.push_goal(Goal::new("user-1", "goal-1", "Trip", 2_000.0));
        store.push_transaction(txn("t1", "user-1", 100));
        store.push_transaction(txn("t2", "user-1", 200));
        store.push_transaction(txn("t3", "user-2", 150));
        store
    }

    #[test]
    fn queries_are_scoped_to_the_user() {
        let store = seeded();
        let insts = store.institutions("user-1").unwrap();
        assert_eq!(insts.len(), 1);
        assert_eq!(insts[0].institution_id, "inst-1");

        assert_eq!(store.goals("user-1").unwrap().len(), 1);
        assert!(store.goals("user-2").unwrap().is_empty());

        let txns = store.transactions("user-1", None).unwrap();
        assert_eq!(txns.len(), 2);
    }

    #[test]
    fn transaction_window_is_inclusive() {
        let store = seeded();
        let range = DateRange::new(100, 150).unwrap();
        let txns = store.transactions("user-1", Some(&range)).unwrap();
        assert_eq!(txns.len(), 1);
        assert_eq!(txns[0].transaction_id, "t1");
    }

    #[test]
    fn unknown_user_gets_empty_records() {
        let store = seeded();
        assert!(store.institutions("nobody").unwrap().is_empty());
        assert!(store.transactions("nobody", None).unwrap().is_empty());
    }
}
