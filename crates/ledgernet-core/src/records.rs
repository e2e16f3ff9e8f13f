//! Financial record model: institutions, transactions, goals.
//!
//! Records arrive from an external store and are consumed read-only; every
//! derived quantity (balances toward a goal, progress, signed amounts) is
//! computed on demand rather than stored.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::time::now_unix;

// ─────────────────────────────────────────────
// TransactionKind
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionKind {
    /// Money entering an institution.
    Deposit,
    /// Money leaving an institution.
    Withdrawal,
}

// ─────────────────────────────────────────────
// Institution
// ─────────────────────────────────────────────

/// A financial account held at some institution.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Institution {
    /// Owning user.
    pub user_id: String,

    /// Stable identifier within the user's records.
    pub institution_id: String,

    /// Display name.
    pub institution_name: String,

    /// Balance when the account was first linked.
    pub starting_balance: f64,

    /// Balance as of the latest sync.
    pub current_balance: f64,

    /// Unix timestamp (seconds) of creation.
    pub created_at: i64,

    /// Goal ids this institution funds.
    #[serde(default)]
    pub linked_goals: Vec<String>,
}

impl Institution {
    /// Construct with required fields; the current balance starts at the
    /// starting balance.
    pub fn new(
        user_id: impl Into<String>,
        institution_id: impl Into<String>,
        institution_name: impl Into<String>,
        starting_balance: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            institution_id: institution_id.into(),
            institution_name: institution_name.into(),
            starting_balance,
            current_balance: starting_balance,
            created_at: now_unix(),
            linked_goals: Vec::new(),
        }
    }

    /// Change from the starting balance.
    pub fn balance_change(&self) -> f64 {
        self.current_balance - self.starting_balance
    }

    /// Percentage growth since linking. 0 when the starting balance is 0.
    pub fn growth_rate(&self) -> f64 {
        if self.starting_balance == 0.0 {
            return 0.0;
        }
        self.balance_change() / self.starting_balance * 100.0
    }
}

// ─────────────────────────────────────────────
// Transaction
// ─────────────────────────────────────────────

/// A single immutable money movement.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    /// Stable identifier.
    pub transaction_id: String,

    /// Institution the money moved through.
    pub institution_id: String,

    /// Owning user.
    pub user_id: String,

    /// Deposit or withdrawal. The store encodes this as `type`.
    #[serde(rename = "type")]
    pub kind: TransactionKind,

    /// Non-negative magnitude; direction comes from `kind`.
    pub amount: f64,

    /// When the money moved (unix seconds).
    pub occurred_at: i64,

    /// When the record was written (unix seconds).
    pub created_at: i64,

    /// Ordered tags, first tag is the primary category.
    #[serde(default)]
    pub tags: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl Transaction {
    pub fn new(
        transaction_id: impl Into<String>,
        institution_id: impl Into<String>,
        user_id: impl Into<String>,
        kind: TransactionKind,
        amount: f64,
        occurred_at: i64,
    ) -> Self {
        Self {
            transaction_id: transaction_id.into(),
            institution_id: institution_id.into(),
            user_id: user_id.into(),
            kind,
            amount,
            occurred_at,
            created_at: now_unix(),
            tags: Vec::new(),
            description: None,
        }
    }

    #[inline]
    pub fn is_deposit(&self) -> bool {
        self.kind == TransactionKind::Deposit
    }

    #[inline]
    pub fn is_withdrawal(&self) -> bool {
        self.kind == TransactionKind::Withdrawal
    }

    /// Amount with direction applied: positive for deposits, negative for
    /// withdrawals.
    pub fn signed_amount(&self) -> f64 {
        if self.is_deposit() {
            self.amount
        } else {
            -self.amount
        }
    }

    /// First tag, the category the scoring layers group by.
    pub fn primary_tag(&self) -> Option<&str> {
        self.tags.first().map(String::as_str)
    }
}

// ─────────────────────────────────────────────
// Goal
// ─────────────────────────────────────────────

/// A savings target funded by percentage allocations of account balances.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Goal {
    /// Owning user.
    pub user_id: String,

    /// Stable identifier.
    pub goal_id: String,

    /// Display name.
    pub name: String,

    /// Amount the user is saving toward.
    pub target_amount: f64,

    /// Unix timestamp (seconds) of creation.
    pub created_at: i64,

    #[serde(default)]
    pub is_completed: bool,

    /// Inactive goals keep their history via `linked_transactions` but no
    /// longer hold balance allocations.
    #[serde(default = "default_active")]
    pub is_active: bool,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// institution id → allocation percent (0–100). Percentages across a
    /// goal's allocations need not sum to 100.
    #[serde(default)]
    pub linked_institutions: BTreeMap<String, f64>,

    /// Transaction ids recorded against this goal (contributions and the
    /// completion transfer).
    #[serde(default)]
    pub linked_transactions: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<i64>,
}

fn default_active() -> bool {
    true
}

impl Goal {
    pub fn new(
        user_id: impl Into<String>,
        goal_id: impl Into<String>,
        name: impl Into<String>,
        target_amount: f64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            goal_id: goal_id.into(),
            name: name.into(),
            target_amount,
            created_at: now_unix(),
            is_completed: false,
            is_active: true,
            description: None,
            linked_institutions: BTreeMap::new(),
            linked_transactions: Vec::new(),
            completed_at: None,
        }
    }

    /// Sum of allocation percentages across linked institutions.
    pub fn total_allocated_percent(&self) -> f64 {
        self.linked_institutions.values().sum()
    }

    /// Balance currently counted toward this goal: each linked institution
    /// contributes its allocation percentage of its current balance.
    /// Allocations pointing at unknown institutions contribute nothing.
    pub fn current_amount(&self, institutions: &[Institution]) -> f64 {
        self.linked_institutions
            .iter()
            .filter_map(|(inst_id, percent)| {
                institutions
                    .iter()
                    .find(|inst| &inst.institution_id == inst_id)
                    .map(|inst| inst.current_balance * percent / 100.0)
            })
            .sum()
    }

    /// Progress toward the target as a percentage, clamped to 100.
    /// 0 when the target amount is 0.
    pub fn progress_percent(&self, institutions: &[Institution]) -> f64 {
        if self.target_amount == 0.0 {
            return 0.0;
        }
        (self.current_amount(institutions) / self.target_amount * 100.0).min(100.0)
    }

    /// Amount still needed, floored at 0.
    pub fn remaining_amount(&self, institutions: &[Institution]) -> f64 {
        (self.target_amount - self.current_amount(institutions)).max(0.0)
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
