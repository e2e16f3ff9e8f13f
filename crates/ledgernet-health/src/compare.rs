//! Health score comparison between two periods.

use serde::{Deserialize, Serialize};

use ledgernet_core::calc::round2;

use crate::score::{ComponentScore, HealthScore, Rating};

/// Changes smaller than this are reported as stable rather than as noise.
const STABLE_BAND: f64 = 1.0;

/// Direction of a score change across periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Improved,
    Declined,
    Stable,
}

impl Trend {
    fn from_change(change: f64) -> Self {
        if change.abs() < STABLE_BAND {
            Trend::Stable
        } else if change > 0.0 {
            Trend::Improved
        } else {
            Trend::Declined
        }
    }
}

/// One dimension across the two periods.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComponentChange {
    pub current_score: f64,
    pub previous_score: f64,
    pub change: f64,
    pub change_pct: f64,
    pub trend: Trend,
}

impl ComponentChange {
    fn between(current: &ComponentScore, previous: &ComponentScore) -> Self {
        let change = round2(current.score - previous.score);
        Self {
            current_score: current.score,
            previous_score: previous.score,
            change,
            change_pct: pct_of(change, previous.score),
            trend: Trend::from_change(change),
        }
    }
}

/// Changes for the five dimensions by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentChanges {
    pub savings_rate: ComponentChange,
    pub goal_progress: ComponentChange,
    pub spending_diversity: ComponentChange,
    pub account_utilization: ComponentChange,
    pub transaction_regularity: ComponentChange,
}

/// Overall and per-component deltas between two health scores.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PeriodComparison {
    pub current_score: f64,
    pub previous_score: f64,
    pub score_change: f64,
    pub score_change_pct: f64,
    pub overall_trend: Trend,
    pub current_rating: Rating,
    pub previous_rating: Rating,
    pub component_changes: ComponentChanges,
}

/// Compare `current` against `previous`.
///
/// `change` fields are antisymmetric: swapping the arguments negates
/// every delta. Percentage changes against a non-positive previous score
/// are reported as 0 rather than a division blowup.
pub fn compare_periods(current: &HealthScore, previous: &HealthScore) -> PeriodComparison {
    let score_change = round2(current.overall_score - previous.overall_score);

    PeriodComparison {
        current_score: round2(current.overall_score),
        previous_score: round2(previous.overall_score),
        score_change,
        score_change_pct: pct_of(score_change, previous.overall_score),
        overall_trend: Trend::from_change(score_change),
        current_rating: current.rating,
        previous_rating: previous.rating,
        component_changes: ComponentChanges {
            savings_rate: ComponentChange::between(
                &current.components.savings_rate,
                &previous.components.savings_rate,
            ),
            goal_progress: ComponentChange::between(
                &current.components.goal_progress,
                &previous.components.goal_progress,
            ),
            spending_diversity: ComponentChange::between(
                &current.components.spending_diversity,
                &previous.components.spending_diversity,
            ),
            account_utilization: ComponentChange::between(
                &current.components.account_utilization,
                &previous.components.account_utilization,
            ),
            transaction_regularity: ComponentChange::between(
                &current.components.transaction_regularity,
                &previous.components.transaction_regularity,
            ),
        },
    }
}

fn pct_of(change: f64, base: f64) -> f64 {
    if base > 0.0 {
        round2(change / base * 100.0)
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::{calculate_health_score, ScoringConfig};
    use ledgernet_core::{Transaction, TransactionKind};

    fn deposit(id: &str, amount: f64, occurred_at: i64) -> Transaction {
        Transaction::new(id, "inst1", "user1", TransactionKind::Deposit, amount, occurred_at)
    }

    fn withdrawal(id: &str, amount: f64, occurred_at: i64) -> Transaction {
        let mut txn =
            Transaction::new(id, "inst1", "user1", TransactionKind::Withdrawal, amount, occurred_at);
        txn.tags = vec!["general".to_string()];
        txn
    }

    fn scored(transactions: &[Transaction]) -> HealthScore {
        calculate_health_score(transactions, &[], &[], 30, &ScoringConfig::default()).unwrap()
    }

    #[test]
    fn improvement_is_reported_with_deltas() {
        // Saving nothing, then saving plenty.
        let previous = scored(&[deposit("d1", 100.0, 0), withdrawal("w1", 100.0, 0)]);
        let current = scored(&[deposit("d2", 100.0, 0), withdrawal("w2", 50.0, 0)]);
        let cmp = compare_periods(&current, &previous);

        assert!(cmp.score_change > 0.0);
        assert_eq!(cmp.overall_trend, Trend::Improved);
        assert_eq!(cmp.component_changes.savings_rate.trend, Trend::Improved);
        assert_eq!(
            cmp.component_changes.savings_rate.change,
            round2(
                current.components.savings_rate.score - previous.components.savings_rate.score
            )
        );
    }

    #[test]
    fn comparison_is_antisymmetric() {
        let a = scored(&[deposit("d1", 1000.0, 0), withdrawal("w1", 100.0, 86_400)]);
        let b = scored(&[deposit("d2", 1000.0, 0), withdrawal("w2", 900.0, 86_400)]);

        let forward = compare_periods(&a, &b);
        let backward = compare_periods(&b, &a);
        assert_eq!(forward.score_change, -backward.score_change);
        assert_eq!(
            forward.component_changes.savings_rate.change,
            -backward.component_changes.savings_rate.change
        );
        assert_eq!(
            forward.component_changes.transaction_regularity.change,
            -backward.component_changes.transaction_regularity.change
        );
    }

    #[test]
    fn small_changes_read_as_stable() {
        assert_eq!(Trend::from_change(0.0), Trend::Stable);
        assert_eq!(Trend::from_change(0.99), Trend::Stable);
        assert_eq!(Trend::from_change(-0.99), Trend::Stable);
        assert_eq!(Trend::from_change(1.0), Trend::Improved);
        assert_eq!(Trend::from_change(-1.0), Trend::Declined);
    }

    #[test]
    fn identical_periods_are_fully_stable() {
        let score = scored(&[deposit("d1", 500.0, 0), withdrawal("w1", 100.0, 86_400)]);
        let cmp = compare_periods(&score, &score);
        assert_eq!(cmp.score_change, 0.0);
        assert_eq!(cmp.score_change_pct, 0.0);
        assert_eq!(cmp.overall_trend, Trend::Stable);
        assert_eq!(cmp.component_changes.goal_progress.trend, Trend::Stable);
    }

    #[test]
    fn zero_previous_score_reports_zero_pct() {
        let mut previous = scored(&[deposit("d1", 100.0, 0)]);
        previous.overall_score = 0.0;
        previous.components.savings_rate.score = 0.0;
        let current = scored(&[deposit("d2", 100.0, 0)]);

        let cmp = compare_periods(&current, &previous);
        assert_eq!(cmp.score_change_pct, 0.0);
        assert!(cmp.score_change > 0.0);
    }

    #[test]
    fn trend_labels_serialize_lowercase() {
        let json = serde_json::to_value(Trend::Improved).unwrap();
        assert_eq!(json, serde_json::json!("improved"));
        let json = serde_json::to_value(Trend::Stable).unwrap();
        assert_eq!(json, serde_json::json!("stable"));
    }
}
