//! Composite financial health score.
//!
//! Five independent component scores, each 0–100, combined by a weighted
//! sum. Components that cannot be computed from the given records fall
//! back to a neutral 50.0; that fallback is a policy, not an accident,
//! so callers can distinguish "no data" from "bad habits" only through
//! the inputs they pass.

use std::collections::{HashMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use ledgernet_core::calc::{self, round2};
use ledgernet_core::time::day_bucket;
use ledgernet_core::{Goal, Institution, Transaction};

use crate::recommend;

/// Component score when the records cannot support the metric.
pub const NEUTRAL_SCORE: f64 = 50.0;

// ─────────────────────────────────────────────
// Configuration
// ─────────────────────────────────────────────

/// Weight and advice threshold for one scoring dimension.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DimensionWeights {
    /// Share of the overall score, 0–1.
    pub weight: f64,
    /// Component scores below this trigger a recommendation.
    pub advice_threshold: f64,
}

impl DimensionWeights {
    fn new(weight: f64) -> Self {
        Self {
            weight,
            advice_threshold: 60.0,
        }
    }
}

/// The five-dimension weighting scheme, substitutable for tests and
/// alternate scoring policies. Weights must sum to 1.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoringConfig {
    pub savings_rate: DimensionWeights,
    pub goal_progress: DimensionWeights,
    pub spending_diversity: DimensionWeights,
    pub account_utilization: DimensionWeights,
    pub transaction_regularity: DimensionWeights,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            savings_rate: DimensionWeights::new(0.25),
            goal_progress: DimensionWeights::new(0.25),
            spending_diversity: DimensionWeights::new(0.20),
            account_utilization: DimensionWeights::new(0.15),
            transaction_regularity: DimensionWeights::new(0.15),
        }
    }
}

impl ScoringConfig {
    /// Reject weight sets that do not form a convex combination.
    pub fn validate(&self) -> Result<(), ScoringError> {
        let sum = self.savings_rate.weight
            + self.goal_progress.weight
            + self.spending_diversity.weight
            + self.account_utilization.weight
            + self.transaction_regularity.weight;
        if (sum - 1.0).abs() > 1e-9 {
            return Err(ScoringError::WeightSum { sum });
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScoringError {
    #[error("dimension weights sum to {sum}, expected 1.0")]
    WeightSum { sum: f64 },
}

// ─────────────────────────────────────────────
// Results
// ─────────────────────────────────────────────

/// Rating label for an overall score; lower bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Rating {
    Excellent,
    Good,
    Fair,
    Poor,
    #[serde(rename = "Needs Improvement")]
    NeedsImprovement,
}

impl Rating {
    pub fn from_score(score: f64) -> Self {
        if score >= 90.0 {
            Rating::Excellent
        } else if score >= 75.0 {
            Rating::Good
        } else if score >= 60.0 {
            Rating::Fair
        } else if score >= 45.0 {
            Rating::Poor
        } else {
            Rating::NeedsImprovement
        }
    }
}

impl fmt::Display for Rating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Rating::Excellent => "Excellent",
            Rating::Good => "Good",
            Rating::Fair => "Fair",
            Rating::Poor => "Poor",
            Rating::NeedsImprovement => "Needs Improvement",
        };
        f.write_str(label)
    }
}

/// One dimension's contribution to the overall score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ComponentScore {
    pub score: f64,
    pub weight: f64,
    pub contribution: f64,
}

impl ComponentScore {
    fn new(score: f64, weight: f64) -> Self {
        Self {
            score: round2(score),
            weight,
            contribution: round2(score * weight),
        }
    }
}

/// The five component scores by name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentScores {
    pub savings_rate: ComponentScore,
    pub goal_progress: ComponentScore,
    pub spending_diversity: ComponentScore,
    pub account_utilization: ComponentScore,
    pub transaction_regularity: ComponentScore,
}

/// Complete health score result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthScore {
    pub overall_score: f64,
    pub rating: Rating,
    pub components: ComponentScores,
    pub period_days: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recommendations: Option<Vec<String>>,
}

// ─────────────────────────────────────────────
// Scoring
// ─────────────────────────────────────────────

/// Score the records under `config`.
pub fn calculate_health_score(
    transactions: &[Transaction],
    institutions: &[Institution],
    goals: &[Goal],
    period_days: i64,
    config: &ScoringConfig,
) -> Result<HealthScore, ScoringError> {
    config.validate()?;

    let savings = savings_score(transactions);
    let goal = goal_score(goals, institutions);
    let diversity = diversity_score(transactions);
    let utilization = utilization_score(institutions, transactions);
    let regularity = regularity_score(transactions, period_days);

    let overall = savings * config.savings_rate.weight
        + goal * config.goal_progress.weight
        + diversity * config.spending_diversity.weight
        + utilization * config.account_utilization.weight
        + regularity * config.transaction_regularity.weight;
    let overall = round2(overall);
    let rating = Rating::from_score(overall);

    debug!(
        overall,
        rating = %rating,
        transactions = transactions.len(),
        "health score computed"
    );

    Ok(HealthScore {
        overall_score: overall,
        rating,
        components: ComponentScores {
            savings_rate: ComponentScore::new(savings, config.savings_rate.weight),
            goal_progress: ComponentScore::new(goal, config.goal_progress.weight),
            spending_diversity: ComponentScore::new(diversity, config.spending_diversity.weight),
            account_utilization: ComponentScore::new(
                utilization,
                config.account_utilization.weight,
            ),
            transaction_regularity: ComponentScore::new(
                regularity,
                config.transaction_regularity.weight,
            ),
        },
        period_days,
        recommendations: None,
    })
}

/// [`calculate_health_score`] plus, when asked, the templated
/// recommendations for low components.
pub fn analyze(
    transactions: &[Transaction],
    institutions: &[Institution],
    goals: &[Goal],
    period_days: i64,
    include_recommendations: bool,
    config: &ScoringConfig,
) -> Result<HealthScore, ScoringError> {
    let mut result = calculate_health_score(transactions, institutions, goals, period_days, config)?;
    if include_recommendations {
        result.recommendations = Some(recommend::recommendations(&result, config));
    }
    Ok(result)
}

// ─────────────────────────────────────────────
// Components
// ─────────────────────────────────────────────

/// Net savings rate, scaled so 20 % and above saturates at 100.
fn savings_score(transactions: &[Transaction]) -> f64 {
    if transactions.is_empty() {
        return NEUTRAL_SCORE;
    }
    let deposits: Vec<f64> = transactions
        .iter()
        .filter(|t| t.is_deposit())
        .map(|t| t.amount)
        .collect();
    let withdrawals: Vec<f64> = transactions
        .iter()
        .filter(|t| t.is_withdrawal())
        .map(|t| t.amount)
        .collect();

    let rate = calc::savings_rate(&deposits, &withdrawals);
    if rate <= 0.0 {
        0.0
    } else if rate >= 20.0 {
        100.0
    } else {
        rate / 20.0 * 100.0
    }
}

/// Mean clamped progress over active goals.
fn goal_score(goals: &[Goal], institutions: &[Institution]) -> f64 {
    let active: Vec<&Goal> = goals.iter().filter(|g| g.is_active).collect();
    if active.is_empty() {
        return NEUTRAL_SCORE;
    }
    let total: f64 = active
        .iter()
        .map(|g| g.progress_percent(institutions))
        .sum();
    (total / active.len() as f64).min(100.0)
}

/// Evenness of withdrawal totals across primary tags, via the Gini
/// coefficient. A single category is maximal concentration and scores 0.
fn diversity_score(transactions: &[Transaction]) -> f64 {
    let withdrawals: Vec<&Transaction> =
        transactions.iter().filter(|t| t.is_withdrawal()).collect();
    if withdrawals.is_empty() {
        return NEUTRAL_SCORE;
    }

    let mut totals: HashMap<&str, f64> = HashMap::new();
    for txn in &withdrawals {
        let tag = txn.primary_tag().unwrap_or("uncategorized");
        *totals.entry(tag).or_default() += txn.amount;
    }
    let amounts: Vec<f64> = totals.values().copied().collect();
    let total: f64 = amounts.iter().sum();
    if total == 0.0 {
        return NEUTRAL_SCORE;
    }
    if amounts.len() == 1 {
        return 0.0;
    }

    let gini = calc::gini_coefficient(&amounts);
    ((1.0 - gini) * 100.0).clamp(0.0, 100.0)
}

/// Share of institutions that saw at least one transaction in the
/// provided window. The caller's record fetch defines the window.
fn utilization_score(institutions: &[Institution], transactions: &[Transaction]) -> f64 {
    if institutions.is_empty() {
        return NEUTRAL_SCORE;
    }
    let touched: HashSet<&str> = transactions
        .iter()
        .map(|t| t.institution_id.as_str())
        .collect();
    let active = institutions
        .iter()
        .filter(|inst| touched.contains(inst.institution_id.as_str()))
        .count();
    active as f64 / institutions.len() as f64 * 100.0
}

/// Consistency of daily transaction counts: low coefficient of variation
/// scores high. Fewer than two distinct days of activity is neutral.
fn regularity_score(transactions: &[Transaction], period_days: i64) -> f64 {
    if transactions.is_empty() || period_days <= 0 {
        return NEUTRAL_SCORE;
    }
    let mut daily: HashMap<i64, f64> = HashMap::new();
    for txn in transactions {
        *daily.entry(day_bucket(txn.occurred_at)).or_default() += 1.0;
    }
    if daily.len() < 2 {
        return NEUTRAL_SCORE;
    }
    let counts: Vec<f64> = daily.values().copied().collect();
    let cv = calc::coefficient_of_variation(&counts);
    ((1.0 - cv) * 100.0).clamp(0.0, 100.0)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledgernet_core::TransactionKind;

    fn deposit(id: &str, amount: f64, occurred_at: i64) -> Transaction {
        Transaction::new(id, "inst1", "user1", TransactionKind::Deposit, amount, occurred_at)
    }

    fn withdrawal(id: &str, amount: f64, occurred_at: i64, tags: &[&str]) -> Transaction {
        let mut txn =
            Transaction::new(id, "inst1", "user1", TransactionKind::Withdrawal, amount, occurred_at);
        txn.tags = tags.iter().map(|t| t.to_string()).collect();
        txn
    }

    fn institution(id: &str, balance: f64) -> Institution {
        let mut inst = Institution::new("user1", id, id, balance);
        inst.current_balance = balance;
        inst
    }

    fn goal_at(progress_balance: f64, target: f64) -> (Vec<Goal>, Vec<Institution>) {
        let inst = institution("inst1", progress_balance);
        let mut goal = Goal::new("user1", "goal1", "Goal", target);
        goal.linked_institutions.insert("inst1".into(), 100.0);
        (vec![goal], vec![inst])
    }

    #[test]
    fn literal_example_matches_weighted_sum() {
        // Two deposits of 1000 and withdrawals of 400 and 200: a 70%
        // savings rate saturates the savings component at 100. One goal
        // at 50% progress. A single tag keeps diversity at 0.
        let transactions = vec![
            deposit("d1", 1000.0, 0),
            deposit("d2", 1000.0, 86_400 * 30),
            withdrawal("w1", 400.0, 86_400 * 10, &["rent"]),
            withdrawal("w2", 200.0, 86_400 * 40, &["rent"]),
        ];
        let (goals, institutions) = goal_at(500.0, 1000.0);

        let result = calculate_health_score(
            &transactions,
            &institutions,
            &goals,
            60,
            &ScoringConfig::default(),
        )
        .unwrap();

        assert_eq!(result.components.savings_rate.score, 100.0);
        assert_eq!(result.components.goal_progress.score, 50.0);
        assert_eq!(result.components.spending_diversity.score, 0.0);
        // All four transactions touch inst1, the only institution.
        assert_eq!(result.components.account_utilization.score, 100.0);

        let expected = round2(
            100.0 * 0.25
                + 50.0 * 0.25
                + 0.0 * 0.20
                + 100.0 * 0.15
                + result.components.transaction_regularity.score * 0.15,
        );
        assert_eq!(result.overall_score, expected);
    }

    #[test]
    fn empty_records_are_all_neutral() {
        let result =
            calculate_health_score(&[], &[], &[], 30, &ScoringConfig::default()).unwrap();
        assert_eq!(result.components.savings_rate.score, NEUTRAL_SCORE);
        assert_eq!(result.components.goal_progress.score, NEUTRAL_SCORE);
        assert_eq!(result.components.spending_diversity.score, NEUTRAL_SCORE);
        assert_eq!(result.components.account_utilization.score, NEUTRAL_SCORE);
        assert_eq!(result.components.transaction_regularity.score, NEUTRAL_SCORE);
        assert_eq!(result.overall_score, NEUTRAL_SCORE);
        assert_eq!(result.rating, Rating::Poor);
    }

    #[test]
    fn savings_scales_linearly_below_twenty_percent() {
        // 1000 in, 900 out: 10% savings rate.
        let transactions = vec![deposit("d1", 1000.0, 0), withdrawal("w1", 900.0, 0, &["a"])];
        let result =
            calculate_health_score(&transactions, &[], &[], 30, &ScoringConfig::default())
                .unwrap();
        assert_eq!(result.components.savings_rate.score, 50.0);
    }

    #[test]
    fn negative_savings_clamps_to_zero() {
        let transactions = vec![deposit("d1", 100.0, 0), withdrawal("w1", 500.0, 0, &["a"])];
        let result =
            calculate_health_score(&transactions, &[], &[], 30, &ScoringConfig::default())
                .unwrap();
        assert_eq!(result.components.savings_rate.score, 0.0);
    }

    #[test]
    fn goal_component_averages_active_goals() {
        let inst = institution("inst1", 1000.0);
        let mut done = Goal::new("user1", "g1", "Done", 1000.0);
        done.linked_institutions.insert("inst1".into(), 100.0); // 100%
        let mut half = Goal::new("user1", "g2", "Half", 2000.0);
        half.linked_institutions.insert("inst1".into(), 100.0); // 50%
        let mut inactive = Goal::new("user1", "g3", "Old", 10.0);
        inactive.is_active = false;

        let result = calculate_health_score(
            &[],
            &[inst],
            &[done, half, inactive],
            30,
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(result.components.goal_progress.score, 75.0);
    }

    #[test]
    fn diversity_rewards_even_spread() {
        let even = vec![
            withdrawal("w1", 100.0, 0, &["food"]),
            withdrawal("w2", 100.0, 0, &["rent"]),
            withdrawal("w3", 100.0, 0, &["fun"]),
            withdrawal("w4", 100.0, 0, &["travel"]),
        ];
        let result =
            calculate_health_score(&even, &[], &[], 30, &ScoringConfig::default()).unwrap();
        // Perfectly even spread leaves the sampled Gini slightly negative,
        // clamped into range.
        assert!(result.components.spending_diversity.score >= 99.0);

        let skewed = vec![
            withdrawal("w1", 970.0, 0, &["rent"]),
            withdrawal("w2", 10.0, 0, &["food"]),
            withdrawal("w3", 10.0, 0, &["fun"]),
            withdrawal("w4", 10.0, 0, &["travel"]),
        ];
        let skewed_result =
            calculate_health_score(&skewed, &[], &[], 30, &ScoringConfig::default()).unwrap();
        assert!(
            skewed_result.components.spending_diversity.score
                < result.components.spending_diversity.score
        );
    }

    #[test]
    fn untagged_withdrawals_group_as_uncategorized() {
        let transactions = vec![
            withdrawal("w1", 100.0, 0, &[]),
            withdrawal("w2", 100.0, 0, &["food"]),
        ];
        let result =
            calculate_health_score(&transactions, &[], &[], 30, &ScoringConfig::default())
                .unwrap();
        // Two equal categories, not one.
        assert!(result.components.spending_diversity.score > 50.0);
    }

    #[test]
    fn utilization_is_the_plain_percentage() {
        let institutions = vec![
            institution("inst1", 100.0),
            institution("inst2", 100.0),
            institution("inst3", 100.0),
            institution("inst4", 100.0),
        ];
        // Only inst1 sees activity: 25%.
        let transactions = vec![deposit("d1", 10.0, 0)];
        let result = calculate_health_score(
            &transactions,
            &institutions,
            &[],
            30,
            &ScoringConfig::default(),
        )
        .unwrap();
        assert_eq!(result.components.account_utilization.score, 25.0);
    }

    #[test]
    fn perfectly_regular_days_score_hundred() {
        let transactions: Vec<Transaction> = (0..5i64)
            .map(|i| deposit(&format!("d{i}"), 10.0, i * 86_400))
            .collect();
        let result =
            calculate_health_score(&transactions, &[], &[], 30, &ScoringConfig::default())
                .unwrap();
        assert_eq!(result.components.transaction_regularity.score, 100.0);
    }

    #[test]
    fn single_day_of_activity_is_neutral() {
        let transactions = vec![deposit("d1", 10.0, 100), deposit("d2", 10.0, 200)];
        let result =
            calculate_health_score(&transactions, &[], &[], 30, &ScoringConfig::default())
                .unwrap();
        assert_eq!(result.components.transaction_regularity.score, NEUTRAL_SCORE);
    }

    #[test]
    fn rating_boundaries_are_inclusive() {
        assert_eq!(Rating::from_score(90.0), Rating::Excellent);
        assert_eq!(Rating::from_score(89.99), Rating::Good);
        assert_eq!(Rating::from_score(75.0), Rating::Good);
        assert_eq!(Rating::from_score(60.0), Rating::Fair);
        assert_eq!(Rating::from_score(45.0), Rating::Poor);
        assert_eq!(Rating::from_score(44.99), Rating::NeedsImprovement);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut config = ScoringConfig::default();
        config.savings_rate.weight = 0.5;
        let err = calculate_health_score(&[], &[], &[], 30, &config).unwrap_err();
        assert!(matches!(err, ScoringError::WeightSum { .. }));
    }

    #[test]
    fn analyze_attaches_recommendations_on_request() {
        let without = analyze(&[], &[], &[], 30, false, &ScoringConfig::default()).unwrap();
        assert!(without.recommendations.is_none());

        let with = analyze(&[], &[], &[], 30, true, &ScoringConfig::default()).unwrap();
        let recs = with.recommendations.expect("recommendations requested");
        // Every neutral component sits below the 60.0 advice threshold.
        assert_eq!(recs.len(), 5);
    }
}
