//! Templated recommendations for low-scoring dimensions.
//!
//! One fixed suggestion per dimension whose score sits below its advice
//! threshold, ordered by dimension weight (heaviest first), with an
//! overall headline prepended for very good or very poor scores. The
//! output is deterministic for a given score.

use crate::score::{HealthScore, ScoringConfig};

const SAVINGS_ADVICE: &str = "Low savings rate: trim discretionary spending and aim to keep at \
     least 20% of deposits as savings.";
const GOAL_ADVICE: &str = "Slow goal progress: revisit targets or raise contributions, starting \
     with the highest-priority goals.";
const DIVERSITY_ADVICE: &str = "Concentrated spending: most money flows through very few \
     categories. Check whether important areas are neglected or one category is running hot.";
const UTILIZATION_ADVICE: &str = "Inactive accounts: some linked accounts see no transactions. \
     Consolidate them or give each one a purpose.";
const REGULARITY_ADVICE: &str = "Irregular transactions: cash flow is uneven across days. \
     Automatic transfers and scheduled bills make it more predictable.";

const HEADLINE_EXCELLENT: &str = "Excellent financial health. Keep up the current habits.";
const HEADLINE_GOOD: &str =
    "Good financial health. Focus on the lower-scoring areas for improvement.";
const HEADLINE_POOR: &str =
    "Your financial health needs attention. Start with one improvement area at a time.";

/// Build the recommendation list for `result` under `config`.
pub fn recommendations(result: &HealthScore, config: &ScoringConfig) -> Vec<String> {
    let components = &result.components;
    let mut dimensions = [
        (
            config.savings_rate.weight,
            components.savings_rate.score,
            config.savings_rate.advice_threshold,
            SAVINGS_ADVICE,
        ),
        (
            config.goal_progress.weight,
            components.goal_progress.score,
            config.goal_progress.advice_threshold,
            GOAL_ADVICE,
        ),
        (
            config.spending_diversity.weight,
            components.spending_diversity.score,
            config.spending_diversity.advice_threshold,
            DIVERSITY_ADVICE,
        ),
        (
            config.account_utilization.weight,
            components.account_utilization.score,
            config.account_utilization.advice_threshold,
            UTILIZATION_ADVICE,
        ),
        (
            config.transaction_regularity.weight,
            components.transaction_regularity.score,
            config.transaction_regularity.advice_threshold,
            REGULARITY_ADVICE,
        ),
    ];
    // Stable sort keeps the declared order between equal weights.
    dimensions.sort_by(|a, b| b.0.partial_cmp(&a.0).unwrap_or(std::cmp::Ordering::Equal));

    let mut out: Vec<String> = dimensions
        .iter()
        .filter(|(_, score, threshold, _)| score < threshold)
        .map(|(_, _, _, advice)| (*advice).to_string())
        .collect();

    if result.overall_score >= 90.0 {
        out.insert(0, HEADLINE_EXCELLENT.to_string());
    } else if result.overall_score >= 75.0 {
        out.insert(0, HEADLINE_GOOD.to_string());
    } else if result.overall_score < 45.0 {
        out.insert(0, HEADLINE_POOR.to_string());
    }
    out
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
