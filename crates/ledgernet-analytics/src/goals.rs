//! Goal progress analysis: projections, risk scoring and priorities.
//!
//! - [`analyze_goals`] — per-goal details plus at-risk, near-completion
//!   and priority insights
//! - [`compare_goals`] — two goals side by side
//! - [`reallocation_strategy`] — balance-proportional allocation plan
//!   for one goal
//!
//! Growth is linear from creation: a goal that gathered its current
//! amount in N days is assumed to keep that daily rate.

use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgernet_core::calc::round2;
use ledgernet_core::time::{days_between, SECONDS_PER_DAY};
use ledgernet_core::{Goal, Institution};

use crate::error::AnalyticsError;

/// Months assumed for the required contribution when a goal shows no
/// growth yet.
const DEFAULT_MONTHS_TO_TARGET: f64 = 6.0;

/// Risk score at which a goal lands in the at-risk list.
const AT_RISK_CUTOFF: u32 = 2;

/// Progress from which a goal counts as nearly complete.
const NEAR_COMPLETION_PERCENT: f64 = 90.0;

// ─────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────

/// One allocation row of a goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalAllocation {
    pub institution_id: String,
    pub institution_name: String,
    pub allocation_percent: f64,
    /// The institution's current balance times the allocation percent.
    pub allocated_amount: f64,
}

/// One goal's full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalDetail {
    pub goal_id: String,
    pub name: String,
    pub target_amount: f64,
    pub current_amount: f64,
    pub remaining_amount: f64,
    pub progress_percent: f64,
    pub is_active: bool,
    pub is_completed: bool,
    pub days_since_creation: i64,
    /// Days the goal took (completed) or is projected to take (active
    /// and growing). `None` when there is nothing to project from.
    pub days_to_completion: Option<i64>,
    /// Projected completion timestamp for active, growing goals.
    pub estimated_completion: Option<i64>,
    /// Monthly amount needed to reach the target on the projected
    /// timeline; 0 once nothing remains.
    pub required_monthly_contribution: f64,
    pub total_allocation_percent: f64,
    pub allocations: Vec<GoalAllocation>,
}

/// Why a goal counts as at risk.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RiskReason {
    /// Under 25% progress after the first month.
    SlowProgress,
    /// No completion estimate because nothing has accumulated.
    NoGrowth,
    /// Linked allocations sum to less than half the balances counted.
    UnderAllocated,
}

/// A goal unlikely to complete on its current trajectory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AtRiskGoal {
    pub goal_id: String,
    pub name: String,
    pub progress_percent: f64,
    pub risk_score: u32,
    pub reasons: Vec<RiskReason>,
    pub recommendation: String,
}

/// A goal ranked by where attention pays off most.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalPriority {
    pub goal_id: String,
    pub name: String,
    pub priority_score: u32,
    pub progress_percent: f64,
    pub remaining_amount: f64,
    pub estimated_completion: Option<i64>,
}

/// Derived lists over the goal details.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalInsights {
    /// Highest risk first.
    pub at_risk: Vec<AtRiskGoal>,
    pub near_completion: Vec<GoalDetail>,
    /// Highest priority first.
    pub priorities: Vec<GoalPriority>,
}

/// Totals over every goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalSummary {
    pub total_goals: usize,
    pub active_goals: usize,
    pub completed_goals: usize,
    pub total_target_amount: f64,
    pub total_current_amount: f64,
    pub overall_progress: f64,
}

/// Full goal analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalReport {
    pub summary: GoalSummary,
    pub goals: Vec<GoalDetail>,
    pub insights: GoalInsights,
}

/// Two goals side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalComparison {
    pub progress_difference: f64,
    pub target_difference: f64,
    /// Name of the goal projected to finish first; a goal with an
    /// estimate beats one without.
    pub faster_completion: String,
    pub first: GoalDetail,
    pub second: GoalDetail,
}

/// One institution's row in a reallocation plan.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AllocationChange {
    pub institution_id: String,
    pub institution_name: String,
    pub current_balance: f64,
    pub current_allocation: f64,
    /// Whole-percent share proportional to the institution's balance.
    pub recommended_allocation: f64,
    pub change: f64,
}

/// Balance-proportional allocation recommendations for one goal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReallocationPlan {
    pub goal_id: String,
    pub goal_name: String,
    pub current_progress: f64,
    pub current_total_allocation: f64,
    /// Empty when no institution holds a balance.
    pub recommendations: Vec<AllocationChange>,
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Analyze every goal against the institutions backing it. `now` pins
/// the ages and projections. Fails with `InsufficientData` when there
/// are no goals.
pub fn analyze_goals(
    goals: &[Goal],
    institutions: &[Institution],
    now: i64,
) -> Result<GoalReport, AnalyticsError> {
    if goals.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no goals to analyze".into(),
        ));
    }

    let details: Vec<GoalDetail> = goals
        .iter()
        .map(|goal| goal_detail(goal, institutions, now))
        .collect();

    let total_target: f64 = goals.iter().map(|g| g.target_amount).sum();
    let total_current: f64 = details.iter().map(|d| d.current_amount).sum();
    let overall_progress = if total_target > 0.0 {
        total_current / total_target * 100.0
    } else {
        0.0
    };

    let insights = GoalInsights {
        at_risk: at_risk_goals(&details),
        near_completion: details
            .iter()
            .filter(|d| d.progress_percent >= NEAR_COMPLETION_PERCENT && !d.is_completed)
            .cloned()
            .collect(),
        priorities: goal_priorities(&details),
    };

    let report = GoalReport {
        summary: GoalSummary {
            total_goals: goals.len(),
            active_goals: goals.iter().filter(|g| g.is_active).count(),
            completed_goals: goals.iter().filter(|g| g.is_completed).count(),
            total_target_amount: round2(total_target),
            total_current_amount: round2(total_current),
            overall_progress: round2(overall_progress),
        },
        goals: details,
        insights,
    };
    debug!(goals = report.summary.total_goals, "goals analyzed");
    Ok(report)
}

fn goal_detail(goal: &Goal, institutions: &[Institution], now: i64) -> GoalDetail {
    // Inactive goals no longer hold allocations; they report as settled
    // rather than charting at 0%.
    let (current, progress, remaining) = if goal.is_active {
        (
            goal.current_amount(institutions),
            goal.progress_percent(institutions),
            goal.remaining_amount(institutions),
        )
    } else {
        (goal.target_amount, 100.0, 0.0)
    };

    let days_since_creation = days_between(goal.created_at, now);
    let daily_growth = if days_since_creation > 0 && current > 0.0 {
        current / days_since_creation as f64
    } else {
        0.0
    };

    let (days_to_completion, estimated_completion) = if goal.is_completed {
        (
            goal.completed_at
                .map(|at| days_between(goal.created_at, at)),
            None,
        )
    } else if daily_growth > 0.0 {
        let days_remaining = (remaining / daily_growth).ceil() as i64;
        (
            (remaining > 0.0).then_some(days_remaining),
            Some(now + days_remaining * SECONDS_PER_DAY),
        )
    } else {
        (None, None)
    };

    let required_monthly = if !goal.is_completed && remaining > 0.0 {
        let months_to_target = if daily_growth > 0.0 {
            (remaining / daily_growth / 30.0).max(1.0)
        } else {
            DEFAULT_MONTHS_TO_TARGET
        };
        remaining / months_to_target
    } else {
        0.0
    };

    let allocations: Vec<GoalAllocation> = goal
        .linked_institutions
        .iter()
        .filter_map(|(inst_id, percent)| {
            institutions
                .iter()
                .find(|inst| &inst.institution_id == inst_id)
                .map(|inst| GoalAllocation {
                    institution_id: inst_id.clone(),
                    institution_name: inst.institution_name.clone(),
                    allocation_percent: *percent,
                    allocated_amount: round2(inst.current_balance * percent / 100.0),
                })
        })
        .collect();

    GoalDetail {
        goal_id: goal.goal_id.clone(),
        name: goal.name.clone(),
        target_amount: round2(goal.target_amount),
        current_amount: round2(current),
        remaining_amount: round2(remaining),
        progress_percent: round2(progress),
        is_active: goal.is_active,
        is_completed: goal.is_completed,
        days_since_creation,
        days_to_completion,
        estimated_completion,
        required_monthly_contribution: round2(required_monthly),
        total_allocation_percent: round2(goal.total_allocated_percent()),
        allocations,
    }
}

fn at_risk_goals(details: &[GoalDetail]) -> Vec<AtRiskGoal> {
    let mut at_risk: Vec<AtRiskGoal> = details
        .iter()
        .filter(|d| d.is_active && !d.is_completed)
        .filter_map(|d| {
            let mut score = 0;
            let mut reasons = Vec::new();
            if d.days_since_creation > 30 && d.progress_percent < 25.0 {
                score += 3;
                reasons.push(RiskReason::SlowProgress);
            }
            if d.estimated_completion.is_none() {
                score += 2;
                reasons.push(RiskReason::NoGrowth);
            }
            if d.total_allocation_percent < 50.0 {
                score += 1;
                reasons.push(RiskReason::UnderAllocated);
            }
            (score >= AT_RISK_CUTOFF).then(|| AtRiskGoal {
                goal_id: d.goal_id.clone(),
                name: d.name.clone(),
                progress_percent: d.progress_percent,
                risk_score: score,
                recommendation: risk_recommendation(&reasons),
                reasons,
            })
        })
        .collect();
    at_risk.sort_by(|a, b| b.risk_score.cmp(&a.risk_score));
    at_risk
}

fn risk_recommendation(reasons: &[RiskReason]) -> String {
    let advice = if reasons.contains(&RiskReason::NoGrowth) {
        "Increase allocation percentages to this goal"
    } else if reasons.contains(&RiskReason::UnderAllocated) {
        "Link more institutions or increase allocation percentages"
    } else if reasons.contains(&RiskReason::SlowProgress) {
        "Consider increasing monthly contributions"
    } else {
        "Review goal target and timeline"
    };
    advice.to_owned()
}

fn goal_priorities(details: &[GoalDetail]) -> Vec<GoalPriority> {
    let mut priorities: Vec<GoalPriority> = details
        .iter()
        .filter(|d| d.is_active && !d.is_completed)
        .map(|d| {
            // Near-complete goals first: closing one out beats nudging
            // several along
            let mut score: u32 = match d.progress_percent {
                p if (80.0..95.0).contains(&p) => 10,
                p if (60.0..80.0).contains(&p) => 7,
                p if (40.0..60.0).contains(&p) => 5,
                _ => 0,
            };
            score += (d.days_since_creation / 30).min(5) as u32;
            if d.required_monthly_contribution > 0.0 {
                score += match d.required_monthly_contribution {
                    c if c < 100.0 => 3,
                    c if c < 500.0 => 2,
                    c if c < 1_000.0 => 1,
                    _ => 0,
                };
            }
            GoalPriority {
                goal_id: d.goal_id.clone(),
                name: d.name.clone(),
                priority_score: score,
                progress_percent: d.progress_percent,
                remaining_amount: d.remaining_amount,
                estimated_completion: d.estimated_completion,
            }
        })
        .collect();
    priorities.sort_by(|a, b| b.priority_score.cmp(&a.priority_score));
    priorities
}

// ─────────────────────────────────────────────
// Comparison and reallocation
// ─────────────────────────────────────────────

/// Two goals side by side. Fails with `NotFound` when either id is
/// missing.
pub fn compare_goals(
    goals: &[Goal],
    institutions: &[Institution],
    first_id: &str,
    second_id: &str,
    now: i64,
) -> Result<GoalComparison, AnalyticsError> {
    let first = goal_detail(find_goal(goals, first_id)?, institutions, now);
    let second = goal_detail(find_goal(goals, second_id)?, institutions, now);

    let faster_completion = match (first.estimated_completion, second.estimated_completion) {
        (Some(a), Some(b)) if a < b => first.name.clone(),
        (Some(_), None) => first.name.clone(),
        _ => second.name.clone(),
    };

    Ok(GoalComparison {
        progress_difference: round2(first.progress_percent - second.progress_percent),
        target_difference: round2(first.target_amount - second.target_amount),
        faster_completion,
        first,
        second,
    })
}

/// Recommend allocation percentages proportional to each institution's
/// share of the total balance, truncated to whole percents.
pub fn reallocation_strategy(
    goals: &[Goal],
    institutions: &[Institution],
    goal_id: &str,
) -> Result<ReallocationPlan, AnalyticsError> {
    let goal = find_goal(goals, goal_id)?;
    let total_balance: f64 = institutions.iter().map(|inst| inst.current_balance).sum();

    let recommendations: Vec<AllocationChange> = if total_balance > 0.0 {
        institutions
            .iter()
            .map(|inst| {
                let recommended = (inst.current_balance / total_balance * 100.0).trunc();
                let current = goal
                    .linked_institutions
                    .get(&inst.institution_id)
                    .copied()
                    .unwrap_or(0.0);
                AllocationChange {
                    institution_id: inst.institution_id.clone(),
                    institution_name: inst.institution_name.clone(),
                    current_balance: round2(inst.current_balance),
                    current_allocation: current,
                    recommended_allocation: recommended,
                    change: round2(recommended - current),
                }
            })
            .collect()
    } else {
        Vec::new()
    };

    let current_progress = if goal.is_active {
        goal.progress_percent(institutions)
    } else {
        100.0
    };

    Ok(ReallocationPlan {
        goal_id: goal.goal_id.clone(),
        goal_name: goal.name.clone(),
        current_progress: round2(current_progress),
        current_total_allocation: round2(goal.total_allocated_percent()),
        recommendations,
    })
}

fn find_goal<'a>(goals: &'a [Goal], goal_id: &str) -> Result<&'a Goal, AnalyticsError> {
    goals
        .iter()
        .find(|g| g.goal_id == goal_id)
        .ok_or_else(|| AnalyticsError::NotFound(goal_id.to_owned()))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const DAY: i64 = SECONDS_PER_DAY;
    const NOW: i64 = 1_700_000_000;

    fn checking(balance: f64) -> Institution {
        let mut inst = Institution::new("user-1", "inst-1", "Checking", 1_000.0);
        inst.current_balance = balance;
        inst
    }

    fn aged_goal(id: &str, target: f64, created_at: i64) -> Goal {
        let mut goal = Goal::new("user-1", id, id, target);
        goal.created_at = created_at;
        goal
    }

    #[test]
    fn active_goal_projects_completion_from_growth() {
        let institutions = vec![checking(10_000.0)];
        let mut goal = aged_goal("goal-1", 5_000.0, NOW - 100 * DAY);
        goal.linked_institutions.insert("inst-1".into(), 40.0);

        let report = analyze_goals(&[goal], &institutions, NOW).unwrap();
        let detail = &report.goals[0];

        assert_eq!(detail.current_amount, 4_000.0);
        assert_eq!(detail.progress_percent, 80.0);
        assert_eq!(detail.remaining_amount, 1_000.0);
        assert_eq!(detail.days_since_creation, 100);
        // 40 a day leaves 25 days to cover the last 1000
        assert_eq!(detail.days_to_completion, Some(25));
        assert_eq!(detail.estimated_completion, Some(NOW + 25 * DAY));
        assert_eq!(detail.required_monthly_contribution, 1_000.0);
        assert_eq!(detail.allocations.len(), 1);
        assert_eq!(detail.allocations[0].allocated_amount, 4_000.0);
        assert!(report.insights.at_risk.is_empty());
    }

    #[test]
    fn inactive_goal_reports_settled() {
        let mut goal = aged_goal("goal-frozen", 2_000.0, NOW - 10 * DAY);
        goal.is_active = false;

        let report = analyze_goals(&[goal], &[], NOW).unwrap();
        let detail = &report.goals[0];

        assert_eq!(detail.progress_percent, 100.0);
        assert_eq!(detail.current_amount, 2_000.0);
        assert_eq!(detail.remaining_amount, 0.0);
        assert_eq!(report.summary.total_current_amount, 2_000.0);
        assert_eq!(report.summary.overall_progress, 100.0);
        // Closed goals stay out of the risk and priority lists
        assert!(report.insights.at_risk.is_empty());
        assert!(report.insights.priorities.is_empty());
    }

    #[test]
    fn stagnant_goal_lands_at_risk() {
        let institutions = vec![checking(0.0)];
        let mut goal = aged_goal("goal-stale", 3_000.0, NOW - 60 * DAY);
        goal.linked_institutions.insert("inst-1".into(), 30.0);

        let report = analyze_goals(&[goal], &institutions, NOW).unwrap();

        assert_eq!(report.insights.at_risk.len(), 1);
        let risk = &report.insights.at_risk[0];
        assert_eq!(risk.risk_score, 6);
        assert_eq!(
            risk.reasons,
            vec![
                RiskReason::SlowProgress,
                RiskReason::NoGrowth,
                RiskReason::UnderAllocated
            ]
        );
        assert_eq!(risk.recommendation, "Increase allocation percentages to this goal");
    }

    #[test]
    fn completed_goal_reports_time_taken() {
        let mut goal = aged_goal("goal-done", 1_000.0, NOW - 90 * DAY);
        goal.is_completed = true;
        goal.completed_at = Some(NOW - 30 * DAY);

        let report = analyze_goals(&[goal], &[], NOW).unwrap();
        let detail = &report.goals[0];

        assert_eq!(detail.days_to_completion, Some(60));
        assert_eq!(detail.estimated_completion, None);
        assert_eq!(detail.required_monthly_contribution, 0.0);
        assert_eq!(report.summary.completed_goals, 1);
        assert!(report.insights.priorities.is_empty());
    }

    #[test]
    fn priorities_rank_near_complete_goals_first() {
        let institutions = vec![checking(10_000.0)];
        // 85% funded after 100 days
        let mut leader = aged_goal("goal-lead", 4_000.0, NOW - 100 * DAY);
        leader.linked_institutions.insert("inst-1".into(), 34.0);
        // 10% funded after 10 days
        let mut laggard = aged_goal("goal-lag", 10_000.0, NOW - 10 * DAY);
        laggard.linked_institutions.insert("inst-1".into(), 10.0);

        let report = analyze_goals(&[laggard, leader], &institutions, NOW).unwrap();
        let priorities = &report.insights.priorities;

        assert_eq!(priorities[0].goal_id, "goal-lead");
        assert_eq!(priorities[0].priority_score, 14);
        assert!(priorities[0].priority_score > priorities[1].priority_score);
        assert_eq!(report.insights.near_completion.len(), 0);
    }

    #[test]
    fn comparison_names_the_faster_goal() {
        let institutions = vec![checking(10_000.0)];
        let mut fast = aged_goal("goal-fast", 4_000.0, NOW - 100 * DAY);
        fast.linked_institutions.insert("inst-1".into(), 34.0);
        let stalled = aged_goal("goal-stalled", 1_000.0, NOW - 40 * DAY);

        let comparison = compare_goals(
            &[fast, stalled],
            &institutions,
            "goal-fast",
            "goal-stalled",
            NOW,
        )
        .unwrap();

        assert_eq!(comparison.faster_completion, "goal-fast");
        assert_eq!(comparison.progress_difference, 85.0);
        assert_eq!(comparison.target_difference, 3_000.0);

        let err = compare_goals(&[], &institutions, "a", "b", NOW).unwrap_err();
        assert!(matches!(err, AnalyticsError::NotFound(_)));
    }

    #[test]
    fn reallocation_recommends_balance_proportional_shares() {
        let big = Institution::new("user-1", "inst-big", "Big", 7_500.0);
        let small = Institution::new("user-1", "inst-small", "Small", 2_500.0);
        let mut goal = aged_goal("goal-trip", 5_000.0, NOW - 30 * DAY);
        goal.linked_institutions.insert("inst-big".into(), 20.0);

        let plan = reallocation_strategy(&[goal], &[big, small], "goal-trip").unwrap();

        assert_eq!(plan.current_progress, 30.0);
        assert_eq!(plan.current_total_allocation, 20.0);
        assert_eq!(plan.recommendations.len(), 2);

        let big_rec = &plan.recommendations[0];
        assert_eq!(big_rec.institution_id, "inst-big");
        assert_eq!(big_rec.recommended_allocation, 75.0);
        assert_eq!(big_rec.change, 55.0);

        let small_rec = &plan.recommendations[1];
        assert_eq!(small_rec.recommended_allocation, 25.0);
        assert_eq!(small_rec.current_allocation, 0.0);
    }

    #[test]
    fn reallocation_with_no_balances_has_no_rows() {
        let goal = aged_goal("goal-1", 1_000.0, NOW - 10 * DAY);
        let empty = vec![checking(0.0)];

        let plan = reallocation_strategy(&[goal], &empty, "goal-1").unwrap();
        assert!(plan.recommendations.is_empty());
    }

    #[test]
    fn no_goals_is_insufficient_data() {
        let err = analyze_goals(&[], &[], NOW).unwrap_err();
        assert!(matches!(err, AnalyticsError::InsufficientData(_)));
    }
}
