//! Institution utilization and portfolio analysis.
//!
//! - [`analyze_institutions`] — per-account balances, activity, goal
//!   links and utilization, plus rankings and portfolio concentration
//! - [`compare_institutions`] — two accounts side by side
//!
//! Utilization scores 0–100: holding a balance earns up to 30,
//! transaction activity up to 30, goal allocations up to 40.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgernet_core::calc::{self, round2};
use ledgernet_core::time::days_between;
use ledgernet_core::{Goal, Institution, Transaction};

use crate::error::AnalyticsError;

/// Utilization below which an institution counts as underutilized.
const UNDERUTILIZED_CUTOFF: f64 = 50.0;

// ─────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────

/// Balance movement since the account was linked.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceMetrics {
    pub starting: f64,
    pub current: f64,
    pub change: f64,
    pub growth_rate: f64,
}

/// Transaction activity through one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActivityMetrics {
    pub total_count: usize,
    pub deposit_count: usize,
    pub withdrawal_count: usize,
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub net_flow: f64,
    /// Transactions per 30 days between the first and last occurrence;
    /// 0 when everything falls on one day.
    pub monthly_rate: f64,
    pub first_occurred_at: Option<i64>,
    pub last_occurred_at: Option<i64>,
}

/// Goals funded by one institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GoalLinks {
    pub linked_count: usize,
    /// Sum of this institution's allocation percents across its goals.
    pub total_allocated_percent: f64,
    pub linked_goal_names: Vec<String>,
}

/// Bands over the monthly transaction rate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    VeryActive,
    Active,
    Moderate,
    Low,
    Inactive,
}

/// One institution's full analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionDetail {
    pub institution_id: String,
    pub institution_name: String,
    pub balances: BalanceMetrics,
    pub activity: ActivityMetrics,
    pub goal_links: GoalLinks,
    pub utilization_score: f64,
    pub activity_level: ActivityLevel,
    pub created_at: i64,
}

/// One entry of a ranking.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankEntry {
    pub rank: usize,
    pub institution_name: String,
    pub value: f64,
}

/// The institution orderings, each highest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionRankings {
    pub by_balance: Vec<RankEntry>,
    pub by_growth_rate: Vec<RankEntry>,
    pub by_activity: Vec<RankEntry>,
    pub by_utilization: Vec<RankEntry>,
}

/// Why an institution counts as underutilized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnderuseReason {
    NoTransactions,
    NoGoalAllocation,
    ZeroBalance,
}

/// An institution under the utilization cutoff, lowest first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UnderutilizedInstitution {
    pub institution_id: String,
    pub institution_name: String,
    pub utilization_score: f64,
    pub reasons: Vec<UnderuseReason>,
    pub recommendations: Vec<String>,
}

/// One slice of the balance distribution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceShare {
    pub institution_name: String,
    pub balance: f64,
    pub percent: f64,
}

/// Bands over the balance-concentration HHI.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ConcentrationLevel {
    HighlyDiversified,
    ModeratelyDiversified,
    SomewhatConcentrated,
    HighlyConcentrated,
}

/// Portfolio-level balance and growth metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PortfolioMetrics {
    pub distribution: Vec<BalanceShare>,
    pub concentration_hhi: f64,
    pub concentration: ConcentrationLevel,
    pub average_growth_rate: f64,
    /// Growth rate weighted by current balances.
    pub weighted_growth_rate: f64,
    pub best_performer: Option<String>,
    pub worst_performer: Option<String>,
}

/// Totals over every institution.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionSummary {
    pub total_institutions: usize,
    pub total_balance: f64,
    pub total_starting_balance: f64,
    pub total_growth: f64,
    pub average_balance: f64,
}

/// Full institution analysis.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionReport {
    pub summary: InstitutionSummary,
    pub institutions: Vec<InstitutionDetail>,
    pub rankings: InstitutionRankings,
    pub underutilized: Vec<UnderutilizedInstitution>,
    pub portfolio: PortfolioMetrics,
}

/// Two institutions side by side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstitutionComparison {
    pub balance_difference: f64,
    pub growth_rate_difference: f64,
    pub transaction_count_difference: i64,
    pub more_active: String,
    pub higher_utilization: String,
    pub first: InstitutionDetail,
    pub second: InstitutionDetail,
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Analyze every institution against its transactions and goal links.
/// Fails with `InsufficientData` when there are no institutions.
pub fn analyze_institutions(
    institutions: &[Institution],
    transactions: &[Transaction],
    goals: &[Goal],
) -> Result<InstitutionReport, AnalyticsError> {
    if institutions.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no institutions to analyze".into(),
        ));
    }

    let details: Vec<InstitutionDetail> = institutions
        .iter()
        .map(|inst| institution_detail(inst, transactions, goals))
        .collect();

    let total_balance: f64 = institutions.iter().map(|i| i.current_balance).sum();
    let total_starting: f64 = institutions.iter().map(|i| i.starting_balance).sum();

    let report = InstitutionReport {
        summary: InstitutionSummary {
            total_institutions: institutions.len(),
            total_balance: round2(total_balance),
            total_starting_balance: round2(total_starting),
            total_growth: round2(total_balance - total_starting),
            average_balance: round2(total_balance / institutions.len() as f64),
        },
        rankings: rankings(&details),
        underutilized: underutilized(&details),
        portfolio: portfolio_metrics(&details),
        institutions: details,
    };
    debug!(
        institutions = report.summary.total_institutions,
        "institutions analyzed"
    );
    Ok(report)
}

fn institution_detail(
    institution: &Institution,
    transactions: &[Transaction],
    goals: &[Goal],
) -> InstitutionDetail {
    let own: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| t.institution_id == institution.institution_id)
        .collect();
    let deposits: Vec<f64> = own
        .iter()
        .filter(|t| t.is_deposit())
        .map(|t| t.amount)
        .collect();
    let withdrawals: Vec<f64> = own
        .iter()
        .filter(|t| t.is_withdrawal())
        .map(|t| t.amount)
        .collect();

    let first = own.iter().map(|t| t.occurred_at).min();
    let last = own.iter().map(|t| t.occurred_at).max();
    let monthly_rate = match (first, last) {
        (Some(first), Some(last)) => {
            let span = days_between(first, last);
            if span > 0 {
                own.len() as f64 / span as f64 * 30.0
            } else {
                0.0
            }
        }
        _ => 0.0,
    };

    // Union of both link directions: allocation entries are
    // authoritative, the record's own id list covers one-sided links
    // from partial syncs.
    let linked: Vec<&Goal> = goals
        .iter()
        .filter(|g| {
            g.linked_institutions
                .contains_key(&institution.institution_id)
                || institution.linked_goals.contains(&g.goal_id)
        })
        .collect();
    let total_allocated: f64 = linked
        .iter()
        .filter_map(|g| g.linked_institutions.get(&institution.institution_id))
        .sum();

    InstitutionDetail {
        institution_id: institution.institution_id.clone(),
        institution_name: institution.institution_name.clone(),
        balances: BalanceMetrics {
            starting: round2(institution.starting_balance),
            current: round2(institution.current_balance),
            change: round2(institution.balance_change()),
            growth_rate: round2(institution.growth_rate()),
        },
        activity: ActivityMetrics {
            total_count: own.len(),
            deposit_count: deposits.len(),
            withdrawal_count: withdrawals.len(),
            total_deposits: round2(deposits.iter().sum::<f64>()),
            total_withdrawals: round2(withdrawals.iter().sum::<f64>()),
            net_flow: round2(calc::net_flow(&deposits, &withdrawals)),
            monthly_rate: round2(monthly_rate),
            first_occurred_at: first,
            last_occurred_at: last,
        },
        goal_links: GoalLinks {
            linked_count: linked.len(),
            total_allocated_percent: round2(total_allocated),
            linked_goal_names: linked.iter().map(|g| g.name.clone()).collect(),
        },
        utilization_score: round2(utilization(institution, own.len(), total_allocated)),
        activity_level: activity_level(monthly_rate),
        created_at: institution.created_at,
    }
}

fn utilization(institution: &Institution, transaction_count: usize, allocated_percent: f64) -> f64 {
    let mut score = 0.0;
    if institution.current_balance > 0.0 {
        score += 30.0;
    }
    if transaction_count > 0 {
        score += (transaction_count as f64 / 10.0 * 30.0).min(30.0);
    }
    if allocated_percent > 0.0 {
        score += (allocated_percent / 100.0 * 40.0).min(40.0);
    }
    score.min(100.0)
}

fn activity_level(monthly_rate: f64) -> ActivityLevel {
    if monthly_rate >= 10.0 {
        ActivityLevel::VeryActive
    } else if monthly_rate >= 5.0 {
        ActivityLevel::Active
    } else if monthly_rate >= 1.0 {
        ActivityLevel::Moderate
    } else if monthly_rate > 0.0 {
        ActivityLevel::Low
    } else {
        ActivityLevel::Inactive
    }
}

fn rankings(details: &[InstitutionDetail]) -> InstitutionRankings {
    InstitutionRankings {
        by_balance: ranked(details, |d| d.balances.current),
        by_growth_rate: ranked(details, |d| d.balances.growth_rate),
        by_activity: ranked(details, |d| d.activity.total_count as f64),
        by_utilization: ranked(details, |d| d.utilization_score),
    }
}

fn ranked(
    details: &[InstitutionDetail],
    value: impl Fn(&InstitutionDetail) -> f64,
) -> Vec<RankEntry> {
    let mut ordered: Vec<(&InstitutionDetail, f64)> =
        details.iter().map(|d| (d, value(d))).collect();
    // Ties break by name, ascending
    ordered.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.institution_name.cmp(&b.0.institution_name))
    });
    ordered
        .into_iter()
        .enumerate()
        .map(|(i, (d, v))| RankEntry {
            rank: i + 1,
            institution_name: d.institution_name.clone(),
            value: v,
        })
        .collect()
}

fn underutilized(details: &[InstitutionDetail]) -> Vec<UnderutilizedInstitution> {
    let mut flagged: Vec<UnderutilizedInstitution> = details
        .iter()
        .filter(|d| d.utilization_score < UNDERUTILIZED_CUTOFF)
        .map(|d| {
            let mut reasons = Vec::new();
            let mut recommendations = Vec::new();
            if d.activity.total_count == 0 {
                reasons.push(UnderuseReason::NoTransactions);
                recommendations.push("Start using this account for transactions".to_owned());
            }
            if d.goal_links.total_allocated_percent == 0.0 {
                reasons.push(UnderuseReason::NoGoalAllocation);
                recommendations.push("Link to one or more financial goals".to_owned());
            }
            if d.balances.current == 0.0 {
                reasons.push(UnderuseReason::ZeroBalance);
                recommendations.push("Add funds to this account".to_owned());
            }
            UnderutilizedInstitution {
                institution_id: d.institution_id.clone(),
                institution_name: d.institution_name.clone(),
                utilization_score: d.utilization_score,
                reasons,
                recommendations,
            }
        })
        .collect();
    flagged.sort_by(|a, b| {
        a.utilization_score
            .partial_cmp(&b.utilization_score)
            .unwrap_or(Ordering::Equal)
    });
    flagged
}

fn portfolio_metrics(details: &[InstitutionDetail]) -> PortfolioMetrics {
    let balances: Vec<f64> = details.iter().map(|d| d.balances.current).collect();
    let total: f64 = balances.iter().sum();

    let distribution = details
        .iter()
        .map(|d| BalanceShare {
            institution_name: d.institution_name.clone(),
            balance: d.balances.current,
            percent: if total > 0.0 {
                round2(d.balances.current / total * 100.0)
            } else {
                0.0
            },
        })
        .collect();

    let hhi = if total > 0.0 {
        calc::herfindahl_index(&balances)
    } else {
        0.0
    };
    let concentration = if hhi < 0.15 {
        ConcentrationLevel::HighlyDiversified
    } else if hhi < 0.25 {
        ConcentrationLevel::ModeratelyDiversified
    } else if hhi < 0.50 {
        ConcentrationLevel::SomewhatConcentrated
    } else {
        ConcentrationLevel::HighlyConcentrated
    };

    let growth_rates: Vec<f64> = details.iter().map(|d| d.balances.growth_rate).collect();
    let mut best: Option<&InstitutionDetail> = None;
    let mut worst: Option<&InstitutionDetail> = None;
    for d in details {
        if best.map_or(true, |b| d.balances.growth_rate > b.balances.growth_rate) {
            best = Some(d);
        }
        if worst.map_or(true, |w| d.balances.growth_rate < w.balances.growth_rate) {
            worst = Some(d);
        }
    }

    PortfolioMetrics {
        distribution,
        concentration_hhi: (hhi * 10_000.0).round() / 10_000.0,
        concentration,
        average_growth_rate: round2(calc::mean(&growth_rates)),
        weighted_growth_rate: round2(calc::weighted_average(&growth_rates, &balances)),
        best_performer: best.map(|d| d.institution_name.clone()),
        worst_performer: worst.map(|d| d.institution_name.clone()),
    }
}

// ─────────────────────────────────────────────
// Comparison
// ─────────────────────────────────────────────

/// Two institutions side by side over the full transaction history.
/// Fails with `NotFound` when either id is missing.
pub fn compare_institutions(
    institutions: &[Institution],
    transactions: &[Transaction],
    goals: &[Goal],
    first_id: &str,
    second_id: &str,
) -> Result<InstitutionComparison, AnalyticsError> {
    let first = institution_detail(find_institution(institutions, first_id)?, transactions, goals);
    let second =
        institution_detail(find_institution(institutions, second_id)?, transactions, goals);

    let more_active = if first.activity.total_count > second.activity.total_count {
        first.institution_name.clone()
    } else {
        second.institution_name.clone()
    };
    let higher_utilization = if first.utilization_score > second.utilization_score {
        first.institution_name.clone()
    } else {
        second.institution_name.clone()
    };

    Ok(InstitutionComparison {
        balance_difference: round2(first.balances.current - second.balances.current),
        growth_rate_difference: round2(first.balances.growth_rate - second.balances.growth_rate),
        transaction_count_difference: first.activity.total_count as i64
            - second.activity.total_count as i64,
        more_active,
        higher_utilization,
        first,
        second,
    })
}

fn find_institution<'a>(
    institutions: &'a [Institution],
    institution_id: &str,
) -> Result<&'a Institution, AnalyticsError> {
    institutions
        .iter()
        .find(|inst| inst.institution_id == institution_id)
        .ok_or_else(|| AnalyticsError::NotFound(institution_id.to_owned()))
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
