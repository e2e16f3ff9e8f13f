//! Cash-flow analysis: income against spending over a window.
//!
//! - [`analyze_cash_flow`] — summary totals, distribution metrics,
//!   per-period rows, trend and anomaly detection
//! - [`project_cash_flow`] — flat-average projection of coming months
//!
//! Periods are unix buckets (day, week, 30-day month), never calendar
//! months. Reported figures carry two decimals.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgernet_core::calc::{self, round2};
use ledgernet_core::time::{SECONDS_PER_DAY, SECONDS_PER_MONTH, SECONDS_PER_WEEK};
use ledgernet_core::{DateRange, Institution, Transaction, TransactionKind};

use crate::error::AnalyticsError;
use crate::MIN_TRANSACTIONS_FOR_ANALYSIS;

/// Fewest transactions anomaly detection will consider.
const MIN_TRANSACTIONS_FOR_ANOMALIES: usize = 10;

// ─────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────

/// Bucket width for the per-period rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodGrouping {
    Day,
    Week,
    #[default]
    Month,
}

impl PeriodGrouping {
    fn seconds(self) -> i64 {
        match self {
            PeriodGrouping::Day => SECONDS_PER_DAY,
            PeriodGrouping::Week => SECONDS_PER_WEEK,
            PeriodGrouping::Month => SECONDS_PER_MONTH,
        }
    }

    /// Start of the bucket containing `ts` (floor division, so
    /// pre-epoch timestamps bucket correctly too).
    pub fn bucket_start(self, ts: i64) -> i64 {
        ts.div_euclid(self.seconds()) * self.seconds()
    }
}

/// Tuning knobs for one cash-flow analysis.
#[derive(Debug, Clone)]
pub struct CashFlowOptions {
    pub grouping: PeriodGrouping,
    /// Z-score beyond which a transaction counts as an anomaly.
    pub outlier_threshold: f64,
}

impl Default for CashFlowOptions {
    fn default() -> Self {
        Self {
            grouping: PeriodGrouping::Month,
            outlier_threshold: 2.0,
        }
    }
}

// ─────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────

/// Window-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowSummary {
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub net_cash_flow: f64,
    pub transaction_count: usize,
    pub deposit_count: usize,
    pub withdrawal_count: usize,
}

/// Distribution metrics per flow side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowMetrics {
    /// Net flow as a percentage of deposits.
    pub savings_rate: f64,
    /// Withdrawals averaged over the window's days.
    pub daily_burn_rate: f64,
    pub average_deposit: f64,
    pub average_withdrawal: f64,
    pub median_deposit: f64,
    pub median_withdrawal: f64,
    /// 90th-percentile amounts, the typical ceiling per side.
    pub deposit_p90: f64,
    pub withdrawal_p90: f64,
    /// Sample standard deviation per side.
    pub deposit_volatility: f64,
    pub withdrawal_volatility: f64,
}

/// Current balances and how long they last at the observed burn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BalanceOutlook {
    pub current_total: f64,
    /// `None` when the balance never depletes at the current rate.
    pub runway_days: Option<i64>,
}

/// Totals for one period bucket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodFlow {
    /// Unix second the bucket starts at.
    pub period_start: i64,
    pub total_deposits: f64,
    pub total_withdrawals: f64,
    pub net_flow: f64,
    pub transaction_count: usize,
    pub deposit_count: usize,
    pub withdrawal_count: usize,
}

/// Whether the latest period improved on the one before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FlowDirection {
    Improving,
    Declining,
    Stable,
}

/// Net-flow movement across the period rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowTrends {
    pub net_flows: Vec<f64>,
    /// Three-period trailing moving average of the net flows.
    pub moving_average: Vec<f64>,
    pub direction: FlowDirection,
    /// Bucket start of the best and worst net flow; ties go to the
    /// earliest bucket.
    pub best_period: i64,
    pub worst_period: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnomalyKind {
    LargeDeposit,
    LargeWithdrawal,
}

/// A transaction far outside its side's usual range.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FlowAnomaly {
    pub kind: AnomalyKind,
    pub transaction_id: String,
    pub amount: f64,
    pub occurred_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Full cash-flow analysis over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowReport {
    pub period: DateRange,
    pub span_days: i64,
    pub summary: FlowSummary,
    pub metrics: FlowMetrics,
    pub balance: BalanceOutlook,
    pub periods: Vec<PeriodFlow>,
    pub trends: FlowTrends,
    pub anomalies: Vec<FlowAnomaly>,
}

/// Per-month flat averages observed over the history window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonthlyAverage {
    pub deposits: f64,
    pub withdrawals: f64,
    pub net_flow: f64,
}

/// One projected month.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectedMonth {
    /// 1-based months after the projection start.
    pub month_offset: u32,
    pub projected_deposits: f64,
    pub projected_withdrawals: f64,
    pub projected_net_flow: f64,
    pub projected_balance: f64,
}

/// Flat-average projection of the coming months.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CashFlowProjection {
    pub current_balance: f64,
    pub monthly_average: MonthlyAverage,
    pub months: Vec<ProjectedMonth>,
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Analyze income against spending over `period`.
///
/// `transactions` is the windowed slice; `institutions` supply the
/// balances behind the runway estimate. Fails with `InsufficientData`
/// below [`MIN_TRANSACTIONS_FOR_ANALYSIS`](crate::MIN_TRANSACTIONS_FOR_ANALYSIS)
/// transactions.
pub fn analyze_cash_flow(
    transactions: &[Transaction],
    institutions: &[Institution],
    period: DateRange,
    options: &CashFlowOptions,
) -> Result<CashFlowReport, AnalyticsError> {
    if transactions.len() < MIN_TRANSACTIONS_FOR_ANALYSIS {
        return Err(AnalyticsError::InsufficientData(format!(
            "{} transactions in the window, need {}",
            transactions.len(),
            MIN_TRANSACTIONS_FOR_ANALYSIS
        )));
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

    let span_days = period.span_days();
    let total_balance: f64 = institutions.iter().map(|inst| inst.current_balance).sum();
    let daily_burn = calc::burn_rate(&withdrawals, span_days);

    let periods = group_by_period(transactions, options.grouping);
    let trends = flow_trends(&periods);
    let anomalies = detect_anomalies(transactions, options.outlier_threshold);

    let report = CashFlowReport {
        period,
        span_days,
        summary: FlowSummary {
            total_deposits: round2(deposits.iter().sum::<f64>()),
            total_withdrawals: round2(withdrawals.iter().sum::<f64>()),
            net_cash_flow: round2(calc::net_flow(&deposits, &withdrawals)),
            transaction_count: transactions.len(),
            deposit_count: deposits.len(),
            withdrawal_count: withdrawals.len(),
        },
        metrics: FlowMetrics {
            savings_rate: round2(calc::savings_rate(&deposits, &withdrawals)),
            daily_burn_rate: round2(daily_burn),
            average_deposit: round2(calc::mean(&deposits)),
            average_withdrawal: round2(calc::mean(&withdrawals)),
            median_deposit: round2(calc::median(&deposits)),
            median_withdrawal: round2(calc::median(&withdrawals)),
            deposit_p90: round2(calc::percentile(&deposits, 90.0)),
            withdrawal_p90: round2(calc::percentile(&withdrawals, 90.0)),
            deposit_volatility: round2(calc::std_dev(&deposits)),
            withdrawal_volatility: round2(calc::std_dev(&withdrawals)),
        },
        balance: BalanceOutlook {
            current_total: round2(total_balance),
            runway_days: calc::runway_days(total_balance, daily_burn),
        },
        periods,
        trends,
        anomalies,
    };
    debug!(
        transactions = transactions.len(),
        net = report.summary.net_cash_flow,
        "cash flow analyzed"
    );
    Ok(report)
}

fn group_by_period(transactions: &[Transaction], grouping: PeriodGrouping) -> Vec<PeriodFlow> {
    let mut buckets: BTreeMap<i64, (Vec<f64>, Vec<f64>)> = BTreeMap::new();
    for txn in transactions {
        let slot = buckets
            .entry(grouping.bucket_start(txn.occurred_at))
            .or_default();
        if txn.is_deposit() {
            slot.0.push(txn.amount);
        } else {
            slot.1.push(txn.amount);
        }
    }
    buckets
        .into_iter()
        .map(|(period_start, (deposits, withdrawals))| PeriodFlow {
            period_start,
            total_deposits: round2(deposits.iter().sum::<f64>()),
            total_withdrawals: round2(withdrawals.iter().sum::<f64>()),
            net_flow: round2(calc::net_flow(&deposits, &withdrawals)),
            transaction_count: deposits.len() + withdrawals.len(),
            deposit_count: deposits.len(),
            withdrawal_count: withdrawals.len(),
        })
        .collect()
}

fn flow_trends(periods: &[PeriodFlow]) -> FlowTrends {
    let net_flows: Vec<f64> = periods.iter().map(|p| p.net_flow).collect();
    let moving_average: Vec<f64> = calc::moving_average(&net_flows, 3)
        .into_iter()
        .map(round2)
        .collect();

    let direction = if net_flows.len() < 2 {
        FlowDirection::Stable
    } else {
        let latest = net_flows[net_flows.len() - 1];
        let previous = net_flows[net_flows.len() - 2];
        if latest > previous {
            FlowDirection::Improving
        } else if latest < previous {
            FlowDirection::Declining
        } else {
            FlowDirection::Stable
        }
    };

    let mut best = (0, f64::NEG_INFINITY);
    let mut worst = (0, f64::INFINITY);
    for p in periods {
        if p.net_flow > best.1 {
            best = (p.period_start, p.net_flow);
        }
        if p.net_flow < worst.1 {
            worst = (p.period_start, p.net_flow);
        }
    }

    FlowTrends {
        net_flows,
        moving_average,
        direction,
        best_period: best.0,
        worst_period: worst.0,
    }
}

fn detect_anomalies(transactions: &[Transaction], threshold: f64) -> Vec<FlowAnomaly> {
    if transactions.len() < MIN_TRANSACTIONS_FOR_ANOMALIES {
        return Vec::new();
    }
    let mut anomalies = Vec::new();
    for (kind, side) in [
        (AnomalyKind::LargeDeposit, TransactionKind::Deposit),
        (AnomalyKind::LargeWithdrawal, TransactionKind::Withdrawal),
    ] {
        let side_txns: Vec<&Transaction> =
            transactions.iter().filter(|t| t.kind == side).collect();
        let amounts: Vec<f64> = side_txns.iter().map(|t| t.amount).collect();
        for idx in calc::outlier_indices(&amounts, threshold) {
            let txn = side_txns[idx];
            anomalies.push(FlowAnomaly {
                kind,
                transaction_id: txn.transaction_id.clone(),
                amount: round2(txn.amount),
                occurred_at: txn.occurred_at,
                description: txn.description.clone(),
            });
        }
    }
    anomalies
}

// ─────────────────────────────────────────────
// Projection
// ─────────────────────────────────────────────

/// Project the coming months by applying the historical monthly
/// averages flat, rolling the balance forward.
///
/// `transactions` is the history slice, assumed to span
/// `history_months` months. Fails with `InvalidArgument` on a zero
/// horizon and `InsufficientData` on an empty history.
pub fn project_cash_flow(
    transactions: &[Transaction],
    institutions: &[Institution],
    history_months: u32,
    months_ahead: u32,
) -> Result<CashFlowProjection, AnalyticsError> {
    if history_months == 0 || months_ahead == 0 {
        return Err(AnalyticsError::InvalidArgument(
            "history and projection horizons must be at least one month".into(),
        ));
    }
    if transactions.is_empty() {
        return Err(AnalyticsError::InsufficientData(
            "no transaction history to project from".into(),
        ));
    }

    let total_deposits: f64 = transactions
        .iter()
        .filter(|t| t.is_deposit())
        .map(|t| t.amount)
        .sum();
    let total_withdrawals: f64 = transactions
        .iter()
        .filter(|t| t.is_withdrawal())
        .map(|t| t.amount)
        .sum();
    let monthly_deposits = total_deposits / f64::from(history_months);
    let monthly_withdrawals = total_withdrawals / f64::from(history_months);
    let monthly_net = monthly_deposits - monthly_withdrawals;

    let current_balance: f64 = institutions.iter().map(|inst| inst.current_balance).sum();

    let mut months = Vec::with_capacity(months_ahead as usize);
    let mut balance = current_balance;
    for offset in 1..=months_ahead {
        balance += monthly_net;
        months.push(ProjectedMonth {
            month_offset: offset,
            projected_deposits: round2(monthly_deposits),
            projected_withdrawals: round2(monthly_withdrawals),
            projected_net_flow: round2(monthly_net),
            projected_balance: round2(balance),
        });
    }

    debug!(months = months.len(), "cash flow projected");
    Ok(CashFlowProjection {
        current_balance: round2(current_balance),
        monthly_average: MonthlyAverage {
            deposits: round2(monthly_deposits),
            withdrawals: round2(monthly_withdrawals),
            net_flow: round2(monthly_net),
        },
        months,
    })
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
