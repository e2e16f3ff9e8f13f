//! Spending breakdown by transaction tag.
//!
//! - [`analyze_categories`] — totals, top list, monthly trends,
//!   diversity and tag co-occurrence over a windowed slice
//! - [`compare_category_periods`] — per-category deltas between two
//!   windows
//!
//! A transaction counts once under each of its tags; untagged ones land
//! in [`UNCATEGORIZED`]. Report-level totals sum the transactions
//! themselves, so multi-tag records are not double counted there.

use std::cmp::Ordering;
use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgernet_core::calc::{self, round2};
use ledgernet_core::{Transaction, TransactionKind};

use crate::cash_flow::PeriodGrouping;
use crate::error::AnalyticsError;
use crate::MIN_TRANSACTIONS_FOR_ANALYSIS;

/// Tag assigned when a transaction carries none.
pub const UNCATEGORIZED: &str = "uncategorized";

/// Entries kept in the default top-category list.
const DEFAULT_TOP_LIMIT: usize = 10;

/// Pairs kept in the co-occurrence list.
const CO_OCCURRENCE_LIMIT: usize = 10;

// ─────────────────────────────────────────────
// Options
// ─────────────────────────────────────────────

/// Tuning knobs for one category analysis.
#[derive(Debug, Clone)]
pub struct CategoryOptions {
    /// Restrict to one side before grouping; `None` analyzes both.
    pub kind_filter: Option<TransactionKind>,
    /// Entries kept in the top-category list.
    pub top_limit: usize,
}

impl Default for CategoryOptions {
    fn default() -> Self {
        Self {
            kind_filter: None,
            top_limit: DEFAULT_TOP_LIMIT,
        }
    }
}

// ─────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────

/// Window-wide totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategorySummary {
    /// Summed over transactions, so multi-tag records count once.
    pub total_amount: f64,
    pub transaction_count: usize,
    pub unique_categories: usize,
    /// The side filter the analysis ran under, if any.
    pub kind_filter: Option<TransactionKind>,
}

/// Per-category aggregates, keyed by tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryBreakdown {
    pub totals: BTreeMap<String, f64>,
    pub counts: BTreeMap<String, usize>,
    pub averages: BTreeMap<String, f64>,
    /// Share of the transaction total, percent.
    pub percentages: BTreeMap<String, f64>,
}

/// One entry of the top-category list.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TopCategory {
    pub name: String,
    pub amount: f64,
    pub rank: usize,
    /// Share of the summed category totals, percent. Multi-tag records
    /// count once per tag in this denominator.
    pub percentage: f64,
}

/// Amount in one month bucket of a category's trend line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PeriodAmount {
    pub period_start: i64,
    pub amount: f64,
}

/// How evenly the spend spreads across categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendSpread {
    HighlyDiverse,
    ModeratelyDiverse,
    Concentrated,
    HighlyConcentrated,
}

/// Concentration metrics over the category totals.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryDiversity {
    /// (1 − HHI) × 100; higher is more spread out.
    pub score: f64,
    pub hhi: f64,
    pub spread: SpendSpread,
    pub num_categories: usize,
}

/// Two tags that appear on the same transactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TagPair {
    pub first: String,
    pub second: String,
    pub count: u64,
}

/// Full category analysis over one window.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryReport {
    pub summary: CategorySummary,
    pub categories: CategoryBreakdown,
    pub top_categories: Vec<TopCategory>,
    /// Month-bucketed amounts per category, zero-filled across every
    /// bucket the window produced.
    pub trends: BTreeMap<String, Vec<PeriodAmount>>,
    pub diversity: CategoryDiversity,
    /// Tag pairs by shared-transaction count, highest first.
    pub co_occurrences: Vec<TagPair>,
}

/// One category's movement between two windows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryChange {
    pub category: String,
    pub period1_amount: f64,
    pub period2_amount: f64,
    pub change: f64,
    /// Percent of the period-1 amount; 100 when the category is new.
    pub percent_change: f64,
}

/// Category movement between two windows, largest absolute change
/// first.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CategoryComparison {
    pub period1_total: f64,
    pub period2_total: f64,
    pub total_change: f64,
    pub category_changes: Vec<CategoryChange>,
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Break spending down by tag over one windowed slice.
///
/// The kind filter applies before the minimum-size gate, so a window
/// with enough records overall can still fail with `InsufficientData`
/// for one side.
pub fn analyze_categories(
    transactions: &[Transaction],
    options: &CategoryOptions,
) -> Result<CategoryReport, AnalyticsError> {
    let filtered: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| options.kind_filter.map_or(true, |k| t.kind == k))
        .collect();
    if filtered.len() < MIN_TRANSACTIONS_FOR_ANALYSIS {
        return Err(AnalyticsError::InsufficientData(format!(
            "{} transactions after filtering, need {}",
            filtered.len(),
            MIN_TRANSACTIONS_FOR_ANALYSIS
        )));
    }

    let groups = group_by_tag(&filtered);
    let total_amount: f64 = filtered.iter().map(|t| t.amount).sum();

    let mut raw_totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut totals = BTreeMap::new();
    let mut counts = BTreeMap::new();
    let mut averages = BTreeMap::new();
    let mut percentages = BTreeMap::new();
    for (category, amounts) in &groups {
        let total: f64 = amounts.iter().sum();
        raw_totals.insert(category.clone(), total);
        totals.insert(category.clone(), round2(total));
        counts.insert(category.clone(), amounts.len());
        averages.insert(category.clone(), round2(calc::mean(amounts)));
        percentages.insert(
            category.clone(),
            if total_amount > 0.0 {
                round2(total / total_amount * 100.0)
            } else {
                0.0
            },
        );
    }

    let report = CategoryReport {
        summary: CategorySummary {
            total_amount: round2(total_amount),
            transaction_count: filtered.len(),
            unique_categories: groups.len(),
            kind_filter: options.kind_filter,
        },
        categories: CategoryBreakdown {
            totals,
            counts,
            averages,
            percentages,
        },
        top_categories: top_categories(&raw_totals, options.top_limit),
        trends: category_trends(&filtered),
        diversity: spending_diversity(&raw_totals),
        co_occurrences: tag_co_occurrences(&filtered, CO_OCCURRENCE_LIMIT),
    };
    debug!(
        transactions = report.summary.transaction_count,
        categories = report.summary.unique_categories,
        "categories analyzed"
    );
    Ok(report)
}

fn group_by_tag(transactions: &[&Transaction]) -> BTreeMap<String, Vec<f64>> {
    let mut groups: BTreeMap<String, Vec<f64>> = BTreeMap::new();
    for txn in transactions {
        if txn.tags.is_empty() {
            groups
                .entry(UNCATEGORIZED.to_owned())
                .or_default()
                .push(txn.amount);
        } else {
            for tag in &txn.tags {
                groups.entry(tag.clone()).or_default().push(txn.amount);
            }
        }
    }
    groups
}

fn top_categories(raw_totals: &BTreeMap<String, f64>, limit: usize) -> Vec<TopCategory> {
    let denominator: f64 = raw_totals.values().sum();
    let mut ranked: Vec<(&String, f64)> = raw_totals.iter().map(|(c, t)| (c, *t)).collect();
    // Ties break by name, ascending
    ranked.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.0.cmp(b.0))
    });
    ranked
        .into_iter()
        .take(limit)
        .enumerate()
        .map(|(i, (name, amount))| TopCategory {
            name: name.clone(),
            amount: round2(amount),
            rank: i + 1,
            percentage: if denominator > 0.0 {
                round2(amount / denominator * 100.0)
            } else {
                0.0
            },
        })
        .collect()
}

fn category_trends(transactions: &[&Transaction]) -> BTreeMap<String, Vec<PeriodAmount>> {
    let mut monthly: BTreeMap<i64, BTreeMap<&str, f64>> = BTreeMap::new();
    let mut categories: BTreeSet<&str> = BTreeSet::new();
    for txn in transactions {
        let bucket = PeriodGrouping::Month.bucket_start(txn.occurred_at);
        let slot = monthly.entry(bucket).or_default();
        if txn.tags.is_empty() {
            categories.insert(UNCATEGORIZED);
            *slot.entry(UNCATEGORIZED).or_insert(0.0) += txn.amount;
        } else {
            for tag in &txn.tags {
                categories.insert(tag.as_str());
                *slot.entry(tag.as_str()).or_insert(0.0) += txn.amount;
            }
        }
    }

    let mut trends = BTreeMap::new();
    for category in categories {
        let line: Vec<PeriodAmount> = monthly
            .iter()
            .map(|(bucket, amounts)| PeriodAmount {
                period_start: *bucket,
                amount: round2(amounts.get(category).copied().unwrap_or(0.0)),
            })
            .collect();
        trends.insert(category.to_owned(), line);
    }
    trends
}

fn spending_diversity(raw_totals: &BTreeMap<String, f64>) -> CategoryDiversity {
    let values: Vec<f64> = raw_totals.values().copied().collect();
    let total: f64 = values.iter().sum();
    if values.is_empty() || total <= 0.0 {
        return CategoryDiversity {
            score: 0.0,
            hhi: 0.0,
            spread: SpendSpread::HighlyConcentrated,
            num_categories: raw_totals.len(),
        };
    }

    let hhi = calc::herfindahl_index(&values);
    let score = (1.0 - hhi) * 100.0;
    let spread = if score >= 75.0 {
        SpendSpread::HighlyDiverse
    } else if score >= 50.0 {
        SpendSpread::ModeratelyDiverse
    } else if score >= 25.0 {
        SpendSpread::Concentrated
    } else {
        SpendSpread::HighlyConcentrated
    };
    CategoryDiversity {
        score: round2(score),
        hhi: (hhi * 10_000.0).round() / 10_000.0,
        spread,
        num_categories: raw_totals.len(),
    }
}

fn tag_co_occurrences(transactions: &[&Transaction], limit: usize) -> Vec<TagPair> {
    let mut pair_counts: BTreeMap<(String, String), u64> = BTreeMap::new();
    for txn in transactions {
        let tags: BTreeSet<&str> = txn.tags.iter().map(String::as_str).collect();
        if tags.len() < 2 {
            continue;
        }
        let ordered: Vec<&str> = tags.into_iter().collect();
        for (i, first) in ordered.iter().enumerate() {
            for second in &ordered[i + 1..] {
                *pair_counts
                    .entry(((*first).to_owned(), (*second).to_owned()))
                    .or_insert(0) += 1;
            }
        }
    }

    let mut pairs: Vec<TagPair> = pair_counts
        .into_iter()
        .map(|((first, second), count)| TagPair { first, second, count })
        .collect();
    // Stable sort keeps equal counts in pair order
    pairs.sort_by(|a, b| b.count.cmp(&a.count));
    pairs.truncate(limit);
    pairs
}

// ─────────────────────────────────────────────
// Period comparison
// ─────────────────────────────────────────────

/// Per-category deltas between two windows. Thin or empty windows are
/// fine here; a category absent from one side contributes zero.
pub fn compare_category_periods(
    period1: &[Transaction],
    period2: &[Transaction],
    kind_filter: Option<TransactionKind>,
) -> CategoryComparison {
    let totals1 = period_totals(period1, kind_filter);
    let totals2 = period_totals(period2, kind_filter);
    let total1 = period_total(period1, kind_filter);
    let total2 = period_total(period2, kind_filter);

    let categories: BTreeSet<&String> = totals1.keys().chain(totals2.keys()).collect();
    let mut changes: Vec<CategoryChange> = categories
        .into_iter()
        .map(|category| {
            let amount1 = totals1.get(category).copied().unwrap_or(0.0);
            let amount2 = totals2.get(category).copied().unwrap_or(0.0);
            let change = amount2 - amount1;
            let percent_change = if amount1 > 0.0 {
                change / amount1 * 100.0
            } else if amount2 > 0.0 {
                100.0
            } else {
                0.0
            };
            CategoryChange {
                category: category.clone(),
                period1_amount: round2(amount1),
                period2_amount: round2(amount2),
                change: round2(change),
                percent_change: round2(percent_change),
            }
        })
        .collect();
    changes.sort_by(|a, b| {
        b.change
            .abs()
            .partial_cmp(&a.change.abs())
            .unwrap_or(Ordering::Equal)
    });

    CategoryComparison {
        period1_total: round2(total1),
        period2_total: round2(total2),
        total_change: round2(total2 - total1),
        category_changes: changes,
    }
}

fn period_totals(
    transactions: &[Transaction],
    kind_filter: Option<TransactionKind>,
) -> BTreeMap<String, f64> {
    let filtered: Vec<&Transaction> = transactions
        .iter()
        .filter(|t| kind_filter.map_or(true, |k| t.kind == k))
        .collect();
    group_by_tag(&filtered)
        .into_iter()
        .map(|(category, amounts)| (category, amounts.iter().sum::<f64>()))
        .collect()
}

fn period_total(transactions: &[Transaction], kind_filter: Option<TransactionKind>) -> f64 {
    transactions
        .iter()
        .filter(|t| kind_filter.map_or(true, |k| t.kind == k))
        .map(|t| t.amount)
        .sum()
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
