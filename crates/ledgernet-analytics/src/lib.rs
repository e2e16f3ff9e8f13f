//! # ledgernet-analytics
//!
//! Request-level facade over the graph, algorithm and scoring crates:
//!
//! - [`analyze_network`] — one-shot graph build plus the full metric suite
//! - [`NetworkAnalytics`] — the same plus the report surfaces, fed from
//!   a [`RecordStore`]
//! - cash-flow, category, goal and institution reports as pure
//!   functions over record slices
//! - health scoring and period comparison re-exported from
//!   `ledgernet-health`
//!
//! Handlers depend on this crate alone.

pub mod cash_flow;
pub mod categories;
pub mod engine;
pub mod error;
pub mod goals;
pub mod institutions;
pub mod service;
pub mod store;

/// Fewest transactions a report analysis accepts.
pub const MIN_TRANSACTIONS_FOR_ANALYSIS: usize = 5;

pub use cash_flow::{
    analyze_cash_flow, project_cash_flow, CashFlowOptions, CashFlowProjection, CashFlowReport,
    FlowDirection, PeriodGrouping,
};
pub use categories::{
    analyze_categories, compare_category_periods, CategoryComparison, CategoryOptions,
    CategoryReport,
};
pub use engine::{
    analyze_network, AnalysisOptions, CommunityGroup, CommunitySummary, GraphStats, GraphType,
    NetworkAnalysis, PathSummary,
};
pub use error::AnalyticsError;
pub use goals::{
    analyze_goals, compare_goals, reallocation_strategy, GoalComparison, GoalReport,
    ReallocationPlan,
};
pub use institutions::{
    analyze_institutions, compare_institutions, InstitutionComparison, InstitutionReport,
};
pub use service::NetworkAnalytics;
pub use store::{MemoryStore, RecordStore, StoreError};

pub use ledgernet_health::{
    calculate_health_score, compare_periods, HealthScore, PeriodComparison, Rating, ScoringConfig,
    Trend,
};
