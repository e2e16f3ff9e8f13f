//! # ledgernet-health
//!
//! Composite financial health scoring:
//!
//! - **Score**: five weighted dimensions, each 0–100 with neutral
//!   fallbacks, combined into a rated overall score
//! - **Recommendations**: deterministic templates for weak dimensions
//! - **Comparison**: per-dimension deltas and trend labels across periods

pub mod compare;
pub mod recommend;
pub mod score;

pub use compare::{compare_periods, ComponentChange, ComponentChanges, PeriodComparison, Trend};
pub use recommend::recommendations;
pub use score::{
    analyze, calculate_health_score, ComponentScore, ComponentScores, DimensionWeights,
    HealthScore, Rating, ScoringConfig, ScoringError, NEUTRAL_SCORE,
};
