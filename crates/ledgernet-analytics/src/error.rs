//! Error taxonomy for analysis requests.

use ledgernet_core::TimeError;
use ledgernet_graph::GraphError;
use ledgernet_health::ScoringError;
use thiserror::Error;

use crate::store::StoreError;

/// Everything an analysis call can fail with. Each variant is
/// recoverable at the request boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AnalyticsError {
    /// Malformed request: unknown graph type, inverted window, invalid
    /// scoring weights.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A referenced record or node id does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// Too few records to compute the requested measure.
    #[error("insufficient data: {0}")]
    InsufficientData(String),

    /// The backing record store failed.
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl From<GraphError> for AnalyticsError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::NodeMissing(id) => AnalyticsError::NotFound(id.to_string()),
            other => AnalyticsError::InvalidArgument(other.to_string()),
        }
    }
}

impl From<ScoringError> for AnalyticsError {
    fn from(err: ScoringError) -> Self {
        AnalyticsError::InvalidArgument(err.to_string())
    }
}

impl From<TimeError> for AnalyticsError {
    fn from(err: TimeError) -> Self {
        AnalyticsError::InvalidArgument(err.to_string())
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
