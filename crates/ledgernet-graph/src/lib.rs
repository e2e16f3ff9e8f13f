//! # ledgernet-graph
//!
//! Graph construction layer for the relationship engine:
//!
//! - **Model**: typed nodes ([`NodeKind`]) and edges ([`EdgeKind`]) with
//!   prefixed string ids
//! - **Arena**: [`FinanceGraph`], an index-based adjacency structure shared
//!   by every algorithm
//! - **Builders**: the three analysis views (money flow, goal–institution
//!   bipartite, tag co-occurrence)
//! - **Export**: deterministic, serde-ready flattening with metric joins

pub mod builder;
pub mod error;
pub mod export;
pub mod graph;
pub mod model;

pub use error::GraphError;
pub use export::{EdgeRecord, GraphExport, NodeRecord};
pub use graph::{AdjEntry, Edge, FinanceGraph};
pub use model::{EdgeKind, MetricResult, Node, NodeId, NodeKind};
