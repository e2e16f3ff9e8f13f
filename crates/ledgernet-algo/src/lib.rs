//! Graph algorithm library for the relationship engine.
//!
//! Pure functions over [`ledgernet_graph::FinanceGraph`]; no I/O, no
//! shared state, bounded iteration throughout:
//!
//! - **Centrality**: Degree (count/weighted), Betweenness (Brandes), Closeness
//! - **PageRank**: weighted, dangling-safe, injectable bounds
//! - **Community**: greedy modularity agglomeration
//! - **Paths**: Dijkstra shortest path
//! - **Flow**: goal flow efficiency, clustering coefficients, bottlenecks

pub mod centrality;
pub mod community;
pub mod flow;
pub mod pagerank;
pub mod paths;

pub use centrality::{
    betweenness_centrality, closeness_centrality, degree_centrality, DegreeMode,
};
pub use community::{
    assignment_as_metric, detect_communities, CommunityAssignment, CommunityConfig,
    CommunityResult,
};
pub use flow::{
    average_clustering, clustering_coefficients, find_bottlenecks, flow_efficiency,
    BottleneckConfig,
};
pub use pagerank::{pagerank, PageRankConfig, PageRankResult};
pub use paths::{shortest_path, PathOutcome};
