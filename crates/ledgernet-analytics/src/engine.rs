//! One-shot network analysis over a set of financial records.
//!
//! [`analyze_network`] builds the requested graph and runs the whole
//! metric suite in a single pass:
//!
//! - per-node centrality, PageRank, clustering
//! - greedy community structure and whole-graph stats
//! - graph-specific extras: flow efficiency and bottlenecks on the
//!   money-flow graph, diversification on the goal–institution graph
//!
//! A failed metric never aborts the run; it lands in `metric_errors`
//! keyed by metric name, and the rest of the result stays usable.

use std::collections::{BTreeMap, BTreeSet};
use std::fmt;
use std::str::FromStr;
use std::time::Instant;

use serde::{Deserialize, Serialize};
use tracing::debug;

use ledgernet_algo::{
    betweenness_centrality, closeness_centrality, clustering_coefficients, degree_centrality,
    detect_communities, find_bottlenecks, flow_efficiency, pagerank, shortest_path,
    BottleneckConfig, CommunityConfig, CommunityResult, DegreeMode, PageRankConfig, PathOutcome,
};
use ledgernet_core::calc::herfindahl_index;
use ledgernet_core::{DateRange, Goal, Institution, Transaction};
use ledgernet_graph::{
    builder, EdgeRecord, FinanceGraph, GraphExport, MetricResult, NodeId, NodeRecord,
};

use crate::error::AnalyticsError;

// ─────────────────────────────────────────────
// GraphType
// ─────────────────────────────────────────────

/// Which of the three graph builds an analysis request wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GraphType {
    /// Directed money movement between institutions, goals and spending
    /// categories.
    #[serde(rename = "flow", alias = "financial_flow")]
    FinancialFlow,
    /// Undirected bipartite view of goals and the institutions funding
    /// them.
    GoalInstitution,
    /// Undirected tag co-occurrence.
    TagNetwork,
}

impl GraphType {
    pub fn as_str(self) -> &'static str {
        match self {
            GraphType::FinancialFlow => "flow",
            GraphType::GoalInstitution => "goal_institution",
            GraphType::TagNetwork => "tag_network",
        }
    }
}

impl fmt::Display for GraphType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GraphType {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "flow" | "financial_flow" => Ok(GraphType::FinancialFlow),
            "goal_institution" => Ok(GraphType::GoalInstitution),
            "tag_network" => Ok(GraphType::TagNetwork),
            other => Err(AnalyticsError::InvalidArgument(format!(
                "unknown graph type '{other}'"
            ))),
        }
    }
}

// ─────────────────────────────────────────────
// AnalysisOptions
// ─────────────────────────────────────────────

/// Tuning knobs for one analysis run. The defaults match what the
/// dashboard requests.
#[derive(Debug, Clone)]
pub struct AnalysisOptions {
    /// Also compute the weight-summed degree variant.
    pub weighted_degree: bool,
    pub pagerank: PageRankConfig,
    pub community: CommunityConfig,
    pub bottleneck: BottleneckConfig,
    /// Node ids to route between, as serialized (e.g. `inst_<id>`).
    pub shortest_path: Option<(String, String)>,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            weighted_degree: true,
            pagerank: PageRankConfig::default(),
            community: CommunityConfig::default(),
            bottleneck: BottleneckConfig::default(),
            shortest_path: None,
        }
    }
}

// ─────────────────────────────────────────────
// Result shapes
// ─────────────────────────────────────────────

/// Whole-graph shape numbers.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphStats {
    pub nodes: usize,
    pub edges: usize,
    pub density: f64,
    pub is_connected: bool,
}

/// One detected community.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityGroup {
    pub id: u64,
    /// Member node ids, ascending.
    pub nodes: Vec<NodeId>,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunitySummary {
    pub num_communities: usize,
    pub communities: Vec<CommunityGroup>,
    pub modularity: f64,
}

/// Routing result, flattened for serialization.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSummary {
    pub exists: bool,
    pub path: Vec<NodeId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Everything one analysis run produces.
#[derive(Debug, Clone, Serialize)]
pub struct NetworkAnalysis {
    pub graph_type: GraphType,
    pub stats: GraphStats,
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
    /// Metric name → per-node scores.
    pub metrics: BTreeMap<String, MetricResult>,
    pub communities: CommunitySummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shortest_path: Option<PathSummary>,
    /// Nodes whose removal severs or badly stretches funding routes.
    /// Only populated for flow graphs.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub bottlenecks: Vec<NodeId>,
    /// Metric name → why it was skipped.
    #[serde(skip_serializing_if = "BTreeMap::is_empty")]
    pub metric_errors: BTreeMap<String, String>,
    /// Window the transactions were fetched for, when one was applied.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub period: Option<DateRange>,
}

// ─────────────────────────────────────────────
// Analysis
// ─────────────────────────────────────────────

/// Build the requested graph over the given records and run the full
/// metric suite.
///
/// A shortest-path request naming a node absent from the graph fails
/// the whole call with [`AnalyticsError::NotFound`]; individual metric
/// failures are recorded in `metric_errors` instead of aborting.
pub fn analyze_network(
    graph_type: GraphType,
    institutions: &[Institution],
    transactions: &[Transaction],
    goals: &[Goal],
    options: &AnalysisOptions,
) -> Result<NetworkAnalysis, AnalyticsError> {
    let started = Instant::now();
    let graph = match graph_type {
        GraphType::FinancialFlow => builder::financial_flow(transactions, institutions, goals)?,
        GraphType::GoalInstitution => builder::goal_institution(institutions, goals, transactions)?,
        GraphType::TagNetwork => builder::tag_network(transactions)?,
    };

    // Resolve routing before any metric work so a bad node id fails fast.
    let shortest = match &options.shortest_path {
        Some((source, target)) => Some(route(&graph, source, target)?),
        None => None,
    };

    let mut metrics: BTreeMap<String, MetricResult> = BTreeMap::new();
    let mut metric_errors: BTreeMap<String, String> = BTreeMap::new();

    metrics.insert(
        "degree_centrality".into(),
        degree_centrality(&graph, DegreeMode::Count),
    );
    if options.weighted_degree {
        metrics.insert(
            "weighted_degree".into(),
            degree_centrality(&graph, DegreeMode::Weighted),
        );
    }
    metrics.insert(
        "betweenness_centrality".into(),
        betweenness_centrality(&graph),
    );
    metrics.insert("closeness_centrality".into(), closeness_centrality(&graph));
    metrics.insert("clustering".into(), clustering_coefficients(&graph));

    let ranked = pagerank(&graph, &options.pagerank);
    if ranked.converged {
        metrics.insert("pagerank".into(), ranked.scores);
    } else {
        metric_errors.insert(
            "pagerank".into(),
            format!("did not converge within {} iterations", ranked.iterations),
        );
    }

    let mut bottlenecks = Vec::new();
    match graph_type {
        GraphType::FinancialFlow => {
            let sources = deposit_sources(&graph, transactions);
            metrics.insert("flow_efficiency".into(), flow_efficiency(&graph, &sources));
            bottlenecks = find_bottlenecks(&graph, &options.bottleneck);
        }
        GraphType::GoalInstitution => {
            metrics.insert("diversification".into(), diversification(&graph));
        }
        GraphType::TagNetwork => {}
    }

    let communities = summarize_communities(&detect_communities(&graph, &options.community));

    let stats = GraphStats {
        nodes: graph.node_count(),
        edges: graph.edge_count(),
        density: graph.density(),
        is_connected: graph.is_connected(),
    };

    let metric_refs: Vec<(&str, &MetricResult)> = metrics
        .iter()
        .map(|(name, result)| (name.as_str(), result))
        .collect();
    let export = GraphExport::build(&graph, &metric_refs);

    debug!(
        graph_type = %graph_type,
        nodes = stats.nodes,
        edges = stats.edges,
        communities = communities.num_communities,
        skipped_metrics = metric_errors.len(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "network analysis complete"
    );

    Ok(NetworkAnalysis {
        graph_type,
        stats,
        nodes: export.nodes,
        edges: export.edges,
        metrics,
        communities,
        shortest_path: shortest,
        bottlenecks,
        metric_errors,
        period: None,
    })
}

fn route(
    graph: &FinanceGraph,
    source: &str,
    target: &str,
) -> Result<PathSummary, AnalyticsError> {
    let outcome = shortest_path(graph, &NodeId::raw(source), &NodeId::raw(target))?;
    Ok(match outcome {
        PathOutcome::Found { path, cost } => PathSummary {
            exists: true,
            path,
            cost: Some(cost),
        },
        PathOutcome::NoPath => PathSummary {
            exists: false,
            path: Vec::new(),
            cost: None,
        },
    })
}

/// Institutions that received at least one deposit in the window; these
/// seed the flow efficiency measure.
fn deposit_sources(graph: &FinanceGraph, transactions: &[Transaction]) -> Vec<NodeId> {
    let mut seen: BTreeSet<&str> = BTreeSet::new();
    let mut sources = Vec::new();
    for txn in transactions {
        if txn.is_deposit() && seen.insert(txn.institution_id.as_str()) {
            let id = NodeId::institution(&txn.institution_id);
            if graph.contains(&id) {
                sources.push(id);
            }
        }
    }
    sources
}

/// One minus the Herfindahl index of each node's incident edge weights:
/// 0 when a single relationship carries everything (or none exists),
/// approaching 1 as weight spreads evenly.
fn diversification(graph: &FinanceGraph) -> MetricResult {
    let mut result = MetricResult::new();
    for (idx, node) in graph.nodes().iter().enumerate() {
        let weights: Vec<f64> = graph.entries_undirected(idx).map(|e| e.weight).collect();
        let score = if weights.iter().sum::<f64>() <= 0.0 {
            0.0
        } else {
            1.0 - herfindahl_index(&weights)
        };
        result.insert(node.id.clone(), score);
    }
    result
}

fn summarize_communities(result: &CommunityResult) -> CommunitySummary {
    let mut grouped: BTreeMap<u64, Vec<NodeId>> = BTreeMap::new();
    for (id, label) in &result.assignment {
        grouped.entry(*label).or_default().push(id.clone());
    }
    let communities = grouped
        .into_iter()
        .map(|(id, nodes)| CommunityGroup {
            id,
            size: nodes.len(),
            nodes,
        })
        .collect();
    CommunitySummary {
        num_communities: result.community_count,
        communities,
        modularity: result.modularity,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
