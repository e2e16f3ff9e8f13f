//! Flow efficiency, local clustering, and bottleneck detection.
//!
//! Flow efficiency asks how much of the capital leaving a set of source
//! nodes actually arrives at goals; clustering and bottlenecks describe
//! how fragile the routes are.

use std::collections::{BTreeSet, HashMap, HashSet, VecDeque};

use ledgernet_graph::{FinanceGraph, MetricResult, NodeId, NodeKind};

use crate::centrality::undirected_adjacency;
use crate::paths::dijkstra_from;

/// Tolerance for flagging a node as a bottleneck: removal must stretch
/// some source-to-goal route beyond `threshold_multiplier` times its
/// baseline hop length (or sever it).
#[derive(Debug, Clone, Copy)]
pub struct BottleneckConfig {
    pub threshold_multiplier: f64,
}

impl Default for BottleneckConfig {
    fn default() -> Self {
        Self {
            threshold_multiplier: 2.0,
        }
    }
}

// ─────────────────────────────────────────────
// Flow efficiency
// ─────────────────────────────────────────────

/// Per-goal ratio of capital arriving from `sources` to capital leaving
/// them.
///
/// Arrival is measured as the bottleneck capacity (minimum edge weight)
/// along the weighted shortest path from each source, the most a route
/// can carry end to end. Every Goal-kind node gets a score in [0, 1];
/// unreached goals and source sets with no outgoing weight score 0.
/// Source ids absent from the graph contribute nothing.
pub fn flow_efficiency(graph: &FinanceGraph, sources: &[NodeId]) -> MetricResult {
    let goals = graph.kind_indices(NodeKind::Goal);
    let mut result: MetricResult = goals
        .iter()
        .map(|&g| (graph.node(g).id.clone(), 0.0))
        .collect();

    let source_idx: Vec<usize> = sources
        .iter()
        .filter_map(|id| graph.index_of(id))
        .collect();
    let denominator: f64 = source_idx
        .iter()
        .map(|&s| graph.entries_out(s).iter().map(|e| e.weight).sum::<f64>())
        .sum();
    if denominator <= 0.0 || goals.is_empty() {
        return result;
    }

    let mut arriving = vec![0.0; graph.node_count()];
    for &s in &source_idx {
        let (dist, prev) = dijkstra_from(graph, s);
        for &g in &goals {
            if g != s && dist[g].is_finite() {
                arriving[g] += path_capacity(graph, &prev, s, g);
            }
        }
    }

    for &g in &goals {
        result.insert(
            graph.node(g).id.clone(),
            (arriving[g] / denominator).clamp(0.0, 1.0),
        );
    }
    result
}

/// Minimum raw edge weight along the predecessor chain from `goal` back
/// to `source`.
fn path_capacity(graph: &FinanceGraph, prev: &[Option<usize>], source: usize, goal: usize) -> f64 {
    let mut capacity = f64::INFINITY;
    let mut cursor = goal;
    while cursor != source {
        let Some(p) = prev[cursor] else { return 0.0 };
        let weight = graph
            .entries_out(p)
            .iter()
            .find(|e| e.neighbor == cursor)
            .map(|e| e.weight)
            .unwrap_or(0.0);
        capacity = capacity.min(weight);
        cursor = p;
    }
    if capacity.is_finite() {
        capacity
    } else {
        0.0
    }
}

// ─────────────────────────────────────────────
// Clustering
// ─────────────────────────────────────────────

/// Local clustering coefficient per node over the undirected neighbor
/// sets: `2 * links_among_neighbors / (k * (k - 1))`. Degree below 2
/// scores 0.
pub fn clustering_coefficients(graph: &FinanceGraph) -> MetricResult {
    let n = graph.node_count();
    let neighbor_sets: Vec<HashSet<usize>> = (0..n)
        .map(|v| {
            graph
                .entries_undirected(v)
                .map(|e| e.neighbor)
                .filter(|&w| w != v)
                .collect()
        })
        .collect();

    graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(v, node)| {
            let neighbors: Vec<usize> = neighbor_sets[v].iter().copied().collect();
            let k = neighbors.len();
            let score = if k < 2 {
                0.0
            } else {
                let mut links = 0usize;
                for (i, &a) in neighbors.iter().enumerate() {
                    for &b in &neighbors[i + 1..] {
                        if neighbor_sets[a].contains(&b) {
                            links += 1;
                        }
                    }
                }
                2.0 * links as f64 / (k * (k - 1)) as f64
            };
            (node.id.clone(), score)
        })
        .collect()
}

/// Mean local clustering coefficient; 0 for the empty graph.
pub fn average_clustering(graph: &FinanceGraph) -> f64 {
    let coefficients = clustering_coefficients(graph);
    if coefficients.is_empty() {
        return 0.0;
    }
    coefficients.values().sum::<f64>() / coefficients.len() as f64
}

// ─────────────────────────────────────────────
// Bottlenecks
// ─────────────────────────────────────────────

/// Nodes whose removal stretches or severs an institution-to-goal route.
///
/// Baselines are hop lengths on the undirected view between every
/// (Institution, Goal) pair; a node is flagged when excluding it pushes
/// any pair past `threshold_multiplier` times its baseline or
/// disconnects it. Pairs already unreachable are ignored. The returned
/// ids are sorted.
pub fn find_bottlenecks(graph: &FinanceGraph, config: &BottleneckConfig) -> Vec<NodeId> {
    let sources = graph.kind_indices(NodeKind::Institution);
    let sinks = graph.kind_indices(NodeKind::Goal);
    if sources.is_empty() || sinks.is_empty() {
        return Vec::new();
    }

    let adjacency = undirected_adjacency(graph);
    let mut baseline: HashMap<(usize, usize), i64> = HashMap::new();
    for &s in &sources {
        let dist = hops_from(&adjacency, s, None);
        for &g in &sinks {
            if s != g && dist[g] >= 0 {
                baseline.insert((s, g), dist[g]);
            }
        }
    }
    if baseline.is_empty() {
        return Vec::new();
    }

    let mut flagged: BTreeSet<NodeId> = BTreeSet::new();
    'candidate: for v in 0..graph.node_count() {
        for &s in &sources {
            if s == v {
                continue;
            }
            let dist = hops_from(&adjacency, s, Some(v));
            for &g in &sinks {
                if g == v {
                    continue;
                }
                let Some(&base) = baseline.get(&(s, g)) else {
                    continue;
                };
                let severed = dist[g] < 0;
                if severed || dist[g] as f64 > config.threshold_multiplier * base as f64 {
                    flagged.insert(graph.node(v).id.clone());
                    continue 'candidate;
                }
            }
        }
    }
    flagged.into_iter().collect()
}

/// BFS hop distances, `-1` where unreachable, skipping `excluded`.
fn hops_from(adjacency: &[Vec<usize>], start: usize, excluded: Option<usize>) -> Vec<i64> {
    let mut dist = vec![-1i64; adjacency.len()];
    if Some(start) == excluded {
        return dist;
    }
    dist[start] = 0;
    let mut queue = VecDeque::new();
    queue.push_back(start);
    while let Some(v) = queue.pop_front() {
        for &w in &adjacency[v] {
            if Some(w) != excluded && dist[w] < 0 {
                dist[w] = dist[v] + 1;
                queue.push_back(w);
            }
        }
    }
    dist
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
