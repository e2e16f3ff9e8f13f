//! Degree, betweenness, and closeness centrality.
//!
//! All three read the graph through its undirected view with unweighted
//! hop distances, so directed flow graphs and undirected networks rank on
//! the same scale. Every node receives a score; empty graphs yield empty
//! maps.

use std::collections::VecDeque;

use ledgernet_graph::{FinanceGraph, MetricResult};

/// What "degree" means for [`degree_centrality`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DegreeMode {
    /// Incident edge count.
    Count,
    /// Sum of incident edge weights.
    Weighted,
}

// ─────────────────────────────────────────────
// Degree
// ─────────────────────────────────────────────

/// Degree centrality: incident degree normalized by `n - 1`.
///
/// Single-node graphs score 0 for their only node.
pub fn degree_centrality(graph: &FinanceGraph, mode: DegreeMode) -> MetricResult {
    let n = graph.node_count();
    let mut result = MetricResult::new();
    let scale = if n > 1 { 1.0 / (n - 1) as f64 } else { 0.0 };
    for (idx, node) in graph.nodes().iter().enumerate() {
        let raw = match mode {
            DegreeMode::Count => graph.degree(idx) as f64,
            DegreeMode::Weighted => graph.weighted_degree(idx),
        };
        result.insert(node.id.clone(), raw * scale);
    }
    result
}

// ─────────────────────────────────────────────
// Betweenness (Brandes)
// ─────────────────────────────────────────────

/// Betweenness centrality via Brandes' algorithm on the undirected view.
///
/// Scores are the fraction of all-pairs shortest paths running through a
/// node, scaled by `1 / ((n - 1)(n - 2))`; with the accumulation counting
/// each unordered pair from both endpoints, this matches the conventional
/// normalized form. Nodes in graphs with fewer than 3 nodes score 0.
pub fn betweenness_centrality(graph: &FinanceGraph) -> MetricResult {
    let n = graph.node_count();
    let adjacency = undirected_adjacency(graph);
    let mut centrality = vec![0.0; n];

    for s in 0..n {
        let mut stack = Vec::with_capacity(n);
        let mut preds: Vec<Vec<usize>> = vec![Vec::new(); n];
        let mut sigma = vec![0.0; n];
        let mut dist = vec![-1i64; n];
        sigma[s] = 1.0;
        dist[s] = 0;

        let mut queue = VecDeque::new();
        queue.push_back(s);
        while let Some(v) = queue.pop_front() {
            stack.push(v);
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    queue.push_back(w);
                }
                if dist[w] == dist[v] + 1 {
                    sigma[w] += sigma[v];
                    preds[w].push(v);
                }
            }
        }

        let mut delta = vec![0.0; n];
        while let Some(w) = stack.pop() {
            for &v in &preds[w] {
                delta[v] += sigma[v] / sigma[w] * (1.0 + delta[w]);
            }
            if w != s {
                centrality[w] += delta[w];
            }
        }
    }

    if n > 2 {
        let scale = 1.0 / ((n - 1) as f64 * (n - 2) as f64);
        for value in centrality.iter_mut() {
            *value *= scale;
        }
    } else {
        centrality.fill(0.0);
    }

    graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.clone(), centrality[idx]))
        .collect()
}

// ─────────────────────────────────────────────
// Closeness (Wasserman–Faust)
// ─────────────────────────────────────────────

/// Closeness centrality with the Wasserman–Faust component correction.
///
/// For a node reaching `r` nodes (itself included) over total hop
/// distance `d`: `C = ((r - 1) / d) * ((r - 1) / (n - 1))`. The second
/// factor shrinks scores inside small components; isolated nodes score 0.
pub fn closeness_centrality(graph: &FinanceGraph) -> MetricResult {
    let n = graph.node_count();
    let adjacency = undirected_adjacency(graph);
    let mut result = MetricResult::new();

    for (idx, node) in graph.nodes().iter().enumerate() {
        let mut dist = vec![-1i64; n];
        dist[idx] = 0;
        let mut queue = VecDeque::new();
        queue.push_back(idx);
        let mut reached = 1u64;
        let mut total = 0i64;
        while let Some(v) = queue.pop_front() {
            for &w in &adjacency[v] {
                if dist[w] < 0 {
                    dist[w] = dist[v] + 1;
                    reached += 1;
                    total += dist[w];
                    queue.push_back(w);
                }
            }
        }

        let score = if reached > 1 && total > 0 && n > 1 {
            let r = (reached - 1) as f64;
            (r / total as f64) * (r / (n - 1) as f64)
        } else {
            0.0
        };
        result.insert(node.id.clone(), score);
    }
    result
}

/// Deduplicated neighbor lists ignoring edge direction. Reciprocal
/// directed edges collapse to a single undirected neighbor.
pub(crate) fn undirected_adjacency(graph: &FinanceGraph) -> Vec<Vec<usize>> {
    let n = graph.node_count();
    let mut adjacency = vec![Vec::new(); n];
    for v in 0..n {
        let mut neighbors: Vec<usize> =
            graph.entries_undirected(v).map(|e| e.neighbor).collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        adjacency[v] = neighbors;
    }
    adjacency
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledgernet_graph::{EdgeKind, Node, NodeId, NodeKind};

    fn build_graph(edges: &[(&str, &str, f64)], directed: bool) -> FinanceGraph {
        let mut graph = FinanceGraph::new(directed);
        for (a, b, w) in edges {
            graph.add_node(Node::new(NodeId::tag(a), NodeKind::Tag, *a));
            graph.add_node(Node::new(NodeId::tag(b), NodeKind::Tag, *b));
            graph
                .add_edge(&NodeId::tag(a), &NodeId::tag(b), *w, EdgeKind::CoOccurrence)
                .unwrap();
        }
        graph
    }

    fn score(result: &MetricResult, id: &str) -> f64 {
        result[&NodeId::tag(id)]
    }

    #[test]
    fn complete_graph_degree_is_one() {
        let graph = build_graph(
            &[
                ("a", "b", 1.0),
                ("a", "c", 1.0),
                ("a", "d", 1.0),
                ("b", "c", 1.0),
                ("b", "d", 1.0),
                ("c", "d", 1.0),
            ],
            false,
        );
        let result = degree_centrality(&graph, DegreeMode::Count);
        assert_eq!(result.len(), 4);
        for value in result.values() {
            assert!((value - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn weighted_degree_sums_incident_weights() {
        let graph = build_graph(&[("hub", "a", 2.0), ("hub", "b", 3.0)], false);
        let result = degree_centrality(&graph, DegreeMode::Weighted);
        // (2 + 3) / (3 - 1)
        assert!((score(&result, "hub") - 2.5).abs() < 1e-9);
        assert!((score(&result, "a") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn directed_degree_counts_both_directions() {
        let graph = build_graph(&[("a", "b", 1.0), ("c", "b", 1.0)], true);
        let result = degree_centrality(&graph, DegreeMode::Count);
        assert!((score(&result, "b") - 1.0).abs() < 1e-9);
        assert!((score(&result, "a") - 0.5).abs() < 1e-9);
    }

    #[test]
    fn single_node_scores_zero() {
        let mut graph = FinanceGraph::new(false);
        graph.add_node(Node::new(NodeId::tag("solo"), NodeKind::Tag, "solo"));
        let result = degree_centrality(&graph, DegreeMode::Count);
        assert_eq!(score(&result, "solo"), 0.0);
    }

    #[test]
    fn empty_graph_yields_empty_maps() {
        let graph = FinanceGraph::new(false);
        assert!(degree_centrality(&graph, DegreeMode::Count).is_empty());
        assert!(betweenness_centrality(&graph).is_empty());
        assert!(closeness_centrality(&graph).is_empty());
    }

    #[test]
    fn path_middle_node_has_full_betweenness() {
        let graph = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0)], false);
        let result = betweenness_centrality(&graph);
        assert!((score(&result, "b") - 1.0).abs() < 1e-9);
        assert_eq!(score(&result, "a"), 0.0);
        assert_eq!(score(&result, "c"), 0.0);
    }

    #[test]
    fn four_node_path_betweenness() {
        let graph = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0), ("c", "d", 1.0)], false);
        let result = betweenness_centrality(&graph);
        // b lies on a-c and a-d: 2 of 3 pairs
        assert!((score(&result, "b") - 2.0 / 3.0).abs() < 1e-9);
        assert!((score(&result, "c") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn betweenness_splits_over_equal_paths() {
        // Diamond: two equal-length routes between a and d.
        let graph = build_graph(
            &[("a", "b", 1.0), ("a", "c", 1.0), ("b", "d", 1.0), ("c", "d", 1.0)],
            false,
        );
        let result = betweenness_centrality(&graph);
        // Each middle node carries half of the single a-d pair: 0.5 / 3 pairs.
        assert!((score(&result, "b") - 1.0 / 6.0).abs() < 1e-9);
        assert!((score(&result, "c") - 1.0 / 6.0).abs() < 1e-9);
    }

    #[test]
    fn betweenness_ignores_direction() {
        let directed = build_graph(&[("a", "b", 1.0), ("c", "b", 1.0)], true);
        let result = betweenness_centrality(&directed);
        // Undirected view makes b the middle of an a-c path.
        assert!((score(&result, "b") - 1.0).abs() < 1e-9);
    }

    #[test]
    fn closeness_on_path() {
        let graph = build_graph(&[("a", "b", 1.0), ("b", "c", 1.0)], false);
        let result = closeness_centrality(&graph);
        assert!((score(&result, "b") - 1.0).abs() < 1e-9);
        assert!((score(&result, "a") - 2.0 / 3.0).abs() < 1e-9);
    }

    #[test]
    fn closeness_penalizes_small_components() {
        let graph = build_graph(&[("a", "b", 1.0), ("c", "d", 1.0)], false);
        let result = closeness_centrality(&graph);
        // Each node reaches one other at distance 1 out of n-1 = 3.
        for id in ["a", "b", "c", "d"] {
            assert!((score(&result, id) - 1.0 / 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn isolated_node_closeness_is_zero() {
        let mut graph = build_graph(&[("a", "b", 1.0)], false);
        graph.add_node(Node::new(NodeId::tag("lone"), NodeKind::Tag, "lone"));
        let result = closeness_centrality(&graph);
        assert_eq!(score(&result, "lone"), 0.0);
        assert_eq!(result.len(), graph.node_count());
    }
}
