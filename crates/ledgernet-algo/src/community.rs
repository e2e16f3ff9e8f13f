//! Greedy modularity community detection.
//!
//! Clauset-Newman-Moore agglomeration on the undirected weighted view:
//! every node starts in its own cluster and the pair of connected
//! clusters with the largest modularity gain merges, until no merge
//! improves modularity. Merge order ties break on the lowest pair of
//! member node ids, so repeated runs agree.

use std::collections::{BTreeMap, HashMap};

use ledgernet_graph::{FinanceGraph, MetricResult, NodeId};

/// node id → cluster label, labels contiguous from 0 in first-seen
/// node order.
pub type CommunityAssignment = BTreeMap<NodeId, u64>;

/// Bound on the agglomeration loop. The default never stops early.
#[derive(Debug, Clone, Copy)]
pub struct CommunityConfig {
    pub max_merges: usize,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            max_merges: usize::MAX,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CommunityResult {
    pub assignment: CommunityAssignment,
    pub modularity: f64,
    pub community_count: usize,
    pub merges: usize,
}

/// Detect communities by greedy modularity maximization.
///
/// Graphs with fewer than 2 nodes collapse to a single cluster (or none)
/// with modularity 0; graphs with no edge weight stay fully singleton.
pub fn detect_communities(graph: &FinanceGraph, config: &CommunityConfig) -> CommunityResult {
    let n = graph.node_count();
    if n < 2 {
        let assignment: CommunityAssignment =
            graph.nodes().iter().map(|node| (node.id.clone(), 0)).collect();
        let community_count = assignment.len();
        return CommunityResult {
            assignment,
            modularity: 0.0,
            community_count,
            merges: 0,
        };
    }

    let m: f64 = graph.edges().iter().map(|e| e.weight).sum();
    if m <= 0.0 {
        return singleton_result(graph);
    }
    let two_m = 2.0 * m;

    // Per-cluster state, indexed by the founding node. `a` is the degree
    // fraction deg/2m; `low` is the smallest member id for tie-breaks.
    let mut alive = vec![true; n];
    let mut parent: Vec<usize> = (0..n).collect();
    let mut a: Vec<f64> = (0..n).map(|v| graph.weighted_degree(v) / two_m).collect();
    let low: Vec<NodeId> = graph.nodes().iter().map(|node| node.id.clone()).collect();

    // Between-cluster weights, keyed (min, max).
    let mut between: HashMap<(usize, usize), f64> = HashMap::new();
    for edge in graph.edges() {
        if edge.source != edge.target {
            let key = pair_key(edge.source, edge.target);
            *between.entry(key).or_default() += edge.weight;
        }
    }

    // Singleton partition has no internal edges.
    let mut q: f64 = -a.iter().map(|x| x * x).sum::<f64>();
    let mut merges = 0usize;

    while merges < config.max_merges {
        let mut best: Option<(f64, (NodeId, NodeId), (usize, usize))> = None;
        for (&(ci, cj), &weight) in &between {
            let gain = 2.0 * (weight / two_m - a[ci] * a[cj]);
            let tie = ordered_ids(&low[ci], &low[cj]);
            let candidate = (gain, tie, (ci, cj));
            let better = match &best {
                None => true,
                Some((best_gain, best_tie, _)) => {
                    gain > best_gain + 1e-12
                        || ((gain - best_gain).abs() <= 1e-12 && candidate.1 < *best_tie)
                }
            };
            if better {
                best = Some(candidate);
            }
        }

        let Some((gain, _, (ci, cj))) = best else { break };
        if gain <= 0.0 {
            break;
        }

        // Fold the higher-id cluster into the lower-id one.
        let (keep, drop) = if low[ci] <= low[cj] { (ci, cj) } else { (cj, ci) };
        q += gain;
        a[keep] += a[drop];
        alive[drop] = false;
        parent[drop] = keep;

        let touching: Vec<(usize, usize)> = between
            .keys()
            .filter(|(x, y)| *x == drop || *y == drop)
            .copied()
            .collect();
        for key in touching {
            let weight = between.remove(&key).unwrap_or(0.0);
            let other = if key.0 == drop { key.1 } else { key.0 };
            if other != keep {
                *between.entry(pair_key(keep, other)).or_default() += weight;
            }
        }
        merges += 1;
    }

    // Contiguous labels in first-seen node order.
    let mut label_of: HashMap<usize, u64> = HashMap::new();
    let mut assignment = CommunityAssignment::new();
    let mut next_label = 0u64;
    for (idx, node) in graph.nodes().iter().enumerate() {
        let root = find_root(&parent, idx);
        let label = *label_of.entry(root).or_insert_with(|| {
            let l = next_label;
            next_label += 1;
            l
        });
        assignment.insert(node.id.clone(), label);
    }

    CommunityResult {
        assignment,
        modularity: q,
        community_count: alive.iter().filter(|&&x| x).count(),
        merges,
    }
}

/// Cluster labels as a metric map for serialization alongside centrality.
pub fn assignment_as_metric(result: &CommunityResult) -> MetricResult {
    result
        .assignment
        .iter()
        .map(|(id, label)| (id.clone(), *label as f64))
        .collect()
}

fn singleton_result(graph: &FinanceGraph) -> CommunityResult {
    let assignment: CommunityAssignment = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.clone(), idx as u64))
        .collect();
    let community_count = assignment.len();
    CommunityResult {
        assignment,
        modularity: 0.0,
        community_count,
        merges: 0,
    }
}

fn pair_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

fn ordered_ids(a: &NodeId, b: &NodeId) -> (NodeId, NodeId) {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

fn find_root(parent: &[usize], mut idx: usize) -> usize {
    while parent[idx] != idx {
        idx = parent[idx];
    }
    idx
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledgernet_graph::{EdgeKind, Node, NodeId, NodeKind};

    fn build_graph(edges: &[(&str, &str, f64)]) -> FinanceGraph {
        let mut graph = FinanceGraph::new(false);
        for (a, b, w) in edges {
            graph.add_node(Node::new(NodeId::tag(a), NodeKind::Tag, *a));
            graph.add_node(Node::new(NodeId::tag(b), NodeKind::Tag, *b));
            graph
                .add_edge(&NodeId::tag(a), &NodeId::tag(b), *w, EdgeKind::CoOccurrence)
                .unwrap();
        }
        graph
    }

    fn label(result: &CommunityResult, id: &str) -> u64 {
        result.assignment[&NodeId::tag(id)]
    }

    #[test]
    fn two_disjoint_triangles_form_two_communities() {
        let graph = build_graph(&[
            ("a1", "a2", 1.0),
            ("a2", "a3", 1.0),
            ("a1", "a3", 1.0),
            ("b1", "b2", 1.0),
            ("b2", "b3", 1.0),
            ("b1", "b3", 1.0),
        ]);
        let result = detect_communities(&graph, &CommunityConfig::default());

        assert_eq!(result.community_count, 2);
        assert_eq!(label(&result, "a1"), label(&result, "a2"));
        assert_eq!(label(&result, "a1"), label(&result, "a3"));
        assert_eq!(label(&result, "b1"), label(&result, "b2"));
        assert_ne!(label(&result, "a1"), label(&result, "b1"));
        assert!((result.modularity - 0.5).abs() < 1e-9);
        assert!(result.modularity > 0.0);
    }

    #[test]
    fn bridged_triangles_stay_separate() {
        let graph = build_graph(&[
            ("a1", "a2", 1.0),
            ("a2", "a3", 1.0),
            ("a1", "a3", 1.0),
            ("b1", "b2", 1.0),
            ("b2", "b3", 1.0),
            ("b1", "b3", 1.0),
            ("a3", "b1", 1.0),
        ]);
        let result = detect_communities(&graph, &CommunityConfig::default());

        assert_eq!(result.community_count, 2);
        assert_ne!(label(&result, "a1"), label(&result, "b1"));
        // 2 * (6/14 - (7/14)^2)
        assert!((result.modularity - 5.0 / 14.0).abs() < 1e-9);
    }

    #[test]
    fn assignment_covers_every_node_contiguously() {
        let graph = build_graph(&[("a", "b", 1.0), ("c", "d", 1.0)]);
        let result = detect_communities(&graph, &CommunityConfig::default());

        assert_eq!(result.assignment.len(), graph.node_count());
        let mut labels: Vec<u64> = result.assignment.values().copied().collect();
        labels.sort_unstable();
        labels.dedup();
        assert_eq!(labels, vec![0, 1]);
    }

    #[test]
    fn fewer_than_two_nodes_is_one_cluster() {
        let mut graph = FinanceGraph::new(false);
        graph.add_node(Node::new(NodeId::tag("solo"), NodeKind::Tag, "solo"));
        let result = detect_communities(&graph, &CommunityConfig::default());
        assert_eq!(result.community_count, 1);
        assert_eq!(result.modularity, 0.0);
        assert_eq!(label(&result, "solo"), 0);

        let empty = detect_communities(&FinanceGraph::new(false), &CommunityConfig::default());
        assert!(empty.assignment.is_empty());
        assert_eq!(empty.community_count, 0);
    }

    #[test]
    fn zero_weight_graph_stays_singleton() {
        let graph = build_graph(&[("a", "b", 0.0)]);
        let result = detect_communities(&graph, &CommunityConfig::default());
        assert_eq!(result.community_count, 2);
        assert_eq!(result.modularity, 0.0);
        assert_eq!(result.merges, 0);
    }

    #[test]
    fn merge_cap_limits_agglomeration() {
        let graph = build_graph(&[
            ("a1", "a2", 1.0),
            ("a2", "a3", 1.0),
            ("a1", "a3", 1.0),
        ]);
        let config = CommunityConfig { max_merges: 1 };
        let result = detect_communities(&graph, &config);
        assert_eq!(result.merges, 1);
        assert_eq!(result.community_count, 2);
    }

    #[test]
    fn deterministic_across_runs() {
        let edges = [
            ("a", "b", 1.0),
            ("b", "c", 2.0),
            ("c", "d", 1.0),
            ("d", "a", 2.0),
            ("a", "c", 1.0),
        ];
        let first = detect_communities(&build_graph(&edges), &CommunityConfig::default());
        let second = detect_communities(&build_graph(&edges), &CommunityConfig::default());
        assert_eq!(first.assignment, second.assignment);
        assert!((first.modularity - second.modularity).abs() < 1e-12);
    }

    #[test]
    fn labels_follow_first_seen_order() {
        let graph = build_graph(&[("z", "y", 1.0), ("a", "b", 1.0)]);
        let result = detect_communities(&graph, &CommunityConfig::default());
        // z was inserted first, so its community takes label 0.
        assert_eq!(label(&result, "z"), 0);
        assert_eq!(label(&result, "a"), 1);
    }

    #[test]
    fn assignment_converts_to_a_metric_map() {
        let graph = build_graph(&[("a", "b", 1.0), ("c", "d", 1.0)]);
        let result = detect_communities(&graph, &CommunityConfig::default());
        let metric = assignment_as_metric(&result);

        assert_eq!(metric.len(), graph.node_count());
        assert_eq!(metric[&NodeId::tag("a")], 0.0);
        assert_eq!(metric[&NodeId::tag("c")], 1.0);
    }
}
