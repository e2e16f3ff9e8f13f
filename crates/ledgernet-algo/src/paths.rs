//! Weighted shortest paths between named nodes.
//!
//! Dijkstra with edge weight as cost. Directed graphs are traversed along
//! edge direction; undirected graphs relax the whole neighborhood. The
//! hop-count distances used by the centrality module are a separate
//! convention; this module is the weighted one.

use std::cmp::Reverse;
use std::collections::BinaryHeap;

use ordered_float::OrderedFloat;

use ledgernet_graph::{FinanceGraph, GraphError, NodeId};

/// Floor for edge costs so zero-weight edges still order the frontier.
const MIN_EDGE_COST: f64 = 1e-9;

/// Result of a reachability query. Absent endpoints are a
/// [`GraphError::NodeMissing`], not a `NoPath`.
#[derive(Debug, Clone, PartialEq)]
pub enum PathOutcome {
    Found { path: Vec<NodeId>, cost: f64 },
    NoPath,
}

impl PathOutcome {
    pub fn exists(&self) -> bool {
        matches!(self, PathOutcome::Found { .. })
    }
}

/// Minimum-cost path from `source` to `target`.
pub fn shortest_path(
    graph: &FinanceGraph,
    source: &NodeId,
    target: &NodeId,
) -> Result<PathOutcome, GraphError> {
    let s = graph
        .index_of(source)
        .ok_or_else(|| GraphError::NodeMissing(source.clone()))?;
    let t = graph
        .index_of(target)
        .ok_or_else(|| GraphError::NodeMissing(target.clone()))?;
    if s == t {
        return Ok(PathOutcome::Found {
            path: vec![source.clone()],
            cost: 0.0,
        });
    }

    let (dist, prev) = dijkstra_from(graph, s);
    if dist[t].is_infinite() {
        return Ok(PathOutcome::NoPath);
    }

    let mut indices = vec![t];
    let mut cursor = t;
    while let Some(p) = prev[cursor] {
        indices.push(p);
        cursor = p;
    }
    indices.reverse();

    Ok(PathOutcome::Found {
        path: indices
            .into_iter()
            .map(|idx| graph.node(idx).id.clone())
            .collect(),
        cost: dist[t],
    })
}

/// Single-source Dijkstra: distances and predecessor links for every
/// node, infinity where unreachable.
pub(crate) fn dijkstra_from(graph: &FinanceGraph, start: usize) -> (Vec<f64>, Vec<Option<usize>>) {
    let n = graph.node_count();
    let mut dist = vec![f64::INFINITY; n];
    let mut prev: Vec<Option<usize>> = vec![None; n];
    let mut heap: BinaryHeap<(Reverse<OrderedFloat<f64>>, usize)> = BinaryHeap::new();

    dist[start] = 0.0;
    heap.push((Reverse(OrderedFloat(0.0)), start));

    while let Some((Reverse(OrderedFloat(d)), v)) = heap.pop() {
        if d > dist[v] {
            continue; // stale entry
        }
        for entry in graph.entries_out(v) {
            let next = d + entry.weight.max(MIN_EDGE_COST);
            if next < dist[entry.neighbor] {
                dist[entry.neighbor] = next;
                prev[entry.neighbor] = Some(v);
                heap.push((Reverse(OrderedFloat(next)), entry.neighbor));
            }
        }
    }
    (dist, prev)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use ledgernet_graph::{EdgeKind, Node, NodeKind};

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

    fn ids(outcome: &PathOutcome) -> Vec<&str> {
        match outcome {
            PathOutcome::Found { path, .. } => path.iter().map(NodeId::as_str).collect(),
            PathOutcome::NoPath => Vec::new(),
        }
    }

    #[test]
    fn cheaper_detour_beats_direct_edge() {
        let graph = build_graph(
            &[("a", "b", 5.0), ("a", "c", 1.0), ("c", "b", 1.0)],
            false,
        );
        let outcome = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("b")).unwrap();
        assert_eq!(ids(&outcome), vec!["tag_a", "tag_c", "tag_b"]);
        match outcome {
            PathOutcome::Found { cost, .. } => assert!((cost - 2.0).abs() < 1e-9),
            PathOutcome::NoPath => panic!("expected a path"),
        }
    }

    #[test]
    fn missing_endpoint_is_an_error() {
        let graph = build_graph(&[("a", "b", 1.0)], false);
        let err = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("ghost")).unwrap_err();
        assert!(matches!(err, GraphError::NodeMissing(id) if id == NodeId::tag("ghost")));
    }

    #[test]
    fn disconnected_pair_is_no_path() {
        let graph = build_graph(&[("a", "b", 1.0), ("c", "d", 1.0)], false);
        let outcome = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("d")).unwrap();
        assert_eq!(outcome, PathOutcome::NoPath);
        assert!(!outcome.exists());
    }

    #[test]
    fn source_equal_to_target_is_trivial() {
        let graph = build_graph(&[("a", "b", 1.0)], false);
        let outcome = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("a")).unwrap();
        assert_eq!(
            outcome,
            PathOutcome::Found {
                path: vec![NodeId::tag("a")],
                cost: 0.0
            }
        );
    }

    #[test]
    fn directed_graphs_respect_direction() {
        let graph = build_graph(&[("a", "b", 1.0)], true);
        let forward = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("b")).unwrap();
        assert!(forward.exists());
        let backward = shortest_path(&graph, &NodeId::tag("b"), &NodeId::tag("a")).unwrap();
        assert_eq!(backward, PathOutcome::NoPath);
    }

    #[test]
    fn zero_weight_edges_are_traversable() {
        let graph = build_graph(&[("a", "b", 0.0)], false);
        let outcome = shortest_path(&graph, &NodeId::tag("a"), &NodeId::tag("b")).unwrap();
        match outcome {
            PathOutcome::Found { path, cost } => {
                assert_eq!(path.len(), 2);
                assert!(cost < 1e-6);
            }
            PathOutcome::NoPath => panic!("expected a path"),
        }
    }
}
