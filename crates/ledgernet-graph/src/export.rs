//! Flat, serializable view of a graph plus any computed metrics.
//!
//! Node and edge records keep the graph's insertion order, so exporting
//! the same graph twice yields byte-identical output.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::FinanceGraph;
use crate::model::{EdgeKind, MetricResult, NodeId, NodeKind};

/// One node with every metric value computed for it, keyed by metric name.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeRecord {
    pub id: NodeId,
    pub kind: NodeKind,
    pub label: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub metrics: BTreeMap<String, f64>,
}

/// One edge, endpoint ids rather than arena indices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EdgeRecord {
    pub source: NodeId,
    pub target: NodeId,
    pub weight: f64,
    pub kind: EdgeKind,
    pub directed: bool,
}

/// Complete export of a graph and a named set of metric maps.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphExport {
    pub nodes: Vec<NodeRecord>,
    pub edges: Vec<EdgeRecord>,
}

impl GraphExport {
    /// Flatten `graph`, joining each named metric map onto the node records
    /// by node id. Metric maps missing a node simply leave that metric off
    /// the record.
    pub fn build(graph: &FinanceGraph, metrics: &[(&str, &MetricResult)]) -> Self {
        let nodes = graph
            .nodes()
            .iter()
            .map(|node| {
                let mut joined = BTreeMap::new();
                for (name, values) in metrics {
                    if let Some(value) = values.get(&node.id) {
                        joined.insert((*name).to_string(), *value);
                    }
                }
                NodeRecord {
                    id: node.id.clone(),
                    kind: node.kind,
                    label: node.label.clone(),
                    attributes: node.attributes.clone(),
                    metrics: joined,
                }
            })
            .collect();

        let edges = graph
            .edges()
            .iter()
            .map(|edge| EdgeRecord {
                source: graph.nodes()[edge.source].id.clone(),
                target: graph.nodes()[edge.target].id.clone(),
                weight: edge.weight,
                kind: edge.kind,
                directed: graph.directed(),
            })
            .collect();

        Self { nodes, edges }
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Node;

    fn two_node_graph() -> FinanceGraph {
        let mut graph = FinanceGraph::new(true);
        graph.add_node(
            Node::new(NodeId::institution("a"), NodeKind::Institution, "Checking")
                .with_attr("balance", 100.0),
        );
        graph.add_node(Node::new(NodeId::goal("g"), NodeKind::Goal, "Trip"));
        graph
            .add_edge(
                &NodeId::institution("a"),
                &NodeId::goal("g"),
                40.0,
                EdgeKind::Allocation,
            )
            .unwrap();
        graph
    }

    #[test]
    fn export_preserves_insertion_order() {
        let graph = two_node_graph();
        let export = GraphExport::build(&graph, &[]);

        assert_eq!(export.nodes.len(), 2);
        assert_eq!(export.nodes[0].id.as_str(), "inst_a");
        assert_eq!(export.nodes[1].id.as_str(), "goal_g");
        assert_eq!(export.edges.len(), 1);
        assert_eq!(export.edges[0].source.as_str(), "inst_a");
        assert_eq!(export.edges[0].target.as_str(), "goal_g");
        assert!(export.edges[0].directed);
        assert_eq!(export.edges[0].weight, 40.0);
    }

    #[test]
    fn export_joins_metrics_by_id() {
        let graph = two_node_graph();
        let mut degree = MetricResult::new();
        degree.insert(NodeId::institution("a"), 1.0);
        degree.insert(NodeId::goal("g"), 1.0);
        let mut pagerank = MetricResult::new();
        pagerank.insert(NodeId::institution("a"), 0.35);
        // goal_g deliberately missing from pagerank

        let export =
            GraphExport::build(&graph, &[("degree", &degree), ("pagerank", &pagerank)]);

        assert_eq!(export.nodes[0].metrics["degree"], 1.0);
        assert_eq!(export.nodes[0].metrics["pagerank"], 0.35);
        assert_eq!(export.nodes[1].metrics["degree"], 1.0);
        assert!(!export.nodes[1].metrics.contains_key("pagerank"));
    }

    #[test]
    fn export_is_deterministic() {
        let graph = two_node_graph();
        let mut degree = MetricResult::new();
        degree.insert(NodeId::institution("a"), 1.0);
        degree.insert(NodeId::goal("g"), 1.0);

        let a = serde_json::to_string(&GraphExport::build(&graph, &[("degree", &degree)])).unwrap();
        let b = serde_json::to_string(&GraphExport::build(&graph, &[("degree", &degree)])).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn export_carries_attributes() {
        let graph = two_node_graph();
        let export = GraphExport::build(&graph, &[]);
        assert_eq!(export.nodes[0].attributes["balance"], serde_json::json!(100.0));
        assert!(export.nodes[1].attributes.is_empty());
    }

    #[test]
    fn undirected_edges_marked_undirected() {
        let mut graph = FinanceGraph::new(false);
        graph.add_node(Node::new(NodeId::tag("food"), NodeKind::Tag, "food"));
        graph.add_node(Node::new(NodeId::tag("dining"), NodeKind::Tag, "dining"));
        graph
            .add_edge(
                &NodeId::tag("food"),
                &NodeId::tag("dining"),
                2.0,
                EdgeKind::CoOccurrence,
            )
            .unwrap();
        let export = GraphExport::build(&graph, &[]);
        assert!(!export.edges[0].directed);
    }
}
