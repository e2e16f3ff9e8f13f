//! Node and edge model for the finance graphs.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

// ─────────────────────────────────────────────
// NodeKind / EdgeKind
// ─────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NodeKind {
    /// A financial account.
    Institution,
    /// A savings goal.
    Goal,
    /// A transaction tag (co-occurrence network, bipartite auxiliaries).
    Tag,
    /// A spending category derived from a tag (flow graph).
    Category,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EdgeKind {
    /// Account balance committed toward a goal.
    Allocation,
    /// A link between an inactive goal and the institution its recorded
    /// transactions moved through.
    InactiveAllocation,
    /// Money spent into a category or tag.
    Spending,
    /// Two tags appearing on the same transaction.
    CoOccurrence,
}

// ─────────────────────────────────────────────
// NodeId
// ─────────────────────────────────────────────

/// Prefixed string identifier for a graph node.
///
/// The prefix carries the entity kind on the wire: `inst_…`, `goal_…`,
/// `tag_…`, `cat_…`. Ids are stable across rebuilds of the same records,
/// which is what makes metric maps joinable with serialized graphs.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    pub fn institution(id: &str) -> Self {
        Self(format!("inst_{id}"))
    }

    pub fn goal(id: &str) -> Self {
        Self(format!("goal_{id}"))
    }

    pub fn tag(name: &str) -> Self {
        Self(format!("tag_{name}"))
    }

    pub fn category(name: &str) -> Self {
        Self(format!("cat_{name}"))
    }

    /// Wrap an already-prefixed id, e.g. one echoed back by a caller.
    pub fn raw(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ─────────────────────────────────────────────
// Node
// ─────────────────────────────────────────────

/// A typed node in a finance graph.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    /// Stable prefixed identifier.
    pub id: NodeId,

    /// Entity kind.
    pub kind: NodeKind,

    /// Display name.
    pub label: String,

    /// Builder-attached attributes (balance, target, total_amount, …).
    /// Ordered so serialized output is deterministic.
    #[serde(default)]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Node {
    pub fn new(id: NodeId, kind: NodeKind, label: impl Into<String>) -> Self {
        Self {
            id,
            kind,
            label: label.into(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attr(mut self, key: &str, value: impl Into<serde_json::Value>) -> Self {
        self.attributes.insert(key.to_string(), value.into());
        self
    }
}

// ─────────────────────────────────────────────
// MetricResult
// ─────────────────────────────────────────────

/// Per-node metric scores.
///
/// Whole-graph metrics cover every node, isolated ones included, at the
/// metric's defined default. Restricted measures such as flow efficiency
/// cover only the node kind they are defined over.
pub type MetricResult = BTreeMap<NodeId, f64>;

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn node_id_prefixes() {
        assert_eq!(NodeId::institution("abc").as_str(), "inst_abc");
        assert_eq!(NodeId::goal("g1").as_str(), "goal_g1");
        assert_eq!(NodeId::tag("groceries").as_str(), "tag_groceries");
        assert_eq!(NodeId::category("rent").as_str(), "cat_rent");
    }

    #[test]
    fn node_id_serializes_as_plain_string() {
        let id = NodeId::institution("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"inst_abc\"");
    }

    #[test]
    fn with_attr_accumulates() {
        let node = Node::new(NodeId::goal("g"), NodeKind::Goal, "Trip")
            .with_attr("target", 500.0)
            .with_attr("current", 120.5);
        assert_eq!(node.attributes.len(), 2);
        assert_eq!(node.attributes["target"], serde_json::json!(500.0));
    }

    #[test]
    fn kinds_serialize_snake_case() {
        assert_eq!(
            serde_json::to_string(&NodeKind::Institution).unwrap(),
            "\"institution\""
        );
        assert_eq!(
            serde_json::to_string(&EdgeKind::CoOccurrence).unwrap(),
            "\"co_occurrence\""
        );
        assert_eq!(
            serde_json::to_string(&EdgeKind::InactiveAllocation).unwrap(),
            "\"inactive_allocation\""
        );
    }
}
