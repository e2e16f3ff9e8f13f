//! Dense arena graph with id-indexed adjacency.
//!
//! Nodes live in a `Vec` in insertion order with a `HashMap` from id to
//! dense index; adjacency is a `Vec<Vec<AdjEntry>>` over those indices.
//! Undirected graphs mirror each edge into both endpoint lists, so the
//! outgoing list is always the full neighborhood there.

use std::collections::{HashMap, VecDeque};

use crate::error::GraphError;
use crate::model::{EdgeKind, Node, NodeId, NodeKind};

/// One adjacency slot: a neighbor's dense index plus the edge weight.
#[derive(Debug, Clone, Copy)]
pub struct AdjEntry {
    pub neighbor: usize,
    pub weight: f64,
}

/// An edge stored by dense node index.
#[derive(Debug, Clone)]
pub struct Edge {
    pub source: usize,
    pub target: usize,
    pub weight: f64,
    pub kind: EdgeKind,
}

/// In-memory finance graph, built fresh per analysis request.
#[derive(Debug, Default)]
pub struct FinanceGraph {
    directed: bool,
    nodes: Vec<Node>,
    index: HashMap<NodeId, usize>,
    edges: Vec<Edge>,
    /// (source, target) → slot in `edges`; undirected keys are normalized
    /// to (low, high) so both orientations hit the same slot.
    edge_slots: HashMap<(usize, usize), usize>,
    outgoing: Vec<Vec<AdjEntry>>,
    incoming: Vec<Vec<AdjEntry>>,
}

impl FinanceGraph {
    pub fn new(directed: bool) -> Self {
        Self {
            directed,
            ..Self::default()
        }
    }

    pub fn directed(&self) -> bool {
        self.directed
    }

    // ── Construction ─────────────────────────

    /// Insert a node. An id already present keeps its first record; the
    /// node's dense index is returned either way.
    pub fn add_node(&mut self, node: Node) -> usize {
        if let Some(&idx) = self.index.get(&node.id) {
            return idx;
        }
        let idx = self.nodes.len();
        self.index.insert(node.id.clone(), idx);
        self.nodes.push(node);
        self.outgoing.push(Vec::new());
        self.incoming.push(Vec::new());
        idx
    }

    /// Insert or replace the edge between `source` and `target`.
    ///
    /// Fails when either endpoint is absent, the weight is negative, or an
    /// allocation-kind edge connects anything other than an institution and
    /// a goal. Re-adding an existing pair replaces its weight and kind.
    pub fn add_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        weight: f64,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        let s = self.require(source)?;
        let t = self.require(target)?;
        if weight < 0.0 {
            return Err(GraphError::NegativeWeight {
                source: source.clone(),
                target: target.clone(),
                weight,
            });
        }
        if matches!(kind, EdgeKind::Allocation | EdgeKind::InactiveAllocation) {
            let (sk, tk) = (self.nodes[s].kind, self.nodes[t].kind);
            let crosses = matches!(
                (sk, tk),
                (NodeKind::Institution, NodeKind::Goal) | (NodeKind::Goal, NodeKind::Institution)
            );
            if !crosses {
                return Err(GraphError::KindMismatch {
                    source: source.clone(),
                    source_kind: sk,
                    target: target.clone(),
                    target_kind: tk,
                });
            }
        }

        let key = self.slot_key(s, t);
        if let Some(&slot) = self.edge_slots.get(&key) {
            self.edges[slot].weight = weight;
            self.edges[slot].kind = kind;
            self.set_adj_weight(s, t, weight);
        } else {
            self.edge_slots.insert(key, self.edges.len());
            self.edges.push(Edge {
                source: s,
                target: t,
                weight,
                kind,
            });
            self.outgoing[s].push(AdjEntry {
                neighbor: t,
                weight,
            });
            if self.directed {
                self.incoming[t].push(AdjEntry {
                    neighbor: s,
                    weight,
                });
            } else if s != t {
                self.outgoing[t].push(AdjEntry {
                    neighbor: s,
                    weight,
                });
            }
        }
        Ok(())
    }

    /// Add `delta` onto the edge's weight, inserting the edge when the
    /// pair is new. Co-occurrence counts and spending totals build up
    /// through here.
    pub fn accumulate_edge(
        &mut self,
        source: &NodeId,
        target: &NodeId,
        delta: f64,
        kind: EdgeKind,
    ) -> Result<(), GraphError> {
        let s = self.require(source)?;
        let t = self.require(target)?;
        if delta < 0.0 {
            return Err(GraphError::NegativeWeight {
                source: source.clone(),
                target: target.clone(),
                weight: delta,
            });
        }
        let key = self.slot_key(s, t);
        if let Some(&slot) = self.edge_slots.get(&key) {
            let weight = self.edges[slot].weight + delta;
            self.edges[slot].weight = weight;
            self.set_adj_weight(s, t, weight);
            Ok(())
        } else {
            self.add_edge(source, target, delta, kind)
        }
    }

    // ── Lookup ───────────────────────────────

    pub fn contains(&self, id: &NodeId) -> bool {
        self.index.contains_key(id)
    }

    pub fn index_of(&self, id: &NodeId) -> Option<usize> {
        self.index.get(id).copied()
    }

    pub fn get(&self, id: &NodeId) -> Option<&Node> {
        self.index_of(id).map(|idx| &self.nodes[idx])
    }

    pub fn get_mut(&mut self, id: &NodeId) -> Option<&mut Node> {
        let idx = self.index_of(id)?;
        Some(&mut self.nodes[idx])
    }

    pub fn node(&self, idx: usize) -> &Node {
        &self.nodes[idx]
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn has_edge(&self, source: &NodeId, target: &NodeId) -> bool {
        match (self.index_of(source), self.index_of(target)) {
            (Some(s), Some(t)) => self.edge_slots.contains_key(&self.slot_key(s, t)),
            _ => false,
        }
    }

    /// Dense indices of every node of the given kind, in insertion order.
    pub fn kind_indices(&self, kind: NodeKind) -> Vec<usize> {
        self.nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| n.kind == kind)
            .map(|(i, _)| i)
            .collect()
    }

    // ── Adjacency ────────────────────────────

    /// Outgoing entries. For undirected graphs this is the whole
    /// neighborhood.
    pub fn entries_out(&self, idx: usize) -> &[AdjEntry] {
        &self.outgoing[idx]
    }

    pub fn entries_in(&self, idx: usize) -> &[AdjEntry] {
        &self.incoming[idx]
    }

    /// Neighborhood ignoring edge direction.
    pub fn entries_undirected(&self, idx: usize) -> impl Iterator<Item = &AdjEntry> {
        self.outgoing[idx].iter().chain(self.incoming[idx].iter())
    }

    pub fn degree_out(&self, idx: usize) -> usize {
        self.outgoing[idx].len()
    }

    pub fn degree_in(&self, idx: usize) -> usize {
        self.incoming[idx].len()
    }

    /// Incident edge count regardless of direction.
    pub fn degree(&self, idx: usize) -> usize {
        self.outgoing[idx].len() + self.incoming[idx].len()
    }

    /// Sum of incident edge weights regardless of direction.
    pub fn weighted_degree(&self, idx: usize) -> f64 {
        self.entries_undirected(idx).map(|e| e.weight).sum()
    }

    // ── Whole-graph measures ─────────────────

    pub fn total_edge_weight(&self) -> f64 {
        self.edges.iter().map(|e| e.weight).sum()
    }

    /// Edge density: edges over possible edges. 0 for graphs with fewer
    /// than 2 nodes.
    pub fn density(&self) -> f64 {
        let n = self.nodes.len();
        if n < 2 {
            return 0.0;
        }
        let possible = (n * (n - 1)) as f64;
        if self.directed {
            self.edges.len() as f64 / possible
        } else {
            2.0 * self.edges.len() as f64 / possible
        }
    }

    /// Whether every node is reachable from every other, ignoring edge
    /// direction. `false` for the empty graph.
    pub fn is_connected(&self) -> bool {
        let n = self.nodes.len();
        if n == 0 {
            return false;
        }
        let mut seen = vec![false; n];
        let mut queue = VecDeque::new();
        seen[0] = true;
        queue.push_back(0);
        let mut reached = 1;
        while let Some(v) = queue.pop_front() {
            for entry in self.entries_undirected(v) {
                if !seen[entry.neighbor] {
                    seen[entry.neighbor] = true;
                    reached += 1;
                    queue.push_back(entry.neighbor);
                }
            }
        }
        reached == n
    }

    // ── Internals ────────────────────────────

    fn require(&self, id: &NodeId) -> Result<usize, GraphError> {
        self.index_of(id)
            .ok_or_else(|| GraphError::NodeMissing(id.clone()))
    }

    fn slot_key(&self, s: usize, t: usize) -> (usize, usize) {
        if self.directed || s <= t {
            (s, t)
        } else {
            (t, s)
        }
    }

    fn set_adj_weight(&mut self, s: usize, t: usize, weight: f64) {
        update_entry(&mut self.outgoing[s], t, weight);
        if self.directed {
            update_entry(&mut self.incoming[t], s, weight);
        } else if s != t {
            update_entry(&mut self.outgoing[t], s, weight);
        }
    }
}

fn update_entry(list: &mut [AdjEntry], neighbor: usize, weight: f64) {
    if let Some(entry) = list.iter_mut().find(|e| e.neighbor == neighbor) {
        entry.weight = weight;
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
