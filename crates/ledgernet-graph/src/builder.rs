//! Builders for the three analysis graphs.
//!
//! Each builder consumes the raw record slices and produces a fresh
//! [`FinanceGraph`]; empty input yields an empty graph. Node ids use the
//! prefixed forms from [`NodeId`], so metric maps and serialized output
//! stay joinable across rebuilds.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use ledgernet_core::{Goal, Institution, Transaction};

use crate::error::GraphError;
use crate::graph::FinanceGraph;
use crate::model::{EdgeKind, Node, NodeId, NodeKind};

/// Directed money-flow graph: institutions, goals, and spending categories.
///
/// Allocation edges carry the capital actually committed: the allocation
/// percentage applied to the institution's current balance (overdrawn
/// balances commit nothing). Spending edges carry summed withdrawal
/// amounts per category, originating at the linked goal when the
/// withdrawal belongs to one, else at the institution.
pub fn financial_flow(
    transactions: &[Transaction],
    institutions: &[Institution],
    goals: &[Goal],
) -> Result<FinanceGraph, GraphError> {
    let mut graph = FinanceGraph::new(true);

    for inst in institutions {
        graph.add_node(
            Node::new(
                NodeId::institution(&inst.institution_id),
                NodeKind::Institution,
                &inst.institution_name,
            )
            .with_attr("balance", inst.current_balance),
        );
    }

    for goal in goals {
        graph.add_node(
            Node::new(NodeId::goal(&goal.goal_id), NodeKind::Goal, &goal.name)
                .with_attr("target", goal.target_amount)
                .with_attr("current", goal.current_amount(institutions)),
        );
    }

    // Withdrawals originate at their linked goal when they have one.
    let mut txn_to_goal: HashMap<&str, NodeId> = HashMap::new();
    for goal in goals {
        for txn_id in &goal.linked_transactions {
            txn_to_goal.insert(txn_id.as_str(), NodeId::goal(&goal.goal_id));
        }
    }

    // Category nodes for every tag seen; spending flows for withdrawals only.
    let mut flows: BTreeMap<(NodeId, NodeId), f64> = BTreeMap::new();
    for txn in transactions {
        for tag in &txn.tags {
            graph.add_node(Node::new(NodeId::category(tag), NodeKind::Category, tag));
            if txn.is_withdrawal() {
                let source = txn_to_goal
                    .get(txn.transaction_id.as_str())
                    .cloned()
                    .unwrap_or_else(|| NodeId::institution(&txn.institution_id));
                *flows.entry((source, NodeId::category(tag))).or_default() += txn.amount;
            }
        }
    }
    for ((source, category), amount) in &flows {
        if graph.contains(source) {
            graph.add_edge(source, category, *amount, EdgeKind::Spending)?;
        }
    }

    // Committed capital: allocation percent of the current balance.
    for goal in goals {
        let goal_node = NodeId::goal(&goal.goal_id);
        for (inst_id, percent) in &goal.linked_institutions {
            if let Some(inst) = institutions
                .iter()
                .find(|i| &i.institution_id == inst_id)
            {
                let weight = inst.current_balance.max(0.0) * percent / 100.0;
                graph.add_edge(
                    &NodeId::institution(inst_id),
                    &goal_node,
                    weight,
                    EdgeKind::Allocation,
                )?;
            }
        }
    }

    // Inactive goals keep a zero-weight link to the institutions their
    // recorded transactions moved through.
    let txn_by_id: HashMap<&str, &Transaction> = transactions
        .iter()
        .map(|t| (t.transaction_id.as_str(), t))
        .collect();
    for goal in goals.iter().filter(|g| !g.is_active) {
        let goal_node = NodeId::goal(&goal.goal_id);
        for txn_id in &goal.linked_transactions {
            if let Some(txn) = txn_by_id.get(txn_id.as_str()) {
                let inst_node = NodeId::institution(&txn.institution_id);
                if graph.contains(&inst_node) && !graph.has_edge(&inst_node, &goal_node) {
                    graph.add_edge(&inst_node, &goal_node, 0.0, EdgeKind::InactiveAllocation)?;
                }
            }
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "financial flow graph built"
    );
    Ok(graph)
}

/// Undirected bipartite graph of goals and the institutions funding them,
/// with auxiliary tag nodes for where the money went.
///
/// Active goals link through their allocation map (weight = percent);
/// inactive goals link through their recorded transactions (weight =
/// summed amounts) when no allocation edge exists already.
pub fn goal_institution(
    institutions: &[Institution],
    goals: &[Goal],
    transactions: &[Transaction],
) -> Result<FinanceGraph, GraphError> {
    let mut graph = FinanceGraph::new(false);

    for inst in institutions {
        graph.add_node(
            Node::new(
                NodeId::institution(&inst.institution_id),
                NodeKind::Institution,
                &inst.institution_name,
            )
            .with_attr("balance", inst.current_balance),
        );
    }

    for goal in goals {
        let goal_node = NodeId::goal(&goal.goal_id);
        graph.add_node(
            Node::new(goal_node.clone(), NodeKind::Goal, &goal.name)
                .with_attr("target", goal.target_amount)
                .with_attr("current", goal.current_amount(institutions))
                .with_attr("is_completed", goal.is_completed)
                .with_attr("is_active", goal.is_active),
        );
        for (inst_id, percent) in &goal.linked_institutions {
            let inst_node = NodeId::institution(inst_id);
            if graph.contains(&inst_node) {
                graph.add_edge(&inst_node, &goal_node, *percent, EdgeKind::Allocation)?;
            }
        }
    }

    let txn_by_id: HashMap<&str, &Transaction> = transactions
        .iter()
        .map(|t| (t.transaction_id.as_str(), t))
        .collect();

    // Inactive goals: edge weight is the real money moved, summed per
    // institution before any edge is added.
    for goal in goals
        .iter()
        .filter(|g| !g.is_active && !g.linked_transactions.is_empty())
    {
        let goal_node = NodeId::goal(&goal.goal_id);
        let mut inst_amounts: BTreeMap<&str, f64> = BTreeMap::new();
        for txn_id in &goal.linked_transactions {
            if let Some(txn) = txn_by_id.get(txn_id.as_str()) {
                *inst_amounts.entry(txn.institution_id.as_str()).or_default() += txn.amount;
            }
        }
        for (inst_id, amount) in inst_amounts {
            let inst_node = NodeId::institution(inst_id);
            if graph.contains(&inst_node) && !graph.has_edge(&inst_node, &goal_node) {
                graph.add_edge(&inst_node, &goal_node, amount, EdgeKind::InactiveAllocation)?;
            }
        }
    }

    // Aggregated tag nodes: goal-linked transactions hang off their goal,
    // everything else off its institution. The goal-completion tag is
    // skipped because the allocation edge already represents that flow.
    let mut txn_to_goal: HashMap<&str, NodeId> = HashMap::new();
    for goal in goals {
        for txn_id in &goal.linked_transactions {
            txn_to_goal.insert(txn_id.as_str(), NodeId::goal(&goal.goal_id));
        }
    }
    let mut tag_flows: BTreeMap<(NodeId, String), f64> = BTreeMap::new();
    for txn in transactions {
        let source = match txn_to_goal.get(txn.transaction_id.as_str()) {
            Some(goal_node) => goal_node.clone(),
            None => {
                let inst_node = NodeId::institution(&txn.institution_id);
                if !graph.contains(&inst_node) {
                    continue;
                }
                inst_node
            }
        };
        for tag in &txn.tags {
            if tag == "goal-completion" {
                continue;
            }
            *tag_flows.entry((source.clone(), tag.clone())).or_default() += txn.amount;
        }
    }
    for ((source, tag), total) in &tag_flows {
        let tag_node = NodeId::tag(tag);
        graph.add_node(Node::new(tag_node.clone(), NodeKind::Tag, tag.as_str()));
        graph.accumulate_edge(source, &tag_node, *total, EdgeKind::Spending)?;
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "goal-institution graph built"
    );
    Ok(graph)
}

/// Undirected tag co-occurrence network.
///
/// One node per distinct tag (carrying the total amount moved under it);
/// an edge between two tags counts the transactions they appear on
/// together, accumulated across the whole input.
pub fn tag_network(transactions: &[Transaction]) -> Result<FinanceGraph, GraphError> {
    let mut graph = FinanceGraph::new(false);

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    let mut pairs: BTreeMap<(String, String), f64> = BTreeMap::new();

    for txn in transactions {
        let mut tags: Vec<&str> = txn.tags.iter().map(String::as_str).collect();
        tags.sort_unstable();
        tags.dedup(); // a tag never pairs with itself
        for tag in &tags {
            graph.add_node(Node::new(NodeId::tag(tag), NodeKind::Tag, *tag));
            *totals.entry(tag.to_string()).or_default() += txn.amount;
        }
        for (i, a) in tags.iter().enumerate() {
            for b in &tags[i + 1..] {
                *pairs.entry((a.to_string(), b.to_string())).or_default() += 1.0;
            }
        }
    }

    for ((a, b), count) in &pairs {
        graph.add_edge(&NodeId::tag(a), &NodeId::tag(b), *count, EdgeKind::CoOccurrence)?;
    }
    for (tag, amount) in &totals {
        if let Some(node) = graph.get_mut(&NodeId::tag(tag)) {
            node.attributes
                .insert("total_amount".to_string(), (*amount).into());
        }
    }

    debug!(
        nodes = graph.node_count(),
        edges = graph.edge_count(),
        "tag network built"
    );
    Ok(graph)
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
