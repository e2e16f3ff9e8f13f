//! PageRank over weighted finance graphs.
//!
//! Rank flows along out-edges in proportion to edge weight. Directed
//! graphs keep their direction; undirected graphs treat every edge as a
//! pair of opposing links. Dangling nodes (no outgoing weight) spread
//! their rank uniformly, so the scores always form a probability
//! distribution.

use ledgernet_graph::{FinanceGraph, MetricResult};

/// Iteration bounds for [`pagerank`]. Injectable so small synthetic
/// graphs can exercise the convergence path.
#[derive(Debug, Clone, Copy)]
pub struct PageRankConfig {
    /// Probability of following an edge rather than teleporting.
    pub damping: f64,
    /// Hard iteration cap.
    pub max_iterations: usize,
    /// L1 convergence threshold between successive iterations.
    pub tolerance: f64,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            max_iterations: 100,
            tolerance: 1e-6,
        }
    }
}

/// Scores plus how the iteration ended.
#[derive(Debug, Clone)]
pub struct PageRankResult {
    pub scores: MetricResult,
    pub iterations: usize,
    pub converged: bool,
}

/// Iterate rank to a fixed point under `config`.
///
/// Empty graphs produce an empty score map with zero iterations.
pub fn pagerank(graph: &FinanceGraph, config: &PageRankConfig) -> PageRankResult {
    let n = graph.node_count();
    if n == 0 {
        return PageRankResult {
            scores: MetricResult::new(),
            iterations: 0,
            converged: true,
        };
    }

    let nf = n as f64;
    let out_weight: Vec<f64> = (0..n)
        .map(|v| graph.entries_out(v).iter().map(|e| e.weight).sum())
        .collect();

    let mut rank = vec![1.0 / nf; n];
    let mut next = vec![0.0; n];
    let mut iterations = 0;
    let mut converged = false;

    for _ in 0..config.max_iterations {
        iterations += 1;

        // Zero-weight out-neighborhoods count as dangling so no rank
        // is lost to a 0/0 share.
        let dangling_mass: f64 = (0..n)
            .filter(|&v| out_weight[v] <= 0.0)
            .map(|v| rank[v])
            .sum();
        let base = (1.0 - config.damping) / nf + config.damping * dangling_mass / nf;

        next.fill(base);
        for v in 0..n {
            if out_weight[v] <= 0.0 {
                continue;
            }
            let share = config.damping * rank[v] / out_weight[v];
            for entry in graph.entries_out(v) {
                next[entry.neighbor] += share * entry.weight;
            }
        }

        let delta: f64 = rank
            .iter()
            .zip(next.iter())
            .map(|(a, b)| (a - b).abs())
            .sum();
        std::mem::swap(&mut rank, &mut next);

        if delta < config.tolerance {
            converged = true;
            break;
        }
    }

    let scores = graph
        .nodes()
        .iter()
        .enumerate()
        .map(|(idx, node)| (node.id.clone(), rank[idx]))
        .collect();
    PageRankResult {
        scores,
        iterations,
        converged,
    }
}

// ─────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────
