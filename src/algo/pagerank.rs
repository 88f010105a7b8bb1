//! Weighted undirected graph and pagerank iteration.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
#[serde(default)]
pub struct PageRankConfig {
    pub damping: f64,
    /// Iteration stops once no node's rank moves by this much or more.
    pub tolerance: f64,
    /// Hard cap on iterations.
    pub max_iterations: usize,
}

impl Default for PageRankConfig {
    fn default() -> Self {
        Self {
            damping: 0.85,
            tolerance: 1e-6,
            max_iterations: 10_000,
        }
    }
}

/// Undirected weighted graph over external node ids. Node order is
/// insertion order.
#[derive(Debug, Clone, Default)]
pub struct WeightedGraph {
    nodes: Vec<usize>,
    index: HashMap<usize, usize>,
    adjacency: Vec<Vec<(usize, f64)>>,
}

/// Result of a pagerank run. Ranks sum to 1 and are keyed by node id in
/// insertion order.
#[derive(Debug, Clone)]
pub struct PageRank {
    pub ranks: IndexMap<usize, f64>,
    pub iterations: usize,
    pub converged: bool,
}

impl WeightedGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a node if absent; returns its internal position.
    pub fn add_node(&mut self, id: usize) -> usize {
        if let Some(&pos) = self.index.get(&id) {
            return pos;
        }
        let pos = self.nodes.len();
        self.nodes.push(id);
        self.index.insert(id, pos);
        self.adjacency.push(Vec::new());
        pos
    }

    /// Add an undirected edge. Self-loops and edges without positive finite
    /// weight carry no rank and are not stored.
    pub fn link(&mut self, a: usize, b: usize, weight: f64) {
        let pa = self.add_node(a);
        let pb = self.add_node(b);
        if pa == pb || !(weight.is_finite() && weight > 0.0) {
            return;
        }
        self.adjacency[pa].push((pb, weight));
        self.adjacency[pb].push((pa, weight));
    }

    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    pub fn edge_count(&self) -> usize {
        self.adjacency.iter().map(Vec::len).sum::<usize>() / 2
    }

    /// Iterate pagerank until the largest per-node change falls below
    /// `config.tolerance`. Rank held by nodes without edges is spread evenly
    /// over all nodes.
    pub fn rank(&self, config: &PageRankConfig) -> PageRank {
        let n = self.nodes.len();
        if n == 0 {
            return PageRank {
                ranks: IndexMap::new(),
                iterations: 0,
                converged: true,
            };
        }

        let uniform = 1.0 / n as f64;
        let out_weight: Vec<f64> = self
            .adjacency
            .iter()
            .map(|edges| edges.iter().map(|(_, w)| w).sum())
            .collect();

        let d = config.damping;
        let mut ranks = vec![uniform; n];
        let mut next = vec![0.0; n];
        let mut iterations = 0;
        let mut converged = false;

        while iterations < config.max_iterations {
            iterations += 1;

            let leak: f64 = (0..n)
                .filter(|&i| out_weight[i] == 0.0)
                .map(|i| ranks[i])
                .sum();
            let base = (1.0 - d) * uniform + d * leak * uniform;

            for (i, slot) in next.iter_mut().enumerate() {
                let inflow: f64 = self.adjacency[i]
                    .iter()
                    .map(|&(j, w)| ranks[j] * w / out_weight[j])
                    .sum();
                *slot = base + d * inflow;
            }

            let delta = ranks
                .iter()
                .zip(&next)
                .map(|(old, new)| (new - old).abs())
                .fold(0.0, f64::max);
            std::mem::swap(&mut ranks, &mut next);

            if delta < config.tolerance {
                converged = true;
                break;
            }
        }

        if converged {
            debug!("Pagerank converged - nodes={}, iterations={}", n, iterations);
        } else {
            warn!(
                "Pagerank stopped before converging - nodes={}, iterations={}",
                n, iterations
            );
        }

        PageRank {
            ranks: self.nodes.iter().copied().zip(ranks).collect(),
            iterations,
            converged,
        }
    }
}

/// Node ids sorted by descending rank; ties keep insertion order.
pub fn ranked_nodes(ranks: &IndexMap<usize, f64>) -> Vec<usize> {
    let mut entries: Vec<(usize, f64)> = ranks.iter().map(|(&k, &v)| (k, v)).collect();
    entries.sort_by(|a, b| b.1.partial_cmp(&a.1).unwrap_or(std::cmp::Ordering::Equal));
    entries.into_iter().map(|(k, _)| k).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn total(ranks: &IndexMap<usize, f64>) -> f64 {
        ranks.values().sum()
    }

    #[test]
    fn empty_graph() {
        let g = WeightedGraph::new();
        let pr = g.rank(&PageRankConfig::default());
        assert!(pr.ranks.is_empty());
        assert!(pr.converged);
    }

    #[test]
    fn single_node_holds_all_rank() {
        let mut g = WeightedGraph::new();
        g.add_node(7);
        let pr = g.rank(&PageRankConfig::default());
        assert!((pr.ranks[&7] - 1.0).abs() < 1e-9);
    }

    #[test]
    fn zero_weight_pair_splits_evenly() {
        let mut g = WeightedGraph::new();
        g.link(3, 9, 0.0);
        assert_eq!(g.node_count(), 2);
        assert_eq!(g.edge_count(), 0);
        let pr = g.rank(&PageRankConfig::default());
        assert!((pr.ranks[&3] - 0.5).abs() < 1e-6);
        assert!((pr.ranks[&9] - 0.5).abs() < 1e-6);
    }

    #[test]
    fn hub_ranks_highest() {
        let mut g = WeightedGraph::new();
        g.link(0, 1, 1.0);
        g.link(0, 2, 1.0);
        g.link(0, 3, 1.0);
        let pr = g.rank(&PageRankConfig::default());
        assert!(pr.converged);
        assert_eq!(ranked_nodes(&pr.ranks)[0], 0);
        assert!((total(&pr.ranks) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn heavier_edges_attract_rank() {
        let mut g = WeightedGraph::new();
        g.link(0, 1, 5.0);
        g.link(1, 2, 0.1);
        g.link(2, 3, 0.1);
        let pr = g.rank(&PageRankConfig::default());
        assert!(pr.ranks[&1] > pr.ranks[&3]);
    }

    #[test]
    fn self_loops_are_ignored() {
        let mut g = WeightedGraph::new();
        g.link(4, 4, 1.0);
        assert_eq!(g.node_count(), 1);
        assert_eq!(g.edge_count(), 0);
    }

    #[test]
    fn ranked_nodes_ties_keep_insertion_order() {
        let ranks: IndexMap<usize, f64> = [(5, 0.25), (2, 0.5), (8, 0.25)].into_iter().collect();
        assert_eq!(ranked_nodes(&ranks), vec![2, 5, 8]);
    }

    #[test]
    fn iteration_cap_is_respected() {
        let mut g = WeightedGraph::new();
        g.link(0, 1, 1.0);
        g.link(1, 2, 3.0);
        let config = PageRankConfig {
            max_iterations: 1,
            tolerance: 0.0,
            ..PageRankConfig::default()
        };
        let pr = g.rank(&config);
        assert_eq!(pr.iterations, 1);
        assert!(!pr.converged);
    }
}
