//! Frequency-weighted power-iteration PageRank.

use tracing::debug;

use crate::graph::StationGraph;

use super::RankConfig;

/// Raw power-iteration output, indexed by node position.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct PowerIteration {
    pub scores: Vec<f64>,
    pub iterations: usize,
    pub converged: bool,
}

/// Run PageRank over `graph`, weighting each edge by its trip frequency.
///
/// Scores start uniform. A node's outgoing mass is split in proportion to
/// edge frequency; nodes with no outgoing frequency spread their mass
/// uniformly over every node. Iteration stops when the L1 change between
/// rounds is below the tolerance, or at the iteration cap.
pub(crate) fn power_iteration(graph: &StationGraph, config: &RankConfig) -> PowerIteration {
    let n = graph.node_count();
    if n == 0 {
        return PowerIteration {
            scores: Vec::new(),
            iterations: 0,
            converged: true,
        };
    }

    let out_weight: Vec<f64> = (0..n)
        .map(|i| {
            graph
                .outgoing(i)
                .iter()
                .map(|link| graph.edge(link.edge).freq as f64)
                .sum()
        })
        .collect();

    let uniform = 1.0 / n as f64;
    let teleport = (1.0 - config.damping) * uniform;
    let mut scores = vec![uniform; n];
    let mut next = vec![0.0; n];

    for iteration in 1..=config.max_iterations {
        let dangling: f64 = scores
            .iter()
            .zip(&out_weight)
            .filter(|&(_, &w)| w <= 0.0)
            .map(|(s, _)| s)
            .sum();

        next.fill(teleport + config.damping * dangling * uniform);

        for (from, &score) in scores.iter().enumerate() {
            let total = out_weight[from];
            if total <= 0.0 {
                continue;
            }
            for link in graph.outgoing(from) {
                let share = graph.edge(link.edge).freq as f64 / total;
                next[link.target] += config.damping * score * share;
            }
        }

        let delta: f64 = next.iter().zip(&scores).map(|(a, b)| (a - b).abs()).sum();
        std::mem::swap(&mut scores, &mut next);

        if delta < config.tolerance {
            debug!(iteration, delta, "pagerank converged");
            return PowerIteration {
                scores,
                iterations: iteration,
                converged: true,
            };
        }
    }

    debug!(
        iterations = config.max_iterations,
        "pagerank hit iteration cap"
    );
    PowerIteration {
        scores,
        iterations: config.max_iterations,
        converged: false,
    }
}

/// Rescale scores linearly to `[0, 1]`.
pub(crate) fn normalize_risk(scores: &[f64], epsilon: f64) -> Vec<f64> {
    let Some(min) = scores.iter().copied().reduce(f64::min) else {
        return Vec::new();
    };
    let max = scores.iter().copied().fold(min, f64::max);
    let spread = max - min + epsilon;
    scores.iter().map(|s| (s - min) / spread).collect()
}
