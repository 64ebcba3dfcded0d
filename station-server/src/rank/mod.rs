//! Station importance and risk.
//!
//! PageRank over trip frequency measures how central a station is to the
//! network; risk rescales it to `[0, 1]` so routing can steer around the
//! most critical stations.

mod config;
mod pagerank;

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::graph::{StationGraph, StationKey};

pub use config::RankConfig;

/// PageRank and risk per station.
///
/// Maps are ordered by key, so serializing a ranking is deterministic.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ranking {
    /// Damping factor the scores were computed with
    pub damping: f64,

    /// Power-iteration rounds run
    pub iterations: usize,

    /// Whether the tolerance was reached before the iteration cap
    pub converged: bool,

    pub pagerank: BTreeMap<StationKey, f64>,
    pub risk: BTreeMap<StationKey, f64>,
}

impl Ranking {
    /// Compute PageRank and risk for every station in `graph`.
    ///
    /// An empty graph gives empty maps.
    pub fn compute(graph: &StationGraph, config: &RankConfig) -> Self {
        let result = pagerank::power_iteration(graph, config);
        let risk = pagerank::normalize_risk(&result.scores, config.risk_epsilon);

        let keys = graph.nodes().iter().map(|n| n.key.clone());
        let ranking = Self {
            damping: config.damping,
            iterations: result.iterations,
            converged: result.converged,
            pagerank: keys.clone().zip(result.scores).collect(),
            risk: keys.zip(risk).collect(),
        };

        info!(
            stations = ranking.pagerank.len(),
            iterations = ranking.iterations,
            converged = ranking.converged,
            "computed pagerank"
        );
        ranking
    }

    /// Ranking of an empty graph.
    pub fn empty(config: &RankConfig) -> Self {
        Self {
            damping: config.damping,
            iterations: 0,
            converged: true,
            pagerank: BTreeMap::new(),
            risk: BTreeMap::new(),
        }
    }

    pub fn pagerank_of(&self, key: &StationKey) -> Option<f64> {
        self.pagerank.get(key).copied()
    }

    /// Risk of a station; stations not in the ranking count as zero risk.
    pub fn risk_of(&self, key: &StationKey) -> f64 {
        self.risk.get(key).copied().unwrap_or(0.0)
    }

    /// The `k` highest-PageRank stations, best first. Ties go to the
    /// smaller key.
    pub fn top_hubs(&self, k: usize) -> Vec<(StationKey, f64)> {
        let mut ranked: Vec<_> = self.pagerank.iter().map(|(k, v)| (k.clone(), *v)).collect();
        ranked.sort_by(|(ka, a), (kb, b)| b.total_cmp(a).then_with(|| ka.cmp(kb)));
        ranked.truncate(k);
        ranked
    }

    /// Keys of the top `k` hubs.
    pub fn hub_set(&self, k: usize) -> BTreeSet<StationKey> {
        self.top_hubs(k).into_iter().map(|(key, _)| key).collect()
    }

    /// Whether this ranking has a score for exactly the stations of `graph`.
    pub fn covers(&self, graph: &StationGraph) -> bool {
        self.pagerank.len() == graph.node_count()
            && self.risk.len() == graph.node_count()
            && graph
                .nodes()
                .iter()
                .all(|n| self.pagerank.contains_key(&n.key) && self.risk.contains_key(&n.key))
    }

    /// Whether every score is in range: PageRank finite and non-negative,
    /// risk within `[0, 1]`.
    pub fn is_well_formed(&self) -> bool {
        self.pagerank.values().all(|p| p.is_finite() && *p >= 0.0)
            && self.risk.values().all(|r| (0.0..=1.0).contains(r))
    }

    /// Risk values in node order, for indexed lookup during routing.
    pub(crate) fn risk_by_position(&self, graph: &StationGraph) -> Vec<f64> {
        graph.nodes().iter().map(|n| self.risk_of(&n.key)).collect()
    }
}
