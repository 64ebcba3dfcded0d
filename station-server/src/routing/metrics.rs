//! Path metrics.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::graph::{DEFAULT_TRAVEL_SECS, StationGraph, StationKey};
use crate::rank::Ranking;

/// Summary of a path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteMetrics {
    /// Sum of edge travel times along the path, in seconds
    pub total_time_sec: f64,

    /// Sum of station risk, origin excluded
    pub risk_sum: f64,

    /// Number of path stations in the hub set, endpoints included
    pub hub_count: usize,
}

impl RouteMetrics {
    pub fn measure(
        graph: &StationGraph,
        ranking: &Ranking,
        path: &[StationKey],
        hubs: &BTreeSet<StationKey>,
    ) -> Self {
        Self {
            total_time_sec: path_total_time(graph, path),
            risk_sum: path_risk_sum(ranking, path),
            hub_count: hub_count(path, hubs),
        }
    }
}

/// Sum of `time_sec` over consecutive pairs.
///
/// Zero for paths shorter than two stations. A pair with no edge between
/// them contributes the default travel time.
pub fn path_total_time(graph: &StationGraph, path: &[StationKey]) -> f64 {
    path.windows(2)
        .map(|pair| {
            graph
                .position(&pair[0])
                .zip(graph.position(&pair[1]))
                .and_then(|(from, to)| graph.edge_between(from, to))
                .map_or(DEFAULT_TRAVEL_SECS, |edge| edge.time_sec)
        })
        .sum()
}

/// Sum of risk over every station after the origin.
pub fn path_risk_sum(ranking: &Ranking, path: &[StationKey]) -> f64 {
    path.iter().skip(1).map(|key| ranking.risk_of(key)).sum()
}

/// How many path stations are hubs.
pub fn hub_count(path: &[StationKey], hubs: &BTreeSet<StationKey>) -> usize {
    path.iter().filter(|key| hubs.contains(*key)).count()
}
