//! Fastest and risk-aware routing between stations.
//!
//! The robust path minimises `time_sec(u, v) + λ · risk(v)` per edge, so a
//! larger λ pushes routes away from high-PageRank stations at the cost of
//! travel time. λ = 0 gives the fastest path.

mod config;
mod dijkstra;
mod error;
mod metrics;

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::graph::{StationGraph, StationKey};
use crate::rank::Ranking;

pub use config::RouteConfig;
pub use error::RouteError;
pub use metrics::{RouteMetrics, hub_count, path_risk_sum, path_total_time};

/// Node positions of both endpoints, or `UnknownStation`.
fn endpoints(
    graph: &StationGraph,
    origin: &StationKey,
    destination: &StationKey,
) -> Result<(usize, usize), RouteError> {
    let from = graph
        .position(origin)
        .ok_or_else(|| RouteError::UnknownStation(origin.to_string()))?;
    let to = graph
        .position(destination)
        .ok_or_else(|| RouteError::UnknownStation(destination.to_string()))?;
    Ok((from, to))
}

fn to_keys(graph: &StationGraph, path: Vec<usize>) -> Vec<StationKey> {
    path.into_iter().map(|i| graph.node(i).key.clone()).collect()
}

/// Minimum total travel time path.
pub fn fastest_path(
    graph: &StationGraph,
    origin: &StationKey,
    destination: &StationKey,
) -> Result<Vec<StationKey>, RouteError> {
    let (from, to) = endpoints(graph, origin, destination)?;

    let path = dijkstra::shortest_path(graph, from, to, |edge, _| edge.time_sec).ok_or_else(|| {
        RouteError::NoPath {
            from: origin.clone(),
            to: destination.clone(),
        }
    })?;
    Ok(to_keys(graph, path))
}

/// Minimum `time + λ · risk` path, charging each station's risk on entry.
pub fn robust_path(
    graph: &StationGraph,
    ranking: &Ranking,
    origin: &StationKey,
    destination: &StationKey,
    lambda: f64,
) -> Result<Vec<StationKey>, RouteError> {
    if !lambda.is_finite() || lambda < 0.0 {
        return Err(RouteError::InvalidPenalty(lambda));
    }
    let (from, to) = endpoints(graph, origin, destination)?;
    let risk = ranking.risk_by_position(graph);

    let path = dijkstra::shortest_path(graph, from, to, |edge, target| {
        edge.time_sec + lambda * risk[target]
    })
    .ok_or_else(|| RouteError::NoPath {
        from: origin.clone(),
        to: destination.clone(),
    })?;
    Ok(to_keys(graph, path))
}

/// A path and its metrics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutePlan {
    pub path: Vec<StationKey>,
    pub metrics: RouteMetrics,
}

/// Parameters for comparing the two routes between a pair of stations.
#[derive(Debug, Clone, PartialEq)]
pub struct RouteRequest {
    pub origin: StationKey,
    pub destination: StationKey,

    /// Risk penalty for the robust path
    pub lambda: f64,

    /// Size of the hub set used for `hub_count`
    pub top_k: usize,
}

impl RouteRequest {
    /// A request using the penalty and hub count from `config`.
    pub fn new(origin: StationKey, destination: StationKey, config: &RouteConfig) -> Self {
        Self {
            origin,
            destination,
            lambda: config.lambda,
            top_k: config.top_k,
        }
    }
}

/// Fastest and robust plans for one request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteComparison {
    pub lambda: f64,
    pub fastest: RoutePlan,
    pub robust: RoutePlan,

    /// Hubs used for counting, best first
    pub hubs: Vec<StationKey>,
}

/// Compute both plans. Either failing fails the whole comparison.
pub fn compare_routes(
    graph: &StationGraph,
    ranking: &Ranking,
    request: &RouteRequest,
) -> Result<RouteComparison, RouteError> {
    let fastest = fastest_path(graph, &request.origin, &request.destination)?;
    let robust = robust_path(
        graph,
        ranking,
        &request.origin,
        &request.destination,
        request.lambda,
    )?;

    let hubs: Vec<StationKey> = ranking
        .top_hubs(request.top_k)
        .into_iter()
        .map(|(key, _)| key)
        .collect();
    let hub_set: BTreeSet<StationKey> = hubs.iter().cloned().collect();

    let plan = |path: Vec<StationKey>| RoutePlan {
        metrics: RouteMetrics::measure(graph, ranking, &path, &hub_set),
        path,
    };
    let comparison = RouteComparison {
        lambda: request.lambda,
        fastest: plan(fastest),
        robust: plan(robust),
        hubs,
    };

    debug!(
        origin = %request.origin,
        destination = %request.destination,
        fastest_secs = comparison.fastest.metrics.total_time_sec,
        robust_secs = comparison.robust.metrics.total_time_sec,
        "compared routes"
    );
    Ok(comparison)
}
