//! Data transfer objects for web requests and responses.

use serde::{Deserialize, Serialize};

use crate::graph::{StationGraph, StationNode};
use crate::network::{CacheStatus, Network};
use crate::rank::Ranking;
use crate::routing::{RouteComparison, RoutePlan};

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,

    /// Hex digest of the loaded feed
    pub digest: String,

    pub stations: usize,
    pub edges: usize,

    /// Whether graph and ranking came from the disk cache
    pub cache: CacheStatus,
}

impl HealthResponse {
    pub fn from_network(network: &Network) -> Self {
        Self {
            status: "ok",
            digest: network.digest().to_hex(),
            stations: network.graph().node_count(),
            edges: network.graph().edge_count(),
            cache: network.status(),
        }
    }
}

/// A station with its scores.
#[derive(Debug, Serialize)]
pub struct StationResult {
    /// Station key (e.g. "station:8000105")
    pub key: String,

    /// Display name
    pub name: String,

    pub lat: f64,
    pub lon: f64,
    pub pagerank: f64,
    pub risk: f64,
}

impl StationResult {
    pub fn from_node(node: &StationNode, ranking: &Ranking) -> Self {
        Self {
            key: node.key.to_string(),
            name: node.display_name.clone(),
            lat: node.lat,
            lon: node.lon,
            pagerank: ranking.pagerank_of(&node.key).unwrap_or(0.0),
            risk: ranking.risk_of(&node.key),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct StationsResponse {
    pub stations: Vec<StationResult>,
}

/// A directed station edge with endpoint coordinates for drawing.
#[derive(Debug, Serialize)]
pub struct EdgeResult {
    pub from: String,
    pub to: String,
    pub from_lat: f64,
    pub from_lon: f64,
    pub to_lat: f64,
    pub to_lon: f64,

    /// Trips using this edge
    pub freq: u64,

    /// Travel time in seconds
    pub time_sec: f64,
}

impl EdgeResult {
    /// The edge at `index` in `graph`.
    pub fn from_graph(graph: &StationGraph, index: usize) -> Self {
        let edge = graph.edge(index);
        let (from, to) = graph.endpoints()[index];
        let (from, to) = (graph.node(from), graph.node(to));
        Self {
            from: edge.from.to_string(),
            to: edge.to.to_string(),
            from_lat: from.lat,
            from_lon: from.lon,
            to_lat: to.lat,
            to_lon: to.lon,
            freq: edge.freq,
            time_sec: edge.time_sec,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct EdgesResponse {
    pub edges: Vec<EdgeResult>,
}

/// Query for the hub list.
#[derive(Debug, Deserialize)]
pub struct HubsRequest {
    /// Number of hubs (defaults to the configured top-K)
    pub k: Option<usize>,
}

/// A hub with its position in the PageRank order.
#[derive(Debug, Serialize)]
pub struct HubResult {
    /// 1-based rank
    pub rank: usize,

    #[serde(flatten)]
    pub station: StationResult,
}

#[derive(Debug, Serialize)]
pub struct HubsResponse {
    pub hubs: Vec<HubResult>,
}

/// Query for a route comparison.
#[derive(Debug, Deserialize)]
pub struct RouteRequestParams {
    /// Origin station key or exact display name
    pub src: String,

    /// Destination station key or exact display name
    pub dst: String,

    /// Risk penalty (defaults to the configured λ)
    pub lambda: Option<f64>,

    /// Hub set size (defaults to the configured top-K)
    pub top_k: Option<usize>,
}

/// A station on a path.
#[derive(Debug, Serialize)]
pub struct PathStation {
    pub key: String,
    pub name: String,
    pub lat: f64,
    pub lon: f64,
}

/// One route with its metrics.
#[derive(Debug, Serialize)]
pub struct PlanResult {
    pub stations: Vec<PathStation>,

    /// `[lon, lat]` pairs along the path, ready for a line layer
    pub coordinates: Vec<[f64; 2]>,

    pub total_time_sec: f64,
    pub total_time_min: f64,
    pub risk_sum: f64,
    pub hub_count: usize,
}

impl PlanResult {
    pub fn from_plan(plan: &RoutePlan, graph: &StationGraph) -> Self {
        let nodes: Vec<&StationNode> = plan
            .path
            .iter()
            .filter_map(|key| graph.position(key).map(|i| graph.node(i)))
            .collect();

        Self {
            stations: nodes
                .iter()
                .map(|n| PathStation {
                    key: n.key.to_string(),
                    name: n.display_name.clone(),
                    lat: n.lat,
                    lon: n.lon,
                })
                .collect(),
            coordinates: nodes.iter().map(|n| [n.lon, n.lat]).collect(),
            total_time_sec: plan.metrics.total_time_sec,
            total_time_min: plan.metrics.total_time_sec / 60.0,
            risk_sum: plan.metrics.risk_sum,
            hub_count: plan.metrics.hub_count,
        }
    }
}

/// Fastest and robust routes side by side.
#[derive(Debug, Serialize)]
pub struct RouteResponse {
    pub lambda: f64,
    pub fastest: PlanResult,
    pub robust: PlanResult,

    /// Hub keys counted in `hub_count`, best first
    pub hubs: Vec<String>,
}

impl RouteResponse {
    pub fn from_comparison(comparison: &RouteComparison, graph: &StationGraph) -> Self {
        Self {
            lambda: comparison.lambda,
            fastest: PlanResult::from_plan(&comparison.fastest, graph),
            robust: PlanResult::from_plan(&comparison.robust, graph),
            hubs: comparison.hubs.iter().map(|k| k.to_string()).collect(),
        }
    }
}

/// Error response.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::test_support::{graph, key};
    use crate::rank::RankConfig;
    use crate::routing::RouteMetrics;

    #[test]
    fn station_result_carries_scores() {
        let g = graph(&[("A", "B", 1, 60.0), ("B", "A", 1, 60.0)]);
        let ranking = Ranking::compute(&g, &RankConfig::default());
        let result = StationResult::from_node(g.node(0), &ranking);

        assert_eq!(result.key, "name:A");
        assert_eq!(result.name, "A");
        assert!((result.pagerank - 0.5).abs() < 1e-9);
    }

    #[test]
    fn edge_result_has_endpoint_coordinates() {
        let mut nodes = vec![
            crate::graph::test_support::node("A"),
            crate::graph::test_support::node("B"),
        ];
        nodes[0].lat = 1.0;
        nodes[1].lon = 2.0;
        let g = StationGraph::new(
            nodes,
            vec![crate::graph::test_support::edge("A", "B", 3, 90.0)],
        )
        .unwrap();

        let result = EdgeResult::from_graph(&g, 0);
        assert_eq!(result.from_lat, 1.0);
        assert_eq!(result.to_lon, 2.0);
        assert_eq!(result.freq, 3);
    }

    #[test]
    fn plan_result_converts_minutes() {
        let g = graph(&[("A", "B", 1, 90.0)]);
        let plan = RoutePlan {
            path: vec![key("A"), key("B")],
            metrics: RouteMetrics {
                total_time_sec: 90.0,
                risk_sum: 0.0,
                hub_count: 1,
            },
        };

        let result = PlanResult::from_plan(&plan, &g);
        assert_eq!(result.stations.len(), 2);
        assert_eq!(result.coordinates.len(), 2);
        assert_eq!(result.total_time_min, 1.5);
    }

    #[test]
    fn hub_result_flattens_station() {
        let g = graph(&[("A", "B", 1, 60.0)]);
        let ranking = Ranking::compute(&g, &RankConfig::default());
        let hub = HubResult {
            rank: 1,
            station: StationResult::from_node(g.node(1), &ranking),
        };

        let json = serde_json::to_value(&hub).unwrap();
        assert_eq!(json["rank"], 1);
        assert_eq!(json["key"], "name:B");
    }
}
