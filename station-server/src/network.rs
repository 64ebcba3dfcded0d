//! Feed to routable network.
//!
//! Runs the feed through aggregation, station merging and ranking, using the
//! disk cache to skip whichever of the graph and the ranking is already
//! stored for this feed.

use serde::Serialize;
use tracing::{info, warn};

use crate::cache::{CacheKey, DiskCache, GraphParams};
use crate::feed::{FeedDigest, FeedError, FeedSource};
use crate::graph::{DEFAULT_TRAVEL_SECS, EdgeAggregator, GraphBuilder, GraphError, StationGraph, TimeMerge};
use crate::rank::{RankConfig, Ranking};
use crate::routing::{RouteComparison, RouteError, RouteRequest, compare_routes};

/// Errors building a network from a feed.
#[derive(Debug, thiserror::Error)]
pub enum NetworkError {
    #[error(transparent)]
    Feed(#[from] FeedError),

    #[error("inconsistent station graph: {0}")]
    Graph(#[from] GraphError),
}

/// Parameters for the build pipeline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Only the first N trips (in feed order) are aggregated. `None` keeps
    /// every trip.
    pub max_trips: Option<usize>,

    /// How travel times combine when stops merge into stations.
    pub time_merge: TimeMerge,

    /// Travel time for stop pairs with no valid timing sample.
    pub default_travel_secs: f64,

    pub rank: RankConfig,
}

impl PipelineConfig {
    pub fn new(max_trips: Option<usize>) -> Self {
        Self {
            max_trips,
            ..Self::default()
        }
    }

    /// The settings a cached graph must have been built with.
    pub fn graph_params(&self) -> GraphParams {
        GraphParams {
            time_merge: self.time_merge,
            default_travel_secs: self.default_travel_secs,
        }
    }

    pub fn cache_key(&self, digest: FeedDigest) -> CacheKey {
        CacheKey::new(digest, self.max_trips)
    }
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            max_trips: None,
            time_merge: TimeMerge::default(),
            default_travel_secs: DEFAULT_TRAVEL_SECS,
            rank: RankConfig::default(),
        }
    }
}

/// Where a piece of the network came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Provenance {
    Cache,
    Built,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CacheStatus {
    pub graph: Provenance,
    pub ranking: Provenance,
}

/// Aggregate, merge and assemble the station graph from a feed.
pub fn build_station_graph(
    source: &FeedSource,
    config: &PipelineConfig,
) -> Result<StationGraph, NetworkError> {
    let stops = source.stops()?;
    let stop_times = source.stop_times()?;
    info!(
        stops = stops.len(),
        stop_times = stop_times.len(),
        "read feed tables"
    );

    let edges =
        EdgeAggregator::new(config.max_trips, config.default_travel_secs).aggregate(&stop_times);
    let graph = GraphBuilder::new(config.time_merge).build(&stops, &edges)?;
    Ok(graph)
}

/// A station graph with its ranking, ready to route on.
#[derive(Debug, Clone)]
pub struct Network {
    key: CacheKey,
    graph: StationGraph,
    ranking: Ranking,
    status: CacheStatus,
}

impl Network {
    /// Load from cache where possible, building and storing what is missing.
    ///
    /// Cache failures are logged and never fail the load.
    pub fn load(
        source: &FeedSource,
        config: &PipelineConfig,
        cache: Option<&DiskCache>,
    ) -> Result<Self, NetworkError> {
        let key = config.cache_key(source.digest());
        let params = config.graph_params();

        let (graph, graph_from) = match cache.and_then(|c| c.load_graph(&key, &params)) {
            Some(graph) => (graph, Provenance::Cache),
            None => {
                let graph = build_station_graph(source, config)?;
                if !graph.is_usable() {
                    warn!(%key, "feed produced a graph too small to route on");
                }
                if let Some(cache) = cache
                    && let Err(e) = cache.store_graph(&key, &params, &graph)
                {
                    warn!(error = %e, "failed to cache graph");
                }
                (graph, Provenance::Built)
            }
        };

        let cached_ranking = cache.and_then(|c| c.load_ranking(&key, &graph, &config.rank));
        let (ranking, ranking_from) = match cached_ranking {
            Some(ranking) => (ranking, Provenance::Cache),
            None => {
                let ranking = Ranking::compute(&graph, &config.rank);
                if let Some(cache) = cache
                    && let Err(e) = cache.store_ranking(&key, &config.rank, &ranking)
                {
                    warn!(error = %e, "failed to cache ranking");
                }
                (ranking, Provenance::Built)
            }
        };

        let status = CacheStatus {
            graph: graph_from,
            ranking: ranking_from,
        };
        info!(
            %key,
            stations = graph.node_count(),
            edges = graph.edge_count(),
            graph = ?status.graph,
            ranking = ?status.ranking,
            "network ready"
        );

        Ok(Self {
            key,
            graph,
            ranking,
            status,
        })
    }

    pub fn digest(&self) -> FeedDigest {
        self.key.digest()
    }

    pub fn key(&self) -> &CacheKey {
        &self.key
    }

    pub fn graph(&self) -> &StationGraph {
        &self.graph
    }

    pub fn ranking(&self) -> &Ranking {
        &self.ranking
    }

    pub fn status(&self) -> CacheStatus {
        self.status
    }

    /// Fastest and robust routes for `request`.
    pub fn route(&self, request: &RouteRequest) -> Result<RouteComparison, RouteError> {
        compare_routes(&self.graph, &self.ranking, request)
    }
}
