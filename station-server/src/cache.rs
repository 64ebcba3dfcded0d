//! Disk cache for built graphs and rankings.
//!
//! Entries are keyed by the feed digest plus the trip cap, and stored as two
//! independent JSON files so a missing or stale ranking can be recomputed
//! without rebuilding the graph. Files are written to a temporary path and
//! renamed into place, so a reader never sees a partial entry.

use std::fmt;
use std::io;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::feed::FeedDigest;
use crate::graph::{
    DEFAULT_TRAVEL_SECS, GraphError, StationEdge, StationGraph, StationNode, TimeMerge,
};
use crate::rank::{RankConfig, Ranking};

/// Errors writing or reading a cache file.
///
/// The cache is an optimization: callers log these and rebuild.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache I/O on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed cache file {}: {source}", .path.display())]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Configuration for the disk cache.
#[derive(Debug, Clone)]
pub struct CacheConfig {
    /// Directory holding the cache files.
    pub dir: PathBuf,
}

impl CacheConfig {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self::new("cache")
    }
}

/// What a cache entry is keyed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct CacheKey {
    digest: FeedDigest,
    max_trips: Option<usize>,
}

impl CacheKey {
    pub fn new(digest: FeedDigest, max_trips: Option<usize>) -> Self {
        Self { digest, max_trips }
    }

    pub fn digest(&self) -> FeedDigest {
        self.digest
    }
}

/// File-name stem: `<hex digest>_trips<n>` or `<hex digest>_alltrips`.
impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.max_trips {
            Some(n) => write!(f, "{}_trips{n}", self.digest),
            None => write!(f, "{}_alltrips", self.digest),
        }
    }
}

/// Build settings a cached graph depends on besides its key.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GraphParams {
    pub time_merge: TimeMerge,
    pub default_travel_secs: f64,
}

impl Default for GraphParams {
    fn default() -> Self {
        Self {
            time_merge: TimeMerge::default(),
            default_travel_secs: DEFAULT_TRAVEL_SECS,
        }
    }
}

/// Persisted station graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphEntry {
    pub digest: FeedDigest,
    pub max_trips: Option<usize>,
    pub params: GraphParams,
    pub nodes: Vec<StationNode>,
    pub edges: Vec<StationEdge>,
}

impl GraphEntry {
    pub fn new(key: &CacheKey, params: GraphParams, graph: &StationGraph) -> Self {
        Self {
            digest: key.digest,
            max_trips: key.max_trips,
            params,
            nodes: graph.nodes().to_vec(),
            edges: graph.edges().to_vec(),
        }
    }

    fn belongs_to(&self, key: &CacheKey) -> bool {
        self.digest == key.digest && self.max_trips == key.max_trips
    }

    /// Whether this entry was built from `key` with `params`.
    pub fn matches(&self, key: &CacheKey, params: &GraphParams) -> bool {
        self.belongs_to(key) && self.params == *params
    }

    /// Reassemble the graph, checking its invariants.
    pub fn into_graph(self) -> Result<StationGraph, GraphError> {
        StationGraph::new(self.nodes, self.edges)
    }
}

/// Persisted PageRank and risk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingEntry {
    pub digest: FeedDigest,
    pub max_trips: Option<usize>,
    pub config: RankConfig,
    pub ranking: Ranking,
}

impl RankingEntry {
    pub fn new(key: &CacheKey, config: RankConfig, ranking: Ranking) -> Self {
        Self {
            digest: key.digest,
            max_trips: key.max_trips,
            config,
            ranking,
        }
    }

    fn belongs_to(&self, key: &CacheKey) -> bool {
        self.digest == key.digest && self.max_trips == key.max_trips
    }

    /// Whether this entry was computed for `key` with `config`.
    pub fn matches(&self, key: &CacheKey, config: &RankConfig) -> bool {
        self.belongs_to(key) && self.config == *config
    }
}

/// A complete entry: graph and ranking for one key.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub graph: GraphEntry,
    pub ranking: RankingEntry,
}

/// JSON files under a cache directory.
#[derive(Debug, Clone)]
pub struct DiskCache {
    config: CacheConfig,
}

impl DiskCache {
    pub fn new(config: CacheConfig) -> Self {
        Self { config }
    }

    pub fn graph_path(&self, key: &CacheKey) -> PathBuf {
        self.config.dir.join(format!("graph_{key}.json"))
    }

    pub fn ranking_path(&self, key: &CacheKey) -> PathBuf {
        self.config.dir.join(format!("ranking_{key}.json"))
    }

    /// Load a routable graph built from `key` with `params`.
    ///
    /// Missing, unreadable, mismatched, inconsistent and unusable entries
    /// are all misses.
    pub fn load_graph(&self, key: &CacheKey, params: &GraphParams) -> Option<StationGraph> {
        let entry: GraphEntry = self.read_logged(&self.graph_path(key))?;
        if !entry.matches(key, params) {
            debug!(%key, "cached graph was built differently, ignoring");
            return None;
        }

        let graph = match entry.into_graph() {
            Ok(graph) => graph,
            Err(e) => {
                warn!(%key, error = %e, "cached graph is inconsistent, ignoring");
                return None;
            }
        };
        if !graph.is_usable() {
            debug!(%key, "cached graph too small to route on, ignoring");
            return None;
        }
        Some(graph)
    }

    pub fn store_graph(
        &self,
        key: &CacheKey,
        params: &GraphParams,
        graph: &StationGraph,
    ) -> Result<(), CacheError> {
        write_json(&self.graph_path(key), &GraphEntry::new(key, *params, graph))
    }

    /// Load a ranking for `graph`, computed with `config`.
    ///
    /// A ranking with out-of-range scores, or one that does not score
    /// exactly the stations of `graph`, is a miss.
    pub fn load_ranking(
        &self,
        key: &CacheKey,
        graph: &StationGraph,
        config: &RankConfig,
    ) -> Option<Ranking> {
        let entry: RankingEntry = self.read_logged(&self.ranking_path(key))?;
        if !entry.matches(key, config) {
            debug!(%key, "cached ranking was computed differently, ignoring");
            return None;
        }
        if !entry.ranking.is_well_formed() {
            warn!(%key, "cached ranking has out-of-range scores, ignoring");
            return None;
        }
        if !entry.ranking.covers(graph) {
            debug!(%key, "cached ranking does not match graph, ignoring");
            return None;
        }
        Some(entry.ranking)
    }

    pub fn store_ranking(
        &self,
        key: &CacheKey,
        config: &RankConfig,
        ranking: &Ranking,
    ) -> Result<(), CacheError> {
        write_json(
            &self.ranking_path(key),
            &RankingEntry::new(key, config.clone(), ranking.clone()),
        )
    }

    /// Read both halves of an entry. `None` unless both exist, parse and
    /// belong to `key`.
    pub fn read(&self, key: &CacheKey) -> Option<CacheEntry> {
        let graph: GraphEntry = self.read_logged(&self.graph_path(key))?;
        let ranking: RankingEntry = self.read_logged(&self.ranking_path(key))?;
        let belongs = graph.belongs_to(key) && ranking.belongs_to(key);
        belongs.then_some(CacheEntry { graph, ranking })
    }

    /// Write both halves of an entry, replacing any existing files.
    pub fn write(&self, key: &CacheKey, entry: &CacheEntry) -> Result<(), CacheError> {
        write_json(&self.graph_path(key), &entry.graph)?;
        write_json(&self.ranking_path(key), &entry.ranking)
    }

    /// Read a file, logging any failure other than absence.
    fn read_logged<T: DeserializeOwned>(&self, path: &Path) -> Option<T> {
        match read_json(path) {
            Ok(value) => value,
            Err(e) => {
                warn!(error = %e, "cache read failed");
                None
            }
        }
    }
}

/// `Ok(None)` when the file does not exist.
fn read_json<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, CacheError> {
    let bytes = match std::fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(source) => {
            return Err(CacheError::Io {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    serde_json::from_slice(&bytes)
        .map(Some)
        .map_err(|source| CacheError::Json {
            path: path.to_path_buf(),
            source,
        })
}

/// Serialize to a sibling temp file, then rename over `path`.
fn write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), CacheError> {
    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: io::Error| CacheError::Io { path, source }
    };

    if let Some(parent) = path.parent()
        && !parent.as_os_str().is_empty()
    {
        std::fs::create_dir_all(parent).map_err(io_err(parent))?;
    }

    let json = serde_json::to_vec_pretty(value).map_err(|source| CacheError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let temp = path.with_extension("json.tmp");
    std::fs::write(&temp, json).map_err(io_err(&temp))?;
    std::fs::rename(&temp, path).map_err(io_err(path))?;

    debug!(path = %path.display(), "wrote cache file");
    Ok(())
}
