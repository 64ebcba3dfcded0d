//! Station-level transit graph.
//!
//! Stop-time records are aggregated into stop-pair statistics
//! ([`EdgeAggregator`]), then stops are collapsed into logical stations and
//! the pairs folded into one weighted directed graph ([`GraphBuilder`]).

mod builder;
mod edges;
mod error;
mod station;

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};

pub use builder::{GraphBuilder, TimeMerge, UnknownTimeMerge};
pub use edges::{DEFAULT_TRAVEL_SECS, DirectedEdgeStat, EdgeAggregator};
pub use error::GraphError;
pub use station::{StationDirectory, StationKey, StationNode, normalize_stop_id};

/// A directed station-to-station connection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationEdge {
    pub from: StationKey,
    pub to: StationKey,

    /// Sum of the trip counts of every stop pair merged into this edge
    pub freq: u64,

    /// Travel time in seconds
    pub time_sec: f64,
}

/// An outgoing adjacency entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Node index of the edge's head
    pub target: usize,

    /// Index into [`StationGraph::edges`]
    pub edge: usize,
}

/// Weighted directed graph over stations.
///
/// Nodes and edges keep the order they were given in; algorithms address
/// them by position. Every edge endpoint is a node. Every edge has
/// `freq >= 1` and a finite, non-negative `time_sec`, and each ordered
/// station pair has at most one edge.
#[derive(Debug, Clone, Default)]
pub struct StationGraph {
    nodes: Vec<StationNode>,
    edges: Vec<StationEdge>,
    positions: HashMap<StationKey, usize>,
    endpoints: Vec<(usize, usize)>,
    outgoing: Vec<Vec<Link>>,
}

impl StationGraph {
    /// Assemble a graph, checking the invariants.
    pub fn new(nodes: Vec<StationNode>, edges: Vec<StationEdge>) -> Result<Self, GraphError> {
        let mut positions = HashMap::with_capacity(nodes.len());
        for (i, node) in nodes.iter().enumerate() {
            if positions.insert(node.key.clone(), i).is_some() {
                return Err(GraphError::DuplicateStation(node.key.clone()));
            }
        }

        let mut endpoints = Vec::with_capacity(edges.len());
        let mut outgoing = vec![Vec::new(); nodes.len()];
        let mut seen = HashSet::with_capacity(edges.len());

        for (i, edge) in edges.iter().enumerate() {
            let from = *positions
                .get(&edge.from)
                .ok_or_else(|| GraphError::UnknownEndpoint(edge.from.clone()))?;
            let to = *positions
                .get(&edge.to)
                .ok_or_else(|| GraphError::UnknownEndpoint(edge.to.clone()))?;

            if edge.freq == 0 {
                return Err(GraphError::ZeroFrequency {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }
            if !(edge.time_sec.is_finite() && edge.time_sec >= 0.0) {
                return Err(GraphError::InvalidTravelTime {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                    time_sec: edge.time_sec,
                });
            }
            if !seen.insert((from, to)) {
                return Err(GraphError::DuplicateEdge {
                    from: edge.from.clone(),
                    to: edge.to.clone(),
                });
            }

            endpoints.push((from, to));
            outgoing[from].push(Link {
                target: to,
                edge: i,
            });
        }

        Ok(Self {
            nodes,
            edges,
            positions,
            endpoints,
            outgoing,
        })
    }

    /// Number of stations.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of directed edges.
    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    /// True if there are no stations.
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether the graph has enough structure to route on: at least two
    /// stations and one edge.
    pub fn is_usable(&self) -> bool {
        self.nodes.len() >= 2 && !self.edges.is_empty()
    }

    pub fn nodes(&self) -> &[StationNode] {
        &self.nodes
    }

    pub fn edges(&self) -> &[StationEdge] {
        &self.edges
    }

    pub fn node(&self, index: usize) -> &StationNode {
        &self.nodes[index]
    }

    pub fn edge(&self, index: usize) -> &StationEdge {
        &self.edges[index]
    }

    /// Node index of a station.
    pub fn position(&self, key: &StationKey) -> Option<usize> {
        self.positions.get(key).copied()
    }

    /// Find a station by key, falling back to an exact display-name match.
    ///
    /// Display names are not unique; the first node in graph order wins.
    pub fn lookup(&self, query: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| n.key.as_str() == query)
            .or_else(|| self.nodes.iter().position(|n| n.display_name == query))
    }

    /// Outgoing links of a node.
    pub fn outgoing(&self, index: usize) -> &[Link] {
        &self.outgoing[index]
    }

    /// `(from, to)` node indices of every edge, parallel to [`Self::edges`].
    pub fn endpoints(&self) -> &[(usize, usize)] {
        &self.endpoints
    }

    /// The edge between two nodes, if any.
    pub fn edge_between(&self, from: usize, to: usize) -> Option<&StationEdge> {
        self.outgoing
            .get(from)?
            .iter()
            .find(|link| link.target == to)
            .map(|link| &self.edges[link.edge])
    }
}


#[cfg(test)]
mod tests {
    use super::test_support::*;
    use super::*;

    #[test]
    fn indexes_edges() {
        let g = graph(&[("A", "B", 2, 60.0), ("B", "C", 1, 30.0), ("A", "C", 1, 200.0)]);
        assert_eq!(g.node_count(), 3);
        assert_eq!(g.edge_count(), 3);

        let a = g.position(&key("A")).unwrap();
        let c = g.position(&key("C")).unwrap();
        assert_eq!(g.outgoing(a).len(), 2);
        assert_eq!(g.edge_between(a, c).unwrap().time_sec, 200.0);
        assert!(g.edge_between(c, a).is_none());
        assert_eq!(g.endpoints()[1], (1, 2));
    }

    #[test]
    fn rejects_unknown_endpoint() {
        let err = StationGraph::new(vec![node("A")], vec![edge("A", "B", 1, 1.0)]).unwrap_err();
        assert_eq!(err, GraphError::UnknownEndpoint(key("B")));
    }

    #[test]
    fn rejects_zero_frequency() {
        let err = StationGraph::new(vec![node("A"), node("B")], vec![edge("A", "B", 0, 1.0)])
            .unwrap_err();
        assert!(matches!(err, GraphError::ZeroFrequency { .. }));
    }

    #[test]
    fn rejects_negative_or_nan_time() {
        for time in [-15.0, f64::NAN, f64::INFINITY] {
            let err = StationGraph::new(vec![node("A"), node("B")], vec![edge("A", "B", 1, time)])
                .unwrap_err();
            assert!(matches!(err, GraphError::InvalidTravelTime { .. }));
        }
        assert!(StationGraph::new(vec![node("A"), node("B")], vec![edge("A", "B", 1, 0.0)]).is_ok());
    }

    #[test]
    fn rejects_duplicates() {
        let err = StationGraph::new(vec![node("A"), node("A")], vec![]).unwrap_err();
        assert_eq!(err, GraphError::DuplicateStation(key("A")));

        let err = StationGraph::new(
            vec![node("A"), node("B")],
            vec![edge("A", "B", 1, 1.0), edge("A", "B", 2, 2.0)],
        )
        .unwrap_err();
        assert!(matches!(err, GraphError::DuplicateEdge { .. }));
    }

    #[test]
    fn usability() {
        assert!(!StationGraph::default().is_usable());
        assert!(!StationGraph::new(vec![node("A")], vec![]).unwrap().is_usable());
        assert!(
            !StationGraph::new(vec![node("A"), node("B")], vec![])
                .unwrap()
                .is_usable()
        );
        assert!(graph(&[("A", "B", 1, 1.0)]).is_usable());
    }

    #[test]
    fn lookup_by_key_then_name() {
        let mut nodes = vec![node("A"), node("B")];
        nodes[1].display_name = "Bravo".into();
        let g = StationGraph::new(nodes, vec![edge("A", "B", 1, 1.0)]).unwrap();

        assert_eq!(g.lookup("name:A"), Some(0));
        assert_eq!(g.lookup("Bravo"), Some(1));
        assert_eq!(g.lookup("B"), None);
    }
}
