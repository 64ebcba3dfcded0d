//! Folding stop-pair statistics into the station graph.

use std::collections::{BTreeMap, BTreeSet};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::feed::StopRecord;

use super::edges::DirectedEdgeStat;
use super::error::GraphError;
use super::station::{StationDirectory, StationKey};
use super::{StationEdge, StationGraph};

/// How travel times combine when several stop pairs land on the same
/// station pair.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeMerge {
    /// `t = (t + t_next) / 2` at each merge step, in stop-pair order.
    ///
    /// Not a true mean once three or more stop pairs merge: later pairs
    /// carry more weight than earlier ones.
    #[default]
    RunningAverage,

    /// Mean of the stop-pair averages weighted by their trip counts.
    TripWeighted,
}

/// A merge policy name that is neither `running_average` nor
/// `trip_weighted`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown time merge policy {0:?}")]
pub struct UnknownTimeMerge(String);

impl FromStr for TimeMerge {
    type Err = UnknownTimeMerge;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "running_average" => Ok(Self::RunningAverage),
            "trip_weighted" => Ok(Self::TripWeighted),
            other => Err(UnknownTimeMerge(other.to_string())),
        }
    }
}

/// Accumulator for one station pair.
#[derive(Debug)]
struct MergedEdge {
    freq: u64,
    time_sec: f64,
    weighted_secs: f64,
}

/// Builds a [`StationGraph`] from stops and stop-pair statistics.
#[derive(Debug, Clone, Default)]
pub struct GraphBuilder {
    merge: TimeMerge,
}

impl GraphBuilder {
    pub fn new(merge: TimeMerge) -> Self {
        Self { merge }
    }

    /// Collapse stops into stations and merge the stop-pair edges.
    ///
    /// Edges touching a stop id with no stop record are dropped. Pairs that
    /// collapse onto a single station are kept as self-loops. Stations with
    /// no remaining edge are left out of the graph.
    pub fn build(
        &self,
        stops: &[StopRecord],
        edges: &[DirectedEdgeStat],
    ) -> Result<StationGraph, GraphError> {
        let directory = StationDirectory::from_stops(stops);

        let mut merged: BTreeMap<(StationKey, StationKey), MergedEdge> = BTreeMap::new();
        let mut unmapped = 0usize;

        for edge in edges {
            let (Some(from), Some(to)) = (
                directory.station_of(&edge.from_stop_id),
                directory.station_of(&edge.to_stop_id),
            ) else {
                unmapped += 1;
                continue;
            };

            let time = edge.avg_travel_time_sec;
            merged
                .entry((from.clone(), to.clone()))
                .and_modify(|m| {
                    m.freq += edge.trip_count;
                    m.weighted_secs += time * edge.trip_count as f64;
                    m.time_sec = match self.merge {
                        TimeMerge::RunningAverage => (m.time_sec + time) / 2.0,
                        TimeMerge::TripWeighted => m.weighted_secs / m.freq as f64,
                    };
                })
                .or_insert_with(|| MergedEdge {
                    freq: edge.trip_count,
                    time_sec: time,
                    weighted_secs: time * edge.trip_count as f64,
                });
        }

        if unmapped > 0 {
            debug!(unmapped, "dropped stop-pair edges with unknown stops");
        }

        let stations: BTreeSet<&StationKey> = merged.keys().flat_map(|(f, t)| [f, t]).collect();
        let nodes = stations.into_iter().map(|key| directory.node(key)).collect();
        let edges = merged
            .into_iter()
            .map(|((from, to), m)| StationEdge {
                from,
                to,
                freq: m.freq,
                time_sec: m.time_sec,
            })
            .collect();

        let graph = StationGraph::new(nodes, edges)?;
        info!(
            stations = graph.node_count(),
            edges = graph.edge_count(),
            known_stations = directory.station_count(),
            "built station graph"
        );
        Ok(graph)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stat(from: &str, to: &str, trips: u64, secs: f64) -> DirectedEdgeStat {
        DirectedEdgeStat {
            from_stop_id: from.into(),
            to_stop_id: to.into(),
            trip_count: trips,
            avg_travel_time_sec: secs,
        }
    }

    fn key(name: &str) -> StationKey {
        StationKey::named(name)
    }

    fn platforms() -> Vec<StopRecord> {
        vec![
            StopRecord::new("A1", "Alpha Pl. 1").with_parent("A"),
            StopRecord::new("A2", "Alpha Pl. 2").with_parent("A"),
            StopRecord::new("B1", "Beta"),
            StopRecord::new("B2", "Beta"),
            StopRecord::new("C1", "Gamma"),
            StopRecord::new("Z1", "Lonely"),
        ]
    }

    #[test]
    fn parses_merge_policy() {
        assert_eq!("trip_weighted".parse::<TimeMerge>(), Ok(TimeMerge::TripWeighted));
        assert_eq!(
            " running_average".parse::<TimeMerge>(),
            Ok(TimeMerge::RunningAverage)
        );
        assert!("mean".parse::<TimeMerge>().is_err());
    }

    #[test]
    fn merges_platforms_into_stations() {
        let edges = vec![stat("A1", "B1", 3, 100.0), stat("A2", "B2", 1, 200.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();

        assert_eq!(graph.node_count(), 2);
        assert_eq!(graph.edge_count(), 1);

        let edge = &graph.edges()[0];
        assert_eq!(edge.from, StationKey::parent("A"));
        assert_eq!(edge.to, key("Beta"));
        assert_eq!(edge.freq, 4);
        assert_eq!(edge.time_sec, 150.0);
    }

    #[test]
    fn trip_weighted_merge() {
        let edges = vec![stat("A1", "B1", 3, 100.0), stat("A2", "B2", 1, 200.0)];
        let graph = GraphBuilder::new(TimeMerge::TripWeighted)
            .build(&platforms(), &edges)
            .unwrap();
        assert_eq!(graph.edges()[0].time_sec, 125.0);
    }

    #[test]
    fn isolated_stations_are_excluded() {
        let edges = vec![stat("B1", "C1", 1, 60.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();

        let keys: Vec<_> = graph.nodes().iter().map(|n| n.key.clone()).collect();
        assert_eq!(keys, vec![key("Beta"), key("Gamma")]);
    }

    #[test]
    fn intra_station_pairs_become_self_loops() {
        let edges = vec![stat("A1", "A2", 2, 30.0), stat("A2", "B1", 1, 60.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();

        let a = StationKey::parent("A");
        assert!(graph.edges().iter().any(|e| e.from == a && e.to == a));
    }

    #[test]
    fn edges_with_unknown_stops_are_dropped() {
        let edges = vec![stat("B1", "C1", 1, 60.0), stat("C1", "X9", 1, 60.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();
        assert_eq!(graph.edge_count(), 1);
        assert_eq!(graph.node_count(), 2);
    }

    #[test]
    fn float_formatted_edge_ids_match_stops() {
        let stops = vec![StopRecord::new("10", "Ten"), StopRecord::new("11", "Eleven")];
        let edges = vec![stat("10.0", "11.0", 1, 60.0)];
        let graph = GraphBuilder::default().build(&stops, &edges).unwrap();
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn display_names_come_from_first_stop() {
        let edges = vec![stat("A2", "B1", 1, 60.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();
        let alpha = graph.position(&StationKey::parent("A")).unwrap();
        assert_eq!(graph.node(alpha).display_name, "Alpha Pl. 1");
    }

    #[test]
    fn empty_input_gives_empty_graph() {
        let graph = GraphBuilder::default().build(&platforms(), &[]).unwrap();
        assert!(graph.is_empty());
        assert_eq!(graph.edge_count(), 0);
    }

    #[test]
    fn output_is_ordered_by_key() {
        let edges = vec![stat("C1", "B1", 1, 60.0), stat("B1", "C1", 1, 60.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();
        let pairs: Vec<_> = graph
            .edges()
            .iter()
            .map(|e| (e.from.as_str().to_string(), e.to.as_str().to_string()))
            .collect();
        assert_eq!(
            pairs,
            vec![
                ("name:Beta".to_string(), "name:Gamma".to_string()),
                ("name:Gamma".to_string(), "name:Beta".to_string()),
            ]
        );
    }

    #[test]
    fn every_edge_has_positive_frequency() {
        let edges = vec![stat("A1", "B1", 1, 10.0), stat("B2", "C1", 5, 20.0)];
        let graph = GraphBuilder::default().build(&platforms(), &edges).unwrap();
        assert!(graph.edges().iter().all(|e| e.freq >= 1));
    }
}

/// Tests that document the running-average approximation.
///
/// The default merge halves the accumulated time at every step, so with
/// three or more stop pairs the result is not the mean of their times.
#[cfg(test)]
mod approximation_tests {
    use super::*;

    fn stops() -> Vec<StopRecord> {
        vec![
            StopRecord::new("A1", "").with_parent("A"),
            StopRecord::new("A2", "").with_parent("A"),
            StopRecord::new("A3", "").with_parent("A"),
            StopRecord::new("B1", "").with_parent("B"),
        ]
    }

    fn stat(from: &str, trips: u64, secs: f64) -> DirectedEdgeStat {
        DirectedEdgeStat {
            from_stop_id: from.into(),
            to_stop_id: "B1".into(),
            trip_count: trips,
            avg_travel_time_sec: secs,
        }
    }

    /// Three equal-weight pairs at 60, 120, 240 seconds: true mean is 140,
    /// but the running average gives ((60 + 120) / 2 + 240) / 2 = 165.
    #[test]
    fn running_average_is_biased_toward_later_pairs() {
        let edges = vec![stat("A1", 1, 60.0), stat("A2", 1, 120.0), stat("A3", 1, 240.0)];
        let graph = GraphBuilder::new(TimeMerge::RunningAverage)
            .build(&stops(), &edges)
            .unwrap();

        let time = graph.edges()[0].time_sec;
        assert_eq!(time, 165.0);
        assert_ne!(time, 140.0, "running average is not the arithmetic mean");
    }

    /// The trip-weighted policy gives the true mean for the same input.
    #[test]
    fn trip_weighted_is_unbiased() {
        let edges = vec![stat("A1", 1, 60.0), stat("A2", 1, 120.0), stat("A3", 1, 240.0)];
        let graph = GraphBuilder::new(TimeMerge::TripWeighted)
            .build(&stops(), &edges)
            .unwrap();
        assert_eq!(graph.edges()[0].time_sec, 140.0);
    }

    /// With exactly two pairs the running average ignores trip counts.
    #[test]
    fn running_average_ignores_trip_counts() {
        let edges = vec![stat("A1", 9, 100.0), stat("A2", 1, 200.0)];
        let graph = GraphBuilder::default().build(&stops(), &edges).unwrap();
        assert_eq!(graph.edges()[0].time_sec, 150.0);
        assert_eq!(graph.edges()[0].freq, 10);
    }
}
