//! Aggregation of per-trip stop visits into directed stop-pair statistics.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::feed::StopTimeRecord;

/// Travel time assumed for a stop pair with no usable duration sample.
pub const DEFAULT_TRAVEL_SECS: f64 = 60.0;

/// Statistics for one ordered pair of consecutive stops.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectedEdgeStat {
    pub from_stop_id: String,
    pub to_stop_id: String,

    /// Number of consecutive visits observed, including those whose
    /// duration could not be computed. Always at least 1.
    pub trip_count: u64,

    /// Mean of the valid duration samples, in seconds.
    pub avg_travel_time_sec: f64,
}

/// Running totals for one stop pair.
#[derive(Debug, Default)]
struct PairSamples {
    visits: u64,
    valid: u64,
    total_secs: f64,
}

/// Turns stop-time records into [`DirectedEdgeStat`]s.
#[derive(Debug, Clone)]
pub struct EdgeAggregator {
    max_trips: Option<usize>,
    default_travel_secs: f64,
}

impl Default for EdgeAggregator {
    fn default() -> Self {
        Self {
            max_trips: None,
            default_travel_secs: DEFAULT_TRAVEL_SECS,
        }
    }
}

impl EdgeAggregator {
    /// Create an aggregator.
    ///
    /// `max_trips` keeps only the first N distinct trip ids in the order
    /// they first appear. `Some(0)` means no cap.
    pub fn new(max_trips: Option<usize>, default_travel_secs: f64) -> Self {
        Self {
            max_trips: max_trips.filter(|&cap| cap > 0),
            default_travel_secs,
        }
    }

    /// Aggregate consecutive visits into per-pair statistics.
    ///
    /// Visits are grouped by trip and ordered by `stop_sequence`; visits with
    /// equal sequence numbers keep their feed order. Output is sorted by
    /// `(from_stop_id, to_stop_id)`.
    pub fn aggregate(&self, records: &[StopTimeRecord]) -> Vec<DirectedEdgeStat> {
        let trips = self.group_trips(records);

        let mut pairs: BTreeMap<(&str, &str), PairSamples> = BTreeMap::new();
        let mut discarded = 0usize;

        for mut visits in trips {
            visits.sort_by_key(|visit| visit.stop_sequence);

            for window in visits.windows(2) {
                let &[current, next] = window else {
                    continue;
                };
                let samples = pairs
                    .entry((current.stop_id.as_str(), next.stop_id.as_str()))
                    .or_default();
                samples.visits += 1;

                match travel_seconds(current, next) {
                    Some(secs) => {
                        samples.valid += 1;
                        samples.total_secs += secs;
                    }
                    None => discarded += 1,
                }
            }
        }

        let edges: Vec<DirectedEdgeStat> = pairs
            .into_iter()
            .map(|((from, to), samples)| DirectedEdgeStat {
                from_stop_id: from.to_string(),
                to_stop_id: to.to_string(),
                trip_count: samples.visits,
                avg_travel_time_sec: if samples.valid > 0 {
                    samples.total_secs / samples.valid as f64
                } else {
                    self.default_travel_secs
                },
            })
            .collect();

        debug!(
            edges = edges.len(),
            discarded_samples = discarded,
            "aggregated stop-pair edges"
        );
        edges
    }

    /// Group visits by trip id, trips in first-seen order.
    fn group_trips<'a>(&self, records: &'a [StopTimeRecord]) -> Vec<Vec<&'a StopTimeRecord>> {
        let mut trips: Vec<Vec<&StopTimeRecord>> = Vec::new();
        let mut slots: HashMap<&str, usize> = HashMap::new();

        for record in records {
            let slot = match slots.get(record.trip_id.as_str()) {
                Some(&slot) => slot,
                None => {
                    if self.max_trips.is_some_and(|cap| trips.len() >= cap) {
                        continue;
                    }
                    slots.insert(record.trip_id.as_str(), trips.len());
                    trips.push(Vec::new());
                    trips.len() - 1
                }
            };
            trips[slot].push(record);
        }

        trips
    }
}

/// Seconds from leaving `current` to arriving at `next`.
///
/// `None` when either time is missing or the arrival precedes the departure
/// (a day rollover or a malformed row).
fn travel_seconds(current: &StopTimeRecord, next: &StopTimeRecord) -> Option<f64> {
    let depart = current.leave_time()?;
    let arrive = next.arrival_time?;
    arrive.checked_sub(depart).map(f64::from)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn hm(h: u32, m: u32) -> Option<u32> {
        Some(h * 3600 + m * 60)
    }

    fn visit(trip: &str, stop: &str, seq: u32, at: Option<u32>) -> StopTimeRecord {
        StopTimeRecord::new(trip, stop, seq).with_times(at, at)
    }

    fn two_trip_feed() -> Vec<StopTimeRecord> {
        vec![
            visit("A", "S1", 1, hm(8, 0)),
            visit("A", "S2", 2, hm(8, 5)),
            visit("A", "S3", 3, hm(8, 12)),
            visit("B", "S1", 1, hm(9, 0)),
            visit("B", "S2", 2, hm(9, 4)),
            visit("B", "S3", 3, hm(9, 15)),
        ]
    }

    fn find<'a>(edges: &'a [DirectedEdgeStat], from: &str, to: &str) -> &'a DirectedEdgeStat {
        edges
            .iter()
            .find(|e| e.from_stop_id == from && e.to_stop_id == to)
            .unwrap()
    }

    #[test]
    fn two_trips_average_their_samples() {
        let edges = EdgeAggregator::default().aggregate(&two_trip_feed());
        assert_eq!(edges.len(), 2);

        let first = find(&edges, "S1", "S2");
        assert_eq!(first.trip_count, 2);
        assert_eq!(first.avg_travel_time_sec, 270.0);

        let second = find(&edges, "S2", "S3");
        assert_eq!(second.trip_count, 2);
        assert_eq!(second.avg_travel_time_sec, 540.0);
    }

    #[test]
    fn visits_are_ordered_by_sequence_not_feed_order() {
        let records = vec![
            visit("A", "S3", 3, hm(8, 12)),
            visit("A", "S1", 1, hm(8, 0)),
            visit("A", "S2", 2, hm(8, 5)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(find(&edges, "S1", "S2").avg_travel_time_sec, 300.0);
        assert_eq!(find(&edges, "S2", "S3").avg_travel_time_sec, 420.0);
    }

    #[test]
    fn interleaved_trips_are_grouped() {
        let records = vec![
            visit("A", "S1", 1, hm(8, 0)),
            visit("B", "S1", 1, hm(9, 0)),
            visit("A", "S2", 2, hm(8, 5)),
            visit("B", "S2", 2, hm(9, 5)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].trip_count, 2);
    }

    #[test]
    fn departure_preferred_over_arrival() {
        let records = vec![
            StopTimeRecord::new("A", "S1", 1).with_times(hm(8, 0), hm(8, 2)),
            StopTimeRecord::new("A", "S2", 2).with_times(hm(8, 10), hm(8, 11)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(edges[0].avg_travel_time_sec, 480.0);
    }

    #[test]
    fn arrival_used_when_departure_missing() {
        let records = vec![
            StopTimeRecord::new("A", "S1", 1).with_times(hm(8, 0), None),
            StopTimeRecord::new("A", "S2", 2).with_times(hm(8, 10), None),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(edges[0].avg_travel_time_sec, 600.0);
    }

    #[test]
    fn invalid_samples_count_as_visits_but_not_durations() {
        let records = vec![
            // valid: 300s
            visit("A", "S1", 1, hm(8, 0)),
            visit("A", "S2", 2, hm(8, 5)),
            // missing arrival at S2
            visit("B", "S1", 1, hm(9, 0)),
            visit("B", "S2", 2, None),
            // arrival before departure
            visit("C", "S1", 1, hm(23, 59)),
            visit("C", "S2", 2, hm(0, 3)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].trip_count, 3);
        assert_eq!(edges[0].avg_travel_time_sec, 300.0);
    }

    #[test]
    fn pair_without_valid_samples_uses_default() {
        let records = vec![visit("A", "S1", 1, None), visit("A", "S2", 2, None)];
        let edges = EdgeAggregator::new(None, 90.0).aggregate(&records);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].trip_count, 1);
        assert_eq!(edges[0].avg_travel_time_sec, 90.0);
    }

    #[test]
    fn repeated_stop_is_emitted_as_self_pair() {
        let records = vec![
            visit("A", "S1", 1, hm(8, 0)),
            visit("A", "S1", 2, hm(8, 0)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_stop_id, "S1");
        assert_eq!(edges[0].to_stop_id, "S1");
        assert_eq!(edges[0].avg_travel_time_sec, 0.0);
    }

    #[test]
    fn max_trips_keeps_first_seen_trips() {
        let records = vec![
            visit("Z", "S1", 1, hm(8, 0)),
            visit("Z", "S2", 2, hm(8, 5)),
            visit("A", "S2", 1, hm(9, 0)),
            visit("A", "S3", 2, hm(9, 5)),
        ];
        let edges = EdgeAggregator::new(Some(1), DEFAULT_TRAVEL_SECS).aggregate(&records);
        assert_eq!(edges.len(), 1);
        assert_eq!(edges[0].from_stop_id, "S1");
    }

    #[test]
    fn zero_cap_means_unlimited() {
        let edges = EdgeAggregator::new(Some(0), DEFAULT_TRAVEL_SECS).aggregate(&two_trip_feed());
        assert_eq!(edges.len(), 2);
        assert_eq!(edges[0].trip_count, 2);
    }

    #[test]
    fn single_visit_trip_yields_nothing() {
        let edges = EdgeAggregator::default().aggregate(&[visit("A", "S1", 1, hm(8, 0))]);
        assert!(edges.is_empty());
        assert!(EdgeAggregator::default().aggregate(&[]).is_empty());
    }

    #[test]
    fn output_is_sorted_by_stop_pair() {
        let records = vec![
            visit("A", "S9", 1, hm(8, 0)),
            visit("A", "S1", 2, hm(8, 5)),
            visit("A", "S5", 3, hm(8, 9)),
        ];
        let edges = EdgeAggregator::default().aggregate(&records);
        let pairs: Vec<_> = edges
            .iter()
            .map(|e| (e.from_stop_id.as_str(), e.to_stop_id.as_str()))
            .collect();
        assert_eq!(pairs, vec![("S1", "S5"), ("S9", "S1")]);
    }
}
