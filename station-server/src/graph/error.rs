//! Graph consistency errors.

use super::StationKey;

/// A station graph whose parts violate the graph invariants.
///
/// Graphs built from a feed never trigger these; they guard graphs
/// reassembled from cached parts.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GraphError {
    /// The same station appears twice in the node list
    #[error("duplicate station {0}")]
    DuplicateStation(StationKey),

    /// An edge references a station that is not a node
    #[error("edge endpoint {0} is not a station in the graph")]
    UnknownEndpoint(StationKey),

    /// An edge has zero trips
    #[error("edge {from} -> {to} has zero frequency")]
    ZeroFrequency { from: StationKey, to: StationKey },

    /// The same ordered station pair appears twice
    #[error("duplicate edge {from} -> {to}")]
    DuplicateEdge { from: StationKey, to: StationKey },

    /// An edge time that is negative or not finite
    #[error("edge {from} -> {to} has invalid travel time {time_sec}")]
    InvalidTravelTime {
        from: StationKey,
        to: StationKey,
        time_sec: f64,
    },
}
