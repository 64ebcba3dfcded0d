//! Routing errors.

use crate::graph::StationKey;

/// Why a route could not be produced.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RouteError {
    /// Origin or destination is not a station in the graph
    #[error("unknown station: {0}")]
    UnknownStation(String),

    /// Both stations exist but the destination is unreachable
    #[error("no path from {from} to {to}")]
    NoPath { from: StationKey, to: StationKey },

    /// Risk penalty must be a finite, non-negative number
    #[error("invalid risk penalty {0}: must be finite and non-negative")]
    InvalidPenalty(f64),
}
