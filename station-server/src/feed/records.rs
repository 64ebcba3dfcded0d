//! Typed feed records.

/// A row of `stops.txt`.
#[derive(Debug, Clone, PartialEq)]
pub struct StopRecord {
    /// Feed-local stop identifier
    pub stop_id: String,

    /// Human-readable stop name (may be empty)
    pub stop_name: String,

    /// Latitude in degrees (0.0 when the feed leaves it blank)
    pub lat: f64,

    /// Longitude in degrees (0.0 when the feed leaves it blank)
    pub lon: f64,

    /// Shared station grouping several platforms, if any
    pub parent_station: Option<String>,
}

impl StopRecord {
    /// Create a stop with no coordinates and no parent station.
    pub fn new(stop_id: impl Into<String>, stop_name: impl Into<String>) -> Self {
        Self {
            stop_id: stop_id.into(),
            stop_name: stop_name.into(),
            lat: 0.0,
            lon: 0.0,
            parent_station: None,
        }
    }

    /// Set the parent station.
    pub fn with_parent(mut self, parent: impl Into<String>) -> Self {
        self.parent_station = Some(parent.into());
        self
    }

    /// Set the coordinates.
    pub fn with_coords(mut self, lat: f64, lon: f64) -> Self {
        self.lat = lat;
        self.lon = lon;
        self
    }
}

/// A row of `stop_times.txt`: one vehicle visit to one stop on one trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StopTimeRecord {
    pub trip_id: String,
    pub stop_id: String,

    /// Position within the trip; visits are ordered by this ascending
    pub stop_sequence: u32,

    /// Seconds since the start of the service day
    pub arrival_time: Option<u32>,

    /// Seconds since the start of the service day
    pub departure_time: Option<u32>,
}

impl StopTimeRecord {
    /// Create a visit with no timestamps.
    pub fn new(trip_id: impl Into<String>, stop_id: impl Into<String>, stop_sequence: u32) -> Self {
        Self {
            trip_id: trip_id.into(),
            stop_id: stop_id.into(),
            stop_sequence,
            arrival_time: None,
            departure_time: None,
        }
    }

    /// Set arrival and departure times.
    pub fn with_times(mut self, arrival: Option<u32>, departure: Option<u32>) -> Self {
        self.arrival_time = arrival;
        self.departure_time = departure;
        self
    }

    /// When the vehicle leaves this stop: the departure time, falling back
    /// to the arrival time.
    pub fn leave_time(&self) -> Option<u32> {
        self.departure_time.or(self.arrival_time)
    }
}
