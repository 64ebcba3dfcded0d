//! Station identity: collapsing stop ids into logical stations.

use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::feed::StopRecord;

/// Logical identity of a station.
///
/// Stops that share a non-empty `parent_station` collapse to
/// `station:<parent>`. Otherwise the stop's trimmed name is used
/// (`name:<stop_name>`), which merges same-named stops even when they are
/// physically distinct. A stop with neither falls back to `stop:<stop_id>`.
///
/// # Examples
///
/// ```
/// use station_server::feed::StopRecord;
/// use station_server::graph::StationKey;
///
/// let platform = StopRecord::new("101", "Central Pl. 1").with_parent("100");
/// assert_eq!(StationKey::for_stop(&platform).as_str(), "station:100");
///
/// let plain = StopRecord::new("7", " Market St ");
/// assert_eq!(StationKey::for_stop(&plain).as_str(), "name:Market St");
/// ```
#[derive(Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StationKey(String);

impl StationKey {
    /// Key for a shared parent station.
    pub fn parent(parent_station: &str) -> Self {
        Self(format!("station:{parent_station}"))
    }

    /// Key for a name-only station.
    pub fn named(stop_name: &str) -> Self {
        Self(format!("name:{stop_name}"))
    }

    /// Key for a stop with neither parent nor name.
    pub fn stop(stop_id: &str) -> Self {
        Self(format!("stop:{stop_id}"))
    }

    /// Derive the key a stop record belongs to.
    pub fn for_stop(stop: &StopRecord) -> Self {
        let parent = stop
            .parent_station
            .as_deref()
            .map(normalize_stop_id)
            .filter(|p| !p.is_empty());
        if let Some(parent) = parent {
            return Self::parent(parent);
        }

        let name = stop.stop_name.trim();
        if !name.is_empty() {
            return Self::named(name);
        }

        Self::stop(normalize_stop_id(&stop.stop_id))
    }

    /// Returns the key as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "StationKey({})", self.0)
    }
}

impl fmt::Display for StationKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Strip the `.0` suffix that spreadsheet exports add to integer ids.
///
/// Only ids that are otherwise all digits are touched, so `"12.0"` becomes
/// `"12"` but `"A.0"` is left alone.
///
/// ```
/// use station_server::graph::normalize_stop_id;
///
/// assert_eq!(normalize_stop_id("8000105.0"), "8000105");
/// assert_eq!(normalize_stop_id("8000105"), "8000105");
/// assert_eq!(normalize_stop_id("de:08111:6118.0"), "de:08111:6118.0");
/// ```
pub fn normalize_stop_id(raw: &str) -> &str {
    let trimmed = raw.trim();
    trimmed
        .strip_suffix(".0")
        .filter(|digits| !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit()))
        .unwrap_or(trimmed)
}

/// A logical station in the graph.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StationNode {
    pub key: StationKey,

    /// First non-empty stop name seen for this station, in feed order
    pub display_name: String,

    /// Coordinates of the first stop seen for this station
    pub lat: f64,
    pub lon: f64,
}

/// Display metadata gathered while scanning stops.
#[derive(Debug, Clone)]
struct StationMeta {
    display_name: Option<String>,
    lat: f64,
    lon: f64,
}

/// Stop id → station assignment, plus per-station display metadata.
///
/// Built by scanning stops in feed order, so "first encountered" is
/// reproducible for a given feed.
#[derive(Debug, Clone, Default)]
pub struct StationDirectory {
    by_stop: HashMap<String, StationKey>,
    meta: HashMap<StationKey, StationMeta>,
}

impl StationDirectory {
    /// Scan stop records in order.
    pub fn from_stops(stops: &[StopRecord]) -> Self {
        let mut directory = Self::default();

        for stop in stops {
            let key = StationKey::for_stop(stop);

            let meta = directory
                .meta
                .entry(key.clone())
                .or_insert_with(|| StationMeta {
                    display_name: None,
                    lat: stop.lat,
                    lon: stop.lon,
                });
            let name = stop.stop_name.trim();
            if meta.display_name.is_none() && !name.is_empty() {
                meta.display_name = Some(name.to_string());
            }

            directory
                .by_stop
                .insert(normalize_stop_id(&stop.stop_id).to_string(), key);
        }

        directory
    }

    /// The station a stop id belongs to, if the stop is known.
    pub fn station_of(&self, stop_id: &str) -> Option<&StationKey> {
        self.by_stop.get(normalize_stop_id(stop_id))
    }

    /// Build the node for a station key.
    ///
    /// Unknown keys and stations without any named stop display as the
    /// key itself.
    pub fn node(&self, key: &StationKey) -> StationNode {
        let meta = self.meta.get(key);
        StationNode {
            key: key.clone(),
            display_name: meta
                .and_then(|m| m.display_name.clone())
                .unwrap_or_else(|| key.to_string()),
            lat: meta.map_or(0.0, |m| m.lat),
            lon: meta.map_or(0.0, |m| m.lon),
        }
    }

    /// Number of distinct stations seen.
    pub fn station_count(&self) -> usize {
        self.meta.len()
    }
}
