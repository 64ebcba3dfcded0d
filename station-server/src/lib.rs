//! Station risk graph server.
//!
//! Turns a static GTFS feed into a station-level graph, scores every
//! station by frequency-weighted PageRank, and answers: "what is the
//! fastest way between these stations, and what is a route that avoids the
//! network's most critical hubs?"

pub mod cache;
pub mod config;
pub mod feed;
pub mod graph;
pub mod network;
pub mod rank;
pub mod routing;
pub mod web;
