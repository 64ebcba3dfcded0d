//! GTFS feed ingestion.
//!
//! Reads `stops.txt` and `stop_times.txt` from a feed directory or zip
//! archive into typed records. Column presence is validated here, once, so
//! code downstream of this module can trust every record it receives.

mod digest;
mod error;
mod reader;
mod records;
mod time;

pub use digest::{FeedDigest, InvalidDigest};
pub use error::FeedError;
pub use reader::FeedSource;
pub use records::{StopRecord, StopTimeRecord};
pub use time::{TimeError, parse_gtfs_time};
