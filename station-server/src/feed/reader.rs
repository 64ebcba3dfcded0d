//! Reading feed tables from disk.

use std::collections::HashMap;
use std::io::{Cursor, Read, Seek};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, StringRecord, Trim};
use tracing::{debug, trace};
use zip::ZipArchive;

use super::digest::FeedDigest;
use super::error::FeedError;
use super::records::{StopRecord, StopTimeRecord};
use super::time::parse_gtfs_time;

const STOPS: &str = "stops.txt";
const STOP_TIMES: &str = "stop_times.txt";

const STOPS_REQUIRED: &[&str] = &["stop_id", "stop_name", "stop_lat", "stop_lon"];
const STOP_TIMES_REQUIRED: &[&str] = &["trip_id", "stop_id", "stop_sequence"];

/// Raw bytes of the two feed tables this crate consumes, plus their digest.
///
/// The digest is computed before any parsing, so a caller can consult the
/// cache and skip parsing entirely when the feed is unchanged.
#[derive(Debug, Clone)]
pub struct FeedSource {
    stops: Vec<u8>,
    stop_times: Vec<u8>,
    digest: FeedDigest,
}

impl FeedSource {
    /// Open a feed directory or `.zip` archive.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, FeedError> {
        let path = path.as_ref();
        if path.is_dir() {
            Self::from_dir(path)
        } else {
            let bytes = read_file(path)?;
            Self::from_zip_bytes(bytes)
        }
    }

    /// Read `stops.txt` and `stop_times.txt` from a directory.
    ///
    /// The digest covers `stops.txt` then `stop_times.txt`, each
    /// length-prefixed.
    pub fn from_dir(dir: &Path) -> Result<Self, FeedError> {
        let stops = read_table_file(dir, STOPS)?;
        let stop_times = read_table_file(dir, STOP_TIMES)?;
        Ok(Self::from_tables(stops, stop_times))
    }

    /// Build a source from in-memory table contents.
    pub fn from_tables(stops: Vec<u8>, stop_times: Vec<u8>) -> Self {
        let digest = FeedDigest::of_parts([stops.as_slice(), stop_times.as_slice()]);
        Self {
            stops,
            stop_times,
            digest,
        }
    }

    /// Read the tables out of a zip archive held in memory.
    ///
    /// The digest covers the archive bytes. Tables may sit in a
    /// subdirectory of the archive.
    pub fn from_zip_bytes(bytes: Vec<u8>) -> Result<Self, FeedError> {
        let digest = FeedDigest::of_bytes(&bytes);
        let mut archive = ZipArchive::new(Cursor::new(bytes.as_slice()))?;
        let stops = read_zip_table(&mut archive, STOPS)?;
        let stop_times = read_zip_table(&mut archive, STOP_TIMES)?;
        Ok(Self {
            stops,
            stop_times,
            digest,
        })
    }

    /// Digest of the raw feed content.
    pub fn digest(&self) -> FeedDigest {
        self.digest
    }

    /// Parse `stops.txt`.
    pub fn stops(&self) -> Result<Vec<StopRecord>, FeedError> {
        let mut reader = table_reader(&self.stops);
        let columns = ColumnIndex::new(STOPS, &mut reader, STOPS_REQUIRED)?;

        let mut stops = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|source| FeedError::Csv {
                table: STOPS,
                source,
            })?;
            let row = i as u64 + 1;

            stops.push(StopRecord {
                stop_id: columns.require(&record, "stop_id", row)?.to_string(),
                stop_name: columns.get(&record, "stop_name").unwrap_or_default().to_string(),
                lat: columns.coordinate(&record, "stop_lat", row)?,
                lon: columns.coordinate(&record, "stop_lon", row)?,
                parent_station: columns.get(&record, "parent_station").map(str::to_string),
            });
        }

        debug!(count = stops.len(), "parsed stops");
        Ok(stops)
    }

    /// Parse `stop_times.txt`.
    ///
    /// Unparseable arrival or departure times become `None`: the edge
    /// aggregator treats them as unusable samples rather than failing.
    pub fn stop_times(&self) -> Result<Vec<StopTimeRecord>, FeedError> {
        let mut reader = table_reader(&self.stop_times);
        let columns = ColumnIndex::new(STOP_TIMES, &mut reader, STOP_TIMES_REQUIRED)?;

        let mut visits = Vec::new();
        for (i, record) in reader.records().enumerate() {
            let record = record.map_err(|source| FeedError::Csv {
                table: STOP_TIMES,
                source,
            })?;
            let row = i as u64 + 1;

            let sequence = columns.require(&record, "stop_sequence", row)?;
            let stop_sequence = sequence.parse::<u32>().map_err(|_| FeedError::InvalidValue {
                table: STOP_TIMES,
                column: "stop_sequence",
                row,
                value: sequence.to_string(),
            })?;

            visits.push(StopTimeRecord {
                trip_id: columns.require(&record, "trip_id", row)?.to_string(),
                stop_id: columns.require(&record, "stop_id", row)?.to_string(),
                stop_sequence,
                arrival_time: columns.time(&record, "arrival_time", row),
                departure_time: columns.time(&record, "departure_time", row),
            });
        }

        debug!(count = visits.len(), "parsed stop times");
        Ok(visits)
    }
}

fn read_file(path: &Path) -> Result<Vec<u8>, FeedError> {
    std::fs::read(path).map_err(|source| FeedError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn read_table_file(dir: &Path, table: &'static str) -> Result<Vec<u8>, FeedError> {
    let path = dir.join(table);
    if !path.is_file() {
        return Err(FeedError::MissingTable(table));
    }
    read_file(&path)
}

fn read_zip_table<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    table: &'static str,
) -> Result<Vec<u8>, FeedError> {
    let suffix = format!("/{table}");
    let name = archive
        .file_names()
        .find(|name| *name == table || name.ends_with(&suffix))
        .map(str::to_string)
        .ok_or(FeedError::MissingTable(table))?;

    let mut file = archive.by_name(&name)?;
    let mut bytes = Vec::new();
    file.read_to_end(&mut bytes).map_err(|source| FeedError::Io {
        path: PathBuf::from(&name),
        source,
    })?;
    Ok(bytes)
}

fn table_reader(bytes: &[u8]) -> csv::Reader<&[u8]> {
    ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_reader(bytes)
}

/// Header name → column position for one table.
struct ColumnIndex {
    table: &'static str,
    positions: HashMap<String, usize>,
}

impl ColumnIndex {
    fn new(
        table: &'static str,
        reader: &mut csv::Reader<&[u8]>,
        required: &[&'static str],
    ) -> Result<Self, FeedError> {
        let headers = reader
            .headers()
            .map_err(|source| FeedError::Csv { table, source })?;

        let positions: HashMap<String, usize> = headers
            .iter()
            .enumerate()
            .map(|(i, name)| (name.trim_start_matches('\u{feff}').trim().to_string(), i))
            .collect();

        for &column in required {
            if !positions.contains_key(column) {
                return Err(FeedError::MissingColumn {
                    table,
                    column,
                    row: None,
                });
            }
        }

        Ok(Self { table, positions })
    }

    /// The trimmed value of `column`, or `None` when absent or empty.
    fn get<'r>(&self, record: &'r StringRecord, column: &str) -> Option<&'r str> {
        let position = *self.positions.get(column)?;
        record.get(position).map(str::trim).filter(|v| !v.is_empty())
    }

    fn require<'r>(
        &self,
        record: &'r StringRecord,
        column: &'static str,
        row: u64,
    ) -> Result<&'r str, FeedError> {
        self.get(record, column).ok_or(FeedError::MissingColumn {
            table: self.table,
            column,
            row: Some(row),
        })
    }

    /// Blank coordinates read as 0.0; anything else must be a number.
    fn coordinate(&self, record: &StringRecord, column: &'static str, row: u64) -> Result<f64, FeedError> {
        let Some(value) = self.get(record, column) else {
            return Ok(0.0);
        };
        value.parse().map_err(|_| FeedError::InvalidValue {
            table: self.table,
            column,
            row,
            value: value.to_string(),
        })
    }

    fn time(&self, record: &StringRecord, column: &'static str, row: u64) -> Option<u32> {
        let value = self.get(record, column)?;
        match parse_gtfs_time(value) {
            Ok(secs) => Some(secs),
            Err(e) => {
                trace!(table = self.table, column, row, value, error = %e, "discarding unparseable time");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::tempdir;
    use zip::write::SimpleFileOptions;

    const STOPS_TXT: &str = "\
stop_id,stop_name,stop_lat,stop_lon,parent_station
S1,Alpha,52.1,13.1,
S2,Beta,52.2,13.2,P9
S3,,,,
";

    const STOP_TIMES_TXT: &str = "\
trip_id,arrival_time,departure_time,stop_id,stop_sequence
A,08:00:00,08:00:00,S1,1
A,08:05:00,08:06:00,S2,2
A,,bogus,S3,3
";

    fn source() -> FeedSource {
        FeedSource::from_tables(STOPS_TXT.into(), STOP_TIMES_TXT.into())
    }

    #[test]
    fn parses_stops() {
        let stops = source().stops().unwrap();
        assert_eq!(stops.len(), 3);
        assert_eq!(stops[0], StopRecord::new("S1", "Alpha").with_coords(52.1, 13.1));
        assert_eq!(stops[1].parent_station.as_deref(), Some("P9"));
        assert_eq!(stops[2].stop_name, "");
        assert_eq!(stops[2].lat, 0.0);
        assert_eq!(stops[2].parent_station, None);
    }

    #[test]
    fn parses_stop_times() {
        let visits = source().stop_times().unwrap();
        assert_eq!(visits.len(), 3);
        assert_eq!(
            visits[1],
            StopTimeRecord::new("A", "S2", 2).with_times(Some(29_100), Some(29_160))
        );
        // Blank and unparseable times are dropped, not fatal
        assert_eq!(visits[2].arrival_time, None);
        assert_eq!(visits[2].departure_time, None);
    }

    #[test]
    fn optional_time_columns_may_be_absent() {
        let source = FeedSource::from_tables(
            STOPS_TXT.into(),
            "trip_id,stop_id,stop_sequence\nA,S1,1\n".into(),
        );
        let visits = source.stop_times().unwrap();
        assert_eq!(visits, vec![StopTimeRecord::new("A", "S1", 1)]);
    }

    #[test]
    fn missing_header_column_is_reported() {
        let source = FeedSource::from_tables(
            STOPS_TXT.into(),
            "trip_id,stop_id,arrival_time\nA,S1,08:00:00\n".into(),
        );
        let err = source.stop_times().unwrap_err();
        assert!(matches!(
            err,
            FeedError::MissingColumn {
                table: "stop_times.txt",
                column: "stop_sequence",
                row: None
            }
        ));
    }

    #[test]
    fn empty_required_value_is_reported_with_row() {
        let source = FeedSource::from_tables(
            STOPS_TXT.into(),
            "trip_id,stop_id,stop_sequence\nA,S1,1\n,S2,2\n".into(),
        );
        let err = source.stop_times().unwrap_err();
        assert!(matches!(
            err,
            FeedError::MissingColumn {
                column: "trip_id",
                row: Some(2),
                ..
            }
        ));
    }

    #[test]
    fn bad_sequence_is_invalid_value() {
        let source = FeedSource::from_tables(
            STOPS_TXT.into(),
            "trip_id,stop_id,stop_sequence\nA,S1,first\n".into(),
        );
        let err = source.stop_times().unwrap_err();
        assert!(matches!(
            err,
            FeedError::InvalidValue {
                column: "stop_sequence",
                row: 1,
                ..
            }
        ));
    }

    #[test]
    fn bad_coordinate_is_invalid_value() {
        let source = FeedSource::from_tables(
            "stop_id,stop_name,stop_lat,stop_lon\nS1,Alpha,north,13.0\n".into(),
            STOP_TIMES_TXT.into(),
        );
        assert!(matches!(
            source.stops().unwrap_err(),
            FeedError::InvalidValue {
                column: "stop_lat",
                ..
            }
        ));
    }

    #[test]
    fn header_byte_order_mark_is_ignored() {
        let source = FeedSource::from_tables(
            "\u{feff}stop_id,stop_name,stop_lat,stop_lon\nS1,Alpha,1.0,2.0\n".into(),
            STOP_TIMES_TXT.into(),
        );
        assert_eq!(source.stops().unwrap().len(), 1);
    }

    #[test]
    fn reads_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stops.txt"), STOPS_TXT).unwrap();
        std::fs::write(dir.path().join("stop_times.txt"), STOP_TIMES_TXT).unwrap();

        let from_dir = FeedSource::open(dir.path()).unwrap();
        assert_eq!(from_dir.digest(), source().digest());
        assert_eq!(from_dir.stops().unwrap().len(), 3);
    }

    #[test]
    fn table_boundary_is_part_of_digest() {
        let whole = format!("{STOPS_TXT}{STOP_TIMES_TXT}");
        let (head, tail) = whole.split_at(STOPS_TXT.len() + 1);
        let shifted = FeedSource::from_tables(head.into(), tail.into());
        assert_ne!(shifted.digest(), source().digest());
    }

    #[test]
    fn directory_without_table_fails() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("stops.txt"), STOPS_TXT).unwrap();

        let err = FeedSource::open(dir.path()).unwrap_err();
        assert!(matches!(err, FeedError::MissingTable("stop_times.txt")));
    }

    #[test]
    fn reads_zip_archive_with_nested_tables() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("gtfs/stops.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(STOPS_TXT.as_bytes()).unwrap();
        writer
            .start_file("gtfs/stop_times.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(STOP_TIMES_TXT.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let dir = tempdir().unwrap();
        let path = dir.path().join("feed.zip");
        std::fs::write(&path, &bytes).unwrap();

        let source = FeedSource::open(&path).unwrap();
        assert_eq!(source.digest(), FeedDigest::of_bytes(&bytes));
        assert_eq!(source.stops().unwrap().len(), 3);
        assert_eq!(source.stop_times().unwrap().len(), 3);
    }

    #[test]
    fn stop_times_table_does_not_match_stops_lookup() {
        let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
        writer
            .start_file("stop_times.txt", SimpleFileOptions::default())
            .unwrap();
        writer.write_all(STOP_TIMES_TXT.as_bytes()).unwrap();
        let bytes = writer.finish().unwrap().into_inner();

        let err = FeedSource::from_zip_bytes(bytes).unwrap_err();
        assert!(matches!(err, FeedError::MissingTable("stops.txt")));
    }
}
