//! Feed ingestion error types.

use std::path::PathBuf;

/// Errors that can occur while reading a feed.
///
/// All of these are fatal for a build: they mean the upstream data does not
/// satisfy the record contract, so no graph is produced from it.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// Reading a file or directory failed
    #[error("failed to read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A required table is not present in the feed
    #[error("feed is missing {0}")]
    MissingTable(&'static str),

    /// A required column is absent from the header, or empty on a row
    #[error("{table} is missing required column {column}{}", at_row(.row))]
    MissingColumn {
        table: &'static str,
        column: &'static str,
        /// 1-based data row, or `None` when the header lacks the column
        row: Option<u64>,
    },

    /// A value could not be interpreted
    #[error("{table} row {row}: invalid {column} value {value:?}")]
    InvalidValue {
        table: &'static str,
        column: &'static str,
        row: u64,
        value: String,
    },

    /// The table is not well-formed CSV
    #[error("CSV error in {table}: {source}")]
    Csv {
        table: &'static str,
        #[source]
        source: csv::Error,
    },

    /// The archive could not be opened
    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

fn at_row(row: &Option<u64>) -> String {
    match row {
        Some(row) => format!(" at row {row}"),
        None => String::new(),
    }
}
