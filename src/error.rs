use std::path::PathBuf;

use thiserror::Error;

/// Failures while building a dataset from a file or from raw records.
#[derive(Debug, Error)]
pub enum DataError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("malformed csv: {0}")]
    Csv(#[from] csv::Error),
    #[error("missing required column: {0}")]
    MissingColumn(String),
    #[error("dataset has no rows with a valid year")]
    NoRows,
}

/// Failures while decoding a selection from a query string.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("invalid year for {key}: {value:?}")]
    BadYear { key: &'static str, value: String },
    #[error(transparent)]
    UnknownDimension(#[from] crate::dimension::UnknownDimension),
}

/// Failures while reading one HTTP request off a connection.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("timed out waiting for the request")]
    Timeout,
    #[error("request body of {0} bytes exceeds the limit")]
    TooLarge(usize),
    #[error("malformed request: {0}")]
    Malformed(String),
    #[error("read failed: {0}")]
    Io(std::io::Error),
}

impl From<std::io::Error> for RequestError {
    fn from(err: std::io::Error) -> Self {
        match err.kind() {
            std::io::ErrorKind::WouldBlock | std::io::ErrorKind::TimedOut => RequestError::Timeout,
            std::io::ErrorKind::UnexpectedEof => RequestError::Malformed("connection closed mid-request".to_string()),
            _ => RequestError::Io(err),
        }
    }
}
