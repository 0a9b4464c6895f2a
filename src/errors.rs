use std::{io, path::PathBuf};

use thiserror::Error;

/// Failures surfaced by the ledger, report, and maintenance layers.
///
/// None of these are fatal to a tracker run: callers report them and fall
/// back to an empty set, a no-op, or an early return.
#[derive(Debug, Error)]
pub enum TrackerError {
    #[error("File '{}' not found.", .0.display())]
    MissingFile(PathBuf),
    #[error("Invalid date format: {value}")]
    MalformedDate { value: String, line: Option<u64> },
    #[error("No data found in the CSV file.")]
    NoDataFound(PathBuf),
    #[error("Malformed row at {}:{line}: {reason}", .path.display())]
    MalformedRow {
        path: PathBuf,
        line: u64,
        reason: String,
    },
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("CSV error: {0}")]
    Csv(String),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

pub type Result<T> = std::result::Result<T, TrackerError>;

/// Row-level problems collected while an operation carries on.
pub type Diagnostics = Vec<TrackerError>;

impl TrackerError {
    /// Maps an I/O error on `path` to `MissingFile` when the file is absent.
    pub fn from_io(err: io::Error, path: impl Into<PathBuf>) -> Self {
        if err.kind() == io::ErrorKind::NotFound {
            TrackerError::MissingFile(path.into())
        } else {
            TrackerError::Io(err)
        }
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, TrackerError::MissingFile(_))
    }
}

impl From<csv::Error> for TrackerError {
    fn from(err: csv::Error) -> Self {
        let message = err.to_string();
        match err.into_kind() {
            csv::ErrorKind::Io(io) => TrackerError::Io(io),
            _ => TrackerError::Csv(message),
        }
    }
}

impl From<serde_json::Error> for TrackerError {
    fn from(err: serde_json::Error) -> Self {
        TrackerError::Config(err.to_string())
    }
}
