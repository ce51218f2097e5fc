//! Error types for the pumpwise core
//!
//! Startup failures (dataset, configuration, training) are fatal to the
//! process. Prediction, device and line-parse failures are scoped to a single
//! acquisition cycle and are reported by the caller.

use std::io;
use std::path::PathBuf;

/// Core errors
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Dataset file '{}' not found", .0.display())]
    DatasetNotFound(PathBuf),

    #[error("Dataset is missing required columns {missing:?} (expected header: {expected:?})")]
    MissingColumns {
        missing: Vec<String>,
        expected: Vec<String>,
    },

    #[error("Dataset error: {0}")]
    Dataset(String),

    #[error("Invalid target value '{value}' in column '{column}': labels must be non-negative integers")]
    InvalidTarget { column: String, value: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Training failed for {model}: {reason}")]
    Training { model: String, reason: String },

    #[error("Prediction failed for {model}: {reason}")]
    Prediction { model: String, reason: String },

    #[error("Cannot open device '{port}': {reason}")]
    DeviceOpen { port: String, reason: String },

    #[error("Device I/O error: {0}")]
    Device(#[source] io::Error),

    #[error("Malformed device line: {0}")]
    Line(#[from] ParseError),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),
}

impl From<polars::prelude::PolarsError> for Error {
    fn from(err: polars::prelude::PolarsError) -> Self {
        Error::Dataset(err.to_string())
    }
}

impl From<config::ConfigError> for Error {
    fn from(err: config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

/// Per-line failures of the device protocol
///
/// Always recoverable: the offending line is reported and the loop moves on.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ParseError {
    #[error("expected {expected} comma-separated fields, found {found}: '{line}'")]
    FieldCount {
        expected: usize,
        found: usize,
        line: String,
    },

    #[error("field {index} is not a number ('{value}'): '{line}'")]
    NotNumeric {
        index: usize,
        value: String,
        line: String,
    },

    #[error("line is not valid UTF-8")]
    Encoding,

    #[error("line exceeds {limit} bytes without a terminator")]
    TooLong { limit: usize },
}

/// Result type for core operations
pub type Result<T> = std::result::Result<T, Error>;
