// Error handling for the dashboard core

use thiserror::Error;

pub type Result<T> = std::result::Result<T, DashboardError>;

#[derive(Error, Debug)]
pub enum DashboardError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Unsupported compression: {0}")]
    UnsupportedCompression(String),

    #[error("Decompression failed: {0}")]
    DecompressionFailed(String),

    #[error("Invalid date {value:?}: {reason}")]
    InvalidDate { value: String, reason: String },

    #[error("Dates are not strictly ascending at position {0}")]
    UnorderedDates(usize),

    #[error("Series length mismatch for {entity} ({kind}): expected {expected}, got {got}")]
    SeriesLengthMismatch {
        entity: String,
        kind: &'static str,
        expected: usize,
        got: usize,
    },

    #[error("Invalid query string: {0}")]
    InvalidQuery(String),
}
