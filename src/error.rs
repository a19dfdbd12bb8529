//! Error types for the mutmerge library.

use thiserror::Error;

/// Errors that can occur while converting mutations or scoring them.
#[derive(Debug, Error)]
pub enum Error {
    /// An I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// A delimited (CSV/TSV) record could not be read or written.
    #[error(transparent)]
    Csv(#[from] csv::Error),

    /// JSON output could not be serialized.
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    /// A parse error occurred while reading input data.
    #[error("{0}")]
    Parse(String),

    /// A validation constraint was violated.
    #[error("{0}")]
    Validation(String),

    /// A file format error was detected, e.g. a missing required column.
    #[error("{0}")]
    Format(String),
}
