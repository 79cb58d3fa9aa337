//! Error types for the extractor

use thiserror::Error;

/// Extractor error type
#[derive(Error, Debug)]
pub enum Error {
    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Invalid configuration or input data
    #[error("Validation error: {0}")]
    Validation(String),

    /// Failure while opening, writing or closing an output table
    #[error("Output error: {0}")]
    Output(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, Error>;
