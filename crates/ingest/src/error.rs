//! Error types for footprint ingestion.

use thiserror::Error;

/// Errors produced by the footprint ingestion layer.
#[derive(Error, Debug)]
pub enum IngestError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("network error: {0}")]
    Network(String),

    #[error("decompression failed: {0}")]
    Decompress(String),

    #[error("dataset index: {0}")]
    Index(String),

    #[error("record {line}: {reason}")]
    Record { line: usize, reason: String },

    #[error("core error: {0}")]
    Core(#[from] urbanmatrix_core::Error),
}

/// Result alias for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;
