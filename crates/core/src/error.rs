//! Error types for UrbanMatrix

use thiserror::Error;

/// Main error type for UrbanMatrix operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        name: &'static str,
        value: String,
        reason: String,
    },

    #[error("Invalid geometry in feature {index}: {reason}")]
    Geometry { index: usize, reason: String },

    #[error("CRS mismatch: {0} vs {1}")]
    CrsMismatch(String, String),

    #[error("Unsupported CRS: {0}")]
    UnsupportedCrs(String),

    #[error("Missing field '{field}' on cell {cell_id}")]
    MissingField { field: String, cell_id: u64 },

    #[error("Serialization error: {0}")]
    Serde(String),

    #[error("{0}")]
    Other(String),
}

/// Result type alias for UrbanMatrix operations
pub type Result<T> = std::result::Result<T, Error>;
