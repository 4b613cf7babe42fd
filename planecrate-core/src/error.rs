//! Error types for planecrate

use thiserror::Error;

/// Main error type for planecrate operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid data: {0}")]
    InvalidData(String),

    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),

    #[error("Missing attribute: {0}")]
    MissingAttribute(&'static str),

    #[error("Algorithm error: {0}")]
    Algorithm(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),
}

/// Result type alias for planecrate operations
pub type Result<T> = std::result::Result<T, Error>;
