//! Error types for synthscope-core

use thiserror::Error;

/// Main error type for the synthscope-core library
#[derive(Error, Debug)]
pub enum Error {
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Health probe failed or returned an unusable response
    #[error("health probe error: {0}")]
    Probe(String),
}

/// Result type alias for synthscope-core
pub type Result<T> = std::result::Result<T, Error>;
