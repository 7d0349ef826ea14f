//! Error types for the shared curator types.

use thiserror::Error;

/// Errors raised while loading settings or (de)serializing records.
#[derive(Debug, Error)]
pub enum CuratorTypesError {
    /// Configuration error
    #[error("Configuration error: {0}")]
    Config(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid input error
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}
