//! Core error types.
//!
//! Thin data is not an error here: too few quotes or no qualifying cluster
//! is reported as `None` or an empty result. Only collaborator failures
//! surface as `CuratorError`.

use thiserror::Error;

/// Errors that abort a digest invocation.
#[derive(Debug, Error)]
pub enum CuratorError {
    /// Quote, category or history repository failed
    #[error("Repository error: {0}")]
    Repository(String),

    /// Prose generation failed
    #[error("Composition error: {0}")]
    Compose(String),

    /// Delivery failed
    #[error("Delivery error: {0}")]
    Delivery(String),

    /// Embedding generation failed
    #[error("Embedding error: {0}")]
    Embedding(String),

    /// Record not found
    #[error("Not found: {0}")]
    NotFound(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl From<curator_types::CuratorTypesError> for CuratorError {
    fn from(err: curator_types::CuratorTypesError) -> Self {
        CuratorError::InvalidInput(err.to_string())
    }
}
