use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// A point read or merge update referenced a document that does not exist.
    #[error("Document not found")]
    NotFound,

    /// Document payloads must be JSON objects.
    #[error("Invalid document payload: {0}")]
    InvalidDocument(String),

    /// JSON (de)serialization failure.
    #[error("Serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Failure reported by the backing store (network, injected fault, ...).
    #[error("Store backend error: {0}")]
    Backend(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;
