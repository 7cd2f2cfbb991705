//! Error types for the corq workspace

use thiserror::Error;

/// Result type alias using our custom Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Error taxonomy for the question-answering system.
///
/// `Classification` and `Retrieval` are recoverable at the pipeline level;
/// everything else propagates to the caller.
#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Authentication error: {0}")]
    Authentication(String),

    #[error("Classification error: {0}")]
    Classification(String),

    #[error("Retrieval error: {0}")]
    Retrieval(String),

    #[error("Schema validation error: {0}")]
    SchemaValidation(String),

    #[error("Upload error: {0}")]
    Upload(String),

    #[error("Import error: {0}")]
    Import(String),

    #[error("Model error: {0}")]
    Model(String),

    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Timeout error: {0}")]
    Timeout(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}
