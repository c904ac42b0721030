//! Error types for layertype

use thiserror::Error;

/// Result type alias using layertype Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in layertype operations
#[derive(Error, Debug)]
pub enum Error {
    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Blob store, detection and digest errors
    #[error(transparent)]
    Oci(#[from] layertype_oci::OciError),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A background blocking task panicked or was cancelled
    #[error("Task error: {0}")]
    Task(String),
}
