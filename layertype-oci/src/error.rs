/// Errors produced while classifying or storing layer blobs.
#[derive(Debug, thiserror::Error)]
pub enum OciError {
    #[error("failed to detect layer {digest} compression type")]
    DetectionFailed { digest: String },

    #[error("digest mismatch: expected {expected}, got {actual}")]
    DigestMismatch { expected: String, actual: String },

    #[error("invalid digest: {0}")]
    InvalidDigest(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("not found: {0}")]
    NotFound(String),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, OciError>;
