//! Error types for object store operations

use std::io;
use thiserror::Error;

/// Result type alias for store operations
pub type StoreResult<T> = Result<T, StoreError>;

/// Errors reported by an object store implementation
#[derive(Error, Debug, Clone)]
pub enum StoreError {
    /// SDK-level error from the underlying client
    #[error("storage SDK error: {0}")]
    Sdk(String),

    /// Store service error with a specific error code
    #[error("storage service error ({code}): {message}")]
    Service { code: String, message: String },

    /// Object not found in bucket
    #[error("object not found: {bucket}/{key}")]
    NotFound { bucket: String, key: String },

    /// Bucket not found or not accessible
    #[error("bucket not found or not accessible: {0}")]
    BucketNotFound(String),

    /// Access denied error
    #[error("access denied: {0}")]
    AccessDenied(String),

    /// Invalid upload target (bucket/key)
    #[error("invalid target: {0}")]
    InvalidTarget(String),

    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// Store did not return a session id when initiating a multipart upload
    #[error("no upload id returned for multipart session")]
    MissingUploadId,

    /// Store did not return an etag for an uploaded part
    #[error("no etag returned for part {part_number}")]
    MissingEtag { part_number: i32 },

    /// The multipart session has already been completed or aborted
    #[error("multipart session {upload_id} is closed")]
    SessionClosed { upload_id: String },

    /// I/O error
    #[error("I/O error: {0}")]
    Io(String),

    /// Network error
    #[error("network error: {0}")]
    Network(String),

    /// Timeout error
    #[error("operation timed out: {0}")]
    Timeout(String),
}

impl StoreError {
    /// Check if error is retryable
    pub fn is_retryable(&self) -> bool {
        match self {
            StoreError::Network(_) => true,
            StoreError::Timeout(_) => true,
            StoreError::Io(_) => true,
            // SDK errors: check for network-related strings
            StoreError::Sdk(msg) => {
                let lower = msg.to_lowercase();
                lower.contains("connection reset")
                    || lower.contains("connection timed out")
                    || lower.contains("broken pipe")
                    || lower.contains("connection refused")
                    || lower.contains("temporarily unavailable")
            }
            StoreError::Service { code, .. } => is_retryable_code(code),
            _ => false,
        }
    }

    /// Check if error is transient (safe to retry without operator action)
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            StoreError::Network(_) | StoreError::Timeout(_) | StoreError::Io(_)
        )
    }
}

impl From<io::Error> for StoreError {
    fn from(err: io::Error) -> Self {
        StoreError::Io(err.to_string())
    }
}

/// Check if a store error code is retryable
pub(crate) fn is_retryable_code(code: &str) -> bool {
    matches!(
        code,
        "RequestTimeout"
            | "ServiceUnavailable"
            | "InternalError"
            | "SlowDown"
            | "RequestTimeTooSkewed"
    )
}
