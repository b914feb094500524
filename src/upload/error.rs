//! Error types for the chunked upload engine

use crate::store::{ObjectTarget, StoreError};
use std::io;
use thiserror::Error;

/// Result type alias for upload operations
pub type UploadResult<T> = Result<T, UploadError>;

/// Errors reported by the chunked upload engine.
///
/// Failures that occur after a multipart session has been initiated trigger
/// a best-effort abort of the session; if that abort itself fails, the abort
/// error is attached to the original failure and available through
/// [`abort_failure`](UploadError::abort_failure). The original error is
/// always the one propagated.
#[derive(Error, Debug)]
pub enum UploadError {
    /// The store refused to open a multipart session
    #[error("failed to initiate multipart session for {target}: {source}")]
    SessionInitiation {
        target: ObjectTarget,
        #[source]
        source: StoreError,
    },

    /// An individual part upload failed
    #[error("failed to upload part {part_number}: {source}")]
    PartUpload {
        part_number: i32,
        #[source]
        source: StoreError,
        abort_failure: Option<StoreError>,
    },

    /// The store rejected the completion manifest
    #[error("failed to complete multipart session {upload_id}: {source}")]
    Completion {
        upload_id: String,
        #[source]
        source: StoreError,
        abort_failure: Option<StoreError>,
    },

    /// An explicit abort of the session failed
    #[error("failed to abort multipart session {upload_id}: {source}")]
    Abort {
        upload_id: String,
        #[source]
        source: StoreError,
    },

    /// Reading the local byte source failed
    #[error("failed to read upload source: {source}")]
    Source {
        #[source]
        source: io::Error,
        abort_failure: Option<StoreError>,
    },

    /// The source yielded fewer bytes than its declared length
    #[error("source length mismatch: expected {expected} bytes, read {actual}")]
    LengthMismatch {
        expected: u64,
        actual: u64,
        abort_failure: Option<StoreError>,
    },

    /// A part upload worker task failed outside the store call itself
    #[error("part upload task failed: {message}")]
    Worker {
        message: String,
        abort_failure: Option<StoreError>,
    },

    /// A direct (non-multipart) put failed
    #[error("direct put to {target} failed: {source}")]
    Put {
        target: ObjectTarget,
        #[source]
        source: StoreError,
    },

    /// Invalid uploader configuration
    #[error("invalid uploader configuration: {0}")]
    Config(String),
}

impl UploadError {
    /// The abort error recorded when session cleanup also failed, if any
    pub fn abort_failure(&self) -> Option<&StoreError> {
        match self {
            UploadError::PartUpload { abort_failure, .. }
            | UploadError::Completion { abort_failure, .. }
            | UploadError::Source { abort_failure, .. }
            | UploadError::LengthMismatch { abort_failure, .. }
            | UploadError::Worker { abort_failure, .. } => abort_failure.as_ref(),
            _ => None,
        }
    }

    /// The failed part number, for part upload errors
    pub fn part_number(&self) -> Option<i32> {
        match self {
            UploadError::PartUpload { part_number, .. } => Some(*part_number),
            _ => None,
        }
    }

    /// Attach the error from a failed session abort.
    ///
    /// No-op for variants where no session existed to abort; those paths
    /// never attempt cleanup.
    pub(crate) fn with_abort_failure(mut self, abort_err: StoreError) -> Self {
        match &mut self {
            UploadError::PartUpload { abort_failure, .. }
            | UploadError::Completion { abort_failure, .. }
            | UploadError::Source { abort_failure, .. }
            | UploadError::LengthMismatch { abort_failure, .. }
            | UploadError::Worker { abort_failure, .. } => {
                *abort_failure = Some(abort_err);
            }
            _ => {}
        }
        self
    }
}
