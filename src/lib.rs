/*!
 * Skylift - chunked multipart transfer client for S3-compatible object storage
 *
 * Skylift uploads large objects to an object store as a sequence of
 * fixed-size parts under a single multipart session, guaranteeing that a
 * failed upload never leaves a partial object visible to readers:
 *
 * - Fixed-size partitioning with an exact-coverage guarantee
 * - Sequential or bounded-concurrency part uploads
 * - Best-effort session abort on every failure path after initiation
 * - Bounded retry with exponential backoff on transient part failures
 * - Per-part upload timeouts
 * - An `ObjectStore` seam so the transfer core is testable without a network
 * - A ready-made S3 store built on the official AWS SDK (works with MinIO,
 *   LocalStack and other S3-compatible services)
 */

pub mod logging;
pub mod s3;
pub mod store;
pub mod upload;

// Re-export commonly used types
pub use s3::{S3Config, S3ConfigBuilder, S3Store};
pub use store::{
    ListResult, ObjectLocation, ObjectMeta, ObjectStore, ObjectTarget, StoreError, StoreResult,
    StoredObject, UploadedPart,
};
pub use upload::{
    BackoffStrategy, ChunkedUploader, PartPlan, RetryPolicy, UploadError, UploadResult,
    UploadSession, UploaderConfig, UploaderConfigBuilder,
};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
