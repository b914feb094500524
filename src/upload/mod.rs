//! Chunked multipart upload engine
//!
//! Splits a finite byte source of known length into fixed-size parts,
//! uploads each part under one multipart session, and completes the session
//! exactly once after every part has succeeded. On any failure after the
//! session is initiated the engine aborts the session before returning, so
//! a failed upload never leaves a partial object visible at the store.
//!
//! # Example
//!
//! ```ignore
//! use std::sync::Arc;
//! use skylift::{ChunkedUploader, ObjectTarget, S3Config, S3Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(S3Store::new(S3Config::default()).await?);
//!     let uploader = ChunkedUploader::new(store);
//!
//!     let target = ObjectTarget::new("my-bucket", "backups/archive.tar")?;
//!     let location = uploader
//!         .upload_file(&target, std::path::Path::new("archive.tar"))
//!         .await?;
//!
//!     println!("uploaded to {}", location.key);
//!     Ok(())
//! }
//! ```

mod chunked;
mod config;
mod error;
mod plan;
mod retry;
mod session;

pub use chunked::ChunkedUploader;
pub use config::{UploaderConfig, UploaderConfigBuilder};
pub use error::{UploadError, UploadResult};
pub use plan::PartPlan;
pub use retry::{with_retry, BackoffStrategy, RetryPolicy};
pub use session::UploadSession;

/// Default part size (5 MB - the minimum most S3-compatible stores accept
/// for a non-final part)
pub const DEFAULT_PART_SIZE: usize = 5 * 1024 * 1024;

/// Largest part size accepted by S3-compatible stores (5 GB)
pub const MAX_PART_SIZE: usize = 5 * 1024 * 1024 * 1024;

/// Smallest part size S3-compatible stores accept for non-final parts
pub const MIN_PART_SIZE: usize = 5 * 1024 * 1024;

/// Most parts a single session may carry (S3 protocol limit)
pub const MAX_PARTS: u64 = 10_000;

/// Default number of part uploads in flight at once
pub const DEFAULT_PARALLEL_PARTS: usize = 1;

/// Upper bound on concurrent part uploads
pub const MAX_PARALLEL_PARTS: usize = 16;
