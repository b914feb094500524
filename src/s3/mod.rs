//! S3 object store implementation
//!
//! [`S3Store`] implements the [`ObjectStore`](crate::store::ObjectStore)
//! seam on top of the official AWS SDK for Rust. It supports AWS S3 as well
//! as S3-compatible services such as MinIO and LocalStack, and adds the
//! object-level conveniences a transfer tool needs: single-call and file
//! uploads, streamed downloads, listings, and presigned URLs.
//!
//! # Examples
//!
//! ## Uploading a file
//!
//! ```ignore
//! use skylift::{ObjectTarget, S3ConfigBuilder, S3Store};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = S3ConfigBuilder::new()
//!         .region("us-east-1".to_string())
//!         .build()?;
//!
//!     let store = S3Store::new(config).await?;
//!     let target = ObjectTarget::new("my-bucket", "remote/file.bin")?;
//!     store.upload_file(Path::new("local/file.bin"), &target).await?;
//!
//!     Ok(())
//! }
//! ```
//!
//! ## Using MinIO or another S3-compatible service
//!
//! ```ignore
//! use skylift::{S3ConfigBuilder, S3Store};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = S3ConfigBuilder::new()
//!         .endpoint("http://localhost:9000".to_string())
//!         .region("us-east-1".to_string()) // Required even for MinIO
//!         .credentials("minioadmin".to_string(), "minioadmin".to_string())
//!         .force_path_style(true)
//!         .build()?;
//!
//!     let store = S3Store::new(config).await?;
//!     println!("connected: {}", store.bucket_exists("my-bucket").await?);
//!
//!     Ok(())
//! }
//! ```

mod client;
mod config;
mod multipart;
mod operations;


pub use client::S3Store;
pub use config::{S3Config, S3ConfigBuilder};

/// Longest presigned URL validity accepted by S3-compatible stores (7 days)
pub const MAX_PRESIGN_EXPIRY_SECONDS: u64 = 604_800;

/// Default request timeout in seconds
pub const DEFAULT_TIMEOUT_SECONDS: u64 = 300;
