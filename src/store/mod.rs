//! Object store abstraction
//!
//! The transfer core talks to storage through the [`ObjectStore`] trait
//! rather than a concrete SDK client. The trait covers exactly the
//! operations a multipart upload needs: initiate a session, upload parts
//! under it, complete it with an ordered part manifest, abort it, and a
//! direct single-call put for payloads that don't warrant a session.
//!
//! The production implementation is [`crate::s3::S3Store`]; tests drive the
//! transfer core against an in-memory store.

mod error;
mod types;

pub use error::{StoreError, StoreResult};
pub use types::{
    ListResult, ObjectLocation, ObjectMeta, ObjectTarget, StoredObject, UploadedPart,
};

use async_trait::async_trait;
use bytes::Bytes;

/// Operations an object store must expose for multipart transfers.
///
/// All methods take the target explicitly; implementations hold no
/// per-upload state. A session is identified by the opaque `upload_id`
/// returned from [`initiate_multipart`](ObjectStore::initiate_multipart)
/// and is destroyed by a successful complete or abort; stores must reject
/// further calls against a destroyed session.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Open a new multipart session for `target`, returning its upload id.
    async fn initiate_multipart(&self, target: &ObjectTarget) -> StoreResult<String>;

    /// Upload one part under `(upload_id, part_number)`, returning its etag.
    async fn upload_part(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StoreResult<String>;

    /// Complete the session from an ordered part manifest.
    ///
    /// `parts` must be sorted by ascending part number with no gaps; the
    /// store validates the manifest and assembles the final object.
    async fn complete_multipart(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> StoreResult<ObjectLocation>;

    /// Abort the session, discarding all uploaded-but-uncommitted parts.
    async fn abort_multipart(&self, target: &ObjectTarget, upload_id: &str) -> StoreResult<()>;

    /// Store an object in a single call, outside any multipart session.
    async fn put_object(&self, target: &ObjectTarget, data: Bytes) -> StoreResult<ObjectLocation>;
}
