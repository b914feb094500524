//! Multipart upload session lifecycle

use super::error::{UploadError, UploadResult};
use crate::store::{ObjectLocation, ObjectStore, ObjectTarget, UploadedPart};
use std::sync::Arc;

/// One in-progress multipart upload.
///
/// A session is created by [`initiate`](UploadSession::initiate) and moves
/// through part recording to exactly one of two terminal states: completed
/// (object visible, session destroyed at the store) or aborted (no object,
/// all parts discarded). Both terminal transitions consume the session, so
/// a completed or aborted session cannot be touched again.
pub struct UploadSession<S> {
    store: Arc<S>,
    target: ObjectTarget,
    upload_id: String,
    part_size: usize,
    parts: Vec<UploadedPart>,
}

impl<S: ObjectStore> UploadSession<S> {
    /// Open a new session at the store.
    ///
    /// Initiation failures carry no cleanup obligation: no store-side state
    /// exists until the store hands back an upload id.
    pub(crate) async fn initiate(
        store: Arc<S>,
        target: ObjectTarget,
        part_size: usize,
    ) -> UploadResult<Self> {
        let upload_id = store
            .initiate_multipart(&target)
            .await
            .map_err(|source| UploadError::SessionInitiation {
                target: target.clone(),
                source,
            })?;

        tracing::debug!(%target, %upload_id, part_size, "initiated multipart session");

        Ok(Self {
            store,
            target,
            upload_id,
            part_size,
            parts: Vec::new(),
        })
    }

    /// The store-issued session id
    pub fn upload_id(&self) -> &str {
        &self.upload_id
    }

    /// The upload target
    pub fn target(&self) -> &ObjectTarget {
        &self.target
    }

    /// Fixed part size for this session
    pub fn part_size(&self) -> usize {
        self.part_size
    }

    /// Parts recorded so far, in recording order
    pub fn parts(&self) -> &[UploadedPart] {
        &self.parts
    }

    /// Total bytes covered by recorded parts
    pub fn bytes_recorded(&self) -> u64 {
        self.parts.iter().map(|p| p.size as u64).sum()
    }

    pub(crate) fn record_part(&mut self, part: UploadedPart) {
        tracing::debug!(
            upload_id = %self.upload_id,
            part_number = part.part_number,
            size = part.size,
            etag = %part.etag,
            "recorded uploaded part"
        );
        self.parts.push(part);
    }

    /// Complete the session with the recorded parts.
    ///
    /// Parts are sorted by ascending part number before the manifest is
    /// submitted; the store only requires manifest order, not physical
    /// upload order. If the store rejects the manifest the session is
    /// aborted before the error is returned.
    pub(crate) async fn complete(mut self) -> UploadResult<ObjectLocation> {
        self.parts.sort_by_key(|p| p.part_number);

        match self
            .store
            .complete_multipart(&self.target, &self.upload_id, &self.parts)
            .await
        {
            Ok(location) => {
                tracing::info!(
                    target = %self.target,
                    upload_id = %self.upload_id,
                    parts = self.parts.len(),
                    bytes = self.bytes_recorded(),
                    "completed multipart upload"
                );
                Ok(location)
            }
            Err(source) => {
                let original = UploadError::Completion {
                    upload_id: self.upload_id.clone(),
                    source,
                    abort_failure: None,
                };
                Err(self.fail(original).await)
            }
        }
    }

    /// Abort the session after `original` occurred, returning the error to
    /// propagate.
    ///
    /// The original failure always takes propagation priority: a failed
    /// abort is logged and attached to it, never substituted for it.
    pub(crate) async fn fail(self, original: UploadError) -> UploadError {
        tracing::warn!(
            upload_id = %self.upload_id,
            error = %original,
            "aborting multipart session after failure"
        );

        match self
            .store
            .abort_multipart(&self.target, &self.upload_id)
            .await
        {
            Ok(()) => original,
            Err(abort_err) => {
                tracing::error!(
                    upload_id = %self.upload_id,
                    error = %abort_err,
                    "failed to abort multipart session; parts may be orphaned at the store"
                );
                original.with_abort_failure(abort_err)
            }
        }
    }
}
