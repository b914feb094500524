//! Chunked multipart upload driver

use super::config::UploaderConfig;
use super::error::{UploadError, UploadResult};
use super::plan::PartPlan;
use super::retry::{with_retry, RetryPolicy};
use super::session::UploadSession;
use super::MAX_PARTS;
use crate::store::{ObjectLocation, ObjectStore, ObjectTarget, StoreError, UploadedPart};
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tokio::fs::File;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::task::{JoinError, JoinSet};

/// Uploads a byte source to an object store as fixed-size parts under one
/// multipart session.
///
/// The store client and the target are injected per call; the uploader
/// holds no bucket or credential state of its own. On every failure after
/// session initiation the session is aborted before the error is returned,
/// so no partial object ever becomes visible to readers.
pub struct ChunkedUploader<S> {
    store: Arc<S>,
    config: UploaderConfig,
}

impl<S: ObjectStore + 'static> ChunkedUploader<S> {
    /// Create an uploader with default configuration
    pub fn new(store: Arc<S>) -> Self {
        Self {
            store,
            config: UploaderConfig::default(),
        }
    }

    /// Create an uploader with a custom configuration
    pub fn with_config(store: Arc<S>, config: UploaderConfig) -> UploadResult<Self> {
        config.validate().map_err(UploadError::Config)?;
        Ok(Self { store, config })
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &UploaderConfig {
        &self.config
    }

    /// Upload an in-memory buffer
    pub async fn upload_bytes(
        &self,
        target: &ObjectTarget,
        data: Bytes,
    ) -> UploadResult<ObjectLocation> {
        let total_len = data.len() as u64;
        self.upload_reader(target, std::io::Cursor::new(data), total_len)
            .await
    }

    /// Upload a local file, taking its length from filesystem metadata
    pub async fn upload_file(
        &self,
        target: &ObjectTarget,
        local_path: &Path,
    ) -> UploadResult<ObjectLocation> {
        let file = File::open(local_path).await.map_err(|source| UploadError::Source {
            source,
            abort_failure: None,
        })?;
        let metadata = file.metadata().await.map_err(|source| UploadError::Source {
            source,
            abort_failure: None,
        })?;

        self.upload_reader(target, file, metadata.len()).await
    }

    /// Upload from any async reader of known total length.
    ///
    /// The reader is consumed by a single cursor advancing strictly
    /// forward; exactly `total_len` bytes are transferred. A reader that
    /// ends early fails the upload (and aborts the session). A zero-length
    /// source skips the multipart protocol entirely and is stored with one
    /// direct put.
    pub async fn upload_reader<R>(
        &self,
        target: &ObjectTarget,
        reader: R,
        total_len: u64,
    ) -> UploadResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + Send,
    {
        if total_len == 0 {
            tracing::debug!(%target, "empty source, storing with a direct put");
            return self
                .store
                .put_object(target, Bytes::new())
                .await
                .map_err(|source| UploadError::Put {
                    target: target.clone(),
                    source,
                });
        }

        let plan = PartPlan::new(total_len, self.config.part_size);
        if plan.part_count() > MAX_PARTS {
            return Err(UploadError::Config(format!(
                "source of {} bytes would need {} parts at part size {}, \
                 exceeding the {}-part session limit; use a larger part size",
                total_len,
                plan.part_count(),
                self.config.part_size,
                MAX_PARTS
            )));
        }

        tracing::info!(
            %target,
            total_len,
            part_size = self.config.part_size,
            parts = plan.part_count(),
            parallel = self.config.parallel_parts,
            "starting chunked upload"
        );

        let session = UploadSession::initiate(
            Arc::clone(&self.store),
            target.clone(),
            self.config.part_size,
        )
        .await?;

        if self.config.parallel_parts <= 1 {
            self.drive_sequential(session, reader, plan).await
        } else {
            self.drive_concurrent(session, reader, plan).await
        }
    }

    /// Baseline drive: one part in flight at a time.
    async fn drive_sequential<R>(
        &self,
        mut session: UploadSession<S>,
        mut reader: R,
        plan: PartPlan,
    ) -> UploadResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + Send,
    {
        for part_number in 1..=plan.part_count() {
            let want = plan.size_of(part_number) as usize;

            let chunk = match read_chunk(&mut reader, want).await {
                Ok(chunk) => chunk,
                Err(source) => {
                    return Err(session
                        .fail(UploadError::Source {
                            source,
                            abort_failure: None,
                        })
                        .await)
                }
            };
            if chunk.len() < want {
                let actual = plan.offset_of(part_number) + chunk.len() as u64;
                return Err(session
                    .fail(UploadError::LengthMismatch {
                        expected: plan.total_len(),
                        actual,
                        abort_failure: None,
                    })
                    .await);
            }

            let part = upload_one_part(
                Arc::clone(&self.store),
                session.target().clone(),
                session.upload_id().to_string(),
                part_number as i32,
                chunk,
                self.config.part_timeout,
                self.config.retry.clone(),
            )
            .await;

            match part {
                Ok(part) => session.record_part(part),
                Err(err) => return Err(session.fail(err).await),
            }
        }

        session.complete().await
    }

    /// Bounded-concurrency drive: up to `parallel_parts` uploads in flight.
    ///
    /// The source is still read by one forward-only cursor; only the store
    /// calls overlap. The first failure stops dispatch, cancels and settles
    /// the in-flight window, then aborts the session.
    async fn drive_concurrent<R>(
        &self,
        mut session: UploadSession<S>,
        mut reader: R,
        plan: PartPlan,
    ) -> UploadResult<ObjectLocation>
    where
        R: AsyncRead + Unpin + Send,
    {
        let window = self.config.parallel_parts;
        let mut tasks: JoinSet<Result<UploadedPart, UploadError>> = JoinSet::new();
        let mut failure: Option<UploadError> = None;

        for part_number in 1..=plan.part_count() {
            // Wait for a slot before reading the next chunk.
            while tasks.len() >= window && failure.is_none() {
                if let Some(joined) = tasks.join_next().await {
                    match flatten_join(joined) {
                        Ok(part) => session.record_part(part),
                        Err(err) => failure = Some(err),
                    }
                }
            }
            if failure.is_some() {
                break;
            }

            let want = plan.size_of(part_number) as usize;
            let chunk = match read_chunk(&mut reader, want).await {
                Ok(chunk) => chunk,
                Err(source) => {
                    failure = Some(UploadError::Source {
                        source,
                        abort_failure: None,
                    });
                    break;
                }
            };
            if chunk.len() < want {
                let actual = plan.offset_of(part_number) + chunk.len() as u64;
                failure = Some(UploadError::LengthMismatch {
                    expected: plan.total_len(),
                    actual,
                    abort_failure: None,
                });
                break;
            }

            tasks.spawn(upload_one_part(
                Arc::clone(&self.store),
                session.target().clone(),
                session.upload_id().to_string(),
                part_number as i32,
                chunk,
                self.config.part_timeout,
                self.config.retry.clone(),
            ));
        }

        if let Some(err) = failure {
            // No new parts start once a failure is observed; in-flight
            // uploads are cancelled and settled before the abort.
            tasks.shutdown().await;
            return Err(session.fail(err).await);
        }

        while let Some(joined) = tasks.join_next().await {
            match flatten_join(joined) {
                Ok(part) => session.record_part(part),
                Err(err) => {
                    tasks.shutdown().await;
                    return Err(session.fail(err).await);
                }
            }
        }

        session.complete().await
    }
}

/// Upload a single part with per-call timeout and bounded retry.
async fn upload_one_part<S: ObjectStore>(
    store: Arc<S>,
    target: ObjectTarget,
    upload_id: String,
    part_number: i32,
    data: Bytes,
    part_timeout: Duration,
    retry: RetryPolicy,
) -> UploadResult<UploadedPart> {
    let size = data.len();

    let etag = with_retry(&retry, || {
        let store = Arc::clone(&store);
        let target = target.clone();
        let upload_id = upload_id.clone();
        let data = data.clone();
        async move {
            match tokio::time::timeout(
                part_timeout,
                store.upload_part(&target, &upload_id, part_number, data),
            )
            .await
            {
                Ok(result) => result,
                Err(_) => Err(StoreError::Timeout(format!(
                    "part {} upload exceeded {:?}",
                    part_number, part_timeout
                ))),
            }
        }
    })
    .await
    .map_err(|source| UploadError::PartUpload {
        part_number,
        source,
        abort_failure: None,
    })?;

    Ok(UploadedPart::new(part_number, etag, size))
}

fn flatten_join(
    joined: Result<Result<UploadedPart, UploadError>, JoinError>,
) -> UploadResult<UploadedPart> {
    match joined {
        Ok(result) => result,
        Err(join_err) => Err(UploadError::Worker {
            message: join_err.to_string(),
            abort_failure: None,
        }),
    }
}

/// Read up to `want` bytes, stopping early only at end of stream.
async fn read_chunk<R>(reader: &mut R, want: usize) -> std::io::Result<Bytes>
where
    R: AsyncRead + Unpin,
{
    let mut buf = vec![0u8; want];
    let mut filled = 0;
    while filled < want {
        let n = reader.read(&mut buf[filled..]).await?;
        if n == 0 {
            break;
        }
        filled += n;
    }
    buf.truncate(filled);
    Ok(Bytes::from(buf))
}
