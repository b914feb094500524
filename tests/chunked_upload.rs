/*!
 * Integration tests for the chunked upload engine
 *
 * These tests drive ChunkedUploader against an in-memory mock store, so
 * every protocol interaction (initiate, per-part upload, completion
 * manifest, abort) can be observed and failure injection is deterministic.
 */

use async_trait::async_trait;
use bytes::Bytes;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use skylift::{
    BackoffStrategy, ChunkedUploader, ObjectLocation, ObjectStore, ObjectTarget, RetryPolicy,
    StoreError, StoreResult, UploadError, UploadedPart, UploaderConfig, UploaderConfigBuilder,
};

const MIB: usize = 1024 * 1024;

#[derive(Default)]
struct MockSession {
    target: String,
    parts: BTreeMap<i32, Vec<u8>>,
    closed: bool,
}

#[derive(Default)]
struct MockState {
    next_id: u64,
    sessions: HashMap<String, MockSession>,
    objects: HashMap<String, Vec<u8>>,
    manifests: Vec<Vec<i32>>,
    initiate_calls: u32,
    put_calls: u32,
    abort_calls: Vec<String>,
    complete_calls: Vec<String>,
    fail_initiate: Option<StoreError>,
    fail_complete: Option<StoreError>,
    fail_abort: Option<StoreError>,
    // part number -> (remaining failures, error to produce)
    part_failures: HashMap<i32, (u32, StoreError)>,
    part_attempts: HashMap<i32, u32>,
}

/// In-memory object store that records every protocol interaction
#[derive(Default)]
struct MockStore {
    state: Mutex<MockState>,
}

impl MockStore {
    fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    fn fail_initiate(&self, error: StoreError) {
        self.state.lock().unwrap().fail_initiate = Some(error);
    }

    fn fail_complete(&self, error: StoreError) {
        self.state.lock().unwrap().fail_complete = Some(error);
    }

    fn fail_abort(&self, error: StoreError) {
        self.state.lock().unwrap().fail_abort = Some(error);
    }

    /// Make uploads of `part_number` fail `times` times with `error`
    fn fail_part(&self, part_number: i32, times: u32, error: StoreError) {
        self.state
            .lock()
            .unwrap()
            .part_failures
            .insert(part_number, (times, error));
    }

    fn object(&self, target: &ObjectTarget) -> Option<Vec<u8>> {
        self.state
            .lock()
            .unwrap()
            .objects
            .get(&target.to_string())
            .cloned()
    }

    fn initiate_calls(&self) -> u32 {
        self.state.lock().unwrap().initiate_calls
    }

    fn put_calls(&self) -> u32 {
        self.state.lock().unwrap().put_calls
    }

    fn abort_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().abort_calls.clone()
    }

    fn complete_calls(&self) -> Vec<String> {
        self.state.lock().unwrap().complete_calls.clone()
    }

    fn manifests(&self) -> Vec<Vec<i32>> {
        self.state.lock().unwrap().manifests.clone()
    }

    fn part_attempts(&self, part_number: i32) -> u32 {
        self.state
            .lock()
            .unwrap()
            .part_attempts
            .get(&part_number)
            .copied()
            .unwrap_or(0)
    }

    fn recorded_part_sizes(&self, upload_id: &str) -> Vec<usize> {
        let state = self.state.lock().unwrap();
        state.sessions[upload_id]
            .parts
            .values()
            .map(|data| data.len())
            .collect()
    }
}

#[async_trait]
impl ObjectStore for MockStore {
    async fn initiate_multipart(&self, target: &ObjectTarget) -> StoreResult<String> {
        let mut state = self.state.lock().unwrap();
        state.initiate_calls += 1;
        if let Some(err) = &state.fail_initiate {
            return Err(err.clone());
        }

        state.next_id += 1;
        let upload_id = format!("upload-{}", state.next_id);
        state.sessions.insert(
            upload_id.clone(),
            MockSession {
                target: target.to_string(),
                ..Default::default()
            },
        );
        Ok(upload_id)
    }

    async fn upload_part(
        &self,
        _target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StoreResult<String> {
        let mut state = self.state.lock().unwrap();
        *state.part_attempts.entry(part_number).or_insert(0) += 1;

        if let Some((remaining, error)) = state.part_failures.get_mut(&part_number) {
            if *remaining > 0 {
                *remaining -= 1;
                let err = error.clone();
                return Err(err);
            }
        }

        let session = state
            .sessions
            .get_mut(upload_id)
            .ok_or_else(|| StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            })?;
        if session.closed {
            return Err(StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            });
        }

        let etag = format!("etag-{}-{}", part_number, data.len());
        session.parts.insert(part_number, data.to_vec());
        Ok(etag)
    }

    async fn complete_multipart(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> StoreResult<ObjectLocation> {
        let mut state = self.state.lock().unwrap();
        state.complete_calls.push(upload_id.to_string());
        state
            .manifests
            .push(parts.iter().map(|p| p.part_number).collect());

        if let Some(err) = &state.fail_complete {
            return Err(err.clone());
        }

        let session = state
            .sessions
            .get(upload_id)
            .ok_or_else(|| StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            })?;
        if session.closed {
            return Err(StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            });
        }
        if session.target != target.to_string() {
            return Err(StoreError::InvalidTarget(format!(
                "session {} belongs to {}",
                upload_id, session.target
            )));
        }

        // Manifest must be 1..=n, ascending, no gaps, matching uploaded parts
        for (i, part) in parts.iter().enumerate() {
            let expected = (i + 1) as i32;
            if part.part_number != expected {
                return Err(StoreError::Service {
                    code: "InvalidPartOrder".to_string(),
                    message: format!(
                        "manifest entry {} has part number {}",
                        i, part.part_number
                    ),
                });
            }
            if !session.parts.contains_key(&part.part_number) {
                return Err(StoreError::Service {
                    code: "InvalidPart".to_string(),
                    message: format!("part {} was never uploaded", part.part_number),
                });
            }
        }
        if parts.len() != session.parts.len() {
            return Err(StoreError::Service {
                code: "InvalidPart".to_string(),
                message: "manifest does not cover all uploaded parts".to_string(),
            });
        }

        let mut assembled = Vec::new();
        for part in parts {
            assembled.extend_from_slice(&session.parts[&part.part_number]);
        }

        let session = state.sessions.get_mut(upload_id).unwrap();
        session.closed = true;
        state.objects.insert(target.to_string(), assembled);

        Ok(ObjectLocation {
            bucket: target.bucket().to_string(),
            key: target.key().to_string(),
            etag: Some(format!("etag-{}", upload_id)),
            location: Some(format!("mock://{}", target)),
        })
    }

    async fn abort_multipart(&self, _target: &ObjectTarget, upload_id: &str) -> StoreResult<()> {
        let mut state = self.state.lock().unwrap();
        state.abort_calls.push(upload_id.to_string());

        if let Some(err) = &state.fail_abort {
            return Err(err.clone());
        }

        let session = state
            .sessions
            .get_mut(upload_id)
            .ok_or_else(|| StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            })?;
        if session.closed {
            return Err(StoreError::SessionClosed {
                upload_id: upload_id.to_string(),
            });
        }

        session.closed = true;
        session.parts.clear();
        Ok(())
    }

    async fn put_object(&self, target: &ObjectTarget, data: Bytes) -> StoreResult<ObjectLocation> {
        let mut state = self.state.lock().unwrap();
        state.put_calls += 1;
        state.objects.insert(target.to_string(), data.to_vec());

        Ok(ObjectLocation {
            bucket: target.bucket().to_string(),
            key: target.key().to_string(),
            etag: Some("etag-put".to_string()),
            location: None,
        })
    }
}

fn target() -> ObjectTarget {
    ObjectTarget::new("test-bucket", "path/to/object.bin").unwrap()
}

fn patterned(len: usize) -> Vec<u8> {
    (0..len).map(|i| (i % 251) as u8).collect()
}

/// Retry policy with negligible delays for tests that exercise retries
fn fast_retry(max_attempts: u32) -> RetryPolicy {
    RetryPolicy {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(10),
        backoff: BackoffStrategy::Fixed,
        jitter_factor: 0.0,
    }
}

fn uploader(store: Arc<MockStore>, part_size: usize, parallel: usize) -> ChunkedUploader<MockStore> {
    let config = UploaderConfigBuilder::new()
        .part_size(part_size)
        .parallel_parts(parallel)
        .retry(RetryPolicy::none())
        .build()
        .unwrap();
    ChunkedUploader::with_config(store, config).unwrap()
}

#[tokio::test]
async fn test_sequential_round_trip() {
    let store = MockStore::new();
    let data = patterned(10);

    let location = uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::from(data.clone()))
        .await
        .unwrap();

    assert_eq!(location.bucket, "test-bucket");
    assert_eq!(location.key, "path/to/object.bin");
    assert_eq!(store.object(&target()).unwrap(), data);
    assert_eq!(store.initiate_calls(), 1);
    assert_eq!(store.complete_calls().len(), 1);
    assert!(store.abort_calls().is_empty());
}

#[tokio::test]
async fn test_round_trip_exact_multiple_of_part_size() {
    let store = MockStore::new();
    let data = patterned(12);

    uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::from(data.clone()))
        .await
        .unwrap();

    assert_eq!(store.object(&target()).unwrap(), data);
    assert_eq!(store.manifests(), vec![vec![1, 2, 3]]);
}

#[tokio::test]
async fn test_sixteen_mib_makes_four_five_mib_parts() {
    let store = MockStore::new();
    let data = patterned(16 * MIB);

    let location = uploader(Arc::clone(&store), 5 * MIB, 1)
        .upload_bytes(&target(), Bytes::from(data.clone()))
        .await
        .unwrap();

    assert!(location.location.is_some());
    assert_eq!(
        store.recorded_part_sizes("upload-1"),
        vec![5 * MIB, 5 * MIB, 5 * MIB, MIB]
    );
    assert_eq!(store.manifests(), vec![vec![1, 2, 3, 4]]);
    assert_eq!(store.object(&target()).unwrap(), data);
}

#[tokio::test]
async fn test_part_two_failure_aborts_exactly_once() {
    let store = MockStore::new();
    store.fail_part(2, u32::MAX, StoreError::AccessDenied("injected".to_string()));
    let data = patterned(12 * MIB);

    let err = uploader(Arc::clone(&store), 5 * MIB, 1)
        .upload_bytes(&target(), Bytes::from(data))
        .await
        .unwrap_err();

    assert_eq!(err.part_number(), Some(2));
    assert!(matches!(err, UploadError::PartUpload { part_number: 2, .. }));
    assert!(err.abort_failure().is_none());

    // Part 1 succeeded, part 2 failed, part 3 never attempted
    assert_eq!(store.part_attempts(1), 1);
    assert_eq!(store.part_attempts(2), 1);
    assert_eq!(store.part_attempts(3), 0);

    // Exactly one abort against the initiated session, no completion, no object
    assert_eq!(store.abort_calls(), vec!["upload-1".to_string()]);
    assert!(store.complete_calls().is_empty());
    assert!(store.object(&target()).is_none());
}

#[tokio::test]
async fn test_zero_length_source_uses_direct_put() {
    let store = MockStore::new();

    let location = uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::new())
        .await
        .unwrap();

    assert_eq!(location.key, "path/to/object.bin");
    assert_eq!(store.put_calls(), 1);
    assert_eq!(store.initiate_calls(), 0);
    assert_eq!(store.object(&target()).unwrap(), Vec::<u8>::new());
}

#[tokio::test]
async fn test_concurrent_round_trip() {
    let store = MockStore::new();
    let data = patterned(23);

    uploader(Arc::clone(&store), 4, 4)
        .upload_bytes(&target(), Bytes::from(data.clone()))
        .await
        .unwrap();

    assert_eq!(store.object(&target()).unwrap(), data);
    // Manifest is ascending and complete regardless of physical upload order
    assert_eq!(store.manifests(), vec![vec![1, 2, 3, 4, 5, 6]]);
}

#[tokio::test]
async fn test_concurrent_failure_aborts_exactly_once() {
    let store = MockStore::new();
    store.fail_part(3, u32::MAX, StoreError::AccessDenied("injected".to_string()));
    let data = patterned(40);

    let err = uploader(Arc::clone(&store), 4, 4)
        .upload_bytes(&target(), Bytes::from(data))
        .await
        .unwrap_err();

    assert_eq!(err.part_number(), Some(3));
    assert_eq!(store.abort_calls().len(), 1);
    assert!(store.complete_calls().is_empty());
    assert!(store.object(&target()).is_none());
}

#[tokio::test]
async fn test_abort_failure_is_attached_not_substituted() {
    let store = MockStore::new();
    store.fail_part(2, u32::MAX, StoreError::AccessDenied("injected".to_string()));
    store.fail_abort(StoreError::Network("abort rejected".to_string()));
    let data = patterned(12);

    let err = uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::from(data))
        .await
        .unwrap_err();

    // The original part failure propagates; the abort failure rides along
    assert_eq!(err.part_number(), Some(2));
    assert!(matches!(
        err.abort_failure(),
        Some(StoreError::Network(_))
    ));
    assert_eq!(store.abort_calls().len(), 1);
}

#[tokio::test]
async fn test_transient_part_failure_is_retried() {
    let store = MockStore::new();
    store.fail_part(1, 2, StoreError::Network("flaky".to_string()));
    let data = patterned(10);

    let config = UploaderConfigBuilder::new()
        .part_size(4)
        .retry(fast_retry(3))
        .build()
        .unwrap();
    let up = ChunkedUploader::with_config(Arc::clone(&store), config).unwrap();

    up.upload_bytes(&target(), Bytes::from(data.clone()))
        .await
        .unwrap();

    assert_eq!(store.part_attempts(1), 3); // two transient failures, then success
    assert_eq!(store.object(&target()).unwrap(), data);
    assert!(store.abort_calls().is_empty());
}

#[tokio::test]
async fn test_exhausted_retries_fail_the_part() {
    let store = MockStore::new();
    store.fail_part(1, u32::MAX, StoreError::Network("down".to_string()));
    let data = patterned(10);

    let config = UploaderConfigBuilder::new()
        .part_size(4)
        .retry(fast_retry(2))
        .build()
        .unwrap();
    let up = ChunkedUploader::with_config(Arc::clone(&store), config).unwrap();

    let err = up
        .upload_bytes(&target(), Bytes::from(data))
        .await
        .unwrap_err();

    assert_eq!(err.part_number(), Some(1));
    assert_eq!(store.part_attempts(1), 2);
    assert_eq!(store.abort_calls().len(), 1);
}

#[tokio::test]
async fn test_short_reader_aborts_with_length_mismatch() {
    let store = MockStore::new();
    let data = patterned(5);

    // Declared length exceeds what the reader can produce
    let err = uploader(Arc::clone(&store), 4, 1)
        .upload_reader(&target(), std::io::Cursor::new(data), 8)
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        UploadError::LengthMismatch {
            expected: 8,
            actual: 5,
            ..
        }
    ));
    assert_eq!(store.abort_calls().len(), 1);
    assert!(store.object(&target()).is_none());
}

#[tokio::test]
async fn test_completion_rejection_aborts_session() {
    let store = MockStore::new();
    store.fail_complete(StoreError::Service {
        code: "InvalidPart".to_string(),
        message: "part below minimum size".to_string(),
    });
    let data = patterned(10);

    let err = uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::from(data))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Completion { .. }));
    assert_eq!(store.complete_calls().len(), 1);
    assert_eq!(store.abort_calls().len(), 1);
    assert!(store.object(&target()).is_none());
}

#[tokio::test]
async fn test_initiation_failure_has_nothing_to_clean_up() {
    let store = MockStore::new();
    store.fail_initiate(StoreError::BucketNotFound("test-bucket".to_string()));

    let err = uploader(Arc::clone(&store), 4, 1)
        .upload_bytes(&target(), Bytes::from(patterned(10)))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::SessionInitiation { .. }));
    assert_eq!(store.initiate_calls(), 1);
    assert!(store.abort_calls().is_empty());
}

#[tokio::test]
async fn test_part_count_limit_rejected_before_initiation() {
    let store = MockStore::new();

    let err = uploader(Arc::clone(&store), 1, 1)
        .upload_bytes(&target(), Bytes::from(patterned(10_001)))
        .await
        .unwrap_err();

    assert!(matches!(err, UploadError::Config(_)));
    assert_eq!(store.initiate_calls(), 0);
}

#[tokio::test]
async fn test_store_rejects_complete_after_complete() {
    let store = MockStore::new();
    let t = target();

    let upload_id = store.initiate_multipart(&t).await.unwrap();
    let etag = store
        .upload_part(&t, &upload_id, 1, Bytes::from_static(b"data"))
        .await
        .unwrap();
    let parts = vec![UploadedPart::new(1, etag, 4)];

    store
        .complete_multipart(&t, &upload_id, &parts)
        .await
        .unwrap();

    // A second completion of the same session must surface an error
    let err = store
        .complete_multipart(&t, &upload_id, &parts)
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::SessionClosed { .. }));
}

#[tokio::test]
async fn test_store_rejects_abort_after_complete() {
    let store = MockStore::new();
    let t = target();

    let upload_id = store.initiate_multipart(&t).await.unwrap();
    let etag = store
        .upload_part(&t, &upload_id, 1, Bytes::from_static(b"data"))
        .await
        .unwrap();
    store
        .complete_multipart(&t, &upload_id, &[UploadedPart::new(1, etag, 4)])
        .await
        .unwrap();

    let err = store.abort_multipart(&t, &upload_id).await.unwrap_err();
    assert!(matches!(err, StoreError::SessionClosed { .. }));
}

#[tokio::test]
async fn test_upload_file_round_trip() {
    let store = MockStore::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("payload.bin");
    let data = patterned(11);
    std::fs::write(&path, &data).unwrap();

    uploader(Arc::clone(&store), 4, 1)
        .upload_file(&target(), &path)
        .await
        .unwrap();

    assert_eq!(store.object(&target()).unwrap(), data);
}

#[tokio::test]
async fn test_upload_empty_file_uses_direct_put() {
    let store = MockStore::new();
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("empty.bin");
    std::fs::write(&path, b"").unwrap();

    uploader(Arc::clone(&store), 4, 1)
        .upload_file(&target(), &path)
        .await
        .unwrap();

    assert_eq!(store.put_calls(), 1);
    assert_eq!(store.initiate_calls(), 0);
}

#[tokio::test]
async fn test_default_config_uploader_construction() {
    // Default configuration is valid and usable as-is
    let store = MockStore::new();
    let up = ChunkedUploader::new(store);
    assert_eq!(up.config().part_size, UploaderConfig::default().part_size);
}
