//! Object-level convenience operations for the S3 store

use super::client::S3Store;
use super::MAX_PRESIGN_EXPIRY_SECONDS;
use crate::store::{
    ListResult, ObjectLocation, ObjectStore, ObjectTarget, StoreError, StoreResult, StoredObject,
};
use crate::upload::{ChunkedUploader, UploadError, UploadResult};
use aws_sdk_s3::presigning::PresigningConfig;
use bytes::Bytes;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::fs::File;
use tokio::io::AsyncWriteExt;

impl S3Store {
    /// Upload a local file.
    ///
    /// Files smaller than the configured part size go up as a single put;
    /// larger files run through the chunked multipart engine with this
    /// store's part size, parallelism, timeout and retry settings. The
    /// Content-Type is guessed from the file name unless the configuration
    /// pins one.
    pub async fn upload_file(
        &self,
        local_path: &Path,
        target: &ObjectTarget,
    ) -> UploadResult<ObjectLocation> {
        let metadata = tokio::fs::metadata(local_path)
            .await
            .map_err(|source| UploadError::Source {
                source,
                abort_failure: None,
            })?;
        let file_size = metadata.len();

        let store = if self.config().content_type.is_none() {
            match mime_guess::from_path(local_path).first_raw() {
                Some(mime) => self.with_content_type(mime.to_string()),
                None => self.clone(),
            }
        } else {
            self.clone()
        };

        if file_size < store.config().part_size as u64 {
            let data = tokio::fs::read(local_path)
                .await
                .map_err(|source| UploadError::Source {
                    source,
                    abort_failure: None,
                })?;
            return store
                .put_object(target, Bytes::from(data))
                .await
                .map_err(|source| UploadError::Put {
                    target: target.clone(),
                    source,
                });
        }

        let uploader_config = store.config().uploader_config();
        let uploader = ChunkedUploader::with_config(Arc::new(store), uploader_config)?;
        uploader.upload_file(target, local_path).await
    }

    /// Upload an in-memory buffer as a single put
    pub async fn upload_bytes(
        &self,
        data: Bytes,
        target: &ObjectTarget,
    ) -> StoreResult<ObjectLocation> {
        self.put_object(target, data).await
    }

    /// Download an object, streaming it to a local file
    pub async fn download_file(&self, target: &ObjectTarget, local_path: &Path) -> StoreResult<()> {
        let response = self
            .aws_client()
            .get_object()
            .bucket(target.bucket())
            .key(target.key())
            .send()
            .await
            .map_err(|e| self.map_get_error(target, e))?;

        // Create parent directories if they don't exist
        if let Some(parent) = local_path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        // Stream the data to file
        let mut file = File::create(local_path).await?;
        let mut body = response.body;

        while let Some(bytes) = body
            .try_next()
            .await
            .map_err(|e| StoreError::Network(format!("failed to read response body: {}", e)))?
        {
            file.write_all(&bytes).await?;
        }

        file.flush().await?;
        Ok(())
    }

    /// Download an object into memory
    pub async fn download_bytes(&self, target: &ObjectTarget) -> StoreResult<Bytes> {
        let response = self
            .aws_client()
            .get_object()
            .bucket(target.bucket())
            .key(target.key())
            .send()
            .await
            .map_err(|e| self.map_get_error(target, e))?;

        let body = response
            .body
            .collect()
            .await
            .map_err(|e| StoreError::Network(format!("failed to collect response body: {}", e)))?;

        Ok(body.into_bytes())
    }

    /// List objects in a bucket under a prefix (first page)
    pub async fn list_objects(&self, bucket: &str, prefix: &str) -> StoreResult<ListResult> {
        self.list_objects_page(bucket, prefix, None, None).await
    }

    /// List objects with pagination support
    pub async fn list_objects_page(
        &self,
        bucket: &str,
        prefix: &str,
        continuation_token: Option<String>,
        max_keys: Option<i32>,
    ) -> StoreResult<ListResult> {
        let mut request = self
            .aws_client()
            .list_objects_v2()
            .bucket(bucket)
            .prefix(prefix);

        if let Some(token) = continuation_token {
            request = request.continuation_token(token);
        }

        if let Some(max) = max_keys {
            request = request.max_keys(max);
        }

        let response = request.send().await.map_err(StoreError::from)?;

        let objects = response
            .contents()
            .iter()
            .filter_map(|obj| {
                let key = obj.key()?.to_string();
                let size = obj.size().unwrap_or(0) as u64;
                let last_modified = obj
                    .last_modified()
                    .and_then(|dt| SystemTime::try_from(*dt).ok());
                let etag = obj.e_tag().map(|s| s.to_string());

                Some(StoredObject {
                    key,
                    size,
                    last_modified,
                    etag,
                })
            })
            .collect();

        let common_prefixes = response
            .common_prefixes()
            .iter()
            .filter_map(|cp| cp.prefix().map(|s| s.to_string()))
            .collect();

        let is_truncated = response.is_truncated().unwrap_or(false);
        let continuation_token = response.next_continuation_token().map(|s| s.to_string());

        Ok(ListResult {
            objects,
            common_prefixes,
            continuation_token,
            is_truncated,
        })
    }

    /// Generate a presigned GET URL granting temporary read access
    pub async fn presigned_get_url(
        &self,
        target: &ObjectTarget,
        expires_in: Duration,
    ) -> StoreResult<String> {
        let presigning = presigning_config(expires_in)?;

        let request = self
            .aws_client()
            .get_object()
            .bucket(target.bucket())
            .key(target.key())
            .presigned(presigning)
            .await
            .map_err(StoreError::from)?;

        Ok(request.uri().to_string())
    }

    /// Generate a presigned PUT URL granting temporary write access
    pub async fn presigned_put_url(
        &self,
        target: &ObjectTarget,
        expires_in: Duration,
    ) -> StoreResult<String> {
        let presigning = presigning_config(expires_in)?;

        let request = self
            .aws_client()
            .put_object()
            .bucket(target.bucket())
            .key(target.key())
            .presigned(presigning)
            .await
            .map_err(StoreError::from)?;

        Ok(request.uri().to_string())
    }

    fn map_get_error<E>(
        &self,
        target: &ObjectTarget,
        error: aws_sdk_s3::error::SdkError<E>,
    ) -> StoreError
    where
        E: std::error::Error + 'static,
    {
        let msg = error.to_string();
        if msg.contains("404") || msg.contains("NoSuchKey") {
            StoreError::NotFound {
                bucket: target.bucket().to_string(),
                key: target.key().to_string(),
            }
        } else {
            StoreError::from(error)
        }
    }
}

fn presigning_config(expires_in: Duration) -> StoreResult<PresigningConfig> {
    if expires_in.is_zero() {
        return Err(StoreError::InvalidConfig(
            "presigned URL expiry must be non-zero".to_string(),
        ));
    }

    if expires_in.as_secs() > MAX_PRESIGN_EXPIRY_SECONDS {
        return Err(StoreError::InvalidConfig(format!(
            "presigned URL expiry {}s exceeds the {}s maximum",
            expires_in.as_secs(),
            MAX_PRESIGN_EXPIRY_SECONDS
        )));
    }

    PresigningConfig::expires_in(expires_in)
        .map_err(|e| StoreError::InvalidConfig(format!("invalid presigning expiry: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presigning_expiry_bounds() {
        assert!(presigning_config(Duration::ZERO).is_err());
        assert!(presigning_config(Duration::from_secs(MAX_PRESIGN_EXPIRY_SECONDS + 1)).is_err());
        assert!(presigning_config(Duration::from_secs(3600)).is_ok());
        assert!(presigning_config(Duration::from_secs(MAX_PRESIGN_EXPIRY_SECONDS)).is_ok());
    }
}
