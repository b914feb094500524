//! Multipart store operations for the S3 client

use super::client::S3Store;
use crate::store::{
    ObjectLocation, ObjectStore, ObjectTarget, StoreError, StoreResult, UploadedPart,
};
use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart};
use bytes::Bytes;

#[async_trait]
impl ObjectStore for S3Store {
    async fn initiate_multipart(&self, target: &ObjectTarget) -> StoreResult<String> {
        let mut request = self
            .aws_client()
            .create_multipart_upload()
            .bucket(target.bucket())
            .key(target.key());

        if let Some(content_type) = &self.config().content_type {
            request = request.content_type(content_type);
        }

        let response = request.send().await.map_err(StoreError::from)?;

        response
            .upload_id()
            .ok_or(StoreError::MissingUploadId)
            .map(|s| s.to_string())
    }

    async fn upload_part(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        part_number: i32,
        data: Bytes,
    ) -> StoreResult<String> {
        let byte_stream = ByteStream::from(data);

        let response = self
            .aws_client()
            .upload_part()
            .bucket(target.bucket())
            .key(target.key())
            .upload_id(upload_id)
            .part_number(part_number)
            .body(byte_stream)
            .send()
            .await
            .map_err(StoreError::from)?;

        response
            .e_tag()
            .ok_or(StoreError::MissingEtag { part_number })
            .map(|s| s.to_string())
    }

    async fn complete_multipart(
        &self,
        target: &ObjectTarget,
        upload_id: &str,
        parts: &[UploadedPart],
    ) -> StoreResult<ObjectLocation> {
        let completed_parts: Vec<CompletedPart> = parts
            .iter()
            .map(|p| {
                CompletedPart::builder()
                    .part_number(p.part_number)
                    .e_tag(&p.etag)
                    .build()
            })
            .collect();

        let multipart_upload = CompletedMultipartUpload::builder()
            .set_parts(Some(completed_parts))
            .build();

        let response = self
            .aws_client()
            .complete_multipart_upload()
            .bucket(target.bucket())
            .key(target.key())
            .upload_id(upload_id)
            .multipart_upload(multipart_upload)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(ObjectLocation {
            bucket: target.bucket().to_string(),
            key: target.key().to_string(),
            etag: response.e_tag().map(|s| s.to_string()),
            location: response.location().map(|s| s.to_string()),
        })
    }

    async fn abort_multipart(&self, target: &ObjectTarget, upload_id: &str) -> StoreResult<()> {
        self.aws_client()
            .abort_multipart_upload()
            .bucket(target.bucket())
            .key(target.key())
            .upload_id(upload_id)
            .send()
            .await
            .map_err(StoreError::from)?;

        Ok(())
    }

    async fn put_object(&self, target: &ObjectTarget, data: Bytes) -> StoreResult<ObjectLocation> {
        let byte_stream = ByteStream::from(data);

        let mut request = self
            .aws_client()
            .put_object()
            .bucket(target.bucket())
            .key(target.key())
            .body(byte_stream);

        if let Some(content_type) = &self.config().content_type {
            request = request.content_type(content_type);
        }

        let response = request.send().await.map_err(StoreError::from)?;

        Ok(ObjectLocation {
            bucket: target.bucket().to_string(),
            key: target.key().to_string(),
            etag: response.e_tag().map(|s| s.to_string()),
            location: None,
        })
    }
}
