//! S3 store client construction and object-level primitives

use super::config::S3Config;
use crate::store::{ObjectMeta, ObjectTarget, StoreError, StoreResult};
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::Client as AwsS3Client;
use std::time::Duration;
use std::time::SystemTime;

/// Object store backed by AWS S3 or an S3-compatible service
#[derive(Clone)]
pub struct S3Store {
    /// AWS S3 client
    client: AwsS3Client,

    /// Store configuration
    config: S3Config,
}

impl S3Store {
    /// Create a new store with the given configuration
    ///
    /// # Example
    ///
    /// ```no_run
    /// use skylift::{S3Config, S3Store};
    ///
    /// #[tokio::main]
    /// async fn main() -> Result<(), Box<dyn std::error::Error>> {
    ///     let store = S3Store::new(S3Config::default()).await?;
    ///     Ok(())
    /// }
    /// ```
    pub async fn new(config: S3Config) -> StoreResult<Self> {
        // Validate configuration
        config.validate()?;

        // Build AWS SDK client
        let client = Self::build_aws_client(&config).await;

        Ok(Self { client, config })
    }

    /// Build the AWS SDK S3 client from configuration
    async fn build_aws_client(config: &S3Config) -> AwsS3Client {
        // Start with default AWS config loader
        let mut aws_config_loader = aws_config::defaults(BehaviorVersion::latest());

        // Set region
        let region_provider = if let Some(region_str) = &config.region {
            RegionProviderChain::first_try(Region::new(region_str.clone()))
        } else {
            RegionProviderChain::default_provider()
        };
        aws_config_loader = aws_config_loader.region(region_provider);

        // Set explicit credentials if provided
        if let (Some(access_key), Some(secret_key)) = (&config.access_key, &config.secret_key) {
            let credentials = Credentials::new(
                access_key,
                secret_key,
                config.session_token.clone(),
                None,
                "skylift-explicit",
            );
            aws_config_loader = aws_config_loader.credentials_provider(credentials);
        }

        // Load AWS config
        let aws_config = aws_config_loader.load().await;

        // Build S3-specific config
        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&aws_config);

        // Set custom endpoint if provided
        if let Some(endpoint) = &config.endpoint {
            s3_config_builder = s3_config_builder.endpoint_url(endpoint);
        }

        // Force path-style addressing if configured (required for MinIO, LocalStack)
        if config.force_path_style {
            s3_config_builder = s3_config_builder.force_path_style(true);
        }

        // Set timeout
        let timeout_config = aws_sdk_s3::config::timeout::TimeoutConfig::builder()
            .operation_timeout(Duration::from_secs(config.timeout_seconds))
            .build();
        s3_config_builder = s3_config_builder.timeout_config(timeout_config);

        AwsS3Client::from_conf(s3_config_builder.build())
    }

    /// Get a reference to the configuration
    pub fn config(&self) -> &S3Config {
        &self.config
    }

    /// Get a reference to the underlying AWS S3 client
    pub fn aws_client(&self) -> &AwsS3Client {
        &self.client
    }

    /// Clone of this store with a pinned upload Content-Type
    pub(crate) fn with_content_type(&self, content_type: String) -> Self {
        let mut store = self.clone();
        store.config.content_type = Some(content_type);
        store
    }

    /// Check whether a bucket exists and is accessible
    pub async fn bucket_exists(&self, bucket: &str) -> StoreResult<bool> {
        match self.client.head_bucket().bucket(bucket).send().await {
            Ok(_) => Ok(true),
            Err(e) => {
                let msg = e.to_string();
                if msg.contains("404") || msg.contains("NoSuchBucket") || msg.contains("NotFound") {
                    Ok(false)
                } else if msg.contains("403") || msg.contains("AccessDenied") {
                    Err(StoreError::AccessDenied(format!(
                        "cannot access bucket: {}",
                        bucket
                    )))
                } else {
                    Err(StoreError::from(e))
                }
            }
        }
    }

    /// Check if an object exists
    pub async fn exists(&self, target: &ObjectTarget) -> StoreResult<bool> {
        match self
            .client
            .head_object()
            .bucket(target.bucket())
            .key(target.key())
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if e.to_string().contains("404") || e.to_string().contains("NotFound") {
                    Ok(false)
                } else {
                    Err(StoreError::from(e))
                }
            }
        }
    }

    /// Get metadata for an object
    pub async fn object_metadata(&self, target: &ObjectTarget) -> StoreResult<ObjectMeta> {
        let response = self
            .client
            .head_object()
            .bucket(target.bucket())
            .key(target.key())
            .send()
            .await
            .map_err(|e| {
                if e.to_string().contains("404") || e.to_string().contains("NotFound") {
                    StoreError::NotFound {
                        bucket: target.bucket().to_string(),
                        key: target.key().to_string(),
                    }
                } else {
                    StoreError::from(e)
                }
            })?;

        let size = response.content_length().unwrap_or(0) as u64;
        let last_modified = response
            .last_modified()
            .and_then(|dt| SystemTime::try_from(*dt).ok());

        let metadata = response
            .metadata()
            .map(|m| m.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
            .unwrap_or_default();

        Ok(ObjectMeta {
            key: target.key().to_string(),
            size,
            last_modified,
            etag: response.e_tag().map(|s| s.to_string()),
            content_type: response.content_type().map(|s| s.to_string()),
            metadata,
        })
    }

    /// Delete an object
    pub async fn delete_object(&self, target: &ObjectTarget) -> StoreResult<()> {
        self.client
            .delete_object()
            .bucket(target.bucket())
            .key(target.key())
            .send()
            .await
            .map_err(StoreError::from)?;

        tracing::debug!(%target, "deleted object");
        Ok(())
    }
}

/// Convert AWS SDK errors to store errors
impl<E> From<aws_sdk_s3::error::SdkError<E>> for StoreError
where
    E: std::error::Error + 'static,
{
    fn from(error: aws_sdk_s3::error::SdkError<E>) -> Self {
        match error {
            aws_sdk_s3::error::SdkError::TimeoutError(e) => {
                StoreError::Timeout(format!("request timed out: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::DispatchFailure(e) => {
                StoreError::Network(format!("network dispatch failure: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ResponseError(e) => {
                StoreError::Network(format!("response error: {:?}", e))
            }
            aws_sdk_s3::error::SdkError::ServiceError(e) => {
                let err_str = format!("{:?}", e);

                // Check for common error patterns
                if err_str.contains("NoSuchKey") {
                    StoreError::Service {
                        code: "NoSuchKey".to_string(),
                        message: "The specified key does not exist".to_string(),
                    }
                } else if err_str.contains("NoSuchBucket") {
                    StoreError::Service {
                        code: "NoSuchBucket".to_string(),
                        message: "The specified bucket does not exist".to_string(),
                    }
                } else if err_str.contains("NoSuchUpload") {
                    StoreError::Service {
                        code: "NoSuchUpload".to_string(),
                        message: "The multipart session does not exist or is already closed"
                            .to_string(),
                    }
                } else if err_str.contains("SlowDown") {
                    StoreError::Service {
                        code: "SlowDown".to_string(),
                        message: "Request rate exceeded".to_string(),
                    }
                } else if err_str.contains("AccessDenied") {
                    StoreError::AccessDenied("access denied to resource".to_string())
                } else {
                    StoreError::Service {
                        code: "Unknown".to_string(),
                        message: err_str,
                    }
                }
            }
            _ => StoreError::Sdk(format!("{:?}", error)),
        }
    }
}
