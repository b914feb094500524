//! Configuration types for the S3 store

use crate::store::{StoreError, StoreResult};
use crate::upload::{
    RetryPolicy, UploaderConfig, DEFAULT_PARALLEL_PARTS, DEFAULT_PART_SIZE, MAX_PARALLEL_PARTS,
    MAX_PART_SIZE, MIN_PART_SIZE,
};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// S3 store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// AWS region (e.g., "us-east-1"); falls back to the SDK region chain
    pub region: Option<String>,

    /// Custom endpoint URL (for S3-compatible services like MinIO)
    pub endpoint: Option<String>,

    /// Access key ID (optional - uses the SDK credential chain if not provided)
    pub access_key: Option<String>,

    /// Secret access key (optional - uses the SDK credential chain if not provided)
    pub secret_key: Option<String>,

    /// Session token (for temporary credentials)
    pub session_token: Option<String>,

    /// Path-style addressing (required for some S3-compatible services)
    pub force_path_style: bool,

    /// Part size for multipart uploads (default: 5MB)
    pub part_size: usize,

    /// Number of part uploads in flight at once
    pub parallel_parts: usize,

    /// Request timeout in seconds
    pub timeout_seconds: u64,

    /// Maximum attempts per part upload, including the first
    pub max_retries: u32,

    /// Content-Type applied to uploads; guessed from the file name when unset
    pub content_type: Option<String>,
}

impl Default for S3Config {
    fn default() -> Self {
        Self {
            region: None,
            endpoint: None,
            access_key: None,
            secret_key: None,
            session_token: None,
            force_path_style: false,
            part_size: DEFAULT_PART_SIZE,
            parallel_parts: DEFAULT_PARALLEL_PARTS,
            timeout_seconds: super::DEFAULT_TIMEOUT_SECONDS,
            max_retries: 3,
            content_type: None,
        }
    }
}

impl S3Config {
    /// Validate the configuration
    pub fn validate(&self) -> StoreResult<()> {
        if self.part_size < MIN_PART_SIZE {
            return Err(StoreError::InvalidConfig(format!(
                "part size {} is below minimum {}",
                self.part_size, MIN_PART_SIZE
            )));
        }

        if self.part_size > MAX_PART_SIZE {
            return Err(StoreError::InvalidConfig(format!(
                "part size {} exceeds maximum {}",
                self.part_size, MAX_PART_SIZE
            )));
        }

        if self.parallel_parts == 0 {
            return Err(StoreError::InvalidConfig(
                "parallel parts must be at least 1".to_string(),
            ));
        }

        if self.parallel_parts > MAX_PARALLEL_PARTS {
            return Err(StoreError::InvalidConfig(format!(
                "parallel parts {} exceeds maximum {}",
                self.parallel_parts, MAX_PARALLEL_PARTS
            )));
        }

        if self.timeout_seconds == 0 {
            return Err(StoreError::InvalidConfig(
                "timeout must be non-zero".to_string(),
            ));
        }

        if self.max_retries == 0 {
            return Err(StoreError::InvalidConfig(
                "max retries must be at least 1".to_string(),
            ));
        }

        // Validate credentials consistency
        if self.access_key.is_some() != self.secret_key.is_some() {
            return Err(StoreError::InvalidConfig(
                "both access_key and secret_key must be provided together".to_string(),
            ));
        }

        Ok(())
    }

    /// Check if using custom endpoint (S3-compatible service)
    pub fn is_custom_endpoint(&self) -> bool {
        self.endpoint.is_some()
    }

    /// Check if using explicit credentials
    pub fn has_explicit_credentials(&self) -> bool {
        self.access_key.is_some() && self.secret_key.is_some()
    }

    /// Derive the uploader configuration for transfers through this store
    pub fn uploader_config(&self) -> UploaderConfig {
        UploaderConfig {
            part_size: self.part_size,
            parallel_parts: self.parallel_parts,
            part_timeout: Duration::from_secs(self.timeout_seconds),
            retry: RetryPolicy {
                max_attempts: self.max_retries,
                ..Default::default()
            },
        }
    }
}

/// Builder for [`S3Config`]
pub struct S3ConfigBuilder {
    config: S3Config,
}

impl S3ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        Self {
            config: S3Config::default(),
        }
    }

    /// Set the AWS region
    pub fn region(mut self, region: String) -> Self {
        self.config.region = Some(region);
        self
    }

    /// Set custom endpoint (for MinIO, LocalStack, etc.)
    pub fn endpoint(mut self, endpoint: String) -> Self {
        self.config.endpoint = Some(endpoint);
        self
    }

    /// Set credentials explicitly
    pub fn credentials(mut self, access_key: String, secret_key: String) -> Self {
        self.config.access_key = Some(access_key);
        self.config.secret_key = Some(secret_key);
        self
    }

    /// Set session token (for temporary credentials)
    pub fn session_token(mut self, token: String) -> Self {
        self.config.session_token = Some(token);
        self
    }

    /// Enable path-style addressing
    pub fn force_path_style(mut self, force: bool) -> Self {
        self.config.force_path_style = force;
        self
    }

    /// Set part size for multipart uploads
    pub fn part_size(mut self, size: usize) -> Self {
        self.config.part_size = size;
        self
    }

    /// Set number of concurrent part uploads
    pub fn parallel_parts(mut self, count: usize) -> Self {
        self.config.parallel_parts = count;
        self
    }

    /// Set request timeout
    pub fn timeout_seconds(mut self, seconds: u64) -> Self {
        self.config.timeout_seconds = seconds;
        self
    }

    /// Set maximum attempts per part upload
    pub fn max_retries(mut self, retries: u32) -> Self {
        self.config.max_retries = retries;
        self
    }

    /// Set the Content-Type applied to uploads
    pub fn content_type(mut self, content_type: String) -> Self {
        self.config.content_type = Some(content_type);
        self
    }

    /// Build the configuration
    pub fn build(self) -> StoreResult<S3Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for S3ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
