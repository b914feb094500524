//! Configuration for the chunked upload engine

use super::retry::RetryPolicy;
use super::{DEFAULT_PARALLEL_PARTS, DEFAULT_PART_SIZE, MAX_PARALLEL_PARTS};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Tuning knobs for [`ChunkedUploader`](super::ChunkedUploader).
///
/// Store-specific limits (minimum/maximum part size) are enforced by the
/// store configuration, not here; the engine itself only requires a
/// non-zero part size so it can be driven against arbitrary stores in
/// tests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploaderConfig {
    /// Fixed size of every part except the last, in bytes
    pub part_size: usize,

    /// Number of part uploads in flight at once (1 = strictly sequential)
    pub parallel_parts: usize,

    /// Per-part upload timeout; expiry is treated as a part upload failure
    pub part_timeout: Duration,

    /// Retry policy for transient part upload failures
    pub retry: RetryPolicy,
}

impl Default for UploaderConfig {
    fn default() -> Self {
        Self {
            part_size: DEFAULT_PART_SIZE,
            parallel_parts: DEFAULT_PARALLEL_PARTS,
            part_timeout: Duration::from_secs(300),
            retry: RetryPolicy::default(),
        }
    }
}

impl UploaderConfig {
    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.part_size == 0 {
            return Err("part size must be non-zero".to_string());
        }

        if self.parallel_parts == 0 {
            return Err("parallel parts must be at least 1".to_string());
        }

        if self.parallel_parts > MAX_PARALLEL_PARTS {
            return Err(format!(
                "parallel parts {} exceeds maximum {}",
                self.parallel_parts, MAX_PARALLEL_PARTS
            ));
        }

        if self.part_timeout.is_zero() {
            return Err("part timeout must be non-zero".to_string());
        }

        if self.retry.max_attempts == 0 {
            return Err("retry attempts must be at least 1".to_string());
        }

        Ok(())
    }
}

/// Builder for [`UploaderConfig`]
pub struct UploaderConfigBuilder {
    config: UploaderConfig,
}

impl UploaderConfigBuilder {
    /// Create a builder seeded with defaults
    pub fn new() -> Self {
        Self {
            config: UploaderConfig::default(),
        }
    }

    /// Set the fixed part size in bytes
    pub fn part_size(mut self, size: usize) -> Self {
        self.config.part_size = size;
        self
    }

    /// Set the number of concurrent part uploads
    pub fn parallel_parts(mut self, count: usize) -> Self {
        self.config.parallel_parts = count;
        self
    }

    /// Set the per-part upload timeout
    pub fn part_timeout(mut self, timeout: Duration) -> Self {
        self.config.part_timeout = timeout;
        self
    }

    /// Set the retry policy for transient part failures
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<UploaderConfig, String> {
        self.config.validate()?;
        Ok(self.config)
    }
}

impl Default for UploaderConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}
