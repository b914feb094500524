//! Type definitions shared by all object store implementations

use super::error::{StoreError, StoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::SystemTime;

/// Coordinates of one object in a store: a bucket and a key within it.
///
/// Validated at construction so every store call downstream can assume a
/// well-formed target.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectTarget {
    bucket: String,
    key: String,
}

impl ObjectTarget {
    /// Create a new target, validating the bucket name and key.
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> StoreResult<Self> {
        let bucket = bucket.into();
        let key = key.into();

        if !is_valid_bucket_name(&bucket) {
            return Err(StoreError::InvalidTarget(format!(
                "invalid bucket name: {}. Bucket names must be 3-63 characters, \
                 lowercase letters, numbers, hyphens, and periods only",
                bucket
            )));
        }

        if key.is_empty() {
            return Err(StoreError::InvalidTarget(
                "object key cannot be empty".to_string(),
            ));
        }

        Ok(Self { bucket, key })
    }

    /// The bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// The object key within the bucket
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl fmt::Display for ObjectTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.bucket, self.key)
    }
}

/// Immutable record of one successfully uploaded part.
///
/// The ordered sequence of these records is the sole input to session
/// completion; the store validates ordering and completeness when the
/// manifest is submitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UploadedPart {
    /// Part number (1-indexed, sequential, no gaps)
    pub part_number: i32,

    /// ETag returned by the store for this part
    pub etag: String,

    /// Size of the part in bytes
    pub size: usize,
}

impl UploadedPart {
    /// Create a new uploaded part record
    pub fn new(part_number: i32, etag: String, size: usize) -> Self {
        Self {
            part_number,
            etag,
            size,
        }
    }
}

/// Location of an object after a successful upload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectLocation {
    /// Bucket the object landed in
    pub bucket: String,

    /// Object key
    pub key: String,

    /// ETag of the assembled object, when the store reports one
    pub etag: Option<String>,

    /// Store-reported URI of the object, when available
    pub location: Option<String>,
}

/// Metadata for a stored object
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectMeta {
    /// Object key
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: Option<SystemTime>,

    /// ETag
    pub etag: Option<String>,

    /// Content type
    pub content_type: Option<String>,

    /// User-defined metadata
    pub metadata: HashMap<String, String>,
}

/// Summary of one object in a listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredObject {
    /// Object key (path within bucket)
    pub key: String,

    /// Object size in bytes
    pub size: u64,

    /// Last modified timestamp
    pub last_modified: Option<SystemTime>,

    /// ETag (entity tag) - often MD5 hash
    pub etag: Option<String>,
}

/// Result of listing objects
#[derive(Debug, Clone)]
pub struct ListResult {
    /// List of objects
    pub objects: Vec<StoredObject>,

    /// Common prefixes (directories)
    pub common_prefixes: Vec<String>,

    /// Continuation token for pagination
    pub continuation_token: Option<String>,

    /// Whether the result is truncated
    pub is_truncated: bool,
}

/// Validate a bucket name against the rules common to S3-compatible stores
fn is_valid_bucket_name(name: &str) -> bool {
    let len = name.len();

    // Length check: 3-63 characters
    if !(3..=63).contains(&len) {
        return false;
    }

    // Must start and end with lowercase letter or number
    let first = match name.chars().next() {
        Some(c) => c,
        None => return false,
    };
    let last = match name.chars().last() {
        Some(c) => c,
        None => return false,
    };
    if !first.is_ascii_lowercase() && !first.is_ascii_digit() {
        return false;
    }
    if !last.is_ascii_lowercase() && !last.is_ascii_digit() {
        return false;
    }

    // Only lowercase letters, numbers, hyphens, and periods
    for c in name.chars() {
        if !c.is_ascii_lowercase() && !c.is_ascii_digit() && c != '-' && c != '.' {
            return false;
        }
    }

    // Cannot have consecutive periods
    if name.contains("..") {
        return false;
    }

    // Cannot be formatted as IP address
    if name.split('.').count() == 4 && name.split('.').all(|s| s.parse::<u8>().is_ok()) {
        return false;
    }

    // Cannot start with "xn--" (reserved for internationalized domain names)
    if name.starts_with("xn--") {
        return false;
    }

    // Cannot end with "-s3alias" (reserved)
    if name.ends_with("-s3alias") {
        return false;
    }

    true
}
