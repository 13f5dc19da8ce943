//! Error types for sitepush-core.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::BucketName;

/// All errors that can arise while loading or validating the site configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file did not exist at the expected path.
    #[error("site config not found at {path}")]
    NotFound { path: PathBuf },

    /// Underlying I/O failure while reading the file.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Malformed YAML; the source carries line context.
    #[error("failed to parse site config at {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("bucket #{index} has an empty name")]
    EmptyBucketName { index: usize },

    #[error("bucket {name} is configured more than once")]
    DuplicateBucket { name: BucketName },

    /// An operation needs a site bucket but the document lists none.
    #[error("no buckets configured")]
    NoBuckets,
}

type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures reported by a [`crate::BucketStore`].
///
/// Remote failures are opaque: the source is kept for display and the
/// operation name is attached for context.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{operation} failed for bucket {bucket}: {source}")]
    Remote {
        operation: &'static str,
        bucket: BucketName,
        #[source]
        source: BoxError,
    },

    #[error("bucket {bucket} does not exist")]
    NoSuchBucket { bucket: BucketName },

    #[error("bucket {bucket} is not empty")]
    BucketNotEmpty { bucket: BucketName },

    /// The uploaded body does not match the declared Content-MD5.
    #[error("content digest mismatch for {bucket}/{key}")]
    BadDigest { bucket: BucketName, key: String },

    /// The request could not be built (e.g. a required field is missing).
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

impl StoreError {
    /// Wrap any provider error as [`StoreError::Remote`].
    pub fn remote<E>(operation: &'static str, bucket: &BucketName, source: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        StoreError::Remote {
            operation,
            bucket: bucket.clone(),
            source: Box::new(source),
        }
    }
}

/// Convenience constructor for [`ConfigError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> ConfigError {
    ConfigError::Io {
        path: path.into(),
        source,
    }
}
