//! Error types for sitepush-bucket.

use thiserror::Error;

use sitepush_core::{BucketName, StoreError};

/// All errors that can arise from bucket lifecycle operations.
#[derive(Debug, Error)]
pub enum BucketError {
    /// The bucket was expected to exist already.
    #[error("bucket {bucket} is not configured")]
    NotConfigured { bucket: BucketName },

    /// A storage call failed; the error is passed through unchanged.
    #[error(transparent)]
    Store(#[from] StoreError),
}
