//! # sitepush-bucket
//!
//! Bucket lifecycle: existence checks, public website deployment and teardown.
//! Every function walks buckets in configuration order and stops at the first
//! failure.

pub mod error;
pub mod lifecycle;

pub use error::BucketError;
pub use lifecycle::{
    check, check_bucket, deploy, deploy_bucket, teardown, teardown_bucket, DeployOutcome,
    STABILIZATION_DELAY,
};
