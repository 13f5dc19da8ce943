//! The storage capability set consumed by the lifecycle manager and the
//! sync reconciler.
//!
//! Every method is one remote call. Callers await each call before issuing
//! the next; implementations must not assume concurrent use.

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::StoreError;
use crate::policy::BucketPolicy;
use crate::types::{BucketName, RedirectConfig, WebsiteConfig};

/// A remote object as reported by a bucket listing.
///
/// `etag` is passed through untouched; providers usually wrap it in quotes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteObject {
    pub key: String,
    pub etag: String,
}

/// Upload request for a single object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PutObject {
    pub bucket: BucketName,
    pub key: String,
    /// Base64 MD5 of `body`, verified server-side.
    pub content_md5: String,
    pub content_type: String,
    pub cache_control: String,
    pub body: Bytes,
}

#[async_trait]
pub trait BucketStore: Send + Sync {
    async fn bucket_exists(&self, bucket: &BucketName) -> Result<bool, StoreError>;

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StoreError>;

    async fn remove_public_access_blocks(&self, bucket: &BucketName) -> Result<(), StoreError>;

    async fn set_bucket_policy(
        &self,
        bucket: &BucketName,
        policy: &BucketPolicy,
    ) -> Result<(), StoreError>;

    async fn set_website_config(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError>;

    async fn set_redirect_config(
        &self,
        bucket: &BucketName,
        redirect: &RedirectConfig,
    ) -> Result<(), StoreError>;

    /// Every object in the bucket; implementations aggregate pages.
    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<RemoteObject>, StoreError>;

    async fn put_object(&self, request: PutObject) -> Result<(), StoreError>;

    async fn delete_object(&self, bucket: &BucketName, key: &str) -> Result<(), StoreError>;

    /// Remove every object; returns only once the bucket is empty.
    async fn empty_bucket(&self, bucket: &BucketName) -> Result<(), StoreError>;

    async fn delete_bucket(&self, bucket: &BucketName) -> Result<(), StoreError>;
}
