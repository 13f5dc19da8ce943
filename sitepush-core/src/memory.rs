//! In-memory [`BucketStore`].
//!
//! Behaves like the real service where it matters to callers: ETags are the
//! quoted hex MD5 of the body, `Content-MD5` is verified on upload, listings
//! are in key order and non-empty buckets cannot be deleted. Every call is
//! recorded, in order, before it is executed, and a predicate can be installed
//! to make selected calls fail.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use async_trait::async_trait;
use base64::Engine;
use bytes::Bytes;
use md5::{Digest, Md5};
use thiserror::Error;

use crate::error::StoreError;
use crate::policy::BucketPolicy;
use crate::store::{BucketStore, PutObject, RemoteObject};
use crate::types::{BucketName, RedirectConfig, WebsiteConfig};

/// One recorded call against the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    BucketExists(BucketName),
    CreateBucket(BucketName),
    RemovePublicAccessBlocks(BucketName),
    SetBucketPolicy(BucketName),
    SetWebsiteConfig(BucketName),
    SetRedirectConfig(BucketName),
    ListObjects(BucketName),
    PutObject { bucket: BucketName, key: String },
    DeleteObject { bucket: BucketName, key: String },
    EmptyBucket(BucketName),
    DeleteBucket(BucketName),
}

impl StoreCall {
    pub fn bucket(&self) -> &BucketName {
        match self {
            StoreCall::BucketExists(b)
            | StoreCall::CreateBucket(b)
            | StoreCall::RemovePublicAccessBlocks(b)
            | StoreCall::SetBucketPolicy(b)
            | StoreCall::SetWebsiteConfig(b)
            | StoreCall::SetRedirectConfig(b)
            | StoreCall::ListObjects(b)
            | StoreCall::EmptyBucket(b)
            | StoreCall::DeleteBucket(b) => b,
            StoreCall::PutObject { bucket, .. } | StoreCall::DeleteObject { bucket, .. } => bucket,
        }
    }
}

/// Error source attached to calls failed by the installed predicate.
#[derive(Debug, Error)]
#[error("injected failure on {0:?}")]
pub struct InjectedFault(pub StoreCall);

/// A stored object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub etag: String,
    pub content_type: String,
    pub cache_control: String,
    pub body: Bytes,
}

/// Observable state of a single bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryBucket {
    pub objects: BTreeMap<String, StoredObject>,
    pub public_access_blocked: bool,
    pub policy: Option<BucketPolicy>,
    pub website: Option<WebsiteConfig>,
    pub redirect: Option<RedirectConfig>,
}

impl Default for MemoryBucket {
    fn default() -> Self {
        Self {
            objects: BTreeMap::new(),
            // New buckets start private.
            public_access_blocked: true,
            policy: None,
            website: None,
            redirect: None,
        }
    }
}

#[derive(Debug, Default)]
struct MemoryState {
    buckets: BTreeMap<BucketName, MemoryBucket>,
    calls: Vec<StoreCall>,
}

type FailWhen = Box<dyn Fn(&StoreCall) -> bool + Send + Sync>;

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<MemoryState>,
    fail_when: Option<FailWhen>,
}

impl fmt::Debug for MemoryStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemoryStore")
            .field("state", &*self.state())
            .field("fail_when", &self.fail_when.is_some())
            .finish()
    }
}

/// Quoted hex MD5 of `body`, as the service reports it.
pub fn etag_for(body: &[u8]) -> String {
    format!("\"{}\"", hex::encode(Md5::digest(body)))
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pre-create an empty, private bucket.
    pub fn with_bucket(self, bucket: impl Into<BucketName>) -> Self {
        self.state().buckets.entry(bucket.into()).or_default();
        self
    }

    /// Seed an object, creating the bucket if needed. Not recorded as a call.
    pub fn with_object(
        self,
        bucket: impl Into<BucketName>,
        key: impl Into<String>,
        body: impl Into<Bytes>,
    ) -> Self {
        let body = body.into();
        let object = StoredObject {
            etag: etag_for(&body),
            content_type: "application/octet-stream".to_string(),
            cache_control: String::new(),
            body,
        };
        self.state()
            .buckets
            .entry(bucket.into())
            .or_default()
            .objects
            .insert(key.into(), object);
        self
    }

    /// Seed an object with an explicit ETag, bypassing hashing.
    pub fn with_raw_object(
        self,
        bucket: impl Into<BucketName>,
        key: impl Into<String>,
        etag: impl Into<String>,
    ) -> Self {
        let object = StoredObject {
            etag: etag.into(),
            content_type: "application/octet-stream".to_string(),
            cache_control: String::new(),
            body: Bytes::new(),
        };
        self.state()
            .buckets
            .entry(bucket.into())
            .or_default()
            .objects
            .insert(key.into(), object);
        self
    }

    /// Fail every call for which `predicate` returns true.
    pub fn failing_when(
        mut self,
        predicate: impl Fn(&StoreCall) -> bool + Send + Sync + 'static,
    ) -> Self {
        self.fail_when = Some(Box::new(predicate));
        self
    }

    /// Calls made so far, in order.
    pub fn calls(&self) -> Vec<StoreCall> {
        self.state().calls.clone()
    }

    pub fn clear_calls(&self) {
        self.state().calls.clear();
    }

    pub fn bucket(&self, bucket: &BucketName) -> Option<MemoryBucket> {
        self.state().buckets.get(bucket).cloned()
    }

    pub fn object(&self, bucket: &BucketName, key: &str) -> Option<StoredObject> {
        self.state()
            .buckets
            .get(bucket)
            .and_then(|b| b.objects.get(key).cloned())
    }

    pub fn object_keys(&self, bucket: &BucketName) -> Vec<String> {
        self.state()
            .buckets
            .get(bucket)
            .map(|b| b.objects.keys().cloned().collect())
            .unwrap_or_default()
    }

    fn state(&self) -> MutexGuard<'_, MemoryState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn record(&self, operation: &'static str, call: StoreCall) -> Result<(), StoreError> {
        let fail = self.fail_when.as_ref().is_some_and(|f| f(&call));
        self.state().calls.push(call.clone());
        if fail {
            let bucket = call.bucket().clone();
            return Err(StoreError::remote(operation, &bucket, InjectedFault(call)));
        }
        Ok(())
    }

    fn with_existing<T>(
        &self,
        bucket: &BucketName,
        f: impl FnOnce(&mut MemoryBucket) -> Result<T, StoreError>,
    ) -> Result<T, StoreError> {
        let mut state = self.state();
        let entry = state
            .buckets
            .get_mut(bucket)
            .ok_or_else(|| StoreError::NoSuchBucket {
                bucket: bucket.clone(),
            })?;
        f(entry)
    }
}

#[async_trait]
impl BucketStore for MemoryStore {
    async fn bucket_exists(&self, bucket: &BucketName) -> Result<bool, StoreError> {
        self.record("bucket_exists", StoreCall::BucketExists(bucket.clone()))?;
        Ok(self.state().buckets.contains_key(bucket))
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        self.record("create_bucket", StoreCall::CreateBucket(bucket.clone()))?;
        self.state().buckets.entry(bucket.clone()).or_default();
        Ok(())
    }

    async fn remove_public_access_blocks(&self, bucket: &BucketName) -> Result<(), StoreError> {
        self.record(
            "remove_public_access_blocks",
            StoreCall::RemovePublicAccessBlocks(bucket.clone()),
        )?;
        self.with_existing(bucket, |b| {
            b.public_access_blocked = false;
            Ok(())
        })
    }

    async fn set_bucket_policy(
        &self,
        bucket: &BucketName,
        policy: &BucketPolicy,
    ) -> Result<(), StoreError> {
        self.record("set_bucket_policy", StoreCall::SetBucketPolicy(bucket.clone()))?;
        self.with_existing(bucket, |b| {
            b.policy = Some(policy.clone());
            Ok(())
        })
    }

    async fn set_website_config(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        self.record("set_website_config", StoreCall::SetWebsiteConfig(bucket.clone()))?;
        self.with_existing(bucket, |b| {
            b.website = Some(website.clone());
            b.redirect = None;
            Ok(())
        })
    }

    async fn set_redirect_config(
        &self,
        bucket: &BucketName,
        redirect: &RedirectConfig,
    ) -> Result<(), StoreError> {
        self.record("set_redirect_config", StoreCall::SetRedirectConfig(bucket.clone()))?;
        self.with_existing(bucket, |b| {
            b.redirect = Some(redirect.clone());
            b.website = None;
            Ok(())
        })
    }

    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<RemoteObject>, StoreError> {
        self.record("list_objects", StoreCall::ListObjects(bucket.clone()))?;
        self.with_existing(bucket, |b| {
            Ok(b.objects
                .iter()
                .map(|(key, object)| RemoteObject {
                    key: key.clone(),
                    etag: object.etag.clone(),
                })
                .collect())
        })
    }

    async fn put_object(&self, request: PutObject) -> Result<(), StoreError> {
        self.record(
            "put_object",
            StoreCall::PutObject {
                bucket: request.bucket.clone(),
                key: request.key.clone(),
            },
        )?;

        let expected = base64::engine::general_purpose::STANDARD
            .decode(&request.content_md5)
            .map_err(|_| StoreError::InvalidRequest(format!("invalid Content-MD5 for {}", request.key)))?;
        if Md5::digest(&request.body).as_slice() != expected.as_slice() {
            return Err(StoreError::BadDigest {
                bucket: request.bucket,
                key: request.key,
            });
        }

        let PutObject {
            bucket,
            key,
            content_type,
            cache_control,
            body,
            ..
        } = request;
        self.with_existing(&bucket, |b| {
            let object = StoredObject {
                etag: etag_for(&body),
                content_type,
                cache_control,
                body,
            };
            b.objects.insert(key, object);
            Ok(())
        })
    }

    async fn delete_object(&self, bucket: &BucketName, key: &str) -> Result<(), StoreError> {
        self.record(
            "delete_object",
            StoreCall::DeleteObject {
                bucket: bucket.clone(),
                key: key.to_string(),
            },
        )?;
        // Deleting a missing key succeeds, as it does remotely.
        self.with_existing(bucket, |b| {
            b.objects.remove(key);
            Ok(())
        })
    }

    async fn empty_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        self.record("empty_bucket", StoreCall::EmptyBucket(bucket.clone()))?;
        self.with_existing(bucket, |b| {
            b.objects.clear();
            Ok(())
        })
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        self.record("delete_bucket", StoreCall::DeleteBucket(bucket.clone()))?;
        let mut state = self.state();
        match state.buckets.get(bucket) {
            None => Err(StoreError::NoSuchBucket {
                bucket: bucket.clone(),
            }),
            Some(b) if !b.objects.is_empty() => Err(StoreError::BucketNotEmpty {
                bucket: bucket.clone(),
            }),
            Some(_) => {
                state.buckets.remove(bucket);
                Ok(())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
