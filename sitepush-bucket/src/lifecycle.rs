//! Check, deploy and tear down configured buckets.
//!
//! ```text
//! Unconfigured → Exists(private) → Exists(public) → Exists(public, website|redirect)
//!                                                 → Emptying → Deleted
//! ```

use std::time::Duration;

use serde::Serialize;

use sitepush_core::{
    BucketDescriptor, BucketName, BucketPolicy, BucketStore, HostingMode, SiteConfig,
};

use crate::error::BucketError;

/// Wait after creating a bucket before configuring it; the provider is only
/// eventually consistent about new buckets.
pub const STABILIZATION_DELAY: Duration = Duration::from_secs(30);

/// Outcome of deploying a single bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeployOutcome {
    pub bucket: BucketName,
    /// The bucket did not exist and was created.
    pub created: bool,
    /// `website`, `redirect` or `storage-only`.
    pub mode: &'static str,
}

// ---------------------------------------------------------------------------
// check
// ---------------------------------------------------------------------------

/// Fail with [`BucketError::NotConfigured`] unless the bucket exists.
pub async fn check_bucket<S>(store: &S, bucket: &BucketDescriptor) -> Result<(), BucketError>
where
    S: BucketStore + ?Sized,
{
    if !store.bucket_exists(&bucket.name).await? {
        return Err(BucketError::NotConfigured {
            bucket: bucket.name.clone(),
        });
    }
    tracing::debug!(bucket = %bucket.name, "bucket exists");
    Ok(())
}

pub async fn check<S>(store: &S, config: &SiteConfig) -> Result<(), BucketError>
where
    S: BucketStore + ?Sized,
{
    for bucket in &config.buckets {
        check_bucket(store, bucket).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// deploy
// ---------------------------------------------------------------------------

/// Create the bucket if needed and put it into public website mode.
///
/// Block removal, policy and hosting configuration are reapplied on every
/// call, so deploying an existing bucket converges it on the configuration.
pub async fn deploy_bucket<S>(
    store: &S,
    bucket: &BucketDescriptor,
) -> Result<DeployOutcome, BucketError>
where
    S: BucketStore + ?Sized,
{
    let name = &bucket.name;
    let created = if store.bucket_exists(name).await? {
        false
    } else {
        store.create_bucket(name).await?;
        tracing::info!(bucket = %name, "initialized {name}");
        tracing::info!(
            bucket = %name,
            delay_secs = STABILIZATION_DELAY.as_secs(),
            "waiting for bucket to stabilize..."
        );
        tokio::time::sleep(STABILIZATION_DELAY).await;
        true
    };

    tracing::info!(bucket = %name, "configuring {name} for website mode");
    store.remove_public_access_blocks(name).await?;
    store
        .set_bucket_policy(name, &BucketPolicy::public_read(name))
        .await?;

    let mode = bucket.hosting_mode();
    match mode {
        HostingMode::Website(website) => store.set_website_config(name, website).await?,
        HostingMode::Redirect(redirect) => store.set_redirect_config(name, redirect).await?,
        HostingMode::StorageOnly => {
            tracing::warn!(bucket = %name, "no website or redirect configured; bucket is public storage only");
        }
    }

    tracing::info!(bucket = %name, mode = mode.label(), "{name} deployed!");
    Ok(DeployOutcome {
        bucket: name.clone(),
        created,
        mode: mode.label(),
    })
}

pub async fn deploy<S>(store: &S, config: &SiteConfig) -> Result<Vec<DeployOutcome>, BucketError>
where
    S: BucketStore + ?Sized,
{
    let mut outcomes = Vec::with_capacity(config.buckets.len());
    for bucket in &config.buckets {
        outcomes.push(deploy_bucket(store, bucket).await?);
    }
    Ok(outcomes)
}

// ---------------------------------------------------------------------------
// teardown
// ---------------------------------------------------------------------------

/// Empty the bucket, then delete it. Nothing is deleted if emptying fails.
pub async fn teardown_bucket<S>(store: &S, bucket: &BucketDescriptor) -> Result<(), BucketError>
where
    S: BucketStore + ?Sized,
{
    let name = &bucket.name;
    tracing::info!(bucket = %name, "emptying bucket {name}");
    store.empty_bucket(name).await?;
    tracing::info!(bucket = %name, "bucket {name} now empty, deleting...");
    store.delete_bucket(name).await?;
    tracing::info!(bucket = %name, "bucket {name} deleted.");
    Ok(())
}

pub async fn teardown<S>(store: &S, config: &SiteConfig) -> Result<(), BucketError>
where
    S: BucketStore + ?Sized,
{
    for bucket in &config.buckets {
        teardown_bucket(store, bucket).await?;
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
