//! Site configuration loading.
//!
//! # Document layout
//!
//! ```text
//! region: us-east-1            (optional)
//! buckets:
//!   - name: www.example.com
//!     website: { index: index.html, error: 404.html }
//!   - name: example.com
//!     redirect: { host: www.example.com, protocol: https }
//! ```
//!
//! The first bucket is the site bucket: it is the sync target.

use std::collections::HashSet;
use std::path::Path;

use crate::error::{io_err, ConfigError};
use crate::types::{BucketDescriptor, SiteConfig};

/// File name looked up when no explicit path is given.
pub const DEFAULT_CONFIG_FILE: &str = "sitepush.yaml";

// ---------------------------------------------------------------------------
// 1. Load
// ---------------------------------------------------------------------------

/// Load and validate the site configuration at `path`.
///
/// Returns `ConfigError::NotFound` if absent,
/// `ConfigError::Parse` (with path + line context) if malformed YAML.
pub fn load_at(path: &Path) -> Result<SiteConfig, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::NotFound {
            path: path.to_path_buf(),
        });
    }
    let contents = std::fs::read_to_string(path).map_err(|e| io_err(path, e))?;
    let config = parse(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })?;
    validate(&config)?;
    tracing::debug!(path = %path.display(), buckets = config.buckets.len(), "site config loaded");
    Ok(config)
}

/// Parse a configuration document without validating it.
pub fn parse(contents: &str) -> Result<SiteConfig, serde_yaml::Error> {
    serde_yaml::from_str(contents)
}

// ---------------------------------------------------------------------------
// 2. Validate
// ---------------------------------------------------------------------------

/// Reject empty and duplicated bucket names.
pub fn validate(config: &SiteConfig) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();
    for (index, bucket) in config.buckets.iter().enumerate() {
        if bucket.name.0.trim().is_empty() {
            return Err(ConfigError::EmptyBucketName { index });
        }
        if !seen.insert(&bucket.name) {
            return Err(ConfigError::DuplicateBucket {
                name: bucket.name.clone(),
            });
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// 3. Site bucket
// ---------------------------------------------------------------------------

/// The bucket a sync targets: the first one configured.
pub fn site_bucket(config: &SiteConfig) -> Result<&BucketDescriptor, ConfigError> {
    config.buckets.first().ok_or(ConfigError::NoBuckets)
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
