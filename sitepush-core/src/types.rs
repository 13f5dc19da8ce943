//! Domain types for the site configuration document.
//!
//! All types are serializable/deserializable via serde + serde_yaml and are
//! immutable once loaded.

use std::fmt;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Newtypes
// ---------------------------------------------------------------------------

/// A strongly-typed bucket name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BucketName(pub String);

impl BucketName {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for BucketName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<String> for BucketName {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for BucketName {
    fn from(s: &str) -> Self {
        Self(s.to_owned())
    }
}

// ---------------------------------------------------------------------------
// Hosting configuration
// ---------------------------------------------------------------------------

fn default_index() -> String {
    "index.html".to_string()
}

/// Website hosting documents for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WebsiteConfig {
    /// Suffix served for directory requests.
    #[serde(default = "default_index")]
    pub index: String,
    /// Object key served on 4xx errors.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl Default for WebsiteConfig {
    fn default() -> Self {
        Self {
            index: default_index(),
            error: None,
        }
    }
}

/// Protocol used when redirecting every request to another host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RedirectProtocol {
    Http,
    Https,
}

impl RedirectProtocol {
    pub fn as_str(self) -> &'static str {
        match self {
            RedirectProtocol::Http => "http",
            RedirectProtocol::Https => "https",
        }
    }
}

impl fmt::Display for RedirectProtocol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Redirect-all configuration for a bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RedirectConfig {
    pub host: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub protocol: Option<RedirectProtocol>,
}

/// Hosting mode a bucket is deployed into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostingMode<'a> {
    Website(&'a WebsiteConfig),
    Redirect(&'a RedirectConfig),
    /// Public-read, but neither website nor redirect configured.
    StorageOnly,
}

impl HostingMode<'_> {
    pub fn label(&self) -> &'static str {
        match self {
            HostingMode::Website(_) => "website",
            HostingMode::Redirect(_) => "redirect",
            HostingMode::StorageOnly => "storage-only",
        }
    }
}

// ---------------------------------------------------------------------------
// Domain structs
// ---------------------------------------------------------------------------

/// A single bucket entry in the site configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BucketDescriptor {
    pub name: BucketName,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub website: Option<WebsiteConfig>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect: Option<RedirectConfig>,
}

impl BucketDescriptor {
    /// A bucket with neither website nor redirect configured.
    pub fn new(name: impl Into<BucketName>) -> Self {
        Self {
            name: name.into(),
            website: None,
            redirect: None,
        }
    }

    pub fn with_website(mut self, website: WebsiteConfig) -> Self {
        self.website = Some(website);
        self
    }

    pub fn with_redirect(mut self, redirect: RedirectConfig) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Resolve the hosting mode; `website` takes precedence over `redirect`.
    pub fn hosting_mode(&self) -> HostingMode<'_> {
        match (&self.website, &self.redirect) {
            (Some(website), _) => HostingMode::Website(website),
            (None, Some(redirect)) => HostingMode::Redirect(redirect),
            (None, None) => HostingMode::StorageOnly,
        }
    }
}

/// Root of the site configuration document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct SiteConfig {
    /// Storage region; the provider default applies when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(default)]
    pub buckets: Vec<BucketDescriptor>,
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
