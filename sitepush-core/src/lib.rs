//! sitepush core library: domain types, configuration, the storage trait and errors.
//!
//! - [`types`]: newtypes and the configuration document
//! - [`config`]: load / validate / site bucket
//! - [`store`]: [`BucketStore`], the storage capability set
//! - [`memory`]: an in-memory [`BucketStore`]
//! - [`policy`]: bucket policy documents
//! - [`error`]: [`ConfigError`], [`StoreError`]

pub mod config;
pub mod error;
pub mod memory;
pub mod policy;
pub mod store;
pub mod types;

pub use error::{ConfigError, StoreError};
pub use memory::MemoryStore;
pub use policy::BucketPolicy;
pub use store::{BucketStore, PutObject, RemoteObject};
pub use types::{
    BucketDescriptor, BucketName, HostingMode, RedirectConfig, RedirectProtocol, SiteConfig,
    WebsiteConfig,
};
