//! # sitepush-sync
//!
//! Fingerprint-gated incremental sync of a local file set into a bucket.
//!
//! Call [`sync`] to converge a bucket on a [`Manifest`], or [`plan`] to see
//! what a sync would do. [`manifest::scan_dir`] builds a manifest from a
//! directory.

pub mod apply;
pub mod error;
pub mod fingerprint;
pub mod manifest;
pub mod pipeline;
pub mod plan;

pub use apply::{OperationRecord, CACHE_CONTROL};
pub use error::SyncError;
pub use manifest::{scan_dir, LocalFile, Manifest};
pub use pipeline::{plan, sync, SyncReport};
pub use plan::{reconcile, Operation, OperationKind, Plan, RemoteIndex};
