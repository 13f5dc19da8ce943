//! Error types for sitepush-sync.

use std::path::PathBuf;

use thiserror::Error;

use sitepush_core::StoreError;

use crate::plan::OperationKind;

/// All errors that can arise from sync operations.
#[derive(Debug, Error)]
pub enum SyncError {
    /// A storage call outside the apply loop (the listing) failed.
    #[error("storage error: {0}")]
    Store(#[from] StoreError),

    /// A single operation failed; operations before it stay applied.
    #[error("{kind} [ {key} ] failed: {source}")]
    Apply {
        kind: OperationKind,
        key: String,
        #[source]
        source: StoreError,
    },

    /// Two local files map to the same remote key.
    #[error("duplicate local key {key}")]
    DuplicateKey { key: String },

    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to walk {root}: {source}")]
    Walk {
        root: PathBuf,
        #[source]
        source: walkdir::Error,
    },

    /// A walked entry did not live under the scanned root.
    #[error("{path} is outside site root {root}")]
    OutsideRoot { root: PathBuf, path: PathBuf },

    #[error("path {path} is not valid UTF-8")]
    NonUtf8Path { path: PathBuf },
}

/// Convenience constructor for [`SyncError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> SyncError {
    SyncError::Io {
        path: path.into(),
        source,
    }
}
