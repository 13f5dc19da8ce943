//! Reconciliation: local manifest vs. remote listing.
//!
//! The remote listing is indexed by key. Each local file consumes its key from
//! the index as it is classified, so whatever is left once the manifest has
//! been walked exists only remotely and is scheduled for deletion. Adds and
//! updates come out in manifest order, deletes last in listing order.

use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use sitepush_core::RemoteObject;

use crate::fingerprint::normalize_etag;
use crate::manifest::{LocalFile, Manifest};

// ---------------------------------------------------------------------------
// Remote index
// ---------------------------------------------------------------------------

/// Remote key → normalized fingerprint, in listing order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RemoteIndex {
    entries: IndexMap<String, String>,
}

impl RemoteIndex {
    pub fn from_listing(objects: impl IntoIterator<Item = RemoteObject>) -> Self {
        objects.into_iter().collect()
    }

    /// Remove and return the fingerprint for `key`, keeping the order of the rest.
    pub fn take(&mut self, key: &str) -> Option<String> {
        self.entries.shift_remove(key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn into_keys(self) -> impl Iterator<Item = String> {
        self.entries.into_keys()
    }
}

impl FromIterator<RemoteObject> for RemoteIndex {
    fn from_iter<I: IntoIterator<Item = RemoteObject>>(iter: I) -> Self {
        let entries = iter
            .into_iter()
            .map(|object| {
                let fingerprint = normalize_etag(&object.etag).to_string();
                (object.key, fingerprint)
            })
            .collect();
        Self { entries }
    }
}

// ---------------------------------------------------------------------------
// Operations
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Add,
    Update,
    Delete,
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::Add => write!(f, "add"),
            OperationKind::Update => write!(f, "update"),
            OperationKind::Delete => write!(f, "delete"),
        }
    }
}

/// One step towards converging the remote bucket on the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Operation<'a> {
    /// Key exists locally only.
    Add(&'a LocalFile),
    /// Key exists on both sides with differing fingerprints.
    Update(&'a LocalFile),
    /// Key exists remotely only.
    Delete(String),
}

impl Operation<'_> {
    pub fn key(&self) -> &str {
        match self {
            Operation::Add(file) | Operation::Update(file) => &file.path,
            Operation::Delete(key) => key,
        }
    }

    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Add(_) => OperationKind::Add,
            Operation::Update(_) => OperationKind::Update,
            Operation::Delete(_) => OperationKind::Delete,
        }
    }
}

/// The full outcome of reconciliation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Plan<'a> {
    pub operations: Vec<Operation<'a>>,
    /// Keys present on both sides with equal fingerprints.
    pub unchanged: Vec<&'a str>,
}

impl Plan<'_> {
    pub fn is_empty(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind() == kind).count()
    }
}

// ---------------------------------------------------------------------------
// reconcile
// ---------------------------------------------------------------------------

/// Classify every local file and every remote leftover.
pub fn reconcile<'a>(manifest: &'a Manifest, mut remote: RemoteIndex) -> Plan<'a> {
    let mut plan = Plan::default();

    for file in manifest {
        match remote.take(&file.path) {
            None => plan.operations.push(Operation::Add(file)),
            Some(fingerprint) if fingerprint != file.hash16 => {
                plan.operations.push(Operation::Update(file));
            }
            Some(_) => plan.unchanged.push(&file.path),
        }
    }

    plan.operations
        .extend(remote.into_keys().map(Operation::Delete));
    plan
}

// ---------------------------------------------------------------------------
// Unit tests
// ---------------------------------------------------------------------------
