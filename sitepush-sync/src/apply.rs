//! Applying a [`Plan`] against a store.
//!
//! Operations run one at a time, in plan order. The first failure stops the
//! loop; anything already applied stays applied. Running the sync again is
//! the recovery path.

use serde::Serialize;

use sitepush_core::{BucketName, BucketStore, PutObject};

use crate::error::SyncError;
use crate::manifest::LocalFile;
use crate::plan::{Operation, OperationKind, Plan};

/// Short browser cache, long shared/CDN cache.
pub const CACHE_CONTROL: &str = "max-age=60, s-maxage=31536000";

/// A completed (or, in dry-run, planned) operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OperationRecord {
    pub kind: OperationKind,
    pub key: String,
}

impl From<&Operation<'_>> for OperationRecord {
    fn from(op: &Operation<'_>) -> Self {
        Self {
            kind: op.kind(),
            key: op.key().to_string(),
        }
    }
}

/// Upload request for `file`. Adds and updates share it.
pub fn put_request(bucket: &BucketName, file: &LocalFile) -> PutObject {
    PutObject {
        bucket: bucket.clone(),
        key: file.path.clone(),
        content_md5: file.hash64.clone(),
        content_type: file.content_type.clone(),
        cache_control: CACHE_CONTROL.to_string(),
        body: file.content.clone(),
    }
}

/// Apply every operation in `plan`, sequentially, stopping at the first failure.
pub async fn apply<S>(
    store: &S,
    bucket: &BucketName,
    plan: &Plan<'_>,
) -> Result<Vec<OperationRecord>, SyncError>
where
    S: BucketStore + ?Sized,
{
    let mut applied = Vec::with_capacity(plan.operations.len());

    for operation in &plan.operations {
        let kind = operation.kind();
        let key = operation.key();
        tracing::info!(bucket = %bucket, "... {kind} [ {key} ]");

        let result = match operation {
            Operation::Add(file) | Operation::Update(file) => {
                store.put_object(put_request(bucket, file)).await
            }
            Operation::Delete(key) => store.delete_object(bucket, key).await,
        };

        if let Err(source) = result {
            tracing::error!(bucket = %bucket, error = %source, "{kind} [ {key} ] failed");
            return Err(SyncError::Apply {
                kind,
                key: key.to_string(),
                source,
            });
        }
        applied.push(OperationRecord::from(operation));
    }

    Ok(applied)
}

#[cfg(test)]
mod tests {
    use sitepush_core::memory::{MemoryStore, StoreCall};

    use super::*;
    use crate::manifest::Manifest;
    use crate::plan::{reconcile, RemoteIndex};

    #[test]
    fn put_request_carries_metadata_contract() {
        let file = LocalFile::new("index.html", "text/html", "<p>hi</p>");
        let request = put_request(&BucketName::from("site"), &file);

        assert_eq!(request.key, "index.html");
        assert_eq!(request.content_md5, file.hash64);
        assert_eq!(request.content_type, "text/html");
        assert_eq!(request.cache_control, "max-age=60, s-maxage=31536000");
        assert_eq!(request.body, file.content);
    }

    #[tokio::test]
    async fn failure_stops_remaining_operations() {
        let bucket = BucketName::from("site");
        let store = MemoryStore::new().with_bucket("site").failing_when(
            |call| matches!(call, StoreCall::PutObject { key, .. } if key == "b.html"),
        );
        let manifest = Manifest::new(vec![
            LocalFile::new("a.html", "text/html", "a"),
            LocalFile::new("b.html", "text/html", "b"),
            LocalFile::new("c.html", "text/html", "c"),
        ])
        .expect("manifest");
        let plan = reconcile(&manifest, RemoteIndex::default());

        let err = apply(&store, &bucket, &plan).await.unwrap_err();
        match err {
            SyncError::Apply { kind, key, .. } => {
                assert_eq!(kind, OperationKind::Add);
                assert_eq!(key, "b.html");
            }
            other => panic!("unexpected error: {other}"),
        }

        // a.html stays applied, c.html was never attempted.
        assert_eq!(store.object_keys(&bucket), vec!["a.html"]);
        assert!(!store
            .calls()
            .iter()
            .any(|call| matches!(call, StoreCall::PutObject { key, .. } if key == "c.html")));
    }
}
