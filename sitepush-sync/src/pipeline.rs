//! Sync pipeline entrypoint: list → index → reconcile → apply.

use serde::Serialize;

use sitepush_core::{BucketName, BucketStore};

use crate::apply::{apply, OperationRecord};
use crate::error::SyncError;
use crate::manifest::Manifest;
use crate::plan::{reconcile, OperationKind, Plan, RemoteIndex};

/// Outcome of syncing one bucket.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SyncReport {
    pub bucket: BucketName,
    pub dry_run: bool,
    /// Applied operations, or in dry-run the operations that would run.
    pub operations: Vec<OperationRecord>,
    pub unchanged: usize,
}

impl SyncReport {
    pub fn is_noop(&self) -> bool {
        self.operations.is_empty()
    }

    pub fn count(&self, kind: OperationKind) -> usize {
        self.operations.iter().filter(|op| op.kind == kind).count()
    }
}

/// Fetch the remote listing for `bucket` and reconcile `manifest` against it.
///
/// No objects are written.
pub async fn plan<'a, S>(
    store: &S,
    bucket: &BucketName,
    manifest: &'a Manifest,
) -> Result<Plan<'a>, SyncError>
where
    S: BucketStore + ?Sized,
{
    let index = RemoteIndex::from_listing(store.list_objects(bucket).await?);
    if index.is_empty() {
        tracing::debug!(bucket = %bucket, "bucket is empty; every local file is an add");
    }
    tracing::debug!(bucket = %bucket, remote = index.len(), local = manifest.len(), "indexing");
    Ok(reconcile(manifest, index))
}

/// Converge `bucket` on `manifest`.
///
/// The bucket must already exist. With `dry_run` the plan is reported but
/// nothing is uploaded or deleted.
pub async fn sync<S>(
    store: &S,
    bucket: &BucketName,
    manifest: &Manifest,
    dry_run: bool,
) -> Result<SyncReport, SyncError>
where
    S: BucketStore + ?Sized,
{
    let plan = plan(store, bucket, manifest).await?;
    for key in &plan.unchanged {
        tracing::debug!("unchanged: {key}");
    }

    if plan.is_empty() {
        tracing::info!(bucket = %bucket, "no file sync required");
    }

    let operations = if dry_run {
        for op in &plan.operations {
            tracing::info!("[dry-run] would {} [ {} ]", op.kind(), op.key());
        }
        plan.operations.iter().map(OperationRecord::from).collect()
    } else {
        apply(store, bucket, &plan).await?
    };

    Ok(SyncReport {
        bucket: bucket.clone(),
        dry_run,
        operations,
        unchanged: plan.unchanged.len(),
    })
}

#[cfg(test)]
mod tests {
    use sitepush_core::memory::{MemoryStore, StoreCall};

    use super::*;
    use crate::manifest::LocalFile;

    #[tokio::test]
    async fn dry_run_lists_but_never_writes() {
        let bucket = BucketName::from("site");
        let store = MemoryStore::new().with_object("site", "old.html", "old");
        let manifest =
            Manifest::new(vec![LocalFile::new("new.html", "text/html", "new")]).expect("manifest");

        let report = sync(&store, &bucket, &manifest, true).await.expect("sync");
        assert!(report.dry_run);
        assert_eq!(report.count(OperationKind::Add), 1);
        assert_eq!(report.count(OperationKind::Delete), 1);
        assert_eq!(store.calls(), vec![StoreCall::ListObjects(bucket.clone())]);
        assert_eq!(store.object_keys(&bucket), vec!["old.html"]);
    }

    #[tokio::test]
    async fn listing_failure_is_store_error() {
        let bucket = BucketName::from("site");
        let store = MemoryStore::new()
            .with_bucket("site")
            .failing_when(|call| matches!(call, StoreCall::ListObjects(_)));

        let err = sync(&store, &bucket, &Manifest::default(), false)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Store(_)), "got: {err}");
    }

    #[test]
    fn report_serializes_operation_kinds_lowercase() {
        let report = SyncReport {
            bucket: BucketName::from("site"),
            dry_run: false,
            operations: vec![OperationRecord {
                kind: OperationKind::Update,
                key: "a.html".to_string(),
            }],
            unchanged: 2,
        };
        let json = serde_json::to_value(&report).expect("json");
        assert_eq!(json["bucket"], "site");
        assert_eq!(json["operations"][0]["kind"], "update");
        assert_eq!(json["unchanged"], 2);
    }
}
