//! # sitepush-s3
//!
//! [`BucketStore`] backed by Amazon S3 (or any S3-compatible endpoint the
//! default credential/config chain resolves to).

use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::Region;
use aws_sdk_s3::error::{BuildError, ProvideErrorMetadata};
use aws_sdk_s3::operation::head_bucket::HeadBucketError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{
    BucketLocationConstraint, CreateBucketConfiguration, Delete, ErrorDocument, IndexDocument,
    ObjectIdentifier, Protocol, RedirectAllRequestsTo, WebsiteConfiguration,
};
use aws_sdk_s3::Client;
use thiserror::Error;

use sitepush_core::{
    BucketName, BucketPolicy, BucketStore, PutObject, RedirectConfig, RemoteObject, StoreError,
    WebsiteConfig,
};

/// `DeleteObjects` accepts at most this many keys per request.
const DELETE_BATCH: usize = 1000;

/// List/delete passes `empty_bucket` makes before giving up.
const EMPTY_PASSES: usize = 10;

const DEFAULT_REGION: &str = "us-east-1";
const NO_PUBLIC_ACCESS_BLOCK: &str = "NoSuchPublicAccessBlockConfiguration";

/// Some keys of a `DeleteObjects` batch were not removed.
#[derive(Debug, Error)]
#[error("{failed} object(s) not deleted, first {key}: {message}")]
pub struct PartialDelete {
    pub failed: usize,
    pub key: String,
    pub message: String,
}

/// S3 client bound to one region.
#[derive(Debug, Clone)]
pub struct S3Store {
    client: Client,
    region: Option<String>,
}

impl S3Store {
    /// Build a client from the environment; `region` overrides the default chain.
    pub async fn from_env(region: Option<String>) -> Self {
        let provider = RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();
        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(provider)
            .load()
            .await;
        let region = config.region().map(ToString::to_string);
        tracing::debug!(region = ?region, "s3 client ready");
        Self {
            client: Client::new(&config),
            region,
        }
    }

    pub fn from_client(client: Client, region: Option<String>) -> Self {
        Self { client, region }
    }

    async fn delete_batch(&self, bucket: &BucketName, keys: &[RemoteObject]) -> Result<(), StoreError> {
        let identifiers = keys
            .iter()
            .map(|object| ObjectIdentifier::builder().key(&object.key).build())
            .collect::<Result<Vec<_>, _>>()
            .map_err(invalid)?;
        let delete = Delete::builder()
            .set_objects(Some(identifiers))
            .quiet(true)
            .build()
            .map_err(invalid)?;

        let output = self
            .client
            .delete_objects()
            .bucket(bucket.as_str())
            .delete(delete)
            .send()
            .await
            .map_err(|e| StoreError::remote("delete_objects", bucket, e))?;

        if let Some(first) = output.errors().first() {
            return Err(StoreError::remote(
                "delete_objects",
                bucket,
                PartialDelete {
                    failed: output.errors().len(),
                    key: first.key().unwrap_or_default().to_string(),
                    message: first.message().unwrap_or("no message").to_string(),
                },
            ));
        }
        Ok(())
    }
}

fn invalid(err: BuildError) -> StoreError {
    StoreError::InvalidRequest(err.to_string())
}

#[async_trait]
impl BucketStore for S3Store {
    async fn bucket_exists(&self, bucket: &BucketName) -> Result<bool, StoreError> {
        match self.client.head_bucket().bucket(bucket.as_str()).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(HeadBucketError::is_not_found) => {
                Ok(false)
            }
            Err(err) => Err(StoreError::remote("head_bucket", bucket, err)),
        }
    }

    async fn create_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        let mut request = self.client.create_bucket().bucket(bucket.as_str());
        // us-east-1 rejects an explicit location constraint.
        if let Some(region) = self.region.as_deref().filter(|r| *r != DEFAULT_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request
            .send()
            .await
            .map_err(|e| StoreError::remote("create_bucket", bucket, e))?;
        Ok(())
    }

    async fn remove_public_access_blocks(&self, bucket: &BucketName) -> Result<(), StoreError> {
        match self
            .client
            .delete_public_access_block()
            .bucket(bucket.as_str())
            .send()
            .await
        {
            Ok(_) => Ok(()),
            Err(err)
                if err.as_service_error().and_then(|e| e.code()) == Some(NO_PUBLIC_ACCESS_BLOCK) =>
            {
                tracing::debug!(bucket = %bucket, "no public access block to remove");
                Ok(())
            }
            Err(err) => Err(StoreError::remote("delete_public_access_block", bucket, err)),
        }
    }

    async fn set_bucket_policy(
        &self,
        bucket: &BucketName,
        policy: &BucketPolicy,
    ) -> Result<(), StoreError> {
        let document = policy
            .to_json()
            .map_err(|e| StoreError::InvalidRequest(e.to_string()))?;
        self.client
            .put_bucket_policy()
            .bucket(bucket.as_str())
            .policy(document)
            .send()
            .await
            .map_err(|e| StoreError::remote("put_bucket_policy", bucket, e))?;
        Ok(())
    }

    async fn set_website_config(
        &self,
        bucket: &BucketName,
        website: &WebsiteConfig,
    ) -> Result<(), StoreError> {
        let index = IndexDocument::builder()
            .suffix(&website.index)
            .build()
            .map_err(invalid)?;
        let mut configuration = WebsiteConfiguration::builder().index_document(index);
        if let Some(error) = &website.error {
            let document = ErrorDocument::builder().key(error).build().map_err(invalid)?;
            configuration = configuration.error_document(document);
        }

        self.client
            .put_bucket_website()
            .bucket(bucket.as_str())
            .website_configuration(configuration.build())
            .send()
            .await
            .map_err(|e| StoreError::remote("put_bucket_website", bucket, e))?;
        Ok(())
    }

    async fn set_redirect_config(
        &self,
        bucket: &BucketName,
        redirect: &RedirectConfig,
    ) -> Result<(), StoreError> {
        let target = RedirectAllRequestsTo::builder()
            .host_name(&redirect.host)
            .set_protocol(redirect.protocol.map(|p| Protocol::from(p.as_str())))
            .build()
            .map_err(invalid)?;
        let configuration = WebsiteConfiguration::builder()
            .redirect_all_requests_to(target)
            .build();

        self.client
            .put_bucket_website()
            .bucket(bucket.as_str())
            .website_configuration(configuration)
            .send()
            .await
            .map_err(|e| StoreError::remote("put_bucket_website", bucket, e))?;
        Ok(())
    }

    async fn list_objects(&self, bucket: &BucketName) -> Result<Vec<RemoteObject>, StoreError> {
        let mut objects = Vec::new();
        let mut continuation_token: Option<String> = None;

        loop {
            let response = self
                .client
                .list_objects_v2()
                .bucket(bucket.as_str())
                .set_continuation_token(continuation_token.take())
                .send()
                .await
                .map_err(|e| StoreError::remote("list_objects_v2", bucket, e))?;

            for object in response.contents() {
                let Some(key) = object.key() else {
                    continue;
                };
                // An empty fingerprint never matches, so the key still gets updated or deleted.
                let etag = object.e_tag().unwrap_or_else(|| {
                    tracing::warn!(bucket = %bucket, key, "listing entry has no ETag");
                    ""
                });
                objects.push(RemoteObject {
                    key: key.to_string(),
                    etag: etag.to_string(),
                });
            }

            match response.next_continuation_token() {
                Some(token) if response.is_truncated() == Some(true) => {
                    continuation_token = Some(token.to_string());
                }
                _ => break,
            }
        }

        tracing::debug!(bucket = %bucket, count = objects.len(), "listed objects");
        Ok(objects)
    }

    async fn put_object(&self, request: PutObject) -> Result<(), StoreError> {
        self.client
            .put_object()
            .bucket(request.bucket.as_str())
            .key(&request.key)
            .content_md5(&request.content_md5)
            .content_type(&request.content_type)
            .cache_control(&request.cache_control)
            .body(ByteStream::from(request.body))
            .send()
            .await
            .map_err(|e| StoreError::remote("put_object", &request.bucket, e))?;
        Ok(())
    }

    async fn delete_object(&self, bucket: &BucketName, key: &str) -> Result<(), StoreError> {
        self.client
            .delete_object()
            .bucket(bucket.as_str())
            .key(key)
            .send()
            .await
            .map_err(|e| StoreError::remote("delete_object", bucket, e))?;
        Ok(())
    }

    async fn empty_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        for _ in 0..EMPTY_PASSES {
            let objects = self.list_objects(bucket).await?;
            if objects.is_empty() {
                return Ok(());
            }
            for batch in objects.chunks(DELETE_BATCH) {
                self.delete_batch(bucket, batch).await?;
                tracing::debug!(bucket = %bucket, count = batch.len(), "deleted batch");
            }
        }
        Err(StoreError::BucketNotEmpty {
            bucket: bucket.clone(),
        })
    }

    async fn delete_bucket(&self, bucket: &BucketName) -> Result<(), StoreError> {
        self.client
            .delete_bucket()
            .bucket(bucket.as_str())
            .send()
            .await
            .map_err(|e| StoreError::remote("delete_bucket", bucket, e))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::operation::delete_objects::DeleteObjectsOutput;
    use aws_sdk_s3::operation::delete_public_access_block::DeletePublicAccessBlockError;
    use aws_sdk_s3::operation::list_objects_v2::ListObjectsV2Output;
    use aws_sdk_s3::types::error::NotFound;
    use aws_sdk_s3::types::{Error as S3Error, Object};
    use aws_smithy_mocks::{mock, mock_client, RuleMode};

    use super::*;

    fn site() -> BucketName {
        BucketName::from("site")
    }

    fn object(key: &str, etag: &str) -> Object {
        Object::builder().key(key).e_tag(etag).build()
    }

    fn store(client: Client) -> S3Store {
        S3Store::from_client(client, None)
    }

    #[test]
    fn partial_delete_message_names_first_key() {
        let err = StoreError::remote(
            "delete_objects",
            &site(),
            PartialDelete {
                failed: 2,
                key: "index.html".to_string(),
                message: "Access Denied".to_string(),
            },
        );
        let msg = err.to_string();
        assert!(msg.contains("delete_objects failed for bucket site"), "got: {msg}");
        assert!(std::error::Error::source(&err)
            .map(ToString::to_string)
            .is_some_and(|s| s.contains("first index.html")));
    }

    // ---------------------------------------------------------------------------
    // existence and public access
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn head_bucket_not_found_is_false() {
        let head = mock!(Client::head_bucket)
            .then_error(|| HeadBucketError::NotFound(NotFound::builder().build()));
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head]);

        assert!(!store(client).bucket_exists(&site()).await.expect("head"));
        assert_eq!(head.num_calls(), 1);
    }

    #[tokio::test]
    async fn head_bucket_success_is_true() {
        let head = mock!(Client::head_bucket)
            .match_requests(|req| req.bucket() == Some("site"))
            .then_output(|| aws_sdk_s3::operation::head_bucket::HeadBucketOutput::builder().build());
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&head]);

        assert!(store(client).bucket_exists(&site()).await.expect("head"));
    }

    #[tokio::test]
    async fn missing_public_access_block_is_tolerated() {
        let remove = mock!(Client::delete_public_access_block).then_error(|| {
            DeletePublicAccessBlockError::generic(
                ErrorMetadata::builder()
                    .code(NO_PUBLIC_ACCESS_BLOCK)
                    .message("The public access block configuration was not found")
                    .build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&remove]);

        store(client)
            .remove_public_access_blocks(&site())
            .await
            .expect("tolerated");
        assert_eq!(remove.num_calls(), 1);
    }

    #[tokio::test]
    async fn other_public_access_errors_propagate() {
        let remove = mock!(Client::delete_public_access_block).then_error(|| {
            DeletePublicAccessBlockError::generic(
                ErrorMetadata::builder().code("AccessDenied").build(),
            )
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&remove]);

        let err = store(client)
            .remove_public_access_blocks(&site())
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Remote { operation: "delete_public_access_block", .. }));
    }

    // ---------------------------------------------------------------------------
    // listing
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn listing_follows_continuation_tokens_in_order() {
        let first = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token().is_none())
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("a.html", "\"1\""))
                    .contents(object("b.html", "\"2\""))
                    .is_truncated(true)
                    .next_continuation_token("page-2")
                    .build()
            });
        let second = mock!(Client::list_objects_v2)
            .match_requests(|req| req.continuation_token() == Some("page-2"))
            .then_output(|| {
                ListObjectsV2Output::builder()
                    .contents(object("c/d.css", "\"3\""))
                    .is_truncated(false)
                    .build()
            });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&first, &second]);

        let listing = store(client).list_objects(&site()).await.expect("list");
        let keys: Vec<_> = listing.iter().map(|o| o.key.as_str()).collect();
        assert_eq!(keys, vec!["a.html", "b.html", "c/d.css"]);
        assert_eq!(listing[2].etag, "\"3\"");
        assert_eq!(first.num_calls(), 1);
        assert_eq!(second.num_calls(), 1);
    }

    #[tokio::test]
    async fn listing_keeps_entries_without_etag() {
        let list = mock!(Client::list_objects_v2).then_output(|| {
            ListObjectsV2Output::builder()
                .contents(Object::builder().key("no-etag.html").build())
                .contents(object("a.html", "\"1\""))
                .build()
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&list]);

        let listing = store(client).list_objects(&site()).await.expect("list");
        assert_eq!(
            listing,
            vec![
                RemoteObject {
                    key: "no-etag.html".to_string(),
                    etag: String::new(),
                },
                RemoteObject {
                    key: "a.html".to_string(),
                    etag: "\"1\"".to_string(),
                },
            ]
        );
    }

    // ---------------------------------------------------------------------------
    // emptying
    // ---------------------------------------------------------------------------

    #[tokio::test]
    async fn empty_bucket_deletes_in_batches_of_one_thousand() {
        let full = mock!(Client::list_objects_v2).then_output(|| {
            let objects = (0..=DELETE_BATCH)
                .map(|i| object(&format!("file-{i:04}.html"), "\"x\""))
                .collect();
            ListObjectsV2Output::builder().set_contents(Some(objects)).build()
        });
        let first_batch = mock!(Client::delete_objects)
            .match_requests(|req| {
                req.delete().map(|d| d.objects().len()) == Some(DELETE_BATCH)
                    && req.delete().and_then(|d| d.quiet()) == Some(true)
            })
            .then_output(|| DeleteObjectsOutput::builder().build());
        let second_batch = mock!(Client::delete_objects)
            .match_requests(|req| {
                req.delete()
                    .map(|d| d.objects().iter().map(|o| o.key()).collect::<Vec<_>>())
                    == Some(vec!["file-1000.html"])
            })
            .then_output(|| DeleteObjectsOutput::builder().build());
        let drained = mock!(Client::list_objects_v2)
            .then_output(|| ListObjectsV2Output::builder().build());
        let client = mock_client!(
            aws_sdk_s3,
            RuleMode::Sequential,
            &[&full, &first_batch, &second_batch, &drained]
        );

        store(client).empty_bucket(&site()).await.expect("empty");
        assert_eq!(first_batch.num_calls(), 1);
        assert_eq!(second_batch.num_calls(), 1);
        assert_eq!(drained.num_calls(), 1);
    }

    #[tokio::test]
    async fn delete_errors_surface_as_partial_delete() {
        let list = mock!(Client::list_objects_v2).then_output(|| {
            ListObjectsV2Output::builder()
                .contents(object("a.html", "\"1\""))
                .contents(object("b.html", "\"2\""))
                .build()
        });
        let delete = mock!(Client::delete_objects).then_output(|| {
            DeleteObjectsOutput::builder()
                .errors(
                    S3Error::builder()
                        .key("b.html")
                        .code("AccessDenied")
                        .message("Access Denied")
                        .build(),
                )
                .build()
        });
        let client = mock_client!(aws_sdk_s3, RuleMode::Sequential, &[&list, &delete]);

        let err = store(client).empty_bucket(&site()).await.unwrap_err();
        let StoreError::Remote { operation, source, .. } = err else {
            panic!("expected a remote delete_objects error");
        };
        assert_eq!(operation, "delete_objects");
        let partial = source.downcast_ref::<PartialDelete>().expect("partial delete");
        assert_eq!(partial.failed, 1);
        assert_eq!(partial.key, "b.html");
        assert_eq!(partial.message, "Access Denied");
    }
}
