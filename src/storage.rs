//! Object storage for the dataset files.

use std::path::Path;

use async_trait::async_trait;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use serde_json::json;
use tracing::info;

use crate::error::{sdk_error, Result};

/// Error code S3 returns when the caller already owns the bucket it creates
pub const BUCKET_OWNED_CODE: &str = "BucketAlreadyOwnedByYou";

/// Write access to a bucket
#[async_trait]
pub trait ObjectStore: Send + Sync {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()>;
    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()>;
    /// Names of the buckets the caller owns
    async fn list_buckets(&self) -> Result<Vec<String>>;
    /// Create a bucket in the store's own region
    async fn create_bucket(&self, bucket: &str) -> Result<()>;
}

/// S3 location of an uploaded object, as the import job expects it.
#[must_use]
pub fn s3_uri(bucket: &str, key: &str) -> String {
    format!("s3://{bucket}/{key}")
}

/// Bucket policy letting the recommendation service read and write the datasets.
#[must_use]
pub fn personalize_access_policy(bucket: &str) -> serde_json::Value {
    json!({
        "Version": "2012-10-17",
        "Id": "PersonalizeS3BucketAccessPolicy",
        "Statement": [
            {
                "Sid": "PersonalizeS3BucketAccessPolicy",
                "Effect": "Allow",
                "Principal": {
                    "Service": "personalize.amazonaws.com"
                },
                "Action": [
                    "s3:GetObject",
                    "s3:ListBucket",
                    "s3:PutObject"
                ],
                "Resource": [
                    format!("arn:aws:s3:::{bucket}"),
                    format!("arn:aws:s3:::{bucket}/*")
                ]
            }
        ]
    })
}

/// Attach [`personalize_access_policy`] to the bucket.
pub async fn allow_personalize_access(store: &dyn ObjectStore, bucket: &str) -> Result<()> {
    let policy = serde_json::to_string(&personalize_access_policy(bucket))?;
    store.put_bucket_policy(bucket, &policy).await?;
    info!(bucket, "Allowed personalize access to bucket");
    Ok(())
}

/// Create `bucket` unless it is already listed. Returns whether it was created.
pub async fn ensure_bucket(store: &dyn ObjectStore, bucket: &str) -> Result<bool> {
    if store.list_buckets().await?.iter().any(|b| b == bucket) {
        info!(bucket, "Bucket already exists");
        return Ok(false);
    }

    match store.create_bucket(bucket).await {
        Ok(()) => {
            info!(bucket, "Bucket created");
            Ok(true)
        }
        Err(e) if e.code() == Some(BUCKET_OWNED_CODE) => {
            info!(bucket, "Bucket already exists");
            Ok(false)
        }
        Err(e) => Err(e),
    }
}

/// Upload a local file and return its `s3://` URI.
pub async fn upload_file(store: &dyn ObjectStore, path: &Path, bucket: &str, key: &str) -> Result<String> {
    let body = tokio::fs::read(path).await?;
    store.put_object(bucket, key, body).await?;
    info!(file = %path.display(), bucket, key, "File uploaded");
    Ok(s3_uri(bucket, key))
}

/// [`ObjectStore`] backed by S3
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: aws_sdk_s3::Client,
    region: Option<String>,
}

impl S3ObjectStore {
    pub fn new(sdk_config: &aws_config::SdkConfig) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(sdk_config),
            region: sdk_config.region().map(ToString::to_string),
        }
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn put_object(&self, bucket: &str, key: &str, body: Vec<u8>) -> Result<()> {
        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .body(ByteStream::from(body))
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error("PutObject", &e))
    }

    async fn put_bucket_policy(&self, bucket: &str, policy: &str) -> Result<()> {
        self.client
            .put_bucket_policy()
            .bucket(bucket)
            .policy(policy)
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error("PutBucketPolicy", &e))
    }

    async fn list_buckets(&self) -> Result<Vec<String>> {
        let output = self
            .client
            .list_buckets()
            .send()
            .await
            .map_err(|e| sdk_error("ListBuckets", &e))?;
        Ok(output
            .buckets()
            .iter()
            .filter_map(|b| b.name())
            .map(str::to_string)
            .collect())
    }

    async fn create_bucket(&self, bucket: &str) -> Result<()> {
        let mut request = self.client.create_bucket().bucket(bucket);
        // us-east-1 rejects an explicit location constraint
        if let Some(region) = self.region.as_deref().filter(|r| *r != "us-east-1") {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        info!(bucket, region = ?self.region, "Creating bucket");
        request
            .send()
            .await
            .map(|_| ())
            .map_err(|e| sdk_error("CreateBucket", &e))
    }
}
