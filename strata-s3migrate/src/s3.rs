//! [`ObjectStore`] over the AWS S3 SDK.

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::Client;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::DisplayErrorContext;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::{BucketLocationConstraint, CreateBucketConfiguration};
use tracing::{debug, instrument};

use crate::config::S3DriverConfig;
use crate::error::{MigrateResult, MigrationError};
use crate::store::{Metadata, ObjectStore};

/// Region S3 creates buckets in when no location constraint is given.
const DEFAULT_BUCKET_REGION: &str = "us-east-1";

/// One S3 bucket.
#[derive(Debug, Clone)]
pub struct S3ObjectStore {
    client: Client,
    bucket: String,
    region: Option<String>,
}

impl S3ObjectStore {
    /// Wrap an existing client.
    pub fn new(client: Client, bucket: impl Into<String>) -> Self {
        let region = client.config().region().map(|r| r.to_string());
        Self {
            client,
            bucket: bucket.into(),
            region,
        }
    }

    /// Build a client from the default AWS chain, adjusted by `config`.
    pub async fn connect(config: &S3DriverConfig) -> MigrateResult<Self> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());
        if let Some(region) = &config.region {
            loader = loader.region(Region::new(region.clone()));
        }
        if let Some(endpoint) = &config.endpoint {
            loader = loader.endpoint_url(endpoint);
        }
        if let Some(creds) = &config.credentials {
            loader = loader.credentials_provider(Credentials::new(
                &creds.access_key_id,
                &creds.secret_access_key,
                creds.session_token.clone(),
                None,
                "strata-s3migrate",
            ));
        }
        let shared = loader.load().await;

        let s3_config = aws_sdk_s3::config::Builder::from(&shared)
            .force_path_style(config.path_style)
            .build();
        debug!(
            bucket = %config.bucket,
            endpoint = ?config.endpoint,
            path_style = config.path_style,
            "S3 client configured"
        );
        Ok(Self::new(Client::from_conf(s3_config), &config.bucket))
    }

    /// The SDK client.
    pub fn client(&self) -> &Client {
        &self.client
    }
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    fn bucket(&self) -> &str {
        &self.bucket
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn bucket_exists(&self) -> MigrateResult<bool> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(MigrationError::store(
                "head_bucket",
                &self.bucket,
                DisplayErrorContext(&err),
            )),
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn create_bucket(&self) -> MigrateResult<()> {
        let mut request = self.client.create_bucket().bucket(&self.bucket);
        if let Some(region) = self.region.as_deref().filter(|r| *r != DEFAULT_BUCKET_REGION) {
            request = request.create_bucket_configuration(
                CreateBucketConfiguration::builder()
                    .location_constraint(BucketLocationConstraint::from(region))
                    .build(),
            );
        }
        request.send().await.map_err(|err| {
            MigrationError::store("create_bucket", &self.bucket, DisplayErrorContext(&err))
        })?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn head_object(&self, key: &str) -> MigrateResult<bool> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(err) if err.as_service_error().is_some_and(|e| e.is_not_found()) => Ok(false),
            Err(err) => Err(MigrationError::store("head", key, DisplayErrorContext(&err))),
        }
    }

    #[instrument(skip(self, body, metadata), fields(bucket = %self.bucket, size = body.len()))]
    async fn put_object(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: Option<&str>,
        metadata: Metadata,
    ) -> MigrateResult<()> {
        let metadata = (!metadata.is_empty()).then_some(metadata);
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .set_content_type(content_type.map(str::to_string))
            .set_metadata(metadata)
            .send()
            .await
            .map_err(|err| MigrationError::store("put", key, DisplayErrorContext(&err)))?;
        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn get_object(&self, key: &str) -> MigrateResult<Vec<u8>> {
        let output = match self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(output) => output,
            Err(err) if err.as_service_error().is_some_and(|e| e.is_no_such_key()) => {
                return Err(MigrationError::NotFound(key.to_string()));
            }
            Err(err) => return Err(MigrationError::store("get", key, DisplayErrorContext(&err))),
        };

        let bytes = output
            .body
            .collect()
            .await
            .map_err(|err| MigrationError::store("get", key, err))?;
        Ok(bytes.into_bytes().to_vec())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> MigrateResult<()> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|err| MigrationError::store("delete", key, DisplayErrorContext(&err)))?;
        Ok(())
    }
}
