// src/adapters/s3.rs
// S3 object store adapter implementation

use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::{
    config::{Credentials, Region},
    error::{DisplayErrorContext, SdkError},
    operation::get_object::GetObjectError,
    primitives::ByteStream,
    Client,
};
use tracing::debug;

use crate::{
    domain::config::RunnerSettings,
    ports::object_store::{ObjectStore, StorageError},
};

/// Object store backed by S3 (or an S3-compatible endpoint)
#[derive(Clone)]
pub struct S3ObjectStore {
    client: Client,
}

impl S3ObjectStore {
    /// Build a client from the ambient AWS configuration, applying the
    /// region, endpoint override and static credentials from `settings`
    pub async fn connect(settings: &RunnerSettings) -> Result<Self, StorageError> {
        let mut loader = aws_config::defaults(BehaviorVersion::latest());

        if let Some(region) = settings.region.as_ref().filter(|r| !r.is_empty()) {
            loader = loader.region(Region::new(region.clone()));
        }

        let credentials = settings
            .credentials()
            .map_err(|e| StorageError::Unreachable(e.to_string()))?;
        if let Some(creds) = credentials {
            loader = loader.credentials_provider(Credentials::new(
                creds.access_key_id,
                creds.secret_access_key,
                None,
                None,
                "ras-runner",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);

        // Local mock stores rarely support virtual-hosted buckets
        if let Some(endpoint) = settings.endpoint_url.as_ref().filter(|e| !e.is_empty()) {
            debug!(endpoint = %endpoint, "using object store endpoint override");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self {
            client: Client::from_conf(builder.build()),
        })
    }
}

fn get_error(bucket: &str, key: &str, err: SdkError<GetObjectError>) -> StorageError {
    if let SdkError::ServiceError(service) = &err {
        if service.err().is_no_such_key() {
            return StorageError::NotFound {
                bucket: bucket.to_string(),
                key: key.to_string(),
            };
        }
    }
    StorageError::Unreachable(DisplayErrorContext(&err).to_string())
}

#[async_trait]
impl ObjectStore for S3ObjectStore {
    async fn get_object(&self, bucket: &str, key: &str) -> Result<Vec<u8>, StorageError> {
        let output = self
            .client
            .get_object()
            .bucket(bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| get_error(bucket, key, e))?;

        let body = output
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Transfer(e.to_string()))?;

        Ok(body.into_bytes().to_vec())
    }

    async fn put_object(
        &self,
        bucket: &str,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), StorageError> {
        let content_length = i64::try_from(body.len())
            .map_err(|e| StorageError::Transfer(e.to_string()))?;

        self.client
            .put_object()
            .bucket(bucket)
            .key(key)
            .content_type(content_type)
            .content_length(content_length)
            .body(ByteStream::from(body))
            .send()
            .await
            .map_err(|e| StorageError::Transfer(DisplayErrorContext(&e).to_string()))?;

        Ok(())
    }
}
