use anyhow::{Context as AnyhowContext, Result};
use async_trait::async_trait;
use aws_credential_types::Credentials;
use aws_sdk_s3::config::BehaviorVersion;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::Client;
use aws_types::region::Region;
use tracing::{debug, error, info, instrument};

use super::BlobStore;
use crate::config::StorageConfig;
use crate::errors::AppError;

/// Object storage client for any S3-compatible service (AWS S3, R2, GCS interop, MinIO)
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
}

impl S3BlobStore {
    /// Create a new client from storage configuration
    ///
    /// # Errors
    /// Returns error if the bucket or credentials are missing
    #[instrument(skip(config), fields(bucket = ?config.s3_bucket))]
    pub fn new(config: &StorageConfig) -> Result<Self> {
        let bucket = config
            .s3_bucket
            .as_ref()
            .context("S3_BUCKET is required for object storage")?;

        let access_key_id = config
            .s3_access_key_id
            .as_ref()
            .context("S3_ACCESS_KEY_ID is required for object storage")?;

        let secret_access_key = config
            .s3_secret_access_key
            .as_ref()
            .context("S3_SECRET_ACCESS_KEY is required for object storage")?;

        let credentials = Credentials::new(
            access_key_id,
            secret_access_key,
            None, // session token
            None, // expiration (static credentials)
            "static",
        );

        let mut builder = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new(config.s3_region.clone()))
            .credentials_provider(credentials);

        if let Some(endpoint) = &config.s3_endpoint {
            debug!(endpoint = %endpoint, "Using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        let client = Client::from_conf(builder.build());

        info!(
            bucket = %bucket,
            region = %config.s3_region,
            "S3 client initialized successfully"
        );

        Ok(Self {
            client,
            bucket: bucket.clone(),
        })
    }
}

/// True only for the service's typed "no such key" reply
fn is_missing_key<R>(err: &SdkError<GetObjectError, R>) -> bool {
    err.as_service_error()
        .is_some_and(|service_err| service_err.is_no_such_key())
}

/// HEAD has no body, so a missing key arrives as the typed `NotFound`
fn is_missing_head<R>(err: &SdkError<HeadObjectError, R>) -> bool {
    err.as_service_error()
        .is_some_and(|service_err| service_err.is_not_found())
}

#[async_trait]
impl BlobStore for S3BlobStore {
    fn name(&self) -> &str {
        "s3"
    }

    #[instrument(skip(self, bytes), fields(bucket = %self.bucket, size_bytes = bytes.len()))]
    async fn put_object(
        &self,
        key: &str,
        bytes: Vec<u8>,
        content_type: &str,
    ) -> std::result::Result<(), AppError> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .content_type(content_type)
            .body(ByteStream::from(bytes))
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = ?e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to upload object"
                );
                AppError::Storage(format!("Failed to upload object: {}", e))
            })?;

        info!(bucket = %self.bucket, key = %key, "Uploaded object");

        Ok(())
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn download_object(&self, key: &str) -> std::result::Result<Vec<u8>, AppError> {
        debug!(key = %key, "Downloading object");

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                if is_missing_key(&e) {
                    AppError::NotFound(format!("Object not found: {}", key))
                } else {
                    error!(
                        error = ?e,
                        bucket = %self.bucket,
                        key = %key,
                        "Failed to fetch object"
                    );
                    AppError::Storage(format!("Failed to fetch object: {}", e))
                }
            })?;

        // Stream the object bytes into memory
        let data = response.body.collect().await.map_err(|e| {
            error!(
                error = ?e,
                bucket = %self.bucket,
                key = %key,
                "Failed to read object bytes"
            );
            AppError::Storage(format!("Failed to read object bytes: {}", e))
        })?;

        let bytes = data.into_bytes().to_vec();

        info!(
            bucket = %self.bucket,
            key = %key,
            size_bytes = %bytes.len(),
            "Downloaded object"
        );

        Ok(bytes)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn object_exists(&self, key: &str) -> std::result::Result<bool, AppError> {
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
        {
            Ok(_) => Ok(true),
            Err(e) => {
                if is_missing_head(&e) {
                    Ok(false)
                } else {
                    error!(
                        error = ?e,
                        bucket = %self.bucket,
                        key = %key,
                        "Failed to check object existence"
                    );
                    Err(AppError::Storage(format!(
                        "Failed to check object existence: {}",
                        e
                    )))
                }
            }
        }
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete_object(&self, key: &str) -> std::result::Result<(), AppError> {
        debug!(key = %key, "Deleting object");

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| {
                error!(
                    error = ?e,
                    bucket = %self.bucket,
                    key = %key,
                    "Failed to delete object"
                );
                AppError::Storage(format!("Failed to delete object: {}", e))
            })?;

        info!(bucket = %self.bucket, key = %key, "Deleted object");

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use aws_sdk_s3::error::ErrorMetadata;
    use aws_sdk_s3::types::error::{NoSuchKey, NotFound};

    #[test]
    fn test_requires_bucket_and_credentials() {
        let config = Config::default();
        assert!(S3BlobStore::new(&config.storage).is_err());
    }

    #[test]
    fn test_builds_with_credentials() {
        let mut config = Config::default();
        config.storage.s3_bucket = Some("pdfs".to_string());
        config.storage.s3_endpoint = Some("http://localhost:9000".to_string());
        config.storage.s3_access_key_id = Some("key".to_string());
        config.storage.s3_secret_access_key = Some("secret".to_string());

        let store = S3BlobStore::new(&config.storage).unwrap();
        assert_eq!(store.bucket, "pdfs");
        assert_eq!(store.name(), "s3");
    }

    #[test]
    fn test_only_no_such_key_means_missing() {
        let missing: SdkError<GetObjectError, ()> = SdkError::service_error(
            GetObjectError::NoSuchKey(NoSuchKey::builder().build()),
            (),
        );
        assert!(is_missing_key(&missing));

        // An access failure whose text mentions 404 is still a failure
        let denied: SdkError<GetObjectError, ()> = SdkError::service_error(
            GetObjectError::generic(
                ErrorMetadata::builder()
                    .code("AccessDenied")
                    .message("request 404a7f denied")
                    .build(),
            ),
            (),
        );
        assert!(!is_missing_key(&denied));
    }

    #[test]
    fn test_only_typed_not_found_means_missing_head() {
        let missing: SdkError<HeadObjectError, ()> = SdkError::service_error(
            HeadObjectError::NotFound(NotFound::builder().build()),
            (),
        );
        assert!(is_missing_head(&missing));

        let server_error: SdkError<HeadObjectError, ()> = SdkError::service_error(
            HeadObjectError::generic(
                ErrorMetadata::builder()
                    .code("InternalError")
                    .message("NotFound handler crashed (404 route)")
                    .build(),
            ),
            (),
        );
        assert!(!is_missing_head(&server_error));
    }
}
