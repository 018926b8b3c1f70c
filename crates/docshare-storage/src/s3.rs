//! S3-compatible blob store (AWS S3, MinIO, etc.)

use crate::{check_size, decrypt_blob, encrypt_blob, validate_name, BlobStore, Result, StorageError};
use async_trait::async_trait;
use aws_config::BehaviorVersion;
use aws_sdk_s3::config::{Credentials, Region};
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::primitives::ByteStream;
use aws_sdk_s3::types::ServerSideEncryption;
use aws_sdk_s3::Client;
use docshare_crypto::Cipher;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, instrument};

/// Default region when none is configured
pub const DEFAULT_REGION: &str = "us-east-1";

/// Key prefix for write-permission probes
const PROBE_PREFIX: &str = ".test";

/// Configuration for the S3 backend
#[derive(Clone, Serialize, Deserialize)]
pub struct S3Config {
    /// Bucket holding the blobs
    pub bucket: String,
    /// AWS region
    pub region: String,
    /// Static access key id (default credential chain when absent)
    pub access_key_id: Option<String>,
    /// Static secret access key
    pub secret_access_key: Option<String>,
    /// Endpoint override for S3-compatible services
    pub endpoint_url: Option<String>,
}

impl std::fmt::Debug for S3Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("S3Config")
            .field("bucket", &self.bucket)
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field(
                "secret_access_key",
                &self.secret_access_key.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint_url", &self.endpoint_url)
            .finish()
    }
}

impl S3Config {
    /// Create a config for a bucket in a region
    pub fn new(bucket: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            region: region.into(),
            access_key_id: None,
            secret_access_key: None,
            endpoint_url: None,
        }
    }

    /// Use static credentials instead of the default chain
    #[must_use]
    pub fn with_credentials(
        mut self,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        self.access_key_id = Some(access_key_id.into());
        self.secret_access_key = Some(secret_access_key.into());
        self
    }

    /// Set the endpoint URL override (MinIO, LocalStack)
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Check required settings before any network activity
    pub fn validate(&self) -> Result<()> {
        if self.bucket.trim().is_empty() {
            return Err(StorageError::Configuration(
                "S3_BUCKET_NAME is required when USE_S3=true".to_string(),
            ));
        }
        if self.region.trim().is_empty() {
            return Err(StorageError::Configuration("S3 region must not be empty".to_string()));
        }
        if self.access_key_id.is_some() != self.secret_access_key.is_some() {
            return Err(StorageError::Configuration(
                "AWS_ACCESS_KEY_ID and AWS_SECRET_ACCESS_KEY must be set together".to_string(),
            ));
        }
        Ok(())
    }
}

/// Stores encrypted blobs as objects in one bucket
#[derive(Clone)]
pub struct S3BlobStore {
    client: Client,
    bucket: String,
    cipher: Arc<Cipher>,
    max_size: usize,
}

impl S3BlobStore {
    /// Build a client from configuration. Does not contact the bucket.
    pub async fn new(config: &S3Config, cipher: Arc<Cipher>, max_size: usize) -> Result<Self> {
        config.validate()?;

        let mut loader =
            aws_config::defaults(BehaviorVersion::latest()).region(Region::new(config.region.clone()));

        if let (Some(key_id), Some(secret)) = (&config.access_key_id, &config.secret_access_key) {
            loader = loader.credentials_provider(Credentials::new(
                key_id.clone(),
                secret.clone(),
                None,
                None,
                "docshare-static",
            ));
        }

        let sdk_config = loader.load().await;
        let mut builder = aws_sdk_s3::config::Builder::from(&sdk_config);
        if let Some(endpoint) = &config.endpoint_url {
            debug!(endpoint = %endpoint, "Using custom S3 endpoint");
            builder = builder.endpoint_url(endpoint).force_path_style(true);
        }

        Ok(Self::from_client(
            Client::from_conf(builder.build()),
            config.bucket.clone(),
            cipher,
            max_size,
        ))
    }

    /// Create from an existing SDK client
    pub fn from_client(
        client: Client,
        bucket: impl Into<String>,
        cipher: Arc<Cipher>,
        max_size: usize,
    ) -> Self {
        Self {
            client,
            bucket: bucket.into(),
            cipher,
            max_size,
        }
    }

    /// The bucket name
    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    /// Configured upload ceiling
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// Confirm the bucket exists, is reachable, and accepts writes
    #[instrument(skip(self), fields(bucket = %self.bucket))]
    pub async fn validate(&self) -> Result<()> {
        if let Err(e) = self.client.head_bucket().bucket(&self.bucket).send().await {
            return Err(match http_status(&e) {
                Some(404) => StorageError::Validation(format!(
                    "S3 bucket '{}' does not exist",
                    self.bucket
                )),
                Some(403) => StorageError::Validation(format!(
                    "Access denied to S3 bucket '{}'. Check your AWS credentials.",
                    self.bucket
                )),
                Some(_) => StorageError::Validation(format!(
                    "Error accessing S3 bucket: {}",
                    DisplayErrorContext(&e)
                )),
                None => StorageError::Validation(format!(
                    "Failed to connect to S3: {}",
                    DisplayErrorContext(&e)
                )),
            });
        }

        let probe_key = format!("{}/{}", PROBE_PREFIX, uuid::Uuid::new_v4());
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(&probe_key)
            .body(ByteStream::from_static(b"test"))
            .send()
            .await
            .map_err(|e| {
                StorageError::Validation(format!(
                    "No write permission to S3 bucket '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(&probe_key)
            .send()
            .await
            .map_err(|e| {
                StorageError::Validation(format!(
                    "Failed to remove probe object from '{}': {}",
                    self.bucket,
                    DisplayErrorContext(&e)
                ))
            })?;

        info!("S3 bucket validated");
        Ok(())
    }
}

#[async_trait]
impl BlobStore for S3BlobStore {
    #[instrument(skip(self, content), fields(size = content.len(), bucket = %self.bucket))]
    async fn save_encrypted(&self, content: &[u8], unique_name: &str) -> Result<u64> {
        check_size(content.len(), self.max_size)?;
        validate_name(unique_name)?;

        let blob = encrypt_blob(&self.cipher, content).await?;
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(unique_name)
            .body(ByteStream::from(blob))
            .server_side_encryption(ServerSideEncryption::Aes256)
            .send()
            .await
            .map_err(|e| {
                StorageError::StorageWrite(format!(
                    "Failed to upload file to S3: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        debug!(key = %unique_name, "Stored object");
        Ok(content.len() as u64)
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn retrieve_decrypted(&self, unique_name: &str) -> Result<Vec<u8>> {
        validate_name(unique_name)?;

        let response = self
            .client
            .get_object()
            .bucket(&self.bucket)
            .key(unique_name)
            .send()
            .await
            .map_err(|e| {
                let missing = e.as_service_error().is_some_and(|se| se.is_no_such_key())
                    || http_status(&e) == Some(404);
                if missing {
                    StorageError::BlobNotFound(unique_name.to_string())
                } else {
                    StorageError::Backend(format!(
                        "Failed to retrieve file from S3: {}",
                        DisplayErrorContext(&e)
                    ))
                }
            })?;

        let blob = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::Backend(format!("Failed to read S3 body: {e}")))?
            .into_bytes()
            .to_vec();

        decrypt_blob(&self.cipher, blob).await
    }

    #[instrument(skip(self), fields(bucket = %self.bucket))]
    async fn delete(&self, unique_name: &str) -> Result<bool> {
        validate_name(unique_name)?;

        // DeleteObject succeeds for absent keys, so presence is checked first
        match self
            .client
            .head_object()
            .bucket(&self.bucket)
            .key(unique_name)
            .send()
            .await
        {
            Ok(_) => {}
            Err(e) if http_status(&e) == Some(404) => return Ok(false),
            Err(e) => {
                return Err(StorageError::Backend(format!(
                    "S3 HEAD failed: {}",
                    DisplayErrorContext(&e)
                )));
            }
        }

        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(unique_name)
            .send()
            .await
            .map_err(|e| {
                StorageError::Backend(format!("S3 DELETE failed: {}", DisplayErrorContext(&e)))
            })?;
        Ok(true)
    }
}

fn http_status<E>(err: &SdkError<E>) -> Option<u16> {
    err.raw_response().map(|response| response.status().as_u16())
}
