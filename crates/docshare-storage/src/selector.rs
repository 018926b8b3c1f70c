//! Backend selection from static configuration

use crate::{
    BackendKind, BlobStore, LocalBlobStore, MemoryBlobStore, Result, S3BlobStore, S3Config,
    StorageError, DEFAULT_MAX_FILE_SIZE,
};
use async_trait::async_trait;
use docshare_crypto::Cipher;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};

/// Storage settings resolved at startup
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Which backend to build
    pub backend: BackendKind,
    /// Directory for the local backend
    pub storage_dir: PathBuf,
    /// Upload ceiling in bytes
    pub max_file_size: usize,
    /// Remote settings, required for the S3 backend
    pub s3: Option<S3Config>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            backend: BackendKind::Local,
            storage_dir: PathBuf::from("storage"),
            max_file_size: DEFAULT_MAX_FILE_SIZE,
            s3: None,
        }
    }
}

/// The selected backend, fixed for the process lifetime
#[derive(Clone)]
pub enum Backend {
    /// Local filesystem
    Local(LocalBlobStore),
    /// S3-compatible object storage
    S3(S3BlobStore),
    /// In-memory storage
    Memory(MemoryBlobStore),
}

impl Backend {
    /// Which kind of backend this is
    pub fn kind(&self) -> BackendKind {
        match self {
            Self::Local(_) => BackendKind::Local,
            Self::S3(_) => BackendKind::S3,
            Self::Memory(_) => BackendKind::Memory,
        }
    }

    /// Configured upload ceiling
    pub fn max_size(&self) -> usize {
        match self {
            Self::Local(store) => store.max_size(),
            Self::S3(store) => store.max_size(),
            Self::Memory(store) => store.max_size(),
        }
    }

    /// Report backend reachability. Re-probes the bucket for S3.
    pub async fn health(&self) -> StorageHealth {
        match self {
            Self::S3(store) => match store.validate().await {
                Ok(()) => StorageHealth {
                    kind: BackendKind::S3,
                    bucket: Some(store.bucket().to_string()),
                    connected: true,
                    error: None,
                },
                Err(e) => StorageHealth {
                    kind: BackendKind::S3,
                    bucket: Some(store.bucket().to_string()),
                    connected: false,
                    error: Some(e.to_string()),
                },
            },
            other => StorageHealth {
                kind: other.kind(),
                bucket: None,
                connected: true,
                error: None,
            },
        }
    }
}

#[async_trait]
impl BlobStore for Backend {
    async fn save_encrypted(&self, content: &[u8], unique_name: &str) -> Result<u64> {
        match self {
            Self::Local(store) => store.save_encrypted(content, unique_name).await,
            Self::S3(store) => store.save_encrypted(content, unique_name).await,
            Self::Memory(store) => store.save_encrypted(content, unique_name).await,
        }
    }

    async fn retrieve_decrypted(&self, unique_name: &str) -> Result<Vec<u8>> {
        match self {
            Self::Local(store) => store.retrieve_decrypted(unique_name).await,
            Self::S3(store) => store.retrieve_decrypted(unique_name).await,
            Self::Memory(store) => store.retrieve_decrypted(unique_name).await,
        }
    }

    async fn delete(&self, unique_name: &str) -> Result<bool> {
        match self {
            Self::Local(store) => store.delete(unique_name).await,
            Self::S3(store) => store.delete(unique_name).await,
            Self::Memory(store) => store.delete(unique_name).await,
        }
    }
}

/// Result of a backend health probe
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StorageHealth {
    /// Backend kind
    pub kind: BackendKind,
    /// Bucket name, for S3
    pub bucket: Option<String>,
    /// Whether the backend answered the probe
    pub connected: bool,
    /// Probe failure detail
    pub error: Option<String>,
}

/// Build the configured backend.
///
/// The S3 backend is validated before it is returned; a failure is a
/// configuration error and never falls back to local storage.
pub async fn select_backend(config: &StorageConfig, cipher: Arc<Cipher>) -> Result<Backend> {
    let backend = match config.backend {
        BackendKind::Local => {
            let store = LocalBlobStore::new(&config.storage_dir, cipher, config.max_file_size)?;
            info!(dir = %config.storage_dir.display(), "Using local blob storage");
            Backend::Local(store)
        }
        BackendKind::S3 => {
            let s3 = config.s3.as_ref().ok_or_else(|| {
                StorageError::Configuration(
                    "S3 storage selected but no S3 settings were provided".to_string(),
                )
            })?;
            let store = S3BlobStore::new(s3, cipher, config.max_file_size)
                .await
                .map_err(init_failed)?;
            store.validate().await.map_err(init_failed)?;
            info!(bucket = %store.bucket(), "Using S3 blob storage");
            Backend::S3(store)
        }
        BackendKind::Memory => {
            warn!("Using in-memory blob storage - data will NOT persist");
            Backend::Memory(MemoryBlobStore::new(cipher, config.max_file_size))
        }
    };
    Ok(backend)
}

fn init_failed(err: StorageError) -> StorageError {
    StorageError::Configuration(format!("S3 storage initialization failed: {err}"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use docshare_crypto::SecretKey;
    use tempfile::TempDir;

    fn cipher() -> Arc<Cipher> {
        Arc::new(Cipher::new(&SecretKey::generate()))
    }

    #[tokio::test]
    async fn test_selects_local() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            storage_dir: dir.path().join("store"),
            max_file_size: 1024,
            ..Default::default()
        };

        let backend = select_backend(&config, cipher()).await.unwrap();
        assert_eq!(backend.kind(), BackendKind::Local);
        assert_eq!(backend.max_size(), 1024);
        assert!(dir.path().join("store").is_dir());

        let health = backend.health().await;
        assert!(health.connected);
        assert!(health.bucket.is_none());
    }

    #[tokio::test]
    async fn test_backend_delegates() {
        let backend = Backend::Memory(MemoryBlobStore::new(cipher(), 1024));
        let name = backend.generate_unique_filename("a.txt");
        assert_eq!(backend.save_encrypted(b"abc", &name).await.unwrap(), 3);
        assert_eq!(backend.retrieve_decrypted(&name).await.unwrap(), b"abc");
        assert!(backend.delete(&name).await.unwrap());
        assert!(!backend.delete(&name).await.unwrap());
    }

    #[tokio::test]
    async fn test_s3_without_settings_is_configuration_error() {
        let config = StorageConfig {
            backend: BackendKind::S3,
            ..Default::default()
        };
        let result = select_backend(&config, cipher()).await;
        assert!(matches!(result, Err(StorageError::Configuration(_))));
    }

    #[tokio::test]
    async fn test_s3_without_bucket_does_not_fall_back() {
        let config = StorageConfig {
            backend: BackendKind::S3,
            s3: Some(S3Config::new("", "us-east-1")),
            ..Default::default()
        };
        let err = select_backend(&config, cipher()).await.err().unwrap();
        assert!(err.to_string().contains("S3 storage initialization failed"));
    }
}
