//! Local filesystem blob store

use crate::{check_size, decrypt_blob, encrypt_blob, validate_name, BlobStore, Result, StorageError};
use async_trait::async_trait;
use docshare_crypto::Cipher;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::io::AsyncWriteExt;
use tracing::{debug, instrument, warn};

/// Stores encrypted blobs as files in a single directory
#[derive(Clone)]
pub struct LocalBlobStore {
    dir: PathBuf,
    cipher: Arc<Cipher>,
    max_size: usize,
}

impl LocalBlobStore {
    /// Create a store rooted at `dir`, creating the directory if absent
    pub fn new(dir: impl Into<PathBuf>, cipher: Arc<Cipher>, max_size: usize) -> Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        Ok(Self {
            dir,
            cipher,
            max_size,
        })
    }

    /// The storage directory
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Configured upload ceiling
    pub fn max_size(&self) -> usize {
        self.max_size
    }

    fn path_for(&self, unique_name: &str) -> Result<PathBuf> {
        validate_name(unique_name)?;
        Ok(self.dir.join(unique_name))
    }

    /// Write to a sibling temp file, then rename over the final name
    async fn write_atomic(&self, path: &Path, data: &[u8]) -> std::io::Result<()> {
        let tmp = self
            .dir
            .join(format!(".{}.tmp-{}", uuid::Uuid::new_v4(), std::process::id()));

        let result = async {
            let mut file = tokio::fs::File::create(&tmp).await?;
            file.write_all(data).await?;
            file.sync_all().await?;
            drop(file);
            tokio::fs::rename(&tmp, path).await
        }
        .await;

        if result.is_err() {
            if let Err(e) = tokio::fs::remove_file(&tmp).await {
                if e.kind() != ErrorKind::NotFound {
                    warn!(path = %tmp.display(), error = %e, "Failed to remove temp file");
                }
            }
        }
        result
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    #[instrument(skip(self, content), fields(size = content.len()))]
    async fn save_encrypted(&self, content: &[u8], unique_name: &str) -> Result<u64> {
        check_size(content.len(), self.max_size)?;
        let path = self.path_for(unique_name)?;

        let blob = encrypt_blob(&self.cipher, content).await?;
        self.write_atomic(&path, &blob)
            .await
            .map_err(|e| StorageError::StorageWrite(e.to_string()))?;

        debug!(name = %unique_name, "Stored blob");
        Ok(content.len() as u64)
    }

    #[instrument(skip(self))]
    async fn retrieve_decrypted(&self, unique_name: &str) -> Result<Vec<u8>> {
        let path = self.path_for(unique_name)?;
        let blob = match tokio::fs::read(&path).await {
            Ok(blob) => blob,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                return Err(StorageError::BlobNotFound(unique_name.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        decrypt_blob(&self.cipher, blob).await
    }

    #[instrument(skip(self))]
    async fn delete(&self, unique_name: &str) -> Result<bool> {
        let path = self.path_for(unique_name)?;
        match tokio::fs::remove_file(&path).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }
}
