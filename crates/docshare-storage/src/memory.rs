//! In-memory blob store for testing and development

use crate::{check_size, decrypt_blob, encrypt_blob, validate_name, BlobStore, Result, StorageError};
use async_trait::async_trait;
use bytes::Bytes;
use dashmap::DashMap;
use docshare_crypto::Cipher;
use std::sync::Arc;

/// An in-memory blob store holding ciphertext, same contract as the others
#[derive(Clone)]
pub struct MemoryBlobStore {
    blobs: Arc<DashMap<String, Bytes>>,
    cipher: Arc<Cipher>,
    max_size: usize,
}

impl MemoryBlobStore {
    /// Create a new empty memory store
    pub fn new(cipher: Arc<Cipher>, max_size: usize) -> Self {
        Self {
            blobs: Arc::new(DashMap::new()),
            cipher,
            max_size,
        }
    }

    /// Get the number of blobs stored
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    /// Check if the store is empty
    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Check whether a blob exists
    pub fn contains(&self, unique_name: &str) -> bool {
        self.blobs.contains_key(unique_name)
    }

    /// Raw ciphertext for a blob
    pub fn raw(&self, unique_name: &str) -> Option<Bytes> {
        self.blobs.get(unique_name).map(|entry| entry.value().clone())
    }

    /// Overwrite raw ciphertext (used to simulate corruption)
    pub fn put_raw(&self, unique_name: &str, blob: Vec<u8>) {
        self.blobs.insert(unique_name.to_string(), Bytes::from(blob));
    }

    /// Configured upload ceiling
    pub fn max_size(&self) -> usize {
        self.max_size
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn save_encrypted(&self, content: &[u8], unique_name: &str) -> Result<u64> {
        check_size(content.len(), self.max_size)?;
        validate_name(unique_name)?;
        let blob = encrypt_blob(&self.cipher, content).await?;
        self.blobs.insert(unique_name.to_string(), Bytes::from(blob));
        Ok(content.len() as u64)
    }

    async fn retrieve_decrypted(&self, unique_name: &str) -> Result<Vec<u8>> {
        let blob = self
            .raw(unique_name)
            .ok_or_else(|| StorageError::BlobNotFound(unique_name.to_string()))?;
        decrypt_blob(&self.cipher, blob.to_vec()).await
    }

    async fn delete(&self, unique_name: &str) -> Result<bool> {
        Ok(self.blobs.remove(unique_name).is_some())
    }
}
