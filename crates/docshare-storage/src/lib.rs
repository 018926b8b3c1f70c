//! # Docshare Storage
//!
//! Encrypted blob storage for the docshare document sharing service.
//!
//! This crate provides:
//! - **Blob operations**: Save, retrieve, and delete encrypted blobs
//! - **Unique naming**: Collision-free storage names that never echo user paths
//! - **Backends**: Local filesystem, S3-compatible object storage, and memory
//! - **Selection**: One backend chosen from configuration at startup
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │            Document Service             │
//! ├─────────────────────────────────────────┤
//! │            BlobStore Trait              │
//! ├─────────────┬─────────────┬─────────────┤
//! │  LocalStore │   S3Store   │ MemoryStore │
//! ├─────────────┴─────────────┴─────────────┤
//! │        Cipher (AES-256-GCM blobs)       │
//! └─────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```rust,ignore
//! use docshare_storage::{BlobStore, LocalBlobStore};
//!
//! let store = LocalBlobStore::new("./storage", cipher, 100 * 1024 * 1024)?;
//! let name = store.generate_unique_filename("report.pdf");
//! let size = store.save_encrypted(&data, &name).await?;
//! let plaintext = store.retrieve_decrypted(&name).await?;
//! ```

pub mod error;
pub mod local;
pub mod memory;
pub mod s3;
pub mod selector;

pub use error::{Result, StorageError};
pub use local::LocalBlobStore;
pub use memory::MemoryBlobStore;
pub use s3::{S3BlobStore, S3Config};
pub use selector::{select_backend, Backend, StorageConfig, StorageHealth};

use async_trait::async_trait;
use docshare_crypto::Cipher;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;

/// Default maximum upload size (100 MB)
pub const DEFAULT_MAX_FILE_SIZE: usize = 100 * 1024 * 1024;

/// Longest file extension carried over into a storage name
pub const MAX_EXTENSION_LEN: usize = 16;

/// Payloads above this size are encrypted and decrypted on the blocking pool
pub const BLOCKING_CRYPTO_THRESHOLD: usize = 64 * 1024;

/// Trait for encrypted blob storage backends
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Generate a collision-free storage name that keeps the original extension
    fn generate_unique_filename(&self, original_name: &str) -> String {
        unique_filename(original_name)
    }

    /// Encrypt and store content, returning the plaintext length
    async fn save_encrypted(&self, content: &[u8], unique_name: &str) -> Result<u64>;

    /// Load and decrypt a blob
    async fn retrieve_decrypted(&self, unique_name: &str) -> Result<Vec<u8>>;

    /// Delete a blob, returning whether it existed
    async fn delete(&self, unique_name: &str) -> Result<bool>;
}

/// Which backend is serving blobs
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum BackendKind {
    /// Local filesystem directory
    Local,
    /// S3-compatible object storage
    S3,
    /// In-process memory (development only)
    Memory,
}

impl BackendKind {
    /// Get the display name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Local => "Local",
            Self::S3 => "S3",
            Self::Memory => "Memory",
        }
    }

    /// Whether blobs survive a restart
    pub fn is_persistent(&self) -> bool {
        !matches!(self, Self::Memory)
    }
}

impl std::fmt::Display for BackendKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Build `"{uuid}{ext}"` from a user-supplied filename.
///
/// Only the extension of the last path component survives, and only if it
/// is short and alphanumeric.
pub fn unique_filename(original_name: &str) -> String {
    let last = original_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();

    let ext = Path::new(last)
        .extension()
        .and_then(|e| e.to_str())
        .filter(|e| {
            !e.is_empty()
                && e.len() <= MAX_EXTENSION_LEN
                && e.chars().all(|c| c.is_ascii_alphanumeric())
        })
        .map(|e| format!(".{e}"))
        .unwrap_or_default();

    format!("{}{}", uuid::Uuid::new_v4(), ext)
}

/// Reject payloads above the ceiling before any encryption work
pub(crate) fn check_size(len: usize, max: usize) -> Result<()> {
    if len > max {
        return Err(StorageError::PayloadTooLarge { size: len, max });
    }
    Ok(())
}

/// Encrypt a payload, off the async executor when it is large
pub(crate) async fn encrypt_blob(cipher: &Arc<Cipher>, content: &[u8]) -> Result<Vec<u8>> {
    if content.len() <= BLOCKING_CRYPTO_THRESHOLD {
        return Ok(cipher.encrypt(content)?);
    }
    let cipher = Arc::clone(cipher);
    let content = content.to_vec();
    Ok(tokio::task::spawn_blocking(move || cipher.encrypt(&content)).await??)
}

/// Decrypt a stored blob, off the async executor when it is large
pub(crate) async fn decrypt_blob(cipher: &Arc<Cipher>, blob: Vec<u8>) -> Result<Vec<u8>> {
    if blob.len() <= BLOCKING_CRYPTO_THRESHOLD {
        return Ok(cipher.decrypt(&blob)?);
    }
    let cipher = Arc::clone(cipher);
    Ok(tokio::task::spawn_blocking(move || cipher.decrypt(&blob)).await??)
}

/// A storage name must be a single, non-special path component
pub(crate) fn validate_name(name: &str) -> Result<()> {
    if name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0'])
    {
        return Err(StorageError::InvalidName(name.to_string()));
    }
    Ok(())
}
