//! Error types for the docshare-storage crate

use thiserror::Error;

/// Result type alias using `StorageError`
pub type Result<T> = std::result::Result<T, StorageError>;

/// Errors that can occur during blob storage operations
#[derive(Error, Debug)]
pub enum StorageError {
    /// Payload exceeds the configured ceiling
    #[error("payload too large: {size} bytes exceeds maximum {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// No blob stored under this name
    #[error("blob not found: {0}")]
    BlobNotFound(String),

    /// The backend refused or failed the write
    #[error("storage write failed: {0}")]
    StorageWrite(String),

    /// Name is not a single safe path component
    #[error("invalid blob name: {0}")]
    InvalidName(String),

    /// Backend misconfiguration, fatal at startup
    #[error("configuration error: {0}")]
    Configuration(String),

    /// Bucket existence or permission probe failed
    #[error("validation failed: {0}")]
    Validation(String),

    /// Backend read or delete failure
    #[error("storage backend error: {0}")]
    Backend(String),

    /// IO error
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Crypto error, including integrity failures on decryption
    #[error("crypto error: {0}")]
    Crypto(#[from] docshare_crypto::CryptoError),

    /// Blocking encryption task failed to complete
    #[error("task error: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl StorageError {
    /// Whether the blob could not be authenticated on read
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Self::Crypto(e) if e.is_integrity_failure())
    }
}
