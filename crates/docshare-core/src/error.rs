//! Error types for the docshare-core crate

use docshare_crypto::CryptoError;
use docshare_storage::StorageError;
use thiserror::Error;

/// Result type alias using `CoreError`
pub type Result<T> = std::result::Result<T, CoreError>;

/// Errors that can occur in document operations
#[derive(Error, Debug)]
pub enum CoreError {
    /// No record for this id
    #[error("document not found: {0}")]
    NotFound(String),

    /// Record exists but its expiration time has passed
    #[error("document has expired: {0}")]
    Expired(String),

    /// Passcode did not match the stored hash
    #[error("invalid passcode")]
    InvalidPasscode,

    /// Record exists but its blob is missing
    #[error("blob not found for document: {0}")]
    BlobNotFound(String),

    /// Upload exceeds the configured ceiling
    #[error("file too large: {size} bytes exceeds maximum of {max} bytes")]
    PayloadTooLarge { size: usize, max: usize },

    /// Blob write failed before any record was created
    #[error("storage write failed: {0}")]
    StorageWrite(String),

    /// Blob was written but the record could not be persisted
    #[error("upload failed: {0}")]
    UploadFailed(String),

    /// Stored blob failed its integrity check
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Request is missing required input
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// Other storage backend error
    #[error("storage error: {0}")]
    Storage(StorageError),

    /// Crypto error
    #[error("crypto error: {0}")]
    Crypto(#[from] CryptoError),

    /// Record store error
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Blocking task was cancelled or panicked
    #[error("task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl CoreError {
    /// Whether this error is the caller's fault rather than the server's
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound(_)
                | Self::Expired(_)
                | Self::InvalidPasscode
                | Self::PayloadTooLarge { .. }
                | Self::InvalidRequest(_)
        )
    }
}

impl From<StorageError> for CoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::PayloadTooLarge { size, max } => Self::PayloadTooLarge { size, max },
            StorageError::StorageWrite(msg) => Self::StorageWrite(msg),
            StorageError::BlobNotFound(name) => Self::BlobNotFound(name),
            StorageError::Crypto(e) if e.is_integrity_failure() => Self::Decryption(e.to_string()),
            other => Self::Storage(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_storage_errors_are_translated() {
        let err: CoreError = StorageError::PayloadTooLarge { size: 9, max: 8 }.into();
        assert!(matches!(err, CoreError::PayloadTooLarge { size: 9, max: 8 }));

        let err: CoreError = StorageError::BlobNotFound("x".into()).into();
        assert!(matches!(err, CoreError::BlobNotFound(_)));

        let err: CoreError =
            StorageError::Crypto(CryptoError::Decryption("integrity check failed".into())).into();
        assert!(matches!(err, CoreError::Decryption(_)));

        let err: CoreError = StorageError::Backend("boom".into()).into();
        assert!(matches!(err, CoreError::Storage(_)));
    }

    #[test]
    fn test_client_errors() {
        assert!(CoreError::InvalidPasscode.is_client_error());
        assert!(CoreError::Expired("id".into()).is_client_error());
        assert!(!CoreError::UploadFailed("db".into()).is_client_error());
        assert!(!CoreError::Decryption("tag".into()).is_client_error());
    }
}
