//! Error types for the docshare-crypto crate

use thiserror::Error;

/// Result type alias using `CryptoError`
pub type Result<T> = std::result::Result<T, CryptoError>;

/// Errors that can occur during cryptographic operations
#[derive(Error, Debug)]
pub enum CryptoError {
    /// Key derivation failed
    #[error("key derivation failed: {0}")]
    KeyDerivation(String),

    /// Encryption failed
    #[error("encryption failed: {0}")]
    Encryption(String),

    /// Ciphertext is malformed, truncated, or failed the integrity check
    #[error("decryption failed: {0}")]
    Decryption(String),

    /// Invalid key material or salt
    #[error("invalid key: {0}")]
    InvalidKey(String),

    /// Invalid nonce
    #[error("invalid nonce: {0}")]
    InvalidNonce(String),

    /// Passcode hashing failed
    #[error("passcode hashing failed: {0}")]
    PasscodeHash(String),

    /// Hex decode error
    #[error("hex decode error: {0}")]
    HexDecode(#[from] hex::FromHexError),
}

impl CryptoError {
    /// Whether this error indicates a blob that could not be authenticated
    pub fn is_integrity_failure(&self) -> bool {
        matches!(self, Self::Decryption(_))
    }
}
