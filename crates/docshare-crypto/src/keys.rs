//! Key derivation for blob encryption
//!
//! The service holds exactly one symmetric key for its lifetime. It is
//! derived from the configured secret with Argon2id, so the same secret
//! and salt always yield the same key across restarts and replicas.

use crate::{CryptoError, Result};
use argon2::{Algorithm, Argon2, Params, Version};
use rand::rngs::OsRng;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Size of a symmetric key in bytes (256 bits)
pub const KEY_SIZE: usize = 32;

/// Size of a nonce in bytes (96 bits for AES-GCM)
pub const NONCE_SIZE: usize = 12;

/// Minimum accepted salt length
pub const MIN_SALT_SIZE: usize = 8;

/// Salt shared by every legacy deployment.
///
/// Identical across installations, so it offers no protection against
/// precomputation on weak secrets. Kept only so existing blobs stay readable.
pub const LEGACY_SALT: &[u8] = b"secure_doc_share_salt";

// Argon2id cost parameters: 19 MiB, 2 passes, 1 lane
const KDF_M_COST: u32 = 19 * 1024;
const KDF_T_COST: u32 = 2;
const KDF_P_COST: u32 = 1;

/// Salt used when deriving the blob encryption key
#[derive(Clone, Debug, PartialEq, Eq, Default)]
pub enum KdfSalt {
    /// The fixed, deployment-independent salt
    #[default]
    Legacy,
    /// A per-deployment salt
    Custom(Vec<u8>),
}

impl KdfSalt {
    /// Parse a per-deployment salt from hex
    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = hex::decode(s.trim())?;
        Self::custom(bytes)
    }

    /// Create a per-deployment salt, enforcing the minimum length
    pub fn custom(bytes: Vec<u8>) -> Result<Self> {
        if bytes.len() < MIN_SALT_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "salt must be at least {} bytes, got {}",
                MIN_SALT_SIZE,
                bytes.len()
            )));
        }
        Ok(Self::Custom(bytes))
    }

    /// Get the salt bytes
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            Self::Legacy => LEGACY_SALT,
            Self::Custom(bytes) => bytes,
        }
    }

    /// Whether this is the shared legacy salt
    pub fn is_legacy(&self) -> bool {
        matches!(self, Self::Legacy)
    }
}

/// The symmetric key used to encrypt blobs
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct SecretKey {
    key: [u8; KEY_SIZE],
}

impl SecretKey {
    /// Derive the key from a server secret
    pub fn derive(secret: &[u8], salt: &KdfSalt) -> Result<Self> {
        if secret.is_empty() {
            return Err(CryptoError::InvalidKey("secret must not be empty".to_string()));
        }

        let params = Params::new(KDF_M_COST, KDF_T_COST, KDF_P_COST, Some(KEY_SIZE))
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        let argon2 = Argon2::new(Algorithm::Argon2id, Version::V0x13, params);

        let mut key = [0u8; KEY_SIZE];
        argon2
            .hash_password_into(secret, salt.as_bytes(), &mut key)
            .map_err(|e| CryptoError::KeyDerivation(e.to_string()))?;
        Ok(Self { key })
    }

    /// Generate a random key
    pub fn generate() -> Self {
        let mut key = [0u8; KEY_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut key);
        Self { key }
    }

    /// Create a key from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "key must be {} bytes, got {}",
                KEY_SIZE,
                bytes.len()
            )));
        }
        let mut key = [0u8; KEY_SIZE];
        key.copy_from_slice(bytes);
        Ok(Self { key })
    }

    /// Get the key bytes
    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.key
    }
}

impl std::fmt::Debug for SecretKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("SecretKey(..)")
    }
}
