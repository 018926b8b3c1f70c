//! Authenticated blob encryption using AES-256-GCM
//!
//! Blob layout:
//!
//! ```text
//! ┌─────────┬──────────────┬────────────────────────────┐
//! │ version │ nonce (12 B) │ ciphertext ‖ GCM tag (16 B) │
//! └─────────┴──────────────┴────────────────────────────┘
//! ```

use crate::{
    keys::{KdfSalt, SecretKey, NONCE_SIZE},
    CryptoError, Result, BLOB_VERSION,
};
use aes_gcm::{aead::Aead as AeadTrait, Aes256Gcm, KeyInit};
use rand::rngs::OsRng;

/// Size of the GCM authentication tag
pub const TAG_SIZE: usize = 16;

/// Smallest well-formed blob (the encryption of an empty buffer)
pub const MIN_BLOB_SIZE: usize = 1 + NONCE_SIZE + TAG_SIZE;

/// A nonce for AEAD encryption
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Nonce {
    bytes: [u8; NONCE_SIZE],
}

impl Nonce {
    /// Generate a random nonce
    pub fn generate() -> Self {
        let mut bytes = [0u8; NONCE_SIZE];
        rand::RngCore::fill_bytes(&mut OsRng, &mut bytes);
        Self { bytes }
    }

    /// Create from raw bytes
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != NONCE_SIZE {
            return Err(CryptoError::InvalidNonce(format!(
                "nonce must be {} bytes, got {}",
                NONCE_SIZE,
                bytes.len()
            )));
        }
        let mut arr = [0u8; NONCE_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self { bytes: arr })
    }

    /// Get the nonce bytes
    pub fn as_bytes(&self) -> &[u8; NONCE_SIZE] {
        &self.bytes
    }
}

/// The process-wide encryption unit.
///
/// Built once at startup and shared behind an `Arc`; encryption and
/// decryption take `&self` and never mutate.
#[derive(Clone)]
pub struct Cipher {
    aead: Aes256Gcm,
}

impl Cipher {
    /// Create a cipher from an existing key
    pub fn new(key: &SecretKey) -> Self {
        Self {
            aead: Aes256Gcm::new(aes_gcm::Key::<Aes256Gcm>::from_slice(key.as_bytes())),
        }
    }

    /// Derive the key from a server secret and create the cipher
    pub fn from_secret(secret: &[u8], salt: &KdfSalt) -> Result<Self> {
        let key = SecretKey::derive(secret, salt)?;
        Ok(Self::new(&key))
    }

    /// Encrypt a buffer into a self-describing blob
    pub fn encrypt(&self, plaintext: &[u8]) -> Result<Vec<u8>> {
        let nonce = Nonce::generate();
        let ciphertext = self
            .aead
            .encrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), plaintext)
            .map_err(|e| CryptoError::Encryption(e.to_string()))?;

        let mut blob = Vec::with_capacity(1 + NONCE_SIZE + ciphertext.len());
        blob.push(BLOB_VERSION);
        blob.extend_from_slice(nonce.as_bytes());
        blob.extend_from_slice(&ciphertext);
        Ok(blob)
    }

    /// Decrypt a blob produced by [`Cipher::encrypt`]
    pub fn decrypt(&self, blob: &[u8]) -> Result<Vec<u8>> {
        if blob.len() < MIN_BLOB_SIZE {
            return Err(CryptoError::Decryption(format!(
                "blob too short: {} bytes, need at least {}",
                blob.len(),
                MIN_BLOB_SIZE
            )));
        }
        if blob[0] != BLOB_VERSION {
            return Err(CryptoError::Decryption(format!(
                "unsupported blob version: {}",
                blob[0]
            )));
        }

        let nonce = Nonce::from_bytes(&blob[1..1 + NONCE_SIZE])?;
        self.aead
            .decrypt(aes_gcm::Nonce::from_slice(nonce.as_bytes()), &blob[1 + NONCE_SIZE..])
            .map_err(|_| CryptoError::Decryption("integrity check failed".to_string()))
    }

    /// Size of the blob produced for a plaintext of `len` bytes
    pub fn blob_size(len: usize) -> usize {
        len + MIN_BLOB_SIZE
    }
}

impl std::fmt::Debug for Cipher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Cipher(AES-256-GCM)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rstest::rstest;

    fn cipher() -> Cipher {
        Cipher::new(&SecretKey::generate())
    }

    #[rstest]
    #[case::empty(b"".to_vec())]
    #[case::short(b"Hello, World!".to_vec())]
    #[case::large(vec![0xAB; 1024 * 1024])]
    fn test_roundtrip(#[case] plaintext: Vec<u8>) {
        let cipher = cipher();
        let blob = cipher.encrypt(&plaintext).unwrap();
        assert_eq!(blob.len(), Cipher::blob_size(plaintext.len()));
        assert_eq!(cipher.decrypt(&blob).unwrap(), plaintext);
    }

    #[test]
    fn test_nonce_is_fresh_per_blob() {
        let cipher = cipher();
        let a = cipher.encrypt(b"same input").unwrap();
        let b = cipher.encrypt(b"same input").unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn test_every_bit_flip_detected() {
        let cipher = cipher();
        let blob = cipher.encrypt(b"tamper me").unwrap();

        for byte in 0..blob.len() {
            for bit in 0..8 {
                let mut tampered = blob.clone();
                tampered[byte] ^= 1 << bit;
                let result = cipher.decrypt(&tampered);
                assert!(
                    matches!(result, Err(CryptoError::Decryption(_))),
                    "flip at byte {byte} bit {bit} was not detected"
                );
            }
        }
    }

    #[test]
    fn test_wrong_key_fails() {
        let blob = cipher().encrypt(b"secret data").unwrap();
        let result = cipher().decrypt(&blob);
        assert!(result.unwrap_err().is_integrity_failure());
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::truncated(vec![BLOB_VERSION; MIN_BLOB_SIZE - 1])]
    #[case::garbage(b"this is definitely not a ciphertext blob".to_vec())]
    fn test_malformed_input_fails(#[case] input: Vec<u8>) {
        assert!(matches!(cipher().decrypt(&input), Err(CryptoError::Decryption(_))));
    }

    #[test]
    fn test_unknown_version_fails() {
        let cipher = cipher();
        let mut blob = cipher.encrypt(b"data").unwrap();
        blob[0] = 9;
        let err = cipher.decrypt(&blob).unwrap_err();
        assert!(err.to_string().contains("unsupported blob version"));
    }

    #[test]
    fn test_from_secret_is_stable() {
        let a = Cipher::from_secret(b"server secret", &KdfSalt::Legacy).unwrap();
        let b = Cipher::from_secret(b"server secret", &KdfSalt::Legacy).unwrap();
        let blob = a.encrypt(b"persisted across restarts").unwrap();
        assert_eq!(b.decrypt(&blob).unwrap(), b"persisted across restarts");
    }

    #[test]
    fn test_nonce_from_bytes() {
        let nonce = Nonce::generate();
        assert_eq!(Nonce::from_bytes(nonce.as_bytes()).unwrap(), nonce);
        assert!(Nonce::from_bytes(&[0u8; 8]).is_err());
    }

    proptest! {
        #[test]
        fn prop_roundtrip(data in proptest::collection::vec(any::<u8>(), 0..4096)) {
            let cipher = Cipher::new(&SecretKey::from_bytes(&[7u8; 32]).unwrap());
            let blob = cipher.encrypt(&data).unwrap();
            prop_assert_eq!(cipher.decrypt(&blob).unwrap(), data);
        }
    }
}
