//! # Docshare Crypto
//!
//! Cryptographic primitives for the docshare document sharing service.
//!
//! This crate provides:
//! - **Key derivation**: A single 256-bit key derived from the configured
//!   server secret with Argon2id
//! - **Blob encryption**: AES-256-GCM with a fresh nonce per blob, so any
//!   tampering is detected on decryption
//! - **Passcode hashing**: Salted Argon2id PHC strings with constant-time
//!   verification
//!
//! ## Security Model
//!
//! - Blobs at rest are always ciphertext; the key never leaves the process
//! - Passcodes are never stored in clear
//! - The legacy fixed KDF salt is supported for parity with existing
//!   deployments; new deployments should configure their own salt
//!
//! ## Example
//!
//! ```rust,ignore
//! use docshare_crypto::{Cipher, KdfSalt};
//!
//! let cipher = Cipher::from_secret(b"server secret", &KdfSalt::Legacy)?;
//! let blob = cipher.encrypt(b"Hello, World!")?;
//! assert_eq!(cipher.decrypt(&blob)?, b"Hello, World!");
//! ```

pub mod error;
pub mod keys;
pub mod passcode;
pub mod symmetric;

pub use error::{CryptoError, Result};
pub use keys::{KdfSalt, SecretKey};
pub use passcode::{hash_passcode, verify_passcode};
pub use symmetric::{Cipher, Nonce};

/// The version byte written at the start of every encrypted blob
pub const BLOB_VERSION: u8 = 1;
