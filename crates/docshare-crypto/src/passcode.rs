//! Passcode hashing
//!
//! Passcodes are stored as Argon2id PHC strings with a random per-hash salt.
//! Verification goes through the PHC verifier, which compares digests in
//! constant time.

use crate::{CryptoError, Result};
use argon2::password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use argon2::Argon2;

/// Hash a passcode for storage
pub fn hash_passcode(passcode: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(passcode.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| CryptoError::PasscodeHash(e.to_string()))
}

/// Verify a candidate passcode against a stored hash.
///
/// A malformed stored hash never matches.
pub fn verify_passcode(passcode: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(passcode.as_bytes(), &parsed)
        .is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_and_verify() {
        let hash = hash_passcode("1234").unwrap();
        assert!(verify_passcode("1234", &hash));
        assert!(!verify_passcode("wrong", &hash));
        assert!(!verify_passcode("", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let a = hash_passcode("1234").unwrap();
        let b = hash_passcode("1234").unwrap();
        assert_ne!(a, b);
        assert!(!a.contains("1234"));
        assert!(a.starts_with("$argon2id$"));
    }

    #[test]
    fn test_malformed_hash_never_matches() {
        assert!(!verify_passcode("1234", "1234"));
        assert!(!verify_passcode("1234", ""));
    }

    #[test]
    fn test_empty_passcode_hashes() {
        let hash = hash_passcode("").unwrap();
        assert!(verify_passcode("", &hash));
    }
}
