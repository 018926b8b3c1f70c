//! Passcode and expiry checks for document records
//!
//! Checks run in a fixed order: existence, then expiration, then passcode.
//! An expired document therefore never reveals whether a passcode was right.

use crate::{CoreError, Document, Result};
use chrono::{DateTime, Utc};
use docshare_crypto::verify_passcode;

/// Outcome of an access check
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum AccessDecision {
    Granted,
    Expired,
    InvalidPasscode,
    NotFound,
}

impl AccessDecision {
    /// Whether access was granted
    pub fn is_granted(&self) -> bool {
        matches!(self, Self::Granted)
    }

    /// Turn a refusal into the matching error
    pub fn into_result(self, id: &str) -> Result<()> {
        match self {
            Self::Granted => Ok(()),
            Self::Expired => Err(CoreError::Expired(id.to_string())),
            Self::InvalidPasscode => Err(CoreError::InvalidPasscode),
            Self::NotFound => Err(CoreError::NotFound(id.to_string())),
        }
    }
}

/// Decide whether `passcode` opens `record` at time `now`
pub fn verify_access(record: Option<&Document>, passcode: &str, now: DateTime<Utc>) -> AccessDecision {
    let Some(doc) = record else {
        return AccessDecision::NotFound;
    };
    if doc.is_expired(now) {
        return AccessDecision::Expired;
    }
    check_passcode(doc, passcode)
}

/// Decide whether `passcode` authorizes owner actions (delete) on `record`.
/// Expired records can still be removed by their owner.
pub fn verify_owner(record: Option<&Document>, passcode: &str) -> AccessDecision {
    match record {
        Some(doc) => check_passcode(doc, passcode),
        None => AccessDecision::NotFound,
    }
}

fn check_passcode(doc: &Document, passcode: &str) -> AccessDecision {
    if verify_passcode(passcode, &doc.passcode_hash) {
        AccessDecision::Granted
    } else {
        AccessDecision::InvalidPasscode
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use docshare_crypto::hash_passcode;
    use std::sync::OnceLock;
    use uuid::Uuid;

    fn hash() -> &'static str {
        static HASH: OnceLock<String> = OnceLock::new();
        HASH.get_or_init(|| hash_passcode("s3cret").unwrap())
    }

    fn document(expires_at: DateTime<Utc>) -> Document {
        Document {
            id: Uuid::new_v4(),
            original_filename: "a.txt".to_string(),
            encrypted_filename: "b.txt".to_string(),
            passcode_hash: hash().to_string(),
            created_at: expires_at - Duration::hours(24),
            expires_at,
            file_size: 1,
            mime_type: None,
        }
    }

    #[test]
    fn test_granted() {
        let now = Utc::now();
        let doc = document(now + Duration::hours(1));
        assert_eq!(verify_access(Some(&doc), "s3cret", now), AccessDecision::Granted);
    }

    #[test]
    fn test_missing_record() {
        assert_eq!(verify_access(None, "s3cret", Utc::now()), AccessDecision::NotFound);
        assert_eq!(verify_owner(None, "s3cret"), AccessDecision::NotFound);
    }

    #[test]
    fn test_wrong_passcode() {
        let now = Utc::now();
        let doc = document(now + Duration::hours(1));
        assert_eq!(
            verify_access(Some(&doc), "guess", now),
            AccessDecision::InvalidPasscode
        );
        assert_eq!(verify_access(Some(&doc), "", now), AccessDecision::InvalidPasscode);
    }

    #[test]
    fn test_expired_hides_passcode_result() {
        let now = Utc::now();
        let doc = document(now - Duration::seconds(1));
        assert_eq!(verify_access(Some(&doc), "s3cret", now), AccessDecision::Expired);
        assert_eq!(verify_access(Some(&doc), "guess", now), AccessDecision::Expired);
    }

    #[test]
    fn test_expiry_boundary_is_inclusive() {
        let now = Utc::now();
        let doc = document(now);
        assert_eq!(verify_access(Some(&doc), "s3cret", now), AccessDecision::Granted);
    }

    #[test]
    fn test_owner_ignores_expiry() {
        let now = Utc::now();
        let doc = document(now - Duration::days(3));
        assert_eq!(verify_owner(Some(&doc), "s3cret"), AccessDecision::Granted);
        assert_eq!(verify_owner(Some(&doc), "nope"), AccessDecision::InvalidPasscode);
    }

    #[test]
    fn test_into_result() {
        assert!(AccessDecision::Granted.into_result("x").is_ok());
        assert!(matches!(
            AccessDecision::Expired.into_result("x"),
            Err(CoreError::Expired(_))
        ));
        assert!(matches!(
            AccessDecision::InvalidPasscode.into_result("x"),
            Err(CoreError::InvalidPasscode)
        ));
        assert!(matches!(
            AccessDecision::NotFound.into_result("x"),
            Err(CoreError::NotFound(_))
        ));
    }
}
