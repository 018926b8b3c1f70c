//! Document record and the views of it handed to callers

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Metadata for one shared document. Never updated after insert.
#[derive(Clone, Debug, Serialize)]
pub struct Document {
    /// Public identifier, used in share links
    pub id: Uuid,
    /// Filename as supplied by the uploader
    pub original_filename: String,
    /// Storage name of the encrypted blob
    pub encrypted_filename: String,
    /// Argon2 PHC string of the passcode
    #[serde(skip_serializing)]
    pub passcode_hash: String,
    /// Upload time
    pub created_at: DateTime<Utc>,
    /// After this instant the document is no longer served
    pub expires_at: DateTime<Utc>,
    /// Plaintext size in bytes
    pub file_size: u64,
    /// Declared content type
    pub mime_type: Option<String>,
}

impl Document {
    /// Whether the document has expired as of `now`
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }

    /// Relative share link for the viewer page
    pub fn share_link(&self) -> String {
        share_link(&self.id)
    }

    /// The subset of metadata shown after a successful access check
    pub fn info(&self) -> DocumentInfo {
        DocumentInfo {
            filename: self.original_filename.clone(),
            mime_type: self.mime_type.clone(),
            file_size: self.file_size,
        }
    }
}

/// Relative share link for a document id
pub fn share_link(id: &Uuid) -> String {
    format!("/view/{id}")
}

/// Metadata revealed to a caller holding the right passcode
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub filename: String,
    pub mime_type: Option<String>,
    pub file_size: u64,
}

/// Input to an upload
#[derive(Clone, Debug)]
pub struct UploadRequest {
    pub content: bytes::Bytes,
    pub passcode: String,
    pub filename: String,
    pub mime_type: Option<String>,
}

/// Result of a successful upload
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UploadReceipt {
    pub id: Uuid,
    pub link: String,
    pub expires_at: DateTime<Utc>,
    pub file_size: u64,
}

/// Decrypted content plus its metadata
#[derive(Clone, Debug)]
pub struct Download {
    pub content: Vec<u8>,
    pub info: DocumentInfo,
}
