//! Upload, access, download, and delete orchestration

use crate::access::{verify_access, verify_owner, AccessDecision};
use crate::{
    CoreError, Document, DocumentInfo, DocumentStore, Download, Result, UploadReceipt,
    UploadRequest,
};
use chrono::{DateTime, Duration, Utc};
use docshare_crypto::hash_passcode;
use docshare_storage::{Backend, BlobStore, StorageHealth};
use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;

/// Default lifetime of an uploaded document
pub const DEFAULT_TTL_HOURS: i64 = 24;

/// Longest accepted document lifetime (100 years)
pub const MAX_TTL_HOURS: i64 = 100 * 365 * 24;

/// Most expired records removed by one purge pass
pub const PURGE_BATCH_SIZE: u32 = 500;

/// Coordinates the record store and the blob backend
pub struct DocumentService<B: BlobStore = Backend> {
    store: DocumentStore,
    blobs: Arc<B>,
    ttl: Duration,
}

impl<B: BlobStore> Clone for DocumentService<B> {
    fn clone(&self) -> Self {
        Self {
            store: self.store.clone(),
            blobs: Arc::clone(&self.blobs),
            ttl: self.ttl,
        }
    }
}

impl<B: BlobStore> DocumentService<B> {
    /// Create a service with the default 24 hour lifetime
    pub fn new(store: DocumentStore, blobs: Arc<B>) -> Self {
        Self {
            store,
            blobs,
            ttl: Duration::hours(DEFAULT_TTL_HOURS),
        }
    }

    /// Override the document lifetime
    #[must_use]
    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// The record store
    pub fn store(&self) -> &DocumentStore {
        &self.store
    }

    /// The blob backend
    pub fn blobs(&self) -> &B {
        &self.blobs
    }

    /// Document lifetime
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Encrypt and store a file, then record it.
    ///
    /// A blob that was written but could not be recorded is removed again
    /// before the error is returned.
    #[instrument(skip(self, request), fields(size = request.content.len()))]
    pub async fn upload(&self, request: UploadRequest) -> Result<UploadReceipt> {
        if request.filename.trim().is_empty() {
            return Err(CoreError::InvalidRequest("filename is required".to_string()));
        }
        if request.passcode.is_empty() {
            return Err(CoreError::InvalidRequest("passcode is required".to_string()));
        }

        let created_at = Utc::now();
        let expires_at = created_at.checked_add_signed(self.ttl).ok_or_else(|| {
            CoreError::InvalidRequest("document lifetime is out of range".to_string())
        })?;

        let id = Uuid::new_v4();
        let encrypted_filename = self.blobs.generate_unique_filename(&request.filename);
        let file_size = self
            .blobs
            .save_encrypted(&request.content, &encrypted_filename)
            .await?;

        let doc = Document {
            id,
            original_filename: request.filename,
            encrypted_filename,
            passcode_hash: String::new(),
            created_at,
            expires_at,
            file_size,
            mime_type: request.mime_type,
        };

        match self.persist(doc, request.passcode).await {
            Ok(doc) => {
                info!(doc_id = %doc.id, size = doc.file_size, "Document uploaded");
                Ok(UploadReceipt {
                    id: doc.id,
                    link: doc.share_link(),
                    expires_at: doc.expires_at,
                    file_size: doc.file_size,
                })
            }
            Err((doc, e)) => {
                if let Err(cleanup) = self.blobs.delete(&doc.encrypted_filename).await {
                    warn!(
                        doc_id = %doc.id,
                        blob = %doc.encrypted_filename,
                        error = %cleanup,
                        "Failed to remove blob after aborted upload"
                    );
                }
                Err(CoreError::UploadFailed(e.to_string()))
            }
        }
    }

    /// Hash the passcode and insert the record
    async fn persist(
        &self,
        mut doc: Document,
        passcode: String,
    ) -> std::result::Result<Document, (Document, CoreError)> {
        let hashed = tokio::task::spawn_blocking(move || hash_passcode(&passcode)).await;
        doc.passcode_hash = match hashed {
            Ok(Ok(hash)) => hash,
            Ok(Err(e)) => return Err((doc, e.into())),
            Err(e) => return Err((doc, e.into())),
        };

        match self.store.insert(&doc).await {
            Ok(()) => Ok(doc),
            Err(e) => Err((doc, e)),
        }
    }

    /// Check a passcode and return the document's metadata
    #[instrument(skip(self, passcode))]
    pub async fn check_access(&self, id: &str, passcode: &str) -> Result<DocumentInfo> {
        let doc = self.authorize(id, passcode, false).await?;
        Ok(doc.info())
    }

    /// Check a passcode and return the decrypted content
    #[instrument(skip(self, passcode))]
    pub async fn download(&self, id: &str, passcode: &str) -> Result<Download> {
        let doc = self.authorize(id, passcode, false).await?;
        let content = self
            .blobs
            .retrieve_decrypted(&doc.encrypted_filename)
            .await
            .map_err(|e| match CoreError::from(e) {
                CoreError::BlobNotFound(_) => CoreError::BlobNotFound(id.to_string()),
                other => other,
            })?;

        Ok(Download {
            content,
            info: doc.info(),
        })
    }

    /// Remove a document's blob and then its record.
    ///
    /// The two steps are not atomic. A blob that is already gone is not an
    /// error; a failed blob delete leaves the record in place.
    #[instrument(skip(self, passcode))]
    pub async fn delete(&self, id: &str, passcode: &str) -> Result<()> {
        let doc = self.authorize(id, passcode, true).await?;

        if !self.blobs.delete(&doc.encrypted_filename).await? {
            warn!(doc_id = %doc.id, "Blob already absent on delete");
        }
        self.store.delete(&doc.id).await?;

        info!(doc_id = %doc.id, "Document deleted");
        Ok(())
    }

    /// Remove every document that expired before `now`, returning how many
    #[instrument(skip(self))]
    pub async fn purge_expired(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut removed = 0;
        for doc in self.store.list_expired(now, PURGE_BATCH_SIZE).await? {
            if let Err(e) = self.blobs.delete(&doc.encrypted_filename).await {
                warn!(doc_id = %doc.id, error = %e, "Failed to remove expired blob");
                continue;
            }
            if self.store.delete(&doc.id).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Load the record and run the access or owner check
    async fn authorize(&self, id: &str, passcode: &str, owner: bool) -> Result<Document> {
        let Ok(uuid) = Uuid::parse_str(id) else {
            return Err(CoreError::NotFound(id.to_string()));
        };
        let record = self.store.get(&uuid).await?;

        let passcode = passcode.to_string();
        let now = Utc::now();
        let (record, decision) = tokio::task::spawn_blocking(move || {
            let decision = if owner {
                verify_owner(record.as_ref(), &passcode)
            } else {
                verify_access(record.as_ref(), &passcode, now)
            };
            (record, decision)
        })
        .await?;

        match (decision, record) {
            (AccessDecision::Granted, Some(doc)) => Ok(doc),
            (decision, _) => {
                info!(doc_id = %id, ?decision, "Access refused");
                decision.into_result(id)?;
                Err(CoreError::NotFound(id.to_string()))
            }
        }
    }
}

impl DocumentService<Backend> {
    /// Backend reachability
    pub async fn health(&self) -> StorageHealth {
        self.blobs.health().await
    }
}
