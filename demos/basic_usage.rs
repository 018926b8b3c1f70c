//! Basic usage example for the docshare document service
//!
//! This example demonstrates:
//! - Uploading a document behind a passcode
//! - Checking access and downloading
//! - What expired documents and wrong passcodes look like
//! - Deleting a document
//!
//! Run with: cargo run --example basic_usage

use bytes::Bytes;
use chrono::{Duration, Utc};
use docshare_core::{CoreError, DocumentService, DocumentStore, UploadRequest};
use docshare_crypto::{Cipher, KdfSalt, SecretKey};
use docshare_storage::{select_backend, StorageConfig};
use std::sync::Arc;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::fmt::init();

    println!("Docshare - Basic Usage Example\n");

    // Derive the blob key from a server secret and a per-deployment salt
    let salt = KdfSalt::custom(b"example-deployment".to_vec())?;
    let key = SecretKey::derive(b"example-server-secret", &salt)?;
    let cipher = Arc::new(Cipher::new(&key));

    // Local blob storage in a scratch directory, records in memory
    let scratch = tempfile::TempDir::new()?;
    let storage = StorageConfig {
        storage_dir: scratch.path().join("blobs"),
        ..Default::default()
    };
    let backend = select_backend(&storage, cipher).await?;
    let store = DocumentStore::in_memory().await?;
    let service = DocumentService::new(store, Arc::new(backend));

    // ==================== Upload ====================

    println!("Uploading 'hello.txt' with passcode 'open-sesame'...");
    let receipt = service
        .upload(UploadRequest {
            content: Bytes::from_static(b"Hello, World! This file is encrypted at rest."),
            passcode: "open-sesame".to_string(),
            filename: "hello.txt".to_string(),
            mime_type: Some("text/plain".to_string()),
        })
        .await?;
    println!("   share link: {}", receipt.link);
    println!("   expires at: {}", receipt.expires_at);

    let id = receipt.id.to_string();

    // ==================== Access ====================

    let info = service.check_access(&id, "open-sesame").await?;
    println!("\nAccess granted: {} ({} bytes)", info.filename, info.file_size);

    match service.check_access(&id, "guess").await {
        Err(CoreError::InvalidPasscode) => println!("   wrong passcode refused"),
        other => println!("   unexpected: {:?}", other.map(|i| i.filename)),
    }

    let download = service.download(&id, "open-sesame").await?;
    println!(
        "\nDownloaded: {}",
        String::from_utf8_lossy(&download.content)
    );

    // ==================== Expiry ====================

    service
        .store()
        .set_expires_at(&receipt.id, Utc::now() - Duration::seconds(1))
        .await?;
    match service.download(&id, "open-sesame").await {
        Err(CoreError::Expired(_)) => println!("\nAfter expiry the document is gone (410)"),
        other => println!("\nUnexpected: {:?}", other.map(|d| d.info)),
    }

    // ==================== Delete ====================

    service.delete(&id, "open-sesame").await?;
    println!("Deleted; {} records remain", service.store().count().await?);

    Ok(())
}
