//! Security properties of stored documents
//!
//! Checks what an attacker with read access to the blob directory or the
//! record database can and cannot learn, and that stored blobs resist tampering.

use bytes::Bytes;
use docshare_core::{CoreError, DocumentService, DocumentStore, UploadRequest};
use docshare_crypto::{Cipher, SecretKey};
use docshare_storage::{select_backend, StorageConfig};
use std::sync::Arc;
use tempfile::TempDir;

const PLAINTEXT: &[u8] = b"TOP-SECRET quarterly numbers: 42, 17, 99";
const PASSCODE: &str = "correct horse battery staple";

async fn setup() -> (TempDir, DocumentService, uuid::Uuid) {
    let dir = TempDir::new().unwrap();
    let storage = StorageConfig {
        storage_dir: dir.path().join("blobs"),
        ..Default::default()
    };
    let cipher = Arc::new(Cipher::new(&SecretKey::generate()));
    let backend = select_backend(&storage, cipher).await.unwrap();
    let url = format!("sqlite://{}", dir.path().join("documents.db").display());
    let service = DocumentService::new(DocumentStore::connect(&url).await.unwrap(), Arc::new(backend));

    let receipt = service
        .upload(UploadRequest {
            content: Bytes::from_static(PLAINTEXT),
            passcode: PASSCODE.to_string(),
            filename: "../../etc/quarterly report.xlsx".to_string(),
            mime_type: None,
        })
        .await
        .unwrap();

    (dir, service, receipt.id)
}

fn blob_paths(dir: &TempDir) -> Vec<std::path::PathBuf> {
    std::fs::read_dir(dir.path().join("blobs"))
        .unwrap()
        .map(|e| e.unwrap().path())
        .collect()
}

fn contains(haystack: &[u8], needle: &[u8]) -> bool {
    haystack.windows(needle.len()).any(|w| w == needle)
}

#[tokio::test]
async fn test_blob_at_rest_is_ciphertext() {
    let (dir, _service, _id) = setup().await;
    let paths = blob_paths(&dir);
    assert_eq!(paths.len(), 1);

    let raw = std::fs::read(&paths[0]).unwrap();
    assert!(!contains(&raw, b"TOP-SECRET"));
    assert!(raw.len() > PLAINTEXT.len());
}

#[tokio::test]
async fn test_storage_name_does_not_echo_user_path() {
    let (dir, service, id) = setup().await;
    let doc = service.store().get(&id).await.unwrap().unwrap();

    assert!(!doc.encrypted_filename.contains(".."));
    assert!(!doc.encrypted_filename.contains('/'));
    assert!(!doc.encrypted_filename.contains("quarterly"));
    assert!(doc.encrypted_filename.ends_with(".xlsx"));
    assert_eq!(doc.original_filename, "../../etc/quarterly report.xlsx");

    // The blob landed inside the storage directory
    assert_eq!(blob_paths(&dir)[0].file_name().unwrap(), doc.encrypted_filename.as_str());
}

#[tokio::test]
async fn test_passcode_never_stored_in_clear() {
    let (dir, service, id) = setup().await;
    let doc = service.store().get(&id).await.unwrap().unwrap();
    assert!(doc.passcode_hash.starts_with("$argon2"));
    assert!(!doc.passcode_hash.contains(PASSCODE));

    service.store().close().await;
    for entry in std::fs::read_dir(dir.path()).unwrap() {
        let path = entry.unwrap().path();
        if path.is_file() {
            let bytes = std::fs::read(&path).unwrap();
            assert!(!contains(&bytes, PASSCODE.as_bytes()), "passcode found in {}", path.display());
        }
    }
}

#[tokio::test]
async fn test_tampered_blob_is_never_served() {
    let (dir, service, id) = setup().await;
    let path = blob_paths(&dir).remove(0);
    let original = std::fs::read(&path).unwrap();

    for index in [0, 1, 13, original.len() / 2, original.len() - 1] {
        let mut tampered = original.clone();
        tampered[index] ^= 0x80;
        std::fs::write(&path, &tampered).unwrap();

        let result = service.download(&id.to_string(), PASSCODE).await;
        assert!(
            matches!(result, Err(CoreError::Decryption(_))),
            "tampering at byte {index} was not detected"
        );
    }

    std::fs::write(&path, &original).unwrap();
    let download = service.download(&id.to_string(), PASSCODE).await.unwrap();
    assert_eq!(download.content, PLAINTEXT);
}

#[tokio::test]
async fn test_truncated_blob_is_never_served() {
    let (dir, service, id) = setup().await;
    let path = blob_paths(&dir).remove(0);
    let original = std::fs::read(&path).unwrap();
    std::fs::write(&path, &original[..original.len() - 1]).unwrap();

    let result = service.download(&id.to_string(), PASSCODE).await;
    assert!(matches!(result, Err(CoreError::Decryption(_))));
}

#[tokio::test]
async fn test_wrong_passcode_reveals_no_metadata() {
    let (_dir, service, id) = setup().await;
    let err = service.check_access(&id.to_string(), "guess").await.unwrap_err();
    let message = err.to_string();
    assert!(!message.contains("quarterly"));
    assert!(!message.contains("argon2"));
}

#[tokio::test]
async fn test_delete_requires_passcode() {
    let (dir, service, id) = setup().await;
    assert!(matches!(
        service.delete(&id.to_string(), "guess").await,
        Err(CoreError::InvalidPasscode)
    ));
    assert_eq!(blob_paths(&dir).len(), 1);
    assert!(service.store().get(&id).await.unwrap().is_some());
}
