//! Application state

use crate::config::GatewayConfig;
use docshare_core::{DocumentService, DocumentStore};
use docshare_crypto::{Cipher, SecretKey};
use docshare_storage::{select_backend, BackendKind};
use std::sync::Arc;
use tracing::{info, warn};

/// Application state shared across handlers
pub struct AppState {
    /// Gateway configuration
    pub config: GatewayConfig,
    /// Document operations over the selected backend
    pub service: DocumentService,
}

impl AppState {
    /// Build the cipher, record store, and backend from configuration.
    ///
    /// Fails if the selected backend cannot be initialized; there is no
    /// fallback to another backend.
    pub async fn new(config: GatewayConfig) -> anyhow::Result<Self> {
        let ttl = config.ttl()?;
        if config.uses_dev_key() {
            warn!("ENCRYPTION_KEY is not set - using the development key, do NOT use in production");
        }
        let salt = config.kdf_salt()?;
        if salt.is_legacy() {
            warn!("ENCRYPTION_SALT is not set - using the legacy fixed key derivation salt");
        }

        let secret = config.encryption_secret().as_bytes().to_vec();
        let key = tokio::task::spawn_blocking(move || SecretKey::derive(&secret, &salt)).await??;
        let cipher = Arc::new(Cipher::new(&key));

        let store = DocumentStore::connect(&config.database_url).await?;
        let backend = select_backend(&config.storage, cipher).await?;

        if backend.kind().is_persistent() {
            info!("Storage mode: {} (persistent)", backend.kind());
        } else {
            warn!("Storage mode: {} (NOT persistent - for development only)", backend.kind());
        }

        let service = DocumentService::new(store, Arc::new(backend)).with_ttl(ttl);
        Ok(Self::from_parts(config, service))
    }

    /// Assemble state from an already-built service
    pub fn from_parts(config: GatewayConfig, service: DocumentService) -> Self {
        Self { config, service }
    }

    /// Which backend serves blobs
    pub fn backend_kind(&self) -> BackendKind {
        self.service.blobs().kind()
    }
}
