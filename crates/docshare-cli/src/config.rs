//! Gateway configuration

use docshare_core::{DEFAULT_DATABASE_URL, DEFAULT_TTL_HOURS, MAX_TTL_HOURS};
use docshare_crypto::KdfSalt;
use docshare_storage::StorageConfig;
use serde::{Deserialize, Serialize};

/// Secret used when `ENCRYPTION_KEY` is unset. Development only.
pub const DEV_ENCRYPTION_KEY: &str = "your-secret-key-32-chars-long!!";

/// Allowance for multipart framing on top of the file size ceiling
pub const MULTIPART_OVERHEAD: usize = 1024 * 1024;

/// Gateway server configuration
#[derive(Clone, Serialize, Deserialize)]
pub struct GatewayConfig {
    /// Host to bind to
    pub host: String,
    /// Port to listen on
    pub port: u16,
    /// SQLite database URL
    pub database_url: String,
    /// Base secret for blob key derivation
    #[serde(skip_serializing)]
    pub encryption_key: Option<String>,
    /// Per-deployment key derivation salt (hex)
    pub encryption_salt: Option<String>,
    /// Blob backend settings
    pub storage: StorageConfig,
    /// Hours until an upload expires
    pub document_ttl_hours: i64,
    /// CORS allowed origins
    pub cors_origins: Vec<String>,
    /// Expired document reaper period in seconds (0 disables it)
    pub reap_interval_secs: u64,
}

impl std::fmt::Debug for GatewayConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GatewayConfig")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("database_url", &self.database_url)
            .field("encryption_key", &self.encryption_key.as_ref().map(|_| "[REDACTED]"))
            .field("encryption_salt", &self.encryption_salt)
            .field("storage", &self.storage)
            .field("document_ttl_hours", &self.document_ttl_hours)
            .field("cors_origins", &self.cors_origins)
            .field("reap_interval_secs", &self.reap_interval_secs)
            .finish()
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8000,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            encryption_key: None,
            encryption_salt: None,
            storage: StorageConfig::default(),
            document_ttl_hours: DEFAULT_TTL_HOURS,
            cors_origins: vec![
                "http://localhost:3000".to_string(),
                "http://127.0.0.1:3000".to_string(),
            ],
            reap_interval_secs: 0,
        }
    }
}

impl GatewayConfig {
    /// Get the bind address
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Maximum request body size (file ceiling plus multipart framing)
    pub fn body_limit(&self) -> usize {
        self.storage.max_file_size.saturating_add(MULTIPART_OVERHEAD)
    }

    /// Document lifetime, between one hour and `MAX_TTL_HOURS`
    pub fn ttl(&self) -> anyhow::Result<chrono::Duration> {
        anyhow::ensure!(
            (1..=MAX_TTL_HOURS).contains(&self.document_ttl_hours),
            "DOCUMENT_TTL_HOURS must be between 1 and {MAX_TTL_HOURS}, got {}",
            self.document_ttl_hours
        );
        Ok(chrono::Duration::hours(self.document_ttl_hours))
    }

    /// The blob key derivation secret, falling back to the development key
    pub fn encryption_secret(&self) -> &str {
        self.encryption_key.as_deref().unwrap_or(DEV_ENCRYPTION_KEY)
    }

    /// Whether the development key is in use
    pub fn uses_dev_key(&self) -> bool {
        self.encryption_key.is_none()
    }

    /// The key derivation salt
    pub fn kdf_salt(&self) -> docshare_crypto::Result<KdfSalt> {
        match self.encryption_salt.as_deref() {
            Some(hex) if !hex.trim().is_empty() => KdfSalt::from_hex(hex),
            _ => Ok(KdfSalt::Legacy),
        }
    }
}

/// Split a comma-separated origin list
pub fn parse_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
