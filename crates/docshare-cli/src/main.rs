//! Docshare Gateway - passcode-protected document sharing

use clap::{Parser, ValueEnum};
use docshare_cli::config::parse_origins;
use docshare_cli::{run_server, GatewayConfig};
use docshare_storage::{BackendKind, S3Config, StorageConfig, DEFAULT_MAX_FILE_SIZE};
use std::path::PathBuf;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Clone, Copy, Debug, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "docshare-gateway")]
#[command(about = "Share encrypted documents behind a passcode, expiring after a fixed time")]
#[command(version)]
struct Args {
    /// Host to bind to
    #[arg(short = 'H', long, default_value = "0.0.0.0", env = "DOCSHARE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8000", env = "DOCSHARE_PORT")]
    port: u16,

    /// SQLite database URL
    #[arg(long, default_value = docshare_core::DEFAULT_DATABASE_URL, env = "DATABASE_URL")]
    database_url: String,

    /// Base secret for blob encryption keys
    #[arg(long, env = "ENCRYPTION_KEY", hide_env_values = true)]
    encryption_key: Option<String>,

    /// Per-deployment key derivation salt, hex encoded (at least 8 bytes)
    #[arg(long, env = "ENCRYPTION_SALT")]
    encryption_salt: Option<String>,

    /// Directory for local blob storage
    #[arg(long, default_value = "storage", env = "STORAGE_DIR")]
    storage_dir: PathBuf,

    /// Maximum upload size in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_FILE_SIZE, env = "MAX_FILE_SIZE")]
    max_file_size: usize,

    /// Store blobs in S3 instead of the local directory
    #[arg(long, env = "USE_S3")]
    use_s3: bool,

    /// Use in-memory blob storage (for testing, data will not persist)
    #[arg(long, env = "DOCSHARE_MEMORY_STORE", conflicts_with = "use_s3")]
    memory_store: bool,

    /// S3 bucket name
    #[arg(long, env = "S3_BUCKET_NAME")]
    s3_bucket_name: Option<String>,

    /// S3 region
    #[arg(long, default_value = docshare_storage::s3::DEFAULT_REGION, env = "S3_REGION")]
    s3_region: String,

    /// Static AWS access key id
    #[arg(long, env = "AWS_ACCESS_KEY_ID")]
    aws_access_key_id: Option<String>,

    /// Static AWS secret access key
    #[arg(long, env = "AWS_SECRET_ACCESS_KEY", hide_env_values = true)]
    aws_secret_access_key: Option<String>,

    /// Endpoint override for S3-compatible services (MinIO, LocalStack)
    #[arg(long, env = "S3_ENDPOINT_URL")]
    s3_endpoint_url: Option<String>,

    /// Hours until an uploaded document expires
    #[arg(long, default_value_t = docshare_core::DEFAULT_TTL_HOURS, env = "DOCUMENT_TTL_HOURS")]
    document_ttl_hours: i64,

    /// Allowed CORS origins, comma separated
    #[arg(
        long,
        default_value = "http://localhost:3000,http://127.0.0.1:3000",
        env = "CORS_ORIGINS"
    )]
    cors_origins: String,

    /// Seconds between expired document purges (0 disables)
    #[arg(long, default_value_t = 0, env = "REAP_INTERVAL_SECS")]
    reap_interval_secs: u64,

    /// Enable debug logging
    #[arg(short, long, env = "DOCSHARE_DEBUG")]
    debug: bool,

    /// Log output format
    #[arg(long, value_enum, default_value = "text", env = "DOCSHARE_LOG_FORMAT")]
    log_format: LogFormat,
}

impl Args {
    fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let backend = if self.use_s3 {
            BackendKind::S3
        } else if self.memory_store {
            BackendKind::Memory
        } else {
            BackendKind::Local
        };

        let s3 = self.use_s3.then(|| S3Config {
            bucket: self.s3_bucket_name.clone().unwrap_or_default(),
            region: self.s3_region.clone(),
            access_key_id: self.aws_access_key_id.clone(),
            secret_access_key: self.aws_secret_access_key.clone(),
            endpoint_url: self.s3_endpoint_url.clone(),
        });

        let config = GatewayConfig {
            host: self.host,
            port: self.port,
            database_url: self.database_url,
            encryption_key: self.encryption_key.filter(|k| !k.is_empty()),
            encryption_salt: self.encryption_salt,
            storage: StorageConfig {
                backend,
                storage_dir: self.storage_dir,
                max_file_size: self.max_file_size,
                s3,
            },
            document_ttl_hours: self.document_ttl_hours,
            cors_origins: parse_origins(&self.cors_origins),
            reap_interval_secs: self.reap_interval_secs,
        };
        config.ttl()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    // Parse arguments
    let args = Args::parse();

    // Setup logging
    let log_level = if args.debug { "debug" } else { "info" };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        format!(
            "docshare_cli={0},docshare_core={0},docshare_storage={0},tower_http=debug",
            log_level
        )
        .into()
    });
    let registry = tracing_subscriber::registry().with(filter);
    match args.log_format {
        LogFormat::Json => registry.with(tracing_subscriber::fmt::layer().json()).init(),
        LogFormat::Text => registry.with(tracing_subscriber::fmt::layer()).init(),
    }

    let config = args.into_config()?;

    tracing::info!("Starting Docshare Gateway on {}", config.bind_addr());
    tracing::info!(
        backend = %config.storage.backend,
        max_file_size = config.storage.max_file_size,
        ttl_hours = config.document_ttl_hours,
        "Storage configuration"
    );

    // Run the server
    run_server(config).await
}
