//! # Docshare Gateway
//!
//! HTTP gateway for passcode-protected, time-limited document sharing.
//!
//! This crate provides:
//! - **Document API**: Upload, access check, download, and delete under `/api`
//! - **Health**: Backend reachability, including an S3 bucket probe
//! - **Lifecycle**: Startup wiring, graceful shutdown, and an optional expiry reaper
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                   HTTP Clients                      │
//! │              (browser frontend, curl)               │
//! └─────────────────────────┬───────────────────────────┘
//!                           │
//! ┌─────────────────────────▼───────────────────────────┐
//! │                  Docshare Gateway                   │
//! ├─────────────────────────────────────────────────────┤
//! │     Request ID │ Access Log │ CORS │ Body Limit     │
//! ├─────────────────────────────────────────────────────┤
//! │                 Document Handlers                   │
//! ├─────────────────────────────────────────────────────┤
//! │                   docshare-core                     │
//! │        (records, access control, orchestration)     │
//! ├─────────────────────────────────────────────────────┤
//! │                  docshare-storage                   │
//! │              (Local, S3, Memory blobs)              │
//! └─────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::GatewayConfig;
pub use error::{ApiError, ErrorCode};
pub use routes::create_router;
pub use server::{run_server, run_server_with_shutdown};
pub use state::AppState;
