//! # Docshare Core
//!
//! Document records and the operations that tie them to encrypted blobs.
//!
//! This crate provides:
//! - **Records**: SQLite-backed document metadata with expiry
//! - **Access control**: Existence, expiry, and passcode checks in fixed order
//! - **Orchestration**: Upload, access, download, delete, and expiry purge
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │             HTTP Gateway                │
//! ├─────────────────────────────────────────┤
//! │           DocumentService               │
//! ├────────────────────┬────────────────────┤
//! │   DocumentStore    │     BlobStore      │
//! │  (SQLite records)  │ (encrypted blobs)  │
//! └────────────────────┴────────────────────┘
//! ```

pub mod access;
pub mod document;
pub mod error;
pub mod service;
pub mod store;

pub use access::{verify_access, verify_owner, AccessDecision};
pub use document::{Document, DocumentInfo, Download, UploadReceipt, UploadRequest};
pub use error::{CoreError, Result};
pub use service::{DocumentService, DEFAULT_TTL_HOURS, MAX_TTL_HOURS};
pub use store::{DocumentStore, DEFAULT_DATABASE_URL};
