//! SQLite-backed document record store

use crate::{CoreError, Document, Result};
use chrono::{DateTime, Utc};
use sqlx::sqlite::{
    SqliteConnectOptions, SqliteJournalMode, SqlitePool, SqlitePoolOptions, SqliteSynchronous,
};
use std::str::FromStr;
use std::time::Duration;
use tracing::{debug, instrument};
use uuid::Uuid;

/// Default database location, relative to the working directory
pub const DEFAULT_DATABASE_URL: &str = "sqlite://documents.db";

/// Persistent store of document records, keyed by id
#[derive(Clone, Debug)]
pub struct DocumentStore {
    pool: SqlitePool,
}

#[derive(sqlx::FromRow)]
struct DocumentRow {
    id: String,
    original_filename: String,
    encrypted_filename: String,
    passcode_hash: String,
    created_at: DateTime<Utc>,
    expires_at: DateTime<Utc>,
    file_size: i64,
    mime_type: Option<String>,
}

impl TryFrom<DocumentRow> for Document {
    type Error = CoreError;

    fn try_from(row: DocumentRow) -> Result<Self> {
        let id = Uuid::parse_str(&row.id)
            .map_err(|e| sqlx::Error::Decode(format!("invalid document id {}: {e}", row.id).into()))?;
        let file_size = u64::try_from(row.file_size)
            .map_err(|e| sqlx::Error::Decode(format!("invalid file size: {e}").into()))?;

        Ok(Document {
            id,
            original_filename: row.original_filename,
            encrypted_filename: row.encrypted_filename,
            passcode_hash: row.passcode_hash,
            created_at: row.created_at,
            expires_at: row.expires_at,
            file_size,
            mime_type: row.mime_type,
        })
    }
}

impl DocumentStore {
    /// Open (creating if missing) the database at `url` and run migrations
    pub async fn connect(url: &str) -> Result<Self> {
        let opts = SqliteConnectOptions::from_str(url)?
            .create_if_missing(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let pool = SqlitePoolOptions::new()
            .max_connections(8)
            .acquire_timeout(Duration::from_secs(10))
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        debug!(url = %url, "Document store ready");
        Ok(store)
    }

    /// A private in-memory database, lost when the store is dropped
    pub async fn in_memory() -> Result<Self> {
        let opts = SqliteConnectOptions::from_str("sqlite::memory:")?;

        // Every connection to :memory: is a separate database, so the pool
        // must hold exactly one connection for its whole life.
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .min_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?;

        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    /// Create the documents table and its indexes if they do not exist
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(
            "
            CREATE TABLE IF NOT EXISTS documents (
                id                 TEXT PRIMARY KEY,
                original_filename  TEXT NOT NULL,
                encrypted_filename TEXT NOT NULL UNIQUE,
                passcode_hash      TEXT NOT NULL,
                created_at         TEXT NOT NULL,
                expires_at         TEXT NOT NULL,
                file_size          INTEGER NOT NULL,
                mime_type          TEXT
            )
            ",
        )
        .execute(&self.pool)
        .await?;

        sqlx::query("CREATE INDEX IF NOT EXISTS idx_documents_expires_at ON documents (expires_at)")
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    /// Insert a new record. Fails if the id or storage name already exists.
    #[instrument(skip(self, doc), fields(doc_id = %doc.id))]
    pub async fn insert(&self, doc: &Document) -> Result<()> {
        let file_size = i64::try_from(doc.file_size)
            .map_err(|e| sqlx::Error::Encode(format!("file size out of range: {e}").into()))?;

        sqlx::query(
            "INSERT INTO documents
                (id, original_filename, encrypted_filename, passcode_hash,
                 created_at, expires_at, file_size, mime_type)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?)",
        )
        .bind(doc.id.to_string())
        .bind(&doc.original_filename)
        .bind(&doc.encrypted_filename)
        .bind(&doc.passcode_hash)
        .bind(doc.created_at)
        .bind(doc.expires_at)
        .bind(file_size)
        .bind(&doc.mime_type)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    /// Fetch a record by id
    pub async fn get(&self, id: &Uuid) -> Result<Option<Document>> {
        let row = sqlx::query_as::<_, DocumentRow>("SELECT * FROM documents WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&self.pool)
            .await?;

        row.map(Document::try_from).transpose()
    }

    /// Remove a record, returning whether it existed
    pub async fn delete(&self, id: &Uuid) -> Result<bool> {
        let result = sqlx::query("DELETE FROM documents WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Records whose expiration time is before `now`, oldest first
    pub async fn list_expired(&self, now: DateTime<Utc>, limit: u32) -> Result<Vec<Document>> {
        let rows = sqlx::query_as::<_, DocumentRow>(
            "SELECT * FROM documents WHERE expires_at < ? ORDER BY expires_at ASC LIMIT ?",
        )
        .bind(now)
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Document::try_from).collect()
    }

    /// Move a record's expiration time. Returns whether the record exists.
    pub async fn set_expires_at(&self, id: &Uuid, expires_at: DateTime<Utc>) -> Result<bool> {
        let result = sqlx::query("UPDATE documents SET expires_at = ? WHERE id = ?")
            .bind(expires_at)
            .bind(id.to_string())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    /// Number of stored records
    pub async fn count(&self) -> Result<u64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM documents")
            .fetch_one(&self.pool)
            .await?;

        #[allow(clippy::cast_sign_loss)]
        Ok(count as u64)
    }

    /// Close the pool. Later operations fail with a database error.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration as ChronoDuration;
    use tempfile::TempDir;

    fn document(expires_at: DateTime<Utc>) -> Document {
        let id = Uuid::new_v4();
        Document {
            id,
            original_filename: "notes.txt".to_string(),
            encrypted_filename: format!("{id}.txt"),
            passcode_hash: "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            created_at: expires_at - ChronoDuration::hours(24),
            expires_at,
            file_size: 11,
            mime_type: Some("text/plain".to_string()),
        }
    }

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = DocumentStore::in_memory().await.unwrap();
        let doc = document(Utc::now() + ChronoDuration::hours(24));
        store.insert(&doc).await.unwrap();

        let loaded = store.get(&doc.id).await.unwrap().unwrap();
        assert_eq!(loaded.id, doc.id);
        assert_eq!(loaded.original_filename, "notes.txt");
        assert_eq!(loaded.encrypted_filename, doc.encrypted_filename);
        assert_eq!(loaded.passcode_hash, doc.passcode_hash);
        assert_eq!(loaded.expires_at, doc.expires_at);
        assert_eq!(loaded.created_at, doc.created_at);
        assert_eq!(loaded.file_size, 11);
        assert_eq!(loaded.mime_type.as_deref(), Some("text/plain"));
        assert_eq!(store.count().await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_get_missing() {
        let store = DocumentStore::in_memory().await.unwrap();
        assert!(store.get(&Uuid::new_v4()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_duplicate_id_rejected() {
        let store = DocumentStore::in_memory().await.unwrap();
        let doc = document(Utc::now());
        store.insert(&doc).await.unwrap();
        assert!(matches!(store.insert(&doc).await, Err(CoreError::Database(_))));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = DocumentStore::in_memory().await.unwrap();
        let doc = document(Utc::now());
        store.insert(&doc).await.unwrap();

        assert!(store.delete(&doc.id).await.unwrap());
        assert!(!store.delete(&doc.id).await.unwrap());
        assert_eq!(store.count().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_list_expired() {
        let store = DocumentStore::in_memory().await.unwrap();
        let now = Utc::now();
        let old = document(now - ChronoDuration::hours(2));
        let older = document(now - ChronoDuration::hours(5));
        let live = document(now + ChronoDuration::hours(1));
        for doc in [&old, &older, &live] {
            store.insert(doc).await.unwrap();
        }

        let expired = store.list_expired(now, 10).await.unwrap();
        let ids: Vec<Uuid> = expired.iter().map(|d| d.id).collect();
        assert_eq!(ids, vec![older.id, old.id]);

        assert_eq!(store.list_expired(now, 1).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_set_expires_at() {
        let store = DocumentStore::in_memory().await.unwrap();
        let now = Utc::now();
        let doc = document(now + ChronoDuration::hours(24));
        store.insert(&doc).await.unwrap();

        assert!(store
            .set_expires_at(&doc.id, now - ChronoDuration::seconds(1))
            .await
            .unwrap());
        let loaded = store.get(&doc.id).await.unwrap().unwrap();
        assert!(loaded.is_expired(now));

        assert!(!store.set_expires_at(&Uuid::new_v4(), now).await.unwrap());
    }

    #[tokio::test]
    async fn test_file_database_persists() {
        let dir = TempDir::new().unwrap();
        let url = format!("sqlite://{}", dir.path().join("docs.db").display());
        let doc = document(Utc::now());

        {
            let store = DocumentStore::connect(&url).await.unwrap();
            store.insert(&doc).await.unwrap();
            store.close().await;
        }

        let store = DocumentStore::connect(&url).await.unwrap();
        assert!(store.get(&doc.id).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_closed_store_errors() {
        let store = DocumentStore::in_memory().await.unwrap();
        store.close().await;
        assert!(matches!(
            store.insert(&document(Utc::now())).await,
            Err(CoreError::Database(_))
        ));
    }
}
