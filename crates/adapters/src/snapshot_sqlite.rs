//! SQLite snapshot store implementation

use async_trait::async_trait;
use social_state_domain::{PersistenceError, SnapshotStore};
use sqlx::{SqlitePool, sqlite::SqlitePoolOptions};
use std::path::Path;
use time::OffsetDateTime;

/// Namespace used when none is given
pub const DEFAULT_NAMESPACE: &str = "social-state";

/// SQLite-backed snapshot store. Each namespace holds one record.
pub struct SqliteSnapshotStore {
    pool: SqlitePool,
    namespace: String,
}

impl SqliteSnapshotStore {
    /// Open (or create) the database at `db_path`
    pub async fn new(
        db_path: impl AsRef<Path>,
        namespace: impl Into<String>,
    ) -> Result<Self, PersistenceError> {
        let db_path = db_path.as_ref();

        // Create parent directories if needed
        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    PersistenceError::Database(format!("Failed to create directory: {}", e))
                })?;
            }
        }

        let db_url = format!("sqlite:{}?mode=rwc", db_path.display());

        let pool = SqlitePoolOptions::new()
            .max_connections(5)
            .connect(&db_url)
            .await
            .map_err(|e| PersistenceError::Database(e.to_string()))?;

        let store = Self {
            pool,
            namespace: namespace.into(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    /// Create an in-memory SQLite store (for testing)
    pub async fn in_memory(namespace: impl Into<String>) -> Result<Self, PersistenceError> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| PersistenceError::Database(e.to_string()))?;

        let store = Self {
            pool,
            namespace: namespace.into(),
        };
        store.run_migrations().await?;

        Ok(store)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    async fn run_migrations(&self) -> Result<(), PersistenceError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS snapshots (
                namespace TEXT PRIMARY KEY,
                payload BLOB NOT NULL,
                updated_at TEXT NOT NULL
            )
            "#,
        )
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::Database(e.to_string()))?;

        Ok(())
    }

    /// When the record of this namespace was last written
    pub async fn updated_at(&self) -> Result<Option<OffsetDateTime>, PersistenceError> {
        let row: Option<(String,)> =
            sqlx::query_as("SELECT updated_at FROM snapshots WHERE namespace = ?")
                .bind(&self.namespace)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PersistenceError::Database(e.to_string()))?;

        row.map(|(updated_at,)| {
            OffsetDateTime::parse(&updated_at, &time::format_description::well_known::Rfc3339)
                .map_err(|e| PersistenceError::Serialization(e.to_string()))
        })
        .transpose()
    }
}

#[async_trait]
impl SnapshotStore for SqliteSnapshotStore {
    async fn load(&self) -> Result<Option<Vec<u8>>, PersistenceError> {
        let row: Option<(Vec<u8>,)> =
            sqlx::query_as("SELECT payload FROM snapshots WHERE namespace = ?")
                .bind(&self.namespace)
                .fetch_optional(&self.pool)
                .await
                .map_err(|e| PersistenceError::Database(e.to_string()))?;

        Ok(row.map(|(payload,)| payload))
    }

    async fn save(&self, payload: &[u8]) -> Result<(), PersistenceError> {
        let updated_at = OffsetDateTime::now_utc()
            .format(&time::format_description::well_known::Rfc3339)
            .map_err(|e| PersistenceError::Serialization(e.to_string()))?;

        sqlx::query(
            r#"
            INSERT INTO snapshots (namespace, payload, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(namespace) DO UPDATE SET
                payload = excluded.payload,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(&self.namespace)
        .bind(payload)
        .bind(&updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| PersistenceError::Database(e.to_string()))?;

        tracing::debug!(namespace = %self.namespace, bytes = payload.len(), "Wrote snapshot");
        Ok(())
    }
}
