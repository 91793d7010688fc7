//! SQLite-backed store. One file, two tables, embedded migrations.

use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::SqlitePool;
use tracing::info;

use newsroom_common::NewsroomError;

use crate::SeenStore;

pub struct SqliteStore {
    pool: SqlitePool,
}

impl SqliteStore {
    /// Open (creating if missing) the database file and run migrations.
    pub async fn connect(path: &str) -> Result<Self> {
        let options = SqliteConnectOptions::new()
            .filename(path)
            .create_if_missing(true);
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .map_err(|e| NewsroomError::Database(e.to_string()))?;

        let store = Self { pool };
        store.migrate().await?;
        info!(path, "SQLite store ready");
        Ok(store)
    }

    /// In-process database for tests. Single connection so the shared
    /// `:memory:` database survives across queries.
    pub async fn connect_memory() -> Result<Self> {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .map_err(|e| NewsroomError::Database(e.to_string()))?;
        let store = Self { pool };
        store.migrate().await?;
        Ok(store)
    }

    async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(())
    }
}

#[async_trait]
impl SeenStore for SqliteStore {
    async fn exists(&self, key: &str) -> Result<bool> {
        let row: Option<i64> = sqlx::query_scalar("SELECT 1 FROM seen_items WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn recent(&self, cutoff: DateTime<Utc>, limit: u32) -> Result<Vec<String>> {
        let texts: Vec<String> = sqlx::query_scalar(
            "SELECT normalized_text FROM seen_items \
             WHERE created_at >= ? ORDER BY created_at DESC LIMIT ?",
        )
        .bind(cutoff)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(texts)
    }

    async fn insert(
        &self,
        key: &str,
        normalized_text: &str,
        timestamp: DateTime<Utc>,
    ) -> Result<()> {
        sqlx::query(
            "INSERT INTO seen_items (key, normalized_text, created_at) VALUES (?, ?, ?) \
             ON CONFLICT(key) DO NOTHING",
        )
        .bind(key)
        .bind(normalized_text)
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(())
    }

    async fn event_seen(&self, fingerprint: &str, cutoff: DateTime<Utc>) -> Result<bool> {
        let row: Option<i64> = sqlx::query_scalar(
            "SELECT 1 FROM event_fingerprints WHERE fingerprint = ? AND last_seen >= ?",
        )
        .bind(fingerprint)
        .bind(cutoff)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(row.is_some())
    }

    async fn event_touch(&self, fingerprint: &str, timestamp: DateTime<Utc>) -> Result<()> {
        sqlx::query(
            "INSERT INTO event_fingerprints (fingerprint, last_seen) VALUES (?, ?) \
             ON CONFLICT(fingerprint) DO UPDATE SET last_seen = excluded.last_seen",
        )
        .bind(fingerprint)
        .bind(timestamp)
        .execute(&self.pool)
        .await
        .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(())
    }

    async fn cleanup_events(&self, cutoff: DateTime<Utc>) -> Result<u64> {
        let result = sqlx::query("DELETE FROM event_fingerprints WHERE last_seen < ?")
            .bind(cutoff)
            .execute(&self.pool)
            .await
            .map_err(|e| NewsroomError::Database(e.to_string()))?;
        Ok(result.rows_affected())
    }
}
