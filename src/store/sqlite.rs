//! SQLite-backed [`BlobStore`] implementation.
//!
//! Wraps a [`SqlitePool`]; every trait method maps to a single statement
//! against the `blobs` table, so each write commits or aborts as a unit.

use std::path::Path;

use anyhow::Result;
use async_trait::async_trait;
use sqlx::{Row, SqlitePool};

use crate::db;
use crate::migrate;
use crate::models::StoredBlob;

use super::BlobStore;

/// [`BlobStore`] over a SQLite database on disk.
pub struct SqliteBlobStore {
    pool: SqlitePool,
}

impl SqliteBlobStore {
    /// Open the database at `path`, creating the file and the `blobs`
    /// table on first use. Safe to call repeatedly.
    pub async fn open(path: &Path) -> Result<Self> {
        let pool = db::connect(path).await?;
        migrate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an existing pool whose schema is already migrated.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn close(self) {
        self.pool.close().await;
    }
}

fn row_to_blob(row: &sqlx::sqlite::SqliteRow) -> StoredBlob {
    StoredBlob {
        id: row.get("id"),
        name: row.get("name"),
        mime_type: row.get("mime_type"),
        data: row.get("data"),
        date: row.get("date"),
    }
}

#[async_trait]
impl BlobStore for SqliteBlobStore {
    async fn put(&self, blob: &StoredBlob) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO blobs (id, name, mime_type, data, date)
            VALUES (?, ?, ?, ?, ?)
            ON CONFLICT(id) DO UPDATE SET
                name = excluded.name,
                mime_type = excluded.mime_type,
                data = excluded.data,
                date = excluded.date
            "#,
        )
        .bind(&blob.id)
        .bind(&blob.name)
        .bind(&blob.mime_type)
        .bind(&blob.data)
        .bind(blob.date)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn get(&self, id: &str) -> Result<Option<StoredBlob>> {
        let row = sqlx::query("SELECT id, name, mime_type, data, date FROM blobs WHERE id = ?")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(row_to_blob))
    }

    async fn get_all(&self) -> Result<Vec<StoredBlob>> {
        let rows = sqlx::query("SELECT id, name, mime_type, data, date FROM blobs")
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.iter().map(row_to_blob).collect())
    }

    async fn delete(&self, id: &str) -> Result<()> {
        sqlx::query("DELETE FROM blobs WHERE id = ?")
            .bind(id)
            .execute(&self.pool)
            .await?;

        Ok(())
    }
}
