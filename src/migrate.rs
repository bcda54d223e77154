use anyhow::Result;
use sqlx::SqlitePool;

/// Schema version stamped into `PRAGMA user_version` after migration.
pub const SCHEMA_VERSION: i64 = 1;

pub async fn run_migrations(pool: &SqlitePool) -> Result<()> {
    let on_disk: i64 = sqlx::query_scalar("PRAGMA user_version")
        .fetch_one(pool)
        .await?;

    // A database stamped by a newer build keeps its schema and data as-is.
    if on_disk > SCHEMA_VERSION {
        return Ok(());
    }

    sqlx::query(
        r#"
        CREATE TABLE IF NOT EXISTS blobs (
            id TEXT PRIMARY KEY,
            name TEXT NOT NULL,
            mime_type TEXT NOT NULL,
            data TEXT NOT NULL,
            date INTEGER NOT NULL
        )
        "#,
    )
    .execute(pool)
    .await?;

    if on_disk < SCHEMA_VERSION {
        // PRAGMA values cannot be bound as parameters.
        sqlx::query(&format!("PRAGMA user_version = {}", SCHEMA_VERSION))
            .execute(pool)
            .await?;
    }

    Ok(())
}
