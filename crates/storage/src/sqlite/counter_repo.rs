use async_trait::async_trait;
use chrono::Utc;
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, count_from_i64, ser};
use crate::repository::{CompletionCounter, StorageError};

#[async_trait]
impl CompletionCounter for SqliteRepository {
    async fn read(&self, key: &str) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT value FROM counters WHERE name = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;

        let Some(row) = row else {
            return Ok(0);
        };
        let value: i64 = row.try_get("value").map_err(ser)?;
        count_from_i64("value", value)
    }

    async fn increment(&self, key: &str) -> Result<u64, StorageError> {
        // Single upsert so the read-modify-write cannot interleave.
        let row = sqlx::query(
            r"
            INSERT INTO counters (name, value, updated_at)
            VALUES (?1, 1, ?2)
            ON CONFLICT(name) DO UPDATE SET
                value = value + 1,
                updated_at = excluded.updated_at
            RETURNING value
            ",
        )
        .bind(key)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(conn)?;

        let value: i64 = row.try_get("value").map_err(ser)?;
        count_from_i64("value", value)
    }
}
