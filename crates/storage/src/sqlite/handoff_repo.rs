use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{conn, ser};
use crate::repository::{HandoffStore, StorageError};

#[async_trait::async_trait]
impl HandoffStore for SqliteRepository {
    async fn put(&self, key: &str, value: String) -> Result<(), StorageError> {
        sqlx::query(
            r"
                INSERT INTO handoff_slots (key, value, updated_at)
                VALUES (?1, ?2, ?3)
                ON CONFLICT(key) DO UPDATE SET
                    value = excluded.value,
                    updated_at = excluded.updated_at
            ",
        )
        .bind(key)
        .bind(value)
        .bind(self.clock.now())
        .execute(&self.pool)
        .await
        .map_err(conn)?;
        Ok(())
    }

    async fn get(&self, key: &str) -> Result<Option<String>, StorageError> {
        let row = sqlx::query("SELECT value FROM handoff_slots WHERE key = ?1")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(conn)?;
        row.map(|r| r.try_get::<String, _>("value").map_err(ser))
            .transpose()
    }

    async fn clear(&self, key: &str) -> Result<(), StorageError> {
        sqlx::query("DELETE FROM handoff_slots WHERE key = ?1")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(conn)?;
        Ok(())
    }
}
