// SQLite KeyValueStore Implementation

use async_trait::async_trait;
use offline_queue_core::error::{AppError, Result};
use offline_queue_core::port::{KeyValueStore, TimeProvider};
use sqlx::SqlitePool;
use std::sync::Arc;
use tracing::debug;

// Helper to convert sqlx::Error to AppError with the SQLite result code when present
fn map_sqlx_error(err: sqlx::Error) -> AppError {
    match &err {
        sqlx::Error::Database(db_err) => match db_err.code() {
            // SQLITE_BUSY - database is locked
            Some(code) if code.as_ref() == "5" => {
                AppError::Storage(format!("Database locked (SQLITE_BUSY): {}", db_err.message()))
            }
            // SQLITE_FULL - database or disk is full
            Some(code) if code.as_ref() == "13" => {
                AppError::Storage(format!("Database full: {}", db_err.message()))
            }
            Some(code) => AppError::Storage(format!(
                "Database error [{}]: {}",
                code.as_ref(),
                db_err.message()
            )),
            None => AppError::Storage(format!("Database error: {}", db_err.message())),
        },
        sqlx::Error::PoolTimedOut => AppError::Storage("Connection pool timed out".to_string()),
        _ => AppError::Storage(err.to_string()),
    }
}

/// Key/value table backed by SQLite
///
/// Expects the schema from [`crate::run_migrations`].
pub struct SqliteKeyValueStore {
    pool: SqlitePool,
    time_provider: Arc<dyn TimeProvider>,
}

impl SqliteKeyValueStore {
    pub fn new(pool: SqlitePool, time_provider: Arc<dyn TimeProvider>) -> Self {
        Self {
            pool,
            time_provider,
        }
    }

    /// Last write time of a key in epoch millis
    pub async fn updated_at(&self, key: &str) -> Result<Option<i64>> {
        sqlx::query_scalar("SELECT updated_at FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }
}

#[async_trait]
impl KeyValueStore for SqliteKeyValueStore {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        sqlx::query_scalar("SELECT value FROM kv_store WHERE key = ?")
            .bind(key)
            .fetch_optional(&self.pool)
            .await
            .map_err(map_sqlx_error)
    }

    async fn set(&self, key: &str, value: &[u8]) -> Result<()> {
        sqlx::query(
            r#"
            INSERT INTO kv_store (key, value, updated_at)
            VALUES (?, ?, ?)
            ON CONFLICT(key) DO UPDATE SET
                value = excluded.value,
                updated_at = excluded.updated_at
            "#,
        )
        .bind(key)
        .bind(value)
        .bind(self.time_provider.now_millis())
        .execute(&self.pool)
        .await
        .map_err(map_sqlx_error)?;

        debug!(key = %key, bytes = value.len(), "Stored value");
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<()> {
        sqlx::query("DELETE FROM kv_store WHERE key = ?")
            .bind(key)
            .execute(&self.pool)
            .await
            .map_err(map_sqlx_error)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{create_pool, run_migrations};
    use offline_queue_core::port::time_provider::mocks::ManualTimeProvider;

    async fn setup_test_db() -> (SqliteKeyValueStore, Arc<ManualTimeProvider>) {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        run_migrations(&pool).await.unwrap();
        let clock = Arc::new(ManualTimeProvider::new(1_000));
        (SqliteKeyValueStore::new(pool, clock.clone()), clock)
    }

    #[tokio::test]
    async fn test_get_missing_key() {
        let (store, _) = setup_test_db().await;
        assert_eq!(store.get("offline_queue").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_set_then_overwrite() {
        let (store, clock) = setup_test_db().await;

        store.set("offline_queue", b"[]").await.unwrap();
        assert_eq!(store.updated_at("offline_queue").await.unwrap(), Some(1_000));

        clock.advance(500);
        let snapshot = serde_json::to_vec(&serde_json::json!([{"id": "a"}])).unwrap();
        store.set("offline_queue", &snapshot).await.unwrap();

        assert_eq!(store.get("offline_queue").await.unwrap(), Some(snapshot));
        assert_eq!(store.updated_at("offline_queue").await.unwrap(), Some(1_500));
    }

    #[tokio::test]
    async fn test_keys_are_independent() {
        let (store, _) = setup_test_db().await;
        store.set("a", b"1").await.unwrap();
        store.set("b", b"2").await.unwrap();

        store.delete("a").await.unwrap();

        assert_eq!(store.get("a").await.unwrap(), None);
        assert_eq!(store.get("b").await.unwrap(), Some(b"2".to_vec()));
    }

    #[tokio::test]
    async fn test_delete_unknown_key_is_noop() {
        let (store, _) = setup_test_db().await;
        store.delete("never-written").await.unwrap();
    }

    #[tokio::test]
    async fn test_missing_schema_maps_to_storage_error() {
        let pool = create_pool("sqlite::memory:").await.unwrap();
        let store = SqliteKeyValueStore::new(pool, Arc::new(ManualTimeProvider::new(0)));

        let err = store.get("offline_queue").await.unwrap_err();
        assert!(matches!(err, AppError::Storage(_)));
    }
}
