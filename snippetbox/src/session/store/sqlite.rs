use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde_json::Value;
use sqlx::{Pool, Sqlite};

use super::SessionStore;
use crate::session::errors::SessionError;
use crate::session::types::StoredSession;

const DB_TABLE_SESSIONS: &str = "sessions";

/// Session store backed by a SQLite table
#[derive(Clone, Debug)]
pub struct SqliteSessionStore {
    pool: Pool<Sqlite>,
}

impl SqliteSessionStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the sessions table if it does not exist yet
    pub async fn init(&self) -> Result<(), SessionError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {DB_TABLE_SESSIONS} (
                token TEXT PRIMARY KEY NOT NULL,
                data TEXT NOT NULL,
                expiry TIMESTAMP NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {DB_TABLE_SESSIONS}_expiry_idx ON {DB_TABLE_SESSIONS} (expiry)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SessionStore for SqliteSessionStore {
    async fn find(&self, token: &str) -> Result<Option<StoredSession>, SessionError> {
        let row = sqlx::query_as::<_, (String, DateTime<Utc>)>(&format!(
            "SELECT data, expiry FROM {DB_TABLE_SESSIONS} WHERE token = ? AND expiry > ?"
        ))
        .bind(token)
        .bind(Utc::now())
        .fetch_optional(&self.pool)
        .await?;

        let Some((data, expires_at)) = row else {
            return Ok(None);
        };

        let data: HashMap<String, Value> = serde_json::from_str(&data)
            .map_err(|e| SessionError::Value(format!("stored session data: {e}")))?;

        Ok(Some(StoredSession { data, expires_at }))
    }

    async fn commit(&self, token: &str, session: &StoredSession) -> Result<(), SessionError> {
        let data = serde_json::to_string(&session.data)
            .map_err(|e| SessionError::Value(format!("session data: {e}")))?;

        sqlx::query(&format!(
            r#"
            INSERT INTO {DB_TABLE_SESSIONS} (token, data, expiry)
            VALUES (?, ?, ?)
            ON CONFLICT (token) DO UPDATE SET
                data = excluded.data,
                expiry = excluded.expiry
            "#
        ))
        .bind(token)
        .bind(data)
        .bind(session.expires_at)
        .execute(&self.pool)
        .await?;

        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        sqlx::query(&format!("DELETE FROM {DB_TABLE_SESSIONS} WHERE token = ?"))
            .bind(token)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let result = sqlx::query(&format!(
            "DELETE FROM {DB_TABLE_SESSIONS} WHERE expiry <= ?"
        ))
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use sqlx::sqlite::SqlitePoolOptions;

    async fn test_store() -> SqliteSessionStore {
        // A single connection keeps every query on the same in-memory database
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();
        let store = SqliteSessionStore::new(pool);
        store.init().await.unwrap();
        store
    }

    fn stored(user_id: i64, offset: Duration) -> StoredSession {
        let mut data = HashMap::new();
        data.insert("authenticatedUserID".to_string(), Value::from(user_id));
        StoredSession {
            data,
            expires_at: Utc::now() + offset,
        }
    }

    #[tokio::test]
    async fn test_init_is_idempotent() {
        let store = test_store().await;
        store.init().await.unwrap();
    }

    #[tokio::test]
    async fn test_commit_find_and_update() {
        let store = test_store().await;

        store
            .commit("token1", &stored(7, Duration::hours(1)))
            .await
            .unwrap();
        let found = store.find("token1").await.unwrap().unwrap();
        assert_eq!(found.data["authenticatedUserID"], Value::from(7));

        store
            .commit("token1", &stored(8, Duration::hours(1)))
            .await
            .unwrap();
        let found = store.find("token1").await.unwrap().unwrap();
        assert_eq!(found.data["authenticatedUserID"], Value::from(8));
    }

    #[tokio::test]
    async fn test_find_ignores_expired_and_unknown() {
        let store = test_store().await;
        store
            .commit("old", &stored(1, Duration::seconds(-10)))
            .await
            .unwrap();

        assert!(store.find("old").await.unwrap().is_none());
        assert!(store.find("unknown").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_delete_and_delete_expired() {
        let store = test_store().await;
        store
            .commit("live", &stored(1, Duration::hours(1)))
            .await
            .unwrap();
        store
            .commit("gone", &stored(2, Duration::hours(1)))
            .await
            .unwrap();
        store
            .commit("old", &stored(3, Duration::seconds(-10)))
            .await
            .unwrap();

        store.delete("gone").await.unwrap();
        assert!(store.find("gone").await.unwrap().is_none());

        assert_eq!(store.delete_expired().await.unwrap(), 1);
        assert!(store.find("live").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_find_reports_corrupt_data() {
        let store = test_store().await;
        sqlx::query("INSERT INTO sessions (token, data, expiry) VALUES (?, ?, ?)")
            .bind("broken")
            .bind("{not json")
            .bind(Utc::now() + Duration::hours(1))
            .execute(&store.pool)
            .await
            .unwrap();

        assert!(matches!(
            store.find("broken").await,
            Err(SessionError::Value(_))
        ));
    }
}
