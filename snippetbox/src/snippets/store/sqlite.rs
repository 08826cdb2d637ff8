use async_trait::async_trait;
use chrono::{Duration, Utc};
use sqlx::{Pool, Sqlite};

use super::SnippetStore;
use crate::snippets::LATEST_LIMIT;
use crate::snippets::errors::SnippetError;
use crate::snippets::types::Snippet;

const DB_TABLE_SNIPPETS: &str = "snippets";

/// Snippet store backed by a SQLite table
#[derive(Clone, Debug)]
pub struct SqliteSnippetStore {
    pool: Pool<Sqlite>,
}

impl SqliteSnippetStore {
    pub fn new(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }

    /// Create the snippets table if it does not exist yet
    pub async fn init(&self) -> Result<(), SnippetError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {DB_TABLE_SNIPPETS} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                title TEXT NOT NULL,
                content TEXT NOT NULL,
                created TIMESTAMP NOT NULL,
                expires TIMESTAMP NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        sqlx::query(&format!(
            "CREATE INDEX IF NOT EXISTS {DB_TABLE_SNIPPETS}_created_idx ON {DB_TABLE_SNIPPETS} (created)"
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl SnippetStore for SqliteSnippetStore {
    #[tracing::instrument(skip(self, content))]
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i64,
    ) -> Result<i64, SnippetError> {
        let created = Utc::now();
        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {DB_TABLE_SNIPPETS} (title, content, created, expires)
            VALUES (?, ?, ?, ?)
            "#
        ))
        .bind(title)
        .bind(content)
        .bind(created)
        .bind(created + Duration::days(expires_days))
        .execute(&self.pool)
        .await?;

        Ok(result.last_insert_rowid())
    }

    #[tracing::instrument(skip(self))]
    async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        sqlx::query_as::<_, Snippet>(&format!(
            r#"
            SELECT id, title, content, created, expires FROM {DB_TABLE_SNIPPETS}
            WHERE expires > ? AND id = ?
            "#
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?
        .ok_or(SnippetError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        let snippets = sqlx::query_as::<_, Snippet>(&format!(
            r#"
            SELECT id, title, content, created, expires FROM {DB_TABLE_SNIPPETS}
            WHERE expires > ? ORDER BY id DESC LIMIT ?
            "#
        ))
        .bind(Utc::now())
        .bind(LATEST_LIMIT as i64)
        .fetch_all(&self.pool)
        .await?;
        Ok(snippets)
    }
}
