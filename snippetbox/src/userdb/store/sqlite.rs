use async_trait::async_trait;
use chrono::Utc;
use sqlx::{Pool, Sqlite};

use super::UserDirectory;
use crate::userdb::errors::UserError;
use crate::userdb::password::{decoy_hash, spawn_hash_password, spawn_verify_password};
use crate::userdb::types::User;

const DB_TABLE_USERS: &str = "users";

/// User directory backed by a SQLite table
#[derive(Clone, Debug)]
pub struct SqliteUserDirectory {
    pool: Pool<Sqlite>,
    iterations: u32,
}

impl SqliteUserDirectory {
    pub fn new(pool: Pool<Sqlite>, iterations: u32) -> Self {
        Self { pool, iterations }
    }

    /// Create the users table if it does not exist yet
    pub async fn init(&self) -> Result<(), UserError> {
        sqlx::query(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS {DB_TABLE_USERS} (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                email TEXT NOT NULL UNIQUE,
                hashed_password TEXT NOT NULL,
                created TIMESTAMP NOT NULL
            )
            "#
        ))
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

#[async_trait]
impl UserDirectory for SqliteUserDirectory {
    #[tracing::instrument(skip(self, password))]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let hashed_password = spawn_hash_password(password, self.iterations).await?;

        let result = sqlx::query(&format!(
            r#"
            INSERT INTO {DB_TABLE_USERS} (name, email, hashed_password, created)
            VALUES (?, ?, ?, ?)
            "#
        ))
        .bind(name)
        .bind(email)
        .bind(hashed_password)
        .bind(Utc::now())
        .execute(&self.pool)
        .await;

        match result {
            Ok(done) => {
                let id = done.last_insert_rowid();
                tracing::info!(user_id = id, "User created");
                Ok(id)
            }
            Err(err)
                if err
                    .as_database_error()
                    .is_some_and(|db| db.is_unique_violation()) =>
            {
                Err(UserError::DuplicateEmail)
            }
            Err(err) => {
                tracing::error!(error = %err, "User insert failed");
                Err(err.into())
            }
        }
    }

    #[tracing::instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let user = sqlx::query_as::<_, User>(&format!(
            "SELECT id, name, email, hashed_password, created FROM {DB_TABLE_USERS} WHERE email = ?"
        ))
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        let Some(user) = user else {
            let _ = spawn_verify_password(password, decoy_hash(self.iterations)).await;
            return Err(UserError::InvalidCredentials);
        };

        if spawn_verify_password(password, user.hashed_password).await? {
            Ok(user.id)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }

    #[tracing::instrument(skip(self))]
    async fn exists(&self, id: i64) -> Result<bool, UserError> {
        let exists: bool = sqlx::query_scalar(&format!(
            "SELECT EXISTS(SELECT true FROM {DB_TABLE_USERS} WHERE id = ?)"
        ))
        .bind(id)
        .fetch_one(&self.pool)
        .await?;
        Ok(exists)
    }
}
