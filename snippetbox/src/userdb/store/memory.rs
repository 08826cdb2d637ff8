use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::UserDirectory;
use crate::userdb::errors::UserError;
use crate::userdb::password::{decoy_hash, spawn_hash_password, spawn_verify_password};
use crate::userdb::types::User;

/// Process-local user directory, for tests and development
#[derive(Debug)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<User>>,
    iterations: u32,
}

impl InMemoryUserDirectory {
    pub fn new(iterations: u32) -> Self {
        Self {
            users: Mutex::new(Vec::new()),
            iterations,
        }
    }

    /// Deletes an account; returns whether it existed
    pub async fn remove(&self, id: i64) -> bool {
        let mut users = self.users.lock().await;
        let before = users.len();
        users.retain(|user| user.id != id);
        users.len() != before
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    #[tracing::instrument(skip(self, password))]
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError> {
        let hashed_password = spawn_hash_password(password, self.iterations).await?;
        let mut users = self.users.lock().await;

        if users.iter().any(|user| user.email == email) {
            return Err(UserError::DuplicateEmail);
        }

        let id = users.iter().map(|user| user.id).max().unwrap_or(0) + 1;
        users.push(User {
            id,
            name: name.to_string(),
            email: email.to_string(),
            hashed_password,
            created: Utc::now(),
        });
        tracing::info!(user_id = id, "User created");
        Ok(id)
    }

    #[tracing::instrument(skip(self, password))]
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError> {
        let found = self
            .users
            .lock()
            .await
            .iter()
            .find(|user| user.email == email)
            .map(|user| (user.id, user.hashed_password.clone()));

        let Some((id, hashed_password)) = found else {
            let _ = spawn_verify_password(password, decoy_hash(self.iterations)).await;
            return Err(UserError::InvalidCredentials);
        };

        if spawn_verify_password(password, hashed_password).await? {
            Ok(id)
        } else {
            Err(UserError::InvalidCredentials)
        }
    }

    async fn exists(&self, id: i64) -> Result<bool, UserError> {
        Ok(self.users.lock().await.iter().any(|user| user.id == id))
    }
}
