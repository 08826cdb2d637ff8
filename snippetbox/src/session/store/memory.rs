use std::collections::HashMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::Mutex;

use super::SessionStore;
use crate::session::errors::SessionError;
use crate::session::types::StoredSession;

/// Process-local session store, for tests and development
#[derive(Debug, Default)]
pub struct InMemorySessionStore {
    entries: Mutex<HashMap<String, StoredSession>>,
}

impl InMemorySessionStore {
    pub fn new() -> Self {
        tracing::info!("Creating new in-memory session store");
        Self::default()
    }

    /// Number of records currently held, expired ones included
    pub async fn len(&self) -> usize {
        self.entries.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.lock().await.is_empty()
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn find(&self, token: &str) -> Result<Option<StoredSession>, SessionError> {
        let mut entries = self.entries.lock().await;
        match entries.get(token) {
            Some(session) if session.is_expired() => {
                tracing::debug!("Session expired at {}", session.expires_at);
                entries.remove(token);
                Ok(None)
            }
            Some(session) => Ok(Some(session.clone())),
            None => Ok(None),
        }
    }

    async fn commit(&self, token: &str, session: &StoredSession) -> Result<(), SessionError> {
        self.entries
            .lock()
            .await
            .insert(token.to_string(), session.clone());
        Ok(())
    }

    async fn delete(&self, token: &str) -> Result<(), SessionError> {
        self.entries.lock().await.remove(token);
        Ok(())
    }

    async fn delete_expired(&self) -> Result<u64, SessionError> {
        let now = Utc::now();
        let mut entries = self.entries.lock().await;
        let before = entries.len();
        entries.retain(|_, session| session.expires_at > now);
        Ok((before - entries.len()) as u64)
    }
}
