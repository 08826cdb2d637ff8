use std::sync::Arc;

use chrono::Utc;
use http::{HeaderMap, HeaderValue};

use super::cookie::token_from_headers;
use super::errors::SessionError;
use super::handle::Session;
use super::store::SessionStore;
use super::types::{SaveOutcome, SessionStatus, StoredSession};
use crate::config::SessionConfig;
use crate::utils::{gen_random_string, set_cookie_value};

const SESSION_TOKEN_BYTES: usize = 32;

/// Loads sessions from request cookies and writes them back after the handler ran
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    config: SessionConfig,
}

impl std::fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionManager")
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, config: SessionConfig) -> Self {
        Self { store, config }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Returns the session named by the request cookie, or a new empty one.
    ///
    /// Unknown and expired tokens are not errors; the client just gets a fresh session.
    pub async fn load(&self, headers: &HeaderMap) -> Result<Session, SessionError> {
        let Some(token) = token_from_headers(headers, &self.config.cookie_name) else {
            return Ok(Session::new());
        };

        match self.store.find(&token).await? {
            Some(stored) if !stored.is_expired() => {
                tracing::debug!("Loaded session with {} keys", stored.data.len());
                Ok(Session::from_stored(token, stored.data))
            }
            _ => {
                tracing::debug!("Session token not found or expired, starting a new session");
                Ok(Session::new())
            }
        }
    }

    /// Persists the session according to its status.
    ///
    /// Only the first call for a given session does any work; later calls return
    /// [`SaveOutcome::Unchanged`].
    pub async fn save(&self, session: &Session) -> Result<SaveOutcome, SessionError> {
        let mut state = session.inner.lock().await;
        if state.saved {
            return Ok(SaveOutcome::Unchanged);
        }
        state.saved = true;

        match state.status {
            SessionStatus::Unmodified => Ok(SaveOutcome::Unchanged),
            SessionStatus::Destroyed => {
                if let Some(stale) = state.stale_token.take() {
                    self.store.delete(&stale).await?;
                }
                tracing::debug!("Session destroyed");
                Ok(SaveOutcome::Destroyed)
            }
            SessionStatus::Modified => {
                if let Some(stale) = state.stale_token.take() {
                    self.store.delete(&stale).await?;
                }

                let token = match state.token.clone() {
                    Some(token) => token,
                    None => gen_random_string(SESSION_TOKEN_BYTES)?,
                };
                let expires_at = Utc::now() + self.config.lifetime;

                self.store
                    .commit(
                        &token,
                        &StoredSession {
                            data: state.data.clone(),
                            expires_at,
                        },
                    )
                    .await?;

                state.token = Some(token.clone());
                tracing::debug!("Session saved, expires at {}", expires_at);
                Ok(SaveOutcome::Saved { token, expires_at })
            }
        }
    }

    /// `Set-Cookie` value to attach to the response for a save outcome
    pub fn set_cookie_header(
        &self,
        outcome: &SaveOutcome,
    ) -> Result<Option<HeaderValue>, SessionError> {
        let value = match outcome {
            SaveOutcome::Unchanged => return Ok(None),
            SaveOutcome::Saved { token, .. } => set_cookie_value(
                &self.config.cookie_name,
                token,
                self.config.lifetime.num_seconds(),
                self.config.cookie_secure,
            )?,
            SaveOutcome::Destroyed => set_cookie_value(
                &self.config.cookie_name,
                "",
                0,
                self.config.cookie_secure,
            )?,
        };
        Ok(Some(value))
    }

    /// Removes expired records from the backing store
    pub async fn delete_expired(&self) -> Result<u64, SessionError> {
        let removed = self.store.delete_expired().await?;
        if removed > 0 {
            tracing::info!("Removed {} expired sessions", removed);
        }
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::store::InMemorySessionStore;
    use async_trait::async_trait;
    use chrono::Duration;
    use http::header::COOKIE;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};

    /// Wraps the in-memory store and counts writes
    #[derive(Default)]
    struct CountingStore {
        inner: InMemorySessionStore,
        commits: AtomicUsize,
        deletes: AtomicUsize,
    }

    #[async_trait]
    impl SessionStore for CountingStore {
        async fn find(&self, token: &str) -> Result<Option<StoredSession>, SessionError> {
            self.inner.find(token).await
        }

        async fn commit(&self, token: &str, session: &StoredSession) -> Result<(), SessionError> {
            self.commits.fetch_add(1, Ordering::SeqCst);
            self.inner.commit(token, session).await
        }

        async fn delete(&self, token: &str) -> Result<(), SessionError> {
            self.deletes.fetch_add(1, Ordering::SeqCst);
            self.inner.delete(token).await
        }

        async fn delete_expired(&self) -> Result<u64, SessionError> {
            self.inner.delete_expired().await
        }
    }

    fn test_config() -> SessionConfig {
        SessionConfig {
            cookie_name: "session".to_string(),
            lifetime: Duration::hours(1),
            cookie_secure: true,
        }
    }

    fn manager_with(store: Arc<CountingStore>) -> SessionManager {
        SessionManager::new(store, test_config())
    }

    fn cookie_headers(token: &str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_str(&format!("session={token}")).unwrap(),
        );
        headers
    }

    async fn seed(store: &CountingStore, token: &str, key: &str, value: &str) {
        let mut data = HashMap::new();
        data.insert(key.to_string(), serde_json::Value::from(value));
        store
            .inner
            .commit(
                token,
                &StoredSession {
                    data,
                    expires_at: Utc::now() + Duration::hours(1),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_load_without_cookie_gives_new_session() {
        let manager = manager_with(Arc::new(CountingStore::default()));
        let session = manager.load(&HeaderMap::new()).await.unwrap();
        assert_eq!(session.token().await, None);
        assert_eq!(session.status().await, SessionStatus::Unmodified);
    }

    #[tokio::test]
    async fn test_load_unknown_token_gives_new_session() {
        let manager = manager_with(Arc::new(CountingStore::default()));
        let session = manager.load(&cookie_headers("bogus")).await.unwrap();
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_load_existing_session() {
        let store = Arc::new(CountingStore::default());
        seed(&store, "tok1", "flash", "hello").await;
        let manager = manager_with(store);

        let session = manager.load(&cookie_headers("tok1")).await.unwrap();
        assert_eq!(session.token().await.as_deref(), Some("tok1"));
        assert_eq!(session.get_string("flash").await, "hello");
    }

    #[tokio::test]
    async fn test_unmodified_session_is_not_persisted() {
        let store = Arc::new(CountingStore::default());
        let manager = manager_with(store.clone());

        let session = manager.load(&HeaderMap::new()).await.unwrap();
        let outcome = manager.save(&session).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Unchanged);
        assert_eq!(manager.set_cookie_header(&outcome).unwrap(), None);
        assert_eq!(store.commits.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_modified_session_gets_token_and_cookie() {
        let store = Arc::new(CountingStore::default());
        let manager = manager_with(store.clone());

        let session = manager.load(&HeaderMap::new()).await.unwrap();
        session.put("flash", "Saved!").await.unwrap();
        let outcome = manager.save(&session).await.unwrap();

        let SaveOutcome::Saved { token, .. } = &outcome else {
            panic!("expected Saved, got {outcome:?}");
        };
        assert_eq!(session.token().await.as_deref(), Some(token.as_str()));

        let cookie = manager.set_cookie_header(&outcome).unwrap().unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("session={token}; Path=/; Max-Age=3600")));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Secure"));

        let reloaded = manager.load(&cookie_headers(token)).await.unwrap();
        assert_eq!(reloaded.get_string("flash").await, "Saved!");
    }

    #[tokio::test]
    async fn test_save_is_idempotent() {
        let store = Arc::new(CountingStore::default());
        let manager = manager_with(store.clone());

        let session = Session::new();
        session.put("k", 1).await.unwrap();

        assert!(matches!(
            manager.save(&session).await.unwrap(),
            SaveOutcome::Saved { .. }
        ));
        assert_eq!(manager.save(&session).await.unwrap(), SaveOutcome::Unchanged);
        assert_eq!(store.commits.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_renew_token_replaces_stored_record() {
        let store = Arc::new(CountingStore::default());
        seed(&store, "old", "k", "v").await;
        let manager = manager_with(store.clone());

        let session = manager.load(&cookie_headers("old")).await.unwrap();
        session.renew_token().await;
        session.put("authenticatedUserID", 7).await.unwrap();

        let SaveOutcome::Saved { token, .. } = manager.save(&session).await.unwrap() else {
            panic!("expected Saved");
        };
        assert_ne!(token, "old");
        assert!(store.find("old").await.unwrap().is_none());

        let stored = store.find(&token).await.unwrap().unwrap();
        assert_eq!(stored.data["k"], serde_json::Value::from("v"));
        assert_eq!(stored.data["authenticatedUserID"], serde_json::Value::from(7));
    }

    #[tokio::test]
    async fn test_destroy_deletes_record_and_expires_cookie() {
        let store = Arc::new(CountingStore::default());
        seed(&store, "tok1", "k", "v").await;
        let manager = manager_with(store.clone());

        let session = manager.load(&cookie_headers("tok1")).await.unwrap();
        session.destroy().await;
        let outcome = manager.save(&session).await.unwrap();

        assert_eq!(outcome, SaveOutcome::Destroyed);
        assert!(store.find("tok1").await.unwrap().is_none());

        let cookie = manager.set_cookie_header(&outcome).unwrap().unwrap();
        assert!(cookie.to_str().unwrap().starts_with("session=; Path=/; Max-Age=0"));
    }

    #[tokio::test]
    async fn test_flash_survives_exactly_one_read() {
        let store = Arc::new(CountingStore::default());
        let manager = manager_with(store.clone());

        let first = Session::new();
        first.put("flash", "Snippet successfully created!").await.unwrap();
        let SaveOutcome::Saved { token, .. } = manager.save(&first).await.unwrap() else {
            panic!("expected Saved");
        };

        let second = manager.load(&cookie_headers(&token)).await.unwrap();
        assert_eq!(
            second.pop_string("flash").await,
            "Snippet successfully created!"
        );
        manager.save(&second).await.unwrap();

        let third = manager.load(&cookie_headers(&token)).await.unwrap();
        assert_eq!(third.pop_string("flash").await, "");
    }

    #[tokio::test]
    async fn test_delete_expired_delegates_to_store() {
        let store = Arc::new(CountingStore::default());
        store
            .inner
            .commit(
                "old",
                &StoredSession {
                    data: HashMap::new(),
                    expires_at: Utc::now() - Duration::seconds(1),
                },
            )
            .await
            .unwrap();
        let manager = manager_with(store);

        assert_eq!(manager.delete_expired().await.unwrap(), 1);
    }
}
