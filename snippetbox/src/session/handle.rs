use std::collections::HashMap;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tokio::sync::Mutex;

use super::errors::SessionError;
use super::types::SessionStatus;

#[derive(Debug, Default)]
pub(crate) struct SessionState {
    pub(crate) token: Option<String>,
    /// Token that must be removed from the store at save time
    pub(crate) stale_token: Option<String>,
    pub(crate) data: HashMap<String, Value>,
    pub(crate) status: SessionStatus,
    pub(crate) saved: bool,
}

/// Per-request session handle.
///
/// Clones share the same state, so a handler and the stage that saves the
/// session observe each other's writes.
#[derive(Debug, Clone, Default)]
pub struct Session {
    pub(crate) inner: Arc<Mutex<SessionState>>,
}

impl Session {
    /// A fresh, empty session without a token
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn from_stored(token: String, data: HashMap<String, Value>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(SessionState {
                token: Some(token),
                data,
                ..Default::default()
            })),
        }
    }

    /// Reads a value, failing if it exists with an incompatible type
    pub async fn get<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, SessionError> {
        let state = self.inner.lock().await;
        match state.data.get(key) {
            None => Ok(None),
            Some(value) => serde_json::from_value(value.clone())
                .map(Some)
                .map_err(|e| SessionError::Value(format!("{key}: {e}"))),
        }
    }

    /// Integer value for `key`, or 0 when absent or not an integer
    pub async fn get_int(&self, key: &str) -> i64 {
        let state = self.inner.lock().await;
        state.data.get(key).and_then(Value::as_i64).unwrap_or(0)
    }

    /// String value for `key`, or empty when absent or not a string
    pub async fn get_string(&self, key: &str) -> String {
        let state = self.inner.lock().await;
        state
            .data
            .get(key)
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string()
    }

    pub async fn exists(&self, key: &str) -> bool {
        self.inner.lock().await.data.contains_key(key)
    }

    pub async fn put<T: Serialize>(&self, key: &str, value: T) -> Result<(), SessionError> {
        let value = serde_json::to_value(value).map_err(|e| SessionError::Value(e.to_string()))?;
        let mut state = self.inner.lock().await;
        state.data.insert(key.to_string(), value);
        state.status = SessionStatus::Modified;
        Ok(())
    }

    /// Removes and returns a value. Only marks the session modified if the key existed.
    pub async fn pop(&self, key: &str) -> Option<Value> {
        let mut state = self.inner.lock().await;
        let value = state.data.remove(key)?;
        state.status = SessionStatus::Modified;
        Some(value)
    }

    /// Removes and returns a string value, empty when absent
    pub async fn pop_string(&self, key: &str) -> String {
        match self.pop(key).await {
            Some(Value::String(s)) => s,
            _ => String::new(),
        }
    }

    pub async fn remove(&self, key: &str) {
        let mut state = self.inner.lock().await;
        if state.data.remove(key).is_some() {
            state.status = SessionStatus::Modified;
        }
    }

    /// Issues a new token for this session at save time, keeping its data.
    ///
    /// Call on every privilege change (login, logout) to prevent session fixation.
    pub async fn renew_token(&self) {
        let mut state = self.inner.lock().await;
        if let Some(token) = state.token.take() {
            if state.stale_token.is_none() {
                state.stale_token = Some(token);
            }
        }
        if state.status != SessionStatus::Destroyed {
            state.status = SessionStatus::Modified;
        }
    }

    /// Clears all data and removes the stored record at save time
    pub async fn destroy(&self) {
        let mut state = self.inner.lock().await;
        if let Some(token) = state.token.take() {
            if state.stale_token.is_none() {
                state.stale_token = Some(token);
            }
        }
        state.data.clear();
        state.status = SessionStatus::Destroyed;
    }

    pub async fn status(&self) -> SessionStatus {
        self.inner.lock().await.status
    }

    /// Token this session was loaded with or saved under, if any
    pub async fn token(&self) -> Option<String> {
        self.inner.lock().await.token.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_put_and_get() {
        let session = Session::new();
        session.put("authenticatedUserID", 42).await.unwrap();

        assert_eq!(
            session.get::<i64>("authenticatedUserID").await.unwrap(),
            Some(42)
        );
        assert_eq!(session.get_int("authenticatedUserID").await, 42);
        assert_eq!(session.status().await, SessionStatus::Modified);
    }

    #[tokio::test]
    async fn test_get_with_wrong_type_fails() {
        let session = Session::new();
        session.put("name", "alice").await.unwrap();
        assert!(matches!(
            session.get::<i64>("name").await,
            Err(SessionError::Value(_))
        ));
        assert_eq!(session.get_int("name").await, 0);
    }

    #[tokio::test]
    async fn test_absent_values_have_defaults() {
        let session = Session::new();
        assert_eq!(session.get::<i64>("missing").await.unwrap(), None);
        assert_eq!(session.get_int("missing").await, 0);
        assert_eq!(session.get_string("missing").await, "");
        assert!(!session.exists("missing").await);
    }

    #[tokio::test]
    async fn test_pop_string_reads_and_clears() {
        let session = Session::from_stored("tok".to_string(), HashMap::new());
        session.put("flash", "Saved!").await.unwrap();

        assert_eq!(session.pop_string("flash").await, "Saved!");
        assert_eq!(session.pop_string("flash").await, "");
        assert!(!session.exists("flash").await);
    }

    #[tokio::test]
    async fn test_pop_missing_key_leaves_session_unmodified() {
        let session = Session::from_stored("tok".to_string(), HashMap::new());
        assert!(session.pop("flash").await.is_none());
        session.remove("flash").await;
        assert_eq!(session.status().await, SessionStatus::Unmodified);
    }

    #[tokio::test]
    async fn test_renew_token_keeps_data() {
        let mut data = HashMap::new();
        data.insert("k".to_string(), Value::from("v"));
        let session = Session::from_stored("old".to_string(), data);

        session.renew_token().await;

        assert_eq!(session.token().await, None);
        assert_eq!(session.get_string("k").await, "v");
        assert_eq!(session.status().await, SessionStatus::Modified);
        let state = session.inner.lock().await;
        assert_eq!(state.stale_token.as_deref(), Some("old"));
    }

    #[tokio::test]
    async fn test_destroy_then_put_starts_over() {
        let mut data = HashMap::new();
        data.insert("k".to_string(), Value::from("v"));
        let session = Session::from_stored("old".to_string(), data);

        session.destroy().await;
        assert_eq!(session.status().await, SessionStatus::Destroyed);
        assert!(!session.exists("k").await);

        session.put("flash", "bye").await.unwrap();
        assert_eq!(session.status().await, SessionStatus::Modified);
        assert_eq!(session.token().await, None);
    }

    #[tokio::test]
    async fn test_clones_share_state() {
        let session = Session::new();
        let clone = session.clone();
        clone.put("flash", "hi").await.unwrap();
        assert_eq!(session.get_string("flash").await, "hi");
    }
}
