use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Session data as kept by a [`SessionStore`](super::SessionStore)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub data: HashMap<String, Value>,
    pub expires_at: DateTime<Utc>,
}

impl StoredSession {
    pub fn is_expired(&self) -> bool {
        self.expires_at <= Utc::now()
    }
}

/// Whether a session changed during the current request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionStatus {
    #[default]
    Unmodified,
    Modified,
    Destroyed,
}

/// Result of writing a session back at the end of a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// Nothing to persist, or the session was already saved for this request
    Unchanged,
    /// Data was committed under `token`
    Saved {
        token: String,
        expires_at: DateTime<Utc>,
    },
    /// The stored record was deleted and the client cookie must be expired
    Destroyed,
}
