mod memory;
mod sqlite;

use async_trait::async_trait;

use crate::session::errors::SessionError;
use crate::session::types::StoredSession;

pub use memory::InMemorySessionStore;
pub use sqlite::SqliteSessionStore;

/// Durable token → session data storage.
///
/// Implementations must be safe to use from many requests at once.
#[async_trait]
pub trait SessionStore: Send + Sync + 'static {
    /// Look up a live session. Expired or unknown tokens yield `None`.
    async fn find(&self, token: &str) -> Result<Option<StoredSession>, SessionError>;

    /// Insert or replace the session stored under `token`.
    async fn commit(&self, token: &str, session: &StoredSession) -> Result<(), SessionError>;

    /// Remove the session stored under `token`, if any.
    async fn delete(&self, token: &str) -> Result<(), SessionError>;

    /// Remove every expired session and return how many were removed.
    async fn delete_expired(&self) -> Result<u64, SessionError>;
}
