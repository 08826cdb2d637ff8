mod memory;
mod sqlite;

use async_trait::async_trait;

use super::errors::SnippetError;
use super::types::Snippet;

pub use memory::InMemorySnippetStore;
pub use sqlite::SqliteSnippetStore;

#[async_trait]
pub trait SnippetStore: Send + Sync + 'static {
    /// Stores a snippet that expires `expires_days` from now and returns its id
    async fn insert(&self, title: &str, content: &str, expires_days: i64)
    -> Result<i64, SnippetError>;

    /// Returns a live snippet, or [`SnippetError::NoRecord`]
    async fn get(&self, id: i64) -> Result<Snippet, SnippetError>;

    /// Most recently created live snippets, newest first
    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError>;
}
