use async_trait::async_trait;
use chrono::{Duration, Utc};
use tokio::sync::Mutex;

use super::SnippetStore;
use crate::snippets::LATEST_LIMIT;
use crate::snippets::errors::SnippetError;
use crate::snippets::types::Snippet;

/// Process-local snippet store, for tests and development
#[derive(Debug, Default)]
pub struct InMemorySnippetStore {
    snippets: Mutex<Vec<Snippet>>,
}

impl InMemorySnippetStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of snippets ever inserted, live or not
    pub async fn len(&self) -> usize {
        self.snippets.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.snippets.lock().await.is_empty()
    }
}

#[async_trait]
impl SnippetStore for InMemorySnippetStore {
    async fn insert(
        &self,
        title: &str,
        content: &str,
        expires_days: i64,
    ) -> Result<i64, SnippetError> {
        let mut snippets = self.snippets.lock().await;
        let id = snippets.len() as i64 + 1;
        let created = Utc::now();
        snippets.push(Snippet {
            id,
            title: title.to_string(),
            content: content.to_string(),
            created,
            expires: created + Duration::days(expires_days),
        });
        Ok(id)
    }

    async fn get(&self, id: i64) -> Result<Snippet, SnippetError> {
        self.snippets
            .lock()
            .await
            .iter()
            .find(|snippet| snippet.id == id && snippet.is_live())
            .cloned()
            .ok_or(SnippetError::NoRecord)
    }

    async fn latest(&self) -> Result<Vec<Snippet>, SnippetError> {
        Ok(self
            .snippets
            .lock()
            .await
            .iter()
            .rev()
            .filter(|snippet| snippet.is_live())
            .take(LATEST_LIMIT)
            .cloned()
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_insert_and_get() {
        let store = InMemorySnippetStore::new();
        let id = store.insert("An old silent pond", "A frog jumps in", 7).await.unwrap();

        let snippet = store.get(id).await.unwrap();
        assert_eq!(snippet.title, "An old silent pond");
        assert_eq!(snippet.expires - snippet.created, Duration::days(7));
    }

    #[tokio::test]
    async fn test_get_missing_or_expired() {
        let store = InMemorySnippetStore::new();
        let id = store.insert("gone", "already", -1).await.unwrap();

        assert!(matches!(store.get(id).await, Err(SnippetError::NoRecord)));
        assert!(matches!(store.get(99).await, Err(SnippetError::NoRecord)));
    }

    #[tokio::test]
    async fn test_latest_is_newest_first_and_limited() {
        let store = InMemorySnippetStore::new();
        for i in 0..12 {
            store.insert(&format!("snippet {i}"), "body", 1).await.unwrap();
        }
        store.insert("expired", "body", -1).await.unwrap();

        let latest = store.latest().await.unwrap();
        assert_eq!(latest.len(), LATEST_LIMIT);
        assert_eq!(latest[0].title, "snippet 11");
        assert!(latest.iter().all(|s| s.title != "expired"));
    }
}
