use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A short piece of text that disappears once `expires` has passed
#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq)]
pub struct Snippet {
    pub id: i64,
    pub title: String,
    pub content: String,
    pub created: DateTime<Utc>,
    pub expires: DateTime<Utc>,
}

impl Snippet {
    pub fn is_live(&self) -> bool {
        self.expires > Utc::now()
    }
}
