use thiserror::Error;

/// Failures opening the database pool
#[derive(Debug, Error, Clone)]
pub enum StorageError {
    #[error("Invalid SQLite URL {url}: {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Failed to connect to database: {0}")]
    Connect(String),
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        Self::Connect(err.to_string())
    }
}
