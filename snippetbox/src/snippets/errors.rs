use thiserror::Error;

#[derive(Clone, Error, Debug)]
pub enum SnippetError {
    #[error("No matching record found")]
    NoRecord,

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<sqlx::Error> for SnippetError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => SnippetError::NoRecord,
            other => SnippetError::Storage(other.to_string()),
        }
    }
}
