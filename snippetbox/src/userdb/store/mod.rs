mod memory;
mod sqlite;

use async_trait::async_trait;

use super::errors::UserError;

pub use memory::InMemoryUserDirectory;
pub use sqlite::SqliteUserDirectory;

/// User accounts as seen by the request pipeline and the user handlers
#[async_trait]
pub trait UserDirectory: Send + Sync + 'static {
    /// Creates an account and returns its id.
    ///
    /// Fails with [`UserError::DuplicateEmail`] if the email is already registered.
    async fn insert(&self, name: &str, email: &str, password: &str) -> Result<i64, UserError>;

    /// Returns the id of the account matching both email and password.
    ///
    /// Unknown email and wrong password both yield [`UserError::InvalidCredentials`].
    async fn authenticate(&self, email: &str, password: &str) -> Result<i64, UserError>;

    async fn exists(&self, id: i64) -> Result<bool, UserError>;
}
