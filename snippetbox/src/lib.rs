//! snippetbox - Core library of the Snippetbox web application
//!
//! Framework-agnostic pieces of the request pipeline: server-side sessions,
//! identity resolution, typed form binding and validation, and the user and
//! snippet collaborators with SQLite and in-memory backends.

mod config;
mod form;
mod identity;
mod session;
mod snippets;
mod storage;
mod userdb;
mod utils;

pub use config::{AppConfig, ConfigError, SessionConfig};

pub use form::{
    BindForm, BindingError, ConversionError, EMAIL_RX, FormBinder, FormBinderBuilder, FormData,
    FormDataError, SnippetCreateForm, UserLoginForm, UserSignupForm, ValidationResult, matches,
    max_chars, min_chars, not_blank, permitted_value, validate_form_bindings,
};

pub use identity::{AUTHENTICATED_USER_ID_KEY, Identity, resolve_identity};

pub use session::{
    FLASH_KEY, InMemorySessionStore, SaveOutcome, Session, SessionError, SessionManager,
    SessionStatus, SessionStore, SqliteSessionStore, StoredSession,
};

pub use snippets::{
    InMemorySnippetStore, LATEST_LIMIT, Snippet, SnippetError, SnippetStore, SqliteSnippetStore,
};

pub use storage::{StorageError, connect_sqlite};

pub use userdb::{
    InMemoryUserDirectory, SqliteUserDirectory, User, UserDirectory, UserError, hash_password,
    verify_password,
};

pub use utils::{UtilError, gen_random_string};

use sqlx::{Pool, Sqlite};

/// The SQLite-backed collaborators sharing one connection pool
#[derive(Clone, Debug)]
pub struct SqliteBackends {
    pub sessions: SqliteSessionStore,
    pub users: SqliteUserDirectory,
    pub snippets: SqliteSnippetStore,
}

/// Create the SQLite collaborators and their tables
pub async fn init_sqlite(
    pool: Pool<Sqlite>,
    password_hash_iterations: u32,
) -> Result<SqliteBackends, Box<dyn std::error::Error + Send + Sync>> {
    let backends = SqliteBackends {
        sessions: SqliteSessionStore::new(pool.clone()),
        users: SqliteUserDirectory::new(pool.clone(), password_hash_iterations),
        snippets: SqliteSnippetStore::new(pool),
    };

    backends.sessions.init().await?;
    backends.users.init().await?;
    backends.snippets.init().await?;

    tracing::info!("SQLite tables initialized");
    Ok(backends)
}

#[cfg(test)]
mod tests {
    use super::*;
    use sqlx::sqlite::SqlitePoolOptions;

    #[tokio::test]
    async fn test_init_sqlite_creates_all_tables() {
        let pool = SqlitePoolOptions::new()
            .max_connections(1)
            .connect("sqlite::memory:")
            .await
            .unwrap();

        let backends = init_sqlite(pool, 1_000).await.unwrap();

        let id = backends
            .users
            .insert("Alice", "alice@example.com", "pa55word!")
            .await
            .unwrap();
        assert!(backends.users.exists(id).await.unwrap());
        assert!(backends.snippets.latest().await.unwrap().is_empty());
        assert_eq!(backends.sessions.delete_expired().await.unwrap(), 0);
    }
}
