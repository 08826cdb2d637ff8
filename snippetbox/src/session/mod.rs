mod cookie;
mod errors;
mod handle;
mod manager;
mod store;
mod types;

pub use errors::SessionError;
pub use handle::Session;
pub use manager::SessionManager;
pub use store::{InMemorySessionStore, SessionStore, SqliteSessionStore};
pub use types::{SaveOutcome, SessionStatus, StoredSession};

/// One-shot message shown on the next rendered page
pub const FLASH_KEY: &str = "flash";
