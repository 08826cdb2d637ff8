mod errors;
mod store;
mod types;

pub use errors::SnippetError;
pub use store::{InMemorySnippetStore, SnippetStore, SqliteSnippetStore};
pub use types::Snippet;

/// Number of snippets shown on the home page
pub const LATEST_LIMIT: usize = 10;
