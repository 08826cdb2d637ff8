mod errors;
mod password;
mod store;
mod types;

pub use errors::UserError;
pub use password::{hash_password, verify_password};
pub use store::{InMemoryUserDirectory, SqliteUserDirectory, UserDirectory};
pub use types::User;
