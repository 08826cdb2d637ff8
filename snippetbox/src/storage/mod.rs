mod errors;
mod sqlite;

pub use errors::StorageError;
pub use sqlite::connect_sqlite;
