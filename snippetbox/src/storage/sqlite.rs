use std::str::FromStr;

use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};

use super::errors::StorageError;

/// Opens a SQLite pool for `url`, creating the database file if missing, and checks
/// that a connection can actually be established.
#[tracing::instrument]
pub async fn connect_sqlite(url: &str) -> Result<SqlitePool, StorageError> {
    let opts = SqliteConnectOptions::from_str(url)
        .map_err(|e| StorageError::InvalidUrl {
            url: url.to_string(),
            reason: e.to_string(),
        })?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = SqlitePoolOptions::new().connect_with(opts).await?;

    tracing::info!("Connected to database: url={}", url);
    Ok(pool)
}
