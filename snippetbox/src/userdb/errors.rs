use thiserror::Error;

use crate::utils::UtilError;

#[derive(Clone, Error, Debug)]
pub enum UserError {
    #[error("Email address is already in use")]
    DuplicateEmail,

    #[error("Invalid credentials")]
    InvalidCredentials,

    #[error("Storage error: {0}")]
    Storage(String),

    #[error("Password hash error: {0}")]
    Hash(String),
}

impl From<sqlx::Error> for UserError {
    fn from(err: sqlx::Error) -> Self {
        UserError::Storage(err.to_string())
    }
}

impl From<UtilError> for UserError {
    fn from(err: UtilError) -> Self {
        UserError::Hash(err.to_string())
    }
}
