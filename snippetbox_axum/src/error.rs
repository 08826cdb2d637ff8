use std::backtrace::Backtrace;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use snippetbox::{BindingError, FormDataError, SessionError, SnippetError, UserError};

/// Errors a handler or pipeline stage can answer a request with
#[derive(Debug, Error)]
pub enum WebError {
    #[error("Bad Request: {0}")]
    BadRequest(String),

    #[error("Not Found")]
    NotFound,

    #[error("Server error: {0}")]
    Server(String),
}

impl WebError {
    pub fn status(&self) -> StatusCode {
        match self {
            WebError::BadRequest(_) => StatusCode::BAD_REQUEST,
            WebError::NotFound => StatusCode::NOT_FOUND,
            WebError::Server(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for WebError {
    fn into_response(self) -> Response {
        let status = self.status();
        match &self {
            WebError::Server(err) => {
                tracing::error!(
                    error = %err,
                    backtrace = %Backtrace::force_capture(),
                    "server error"
                );
            }
            WebError::BadRequest(reason) => {
                tracing::debug!(%reason, "client error");
            }
            WebError::NotFound => {}
        }

        error_response(status)
    }
}

/// Bare error response whose body is the status' canonical reason
pub(crate) fn error_response(status: StatusCode) -> Response {
    let reason = status.canonical_reason().unwrap_or("Error");
    (status, reason).into_response()
}

impl From<SessionError> for WebError {
    fn from(err: SessionError) -> Self {
        WebError::Server(err.to_string())
    }
}

impl From<UserError> for WebError {
    fn from(err: UserError) -> Self {
        WebError::Server(err.to_string())
    }
}

impl From<SnippetError> for WebError {
    fn from(err: SnippetError) -> Self {
        match err {
            SnippetError::NoRecord => WebError::NotFound,
            SnippetError::Storage(msg) => WebError::Server(msg),
        }
    }
}

impl From<BindingError> for WebError {
    fn from(err: BindingError) -> Self {
        match err {
            BindingError::Conversion(e) => WebError::BadRequest(e.to_string()),
            BindingError::MalformedMapping { .. } => WebError::Server(err.to_string()),
        }
    }
}

impl From<FormDataError> for WebError {
    fn from(err: FormDataError) -> Self {
        WebError::BadRequest(err.to_string())
    }
}

impl From<askama::Error> for WebError {
    fn from(err: askama::Error) -> Self {
        WebError::Server(format!("template rendering failed: {err}"))
    }
}
