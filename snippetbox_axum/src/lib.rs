//! snippetbox-axum - Axum front end for the snippetbox core library
//!
//! Provides the request pipeline stages, the page handlers and a ready-made
//! router built on an [`AppState`].

mod error;
mod form;
mod handlers;
mod middleware;
mod recovery;
mod router;
mod state;
mod templates;

pub use error::WebError;
pub use form::PostForm;
pub use middleware::{
    authenticate, load_session, log_request, recover_panic, require_authentication,
    secure_headers,
};
pub use recovery::install_panic_hook;
pub use router::{snippetbox_router, with_session_stages, with_standard_stages};
pub use state::AppState;
