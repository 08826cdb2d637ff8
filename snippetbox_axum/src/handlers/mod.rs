mod snippets;
mod static_files;
mod users;

pub(crate) use snippets::{home, snippet_create, snippet_create_post, snippet_view};
pub(crate) use static_files::serve_main_css;
pub(crate) use users::{login, login_post, logout_post, signup, signup_post};
