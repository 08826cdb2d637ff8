use askama::Template;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use chrono::{Datelike, Utc};

use snippetbox::{
    FLASH_KEY, Identity, Session, Snippet, SnippetCreateForm, UserLoginForm, UserSignupForm,
};

use crate::error::WebError;

/// Data every page shows: footer year, one-shot flash message and login state
#[derive(Debug, Clone, Default)]
pub(crate) struct PageData {
    pub current_year: i32,
    pub flash: Option<String>,
    pub is_authenticated: bool,
}

impl PageData {
    /// Builds the page data, consuming the pending flash message if there is one
    pub(crate) async fn new(session: &Session, identity: Identity) -> Self {
        let flash = session.pop_string(FLASH_KEY).await;
        Self {
            current_year: Utc::now().year(),
            flash: (!flash.is_empty()).then_some(flash),
            is_authenticated: identity.is_authenticated(),
        }
    }
}

#[derive(Template)]
#[template(path = "home.html")]
pub(crate) struct HomeTemplate {
    pub page: PageData,
    pub snippets: Vec<Snippet>,
}

#[derive(Template)]
#[template(path = "view.html")]
pub(crate) struct ViewTemplate {
    pub page: PageData,
    pub snippet: Snippet,
}

#[derive(Template)]
#[template(path = "create.html")]
pub(crate) struct CreateTemplate {
    pub page: PageData,
    pub form: SnippetCreateForm,
}

#[derive(Template)]
#[template(path = "signup.html")]
pub(crate) struct SignupTemplate {
    pub page: PageData,
    pub form: UserSignupForm,
}

#[derive(Template)]
#[template(path = "login.html")]
pub(crate) struct LoginTemplate {
    pub page: PageData,
    pub form: UserLoginForm,
}

/// Renders fully before responding so a template failure becomes a clean 500
pub(crate) fn render<T: Template>(status: StatusCode, template: &T) -> Result<Response, WebError> {
    let html = template.render()?;
    Ok((status, Html(html)).into_response())
}
