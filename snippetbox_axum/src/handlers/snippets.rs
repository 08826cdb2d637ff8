use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use snippetbox::{BindForm, FLASH_KEY, Identity, Session, SnippetCreateForm};

use crate::error::WebError;
use crate::form::PostForm;
use crate::state::AppState;
use crate::templates::{CreateTemplate, HomeTemplate, PageData, ViewTemplate, render};

pub(crate) async fn home(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, WebError> {
    let snippets = state.snippets.latest().await?;

    let template = HomeTemplate {
        page: PageData::new(&session, identity).await,
        snippets,
    };
    render(StatusCode::OK, &template)
}

pub(crate) async fn snippet_view(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    Path(id): Path<String>,
) -> Result<Response, WebError> {
    let id = id
        .parse::<i64>()
        .ok()
        .filter(|id| *id >= 1)
        .ok_or(WebError::NotFound)?;

    let snippet = state.snippets.get(id).await?;

    let template = ViewTemplate {
        page: PageData::new(&session, identity).await,
        snippet,
    };
    render(StatusCode::OK, &template)
}

pub(crate) async fn snippet_create(
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, WebError> {
    let template = CreateTemplate {
        page: PageData::new(&session, identity).await,
        form: SnippetCreateForm::default(),
    };
    render(StatusCode::OK, &template)
}

pub(crate) async fn snippet_create_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    PostForm(data): PostForm,
) -> Result<Response, WebError> {
    let mut form = SnippetCreateForm::default();
    form.bind(&data)?;

    if !form.validate() {
        let template = CreateTemplate {
            page: PageData::new(&session, identity).await,
            form,
        };
        return render(StatusCode::UNPROCESSABLE_ENTITY, &template);
    }

    let id = state
        .snippets
        .insert(&form.title, &form.content, form.expires)
        .await?;
    tracing::info!(snippet_id = id, "Snippet created");

    session
        .put(FLASH_KEY, "Snippet successfully created!")
        .await?;

    Ok(Redirect::to(&format!("/snippet/view/{id}")).into_response())
}
