use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Redirect, Response},
};

use snippetbox::{
    AUTHENTICATED_USER_ID_KEY, BindForm, FLASH_KEY, Identity, Session, UserError, UserLoginForm,
    UserSignupForm,
};

use crate::error::WebError;
use crate::form::PostForm;
use crate::state::AppState;
use crate::templates::{LoginTemplate, PageData, SignupTemplate, render};

pub(crate) async fn signup(
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, WebError> {
    let template = SignupTemplate {
        page: PageData::new(&session, identity).await,
        form: UserSignupForm::default(),
    };
    render(StatusCode::OK, &template)
}

pub(crate) async fn signup_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    PostForm(data): PostForm,
) -> Result<Response, WebError> {
    let mut form = UserSignupForm::default();
    form.bind(&data)?;

    if form.validate() {
        match state
            .users
            .insert(&form.name, &form.email, &form.password)
            .await
        {
            Ok(_) => {
                session
                    .put(FLASH_KEY, "Your signup was successful. Please log in.")
                    .await?;
                return Ok(Redirect::to("/user/login").into_response());
            }
            Err(UserError::DuplicateEmail) => {
                form.validation
                    .add_field_error("email", "Email address is already in use");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let template = SignupTemplate {
        page: PageData::new(&session, identity).await,
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &template)
}

pub(crate) async fn login(
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, WebError> {
    let template = LoginTemplate {
        page: PageData::new(&session, identity).await,
        form: UserLoginForm::default(),
    };
    render(StatusCode::OK, &template)
}

pub(crate) async fn login_post(
    State(state): State<AppState>,
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
    PostForm(data): PostForm,
) -> Result<Response, WebError> {
    let mut form = UserLoginForm::default();
    form.bind(&data)?;

    if form.validate() {
        match state.users.authenticate(&form.email, &form.password).await {
            Ok(user_id) => {
                // New token on privilege change
                session.renew_token().await;
                session.put(AUTHENTICATED_USER_ID_KEY, user_id).await?;
                tracing::info!(user_id, "User logged in");
                return Ok(Redirect::to("/snippet/create").into_response());
            }
            Err(UserError::InvalidCredentials) => {
                form.validation
                    .add_non_field_error("Email or password is incorrect");
            }
            Err(e) => return Err(e.into()),
        }
    }

    let template = LoginTemplate {
        page: PageData::new(&session, identity).await,
        form,
    };
    render(StatusCode::UNPROCESSABLE_ENTITY, &template)
}

pub(crate) async fn logout_post(
    Extension(session): Extension<Session>,
    Extension(identity): Extension<Identity>,
) -> Result<Response, WebError> {
    session.renew_token().await;
    session.remove(AUTHENTICATED_USER_ID_KEY).await;
    session
        .put(FLASH_KEY, "You've been logged out successfully!")
        .await?;
    tracing::info!(user_id = ?identity.user_id(), "User logged out");

    Ok(Redirect::to("/").into_response())
}
