//! Route table and the order in which pipeline stages wrap it

use axum::{
    Router,
    middleware::{from_fn, from_fn_with_state},
    routing::{get, post},
};

use crate::error::WebError;
use crate::handlers;
use crate::middleware::{
    authenticate, load_session, log_request, recover_panic, require_authentication,
    secure_headers,
};
use crate::state::AppState;

/// Wraps `router` in SessionLoad then Authenticate.
///
/// Routes added afterwards can rely on the `Session` and `Identity` extensions.
pub fn with_session_stages(router: Router<AppState>, state: &AppState) -> Router<AppState> {
    // The last layer added runs first
    router
        .layer(from_fn_with_state(state.clone(), authenticate))
        .layer(from_fn_with_state(state.clone(), load_session))
}

/// Wraps `router` in PanicRecovery, RequestLog and SecurityHeaders, in that order
pub fn with_standard_stages<S>(router: Router<S>) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    router
        .layer(from_fn(secure_headers))
        .layer(from_fn(log_request))
        .layer(from_fn(recover_panic))
}

fn dynamic_routes(state: &AppState) -> Router<AppState> {
    let public = Router::new()
        .route("/", get(handlers::home))
        .route("/snippet/view/{id}", get(handlers::snippet_view))
        .route(
            "/user/signup",
            get(handlers::signup).post(handlers::signup_post),
        )
        .route("/user/login", get(handlers::login).post(handlers::login_post));

    let protected = Router::new()
        .route(
            "/snippet/create",
            get(handlers::snippet_create).post(handlers::snippet_create_post),
        )
        .route("/user/logout", post(handlers::logout_post))
        .route_layer(from_fn_with_state(state.clone(), require_authentication));

    with_session_stages(public.merge(protected), state)
}

/// The complete application: static files, pages and the full pipeline
pub fn snippetbox_router(state: AppState) -> Router {
    let router = Router::new()
        .route("/static/main.css", get(handlers::serve_main_css))
        .merge(dynamic_routes(&state))
        .fallback(|| async { WebError::NotFound })
        .with_state(state);

    with_standard_stages(router)
}
