//! Request pipeline stages, applied around every route by [`crate::router`]

use std::backtrace::Backtrace;
use std::future::{Future, poll_fn};
use std::net::SocketAddr;
use std::panic::AssertUnwindSafe;
use std::pin::pin;

use axum::{
    extract::{ConnectInfo, Request, State},
    middleware::Next,
    response::{IntoResponse, Redirect, Response},
};
use futures::FutureExt;
use http::{
    HeaderMap, HeaderName, HeaderValue, StatusCode,
    header::{CACHE_CONTROL, CONNECTION, SET_COOKIE, VARY},
};

use snippetbox::{Identity, Session, resolve_identity};

use crate::error::{WebError, error_response};
use crate::recovery::{
    RecoveryScope, payload_message, restore_panic_report, take_panic_report,
};
use crate::state::AppState;

const SECURITY_HEADERS: [(&str, &str); 5] = [
    (
        "content-security-policy",
        "default-src 'self'; style-src 'self' fonts.googleapis.com; font-src fonts.gstatic.com",
    ),
    ("referrer-policy", "origin-when-cross-origin"),
    ("x-content-type-options", "nosniff"),
    ("x-frame-options", "deny"),
    ("x-xss-protection", "0"),
];

/// Adds the fixed browser security headers that are not already present
fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        headers
            .entry(HeaderName::from_static(name))
            .or_insert(HeaderValue::from_static(value));
    }
}

/// Turns a panic anywhere downstream into a single logged 500 that closes the connection.
///
/// With [`crate::install_panic_hook`] in place the log entry carries the location and
/// backtrace of the panic itself; without it, the backtrace of this stage.
pub async fn recover_panic(req: Request, next: Next) -> Response {
    let mut downstream = pin!(AssertUnwindSafe(next.run(req)).catch_unwind());
    let result = poll_fn(|cx| {
        let _scope = RecoveryScope::enter();
        downstream.as_mut().poll(cx)
    })
    .await;

    let panic = match result {
        Ok(response) => return response,
        Err(panic) => panic,
    };

    match take_panic_report() {
        Some(report) => tracing::error!(
            error = %format!("panic: {}", report.message),
            location = %report.location,
            backtrace = %report.backtrace,
            "server error"
        ),
        None => tracing::error!(
            error = %format!("panic: {}", payload_message(&*panic)),
            backtrace = %Backtrace::force_capture(),
            "server error"
        ),
    }

    // SecurityHeaders never saw this response, so they are added here
    let mut response = error_response(StatusCode::INTERNAL_SERVER_ERROR);
    let headers = response.headers_mut();
    headers.insert(CONNECTION, HeaderValue::from_static("close"));
    apply_security_headers(headers);
    response
}

pub async fn log_request(req: Request, next: Next) -> Response {
    let remote = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.to_string())
        .unwrap_or_else(|| "-".to_string());

    tracing::info!(
        "{} - {:?} {} {}",
        remote,
        req.version(),
        req.method(),
        req.uri()
    );

    next.run(req).await
}

/// Adds the fixed browser security headers, leaving any a handler set alone
pub async fn secure_headers(req: Request, next: Next) -> Response {
    let mut response = next.run(req).await;
    apply_security_headers(response.headers_mut());
    response
}

/// Attaches the client's session to the request and writes it back exactly once,
/// whether the handler returned normally, with an error response, or panicked.
///
/// After a panic no cookie can be delivered, so a session without a token (new, or
/// renewed by the handler) is not written back at all.
pub async fn load_session(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    if req.extensions().get::<Session>().is_some() {
        tracing::warn!("Session already attached to request, not loading it again");
        return next.run(req).await;
    }

    let session = match state.sessions.load(req.headers()).await {
        Ok(session) => session,
        Err(e) => return WebError::from(e).into_response(),
    };
    req.extensions_mut().insert(session.clone());

    let mut response = match AssertUnwindSafe(next.run(req)).catch_unwind().await {
        Ok(response) => response,
        Err(panic) => {
            let report = take_panic_report();
            if session.token().await.is_some() {
                if let Err(e) = state.sessions.save(&session).await {
                    tracing::error!(error = %e, "Failed to save session after panic");
                }
            } else {
                tracing::debug!("Not saving a session whose cookie cannot be delivered");
            }
            restore_panic_report(report);
            std::panic::resume_unwind(panic);
        }
    };

    let cookie = match state
        .sessions
        .save(&session)
        .await
        .and_then(|outcome| state.sessions.set_cookie_header(&outcome))
    {
        Ok(cookie) => cookie,
        Err(e) => return WebError::from(e).into_response(),
    };

    let headers = response.headers_mut();
    if let Some(cookie) = cookie {
        headers.append(SET_COOKIE, cookie);
    }
    headers.append(VARY, HeaderValue::from_static("Cookie"));
    response
}

/// Resolves who is making the request and exposes it as an [`Identity`] extension
pub async fn authenticate(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Response {
    let identity = match req.extensions().get::<Session>().cloned() {
        Some(session) => match resolve_identity(&session, state.users.as_ref()).await {
            Ok(identity) => identity,
            Err(e) => return WebError::from(e).into_response(),
        },
        None => {
            tracing::warn!("No session on request, treating it as anonymous");
            Identity::Anonymous
        }
    };

    req.extensions_mut().insert(identity);
    next.run(req).await
}

/// Sends anonymous requests to the login page; authenticated responses are not cached
pub async fn require_authentication(
    State(state): State<AppState>,
    req: Request,
    next: Next,
) -> Response {
    let identity = req
        .extensions()
        .get::<Identity>()
        .copied()
        .unwrap_or_default();

    if !identity.is_authenticated() {
        return Redirect::to(&state.config.login_path).into_response();
    }

    let mut response = next.run(req).await;
    response
        .headers_mut()
        .append(CACHE_CONTROL, HeaderValue::from_static("no-store"));
    response
}
