#![allow(dead_code)]

use std::io::Write;
use std::sync::{Arc, Mutex};

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{
        Request,
        header::{CONTENT_TYPE, COOKIE, SET_COOKIE},
    },
    response::Response,
};
use chrono::Duration;
use tower::ServiceExt;
use tracing_subscriber::fmt::MakeWriter;

use snippetbox::{
    AppConfig, InMemorySessionStore, InMemorySnippetStore, InMemoryUserDirectory, SessionConfig,
};
use snippetbox_axum::{AppState, snippetbox_router};

pub const TEST_ITERATIONS: u32 = 1_000;

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    pub sessions: Arc<InMemorySessionStore>,
    pub users: Arc<InMemoryUserDirectory>,
    pub snippets: Arc<InMemorySnippetStore>,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        session: SessionConfig {
            cookie_name: "session".to_string(),
            lifetime: Duration::hours(12),
            cookie_secure: true,
        },
        password_hash_iterations: TEST_ITERATIONS,
        ..AppConfig::default()
    }
}

pub fn test_app() -> TestApp {
    let sessions = Arc::new(InMemorySessionStore::new());
    let users = Arc::new(InMemoryUserDirectory::new(TEST_ITERATIONS));
    let snippets = Arc::new(InMemorySnippetStore::new());

    let state = AppState::new(
        test_config(),
        sessions.clone(),
        users.clone(),
        snippets.clone(),
    )
    .unwrap();

    TestApp {
        router: snippetbox_router(state.clone()),
        state,
        sessions,
        users,
        snippets,
    }
}

pub async fn send(router: &Router, req: Request<Body>) -> Response {
    router.clone().oneshot(req).await.unwrap()
}

pub fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

pub fn post_form(uri: &str, body: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(CONTENT_TYPE, "application/x-www-form-urlencoded");
    if let Some(cookie) = cookie {
        builder = builder.header(COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

/// `name=value` part of the session Set-Cookie header, if any
pub fn session_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .find(|value| value.starts_with("session="))
        .and_then(|value| value.split(';').next())
        .map(str::to_string)
}

pub fn header<'a>(response: &'a Response, name: &str) -> Option<&'a str> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
}

pub async fn body_text(response: Response) -> String {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

/// Signs a user up and logs them in, returning the authenticated session cookie
pub async fn logged_in(app: &TestApp) -> String {
    let response = send(
        &app.router,
        post_form(
            "/user/signup",
            "name=Alice&email=alice%40example.com&password=pa55word%21",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 303);

    let response = send(
        &app.router,
        post_form(
            "/user/login",
            "email=alice%40example.com&password=pa55word%21",
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), 303);
    session_cookie(&response).expect("login sets a session cookie")
}

/// Collects formatted log output in memory
#[derive(Clone, Default)]
pub struct LogBuffer(Arc<Mutex<Vec<u8>>>);

impl LogBuffer {
    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
    }
}

impl Write for LogBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}

impl<'a> MakeWriter<'a> for LogBuffer {
    type Writer = LogBuffer;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Routes logs of the current thread into a buffer until the guard is dropped
pub fn capture_logs() -> (LogBuffer, tracing::subscriber::DefaultGuard) {
    let buffer = LogBuffer::default();
    let subscriber = tracing_subscriber::fmt()
        .with_writer(buffer.clone())
        .with_ansi(false)
        .with_max_level(tracing::Level::DEBUG)
        .finish();
    let guard = tracing::subscriber::set_default(subscriber);
    (buffer, guard)
}
