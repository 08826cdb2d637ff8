use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum_server::tls_rustls::RustlsConfig;
use rustls::crypto::CryptoProvider;
use rustls::crypto::ring::{default_provider, kx_group};
use tokio::task::JoinHandle;
use tower_http::timeout::{RequestBodyTimeoutLayer, TimeoutLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use snippetbox::SessionManager;

pub(crate) const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
pub(crate) const REQUEST_BODY_TIMEOUT: Duration = Duration::from_secs(5);

/// ring provider limited to the X25519 and P-256 key exchanges
pub(crate) fn tls_crypto_provider() -> CryptoProvider {
    CryptoProvider {
        kx_groups: vec![kx_group::X25519, kx_group::SECP256R1],
        ..default_provider()
    }
}

/// Answers 408 when a request body is not received within `body`, or the whole
/// request is not handled within `request`
#[allow(deprecated)]
pub(crate) fn with_timeouts(app: Router, request: Duration, body: Duration) -> Router {
    app.layer(RequestBodyTimeoutLayer::new(body))
        .layer(TimeoutLayer::new(request))
}

pub(crate) async fn serve_http(addr: SocketAddr, app: Router) -> std::io::Result<()> {
    tracing::info!("HTTP server listening on {}", addr);
    axum_server::bind(addr)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
}

pub(crate) async fn serve_https(
    addr: SocketAddr,
    app: Router,
    cert: &Path,
    key: &Path,
) -> std::io::Result<()> {
    let config = RustlsConfig::from_pem_file(cert, key).await?;

    tracing::info!("HTTPS server listening on {}", addr);
    axum_server::bind_rustls(addr, config)
        .serve(app.into_make_service_with_connect_info::<SocketAddr>())
        .await
}

/// Periodically removes expired sessions from the store
pub(crate) fn spawn_session_cleanup(
    sessions: Arc<SessionManager>,
    interval_secs: u64,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(Duration::from_secs(interval_secs));
        loop {
            interval.tick().await;
            if let Err(e) = sessions.delete_expired().await {
                tracing::error!(error = %e, "Expired session cleanup failed");
            }
        }
    })
}

pub(crate) fn init_tracing(app_name: &str) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        #[cfg(debug_assertions)]
        {
            format!("snippetbox=debug,snippetbox_axum=debug,{app_name}=debug,info").into()
        }

        #[cfg(not(debug_assertions))]
        {
            "info".into()
        }
    });

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer())
        .init();

    #[cfg(debug_assertions)]
    tracing::info!("Debug build, showing detailed logs by default");
    tracing::info!("Set RUST_LOG to change verbosity, e.g. RUST_LOG=debug ./demo-snippetbox");
}
