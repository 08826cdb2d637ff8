use std::net::SocketAddr;
use std::sync::Arc;

use dotenvy::dotenv;

use snippetbox::{AppConfig, connect_sqlite, init_sqlite};
use snippetbox_axum::{AppState, install_panic_hook, snippetbox_router};

mod server;
use server::{
    REQUEST_BODY_TIMEOUT, REQUEST_TIMEOUT, init_tracing, serve_http, serve_https,
    spawn_session_cleanup, tls_crypto_provider, with_timeouts,
};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    tls_crypto_provider()
        .install_default()
        .map_err(|_| "Failed to install default CryptoProvider")?;

    dotenv().ok();
    init_tracing("demo_snippetbox");
    install_panic_hook();

    let config = AppConfig::from_env();
    config.validate()?;
    let addr: SocketAddr = config.addr.parse()?;

    let pool = connect_sqlite(&config.database_url).await?;
    let backends = init_sqlite(pool, config.password_hash_iterations).await?;

    let cleanup_interval = config.session_cleanup_interval_secs;
    let tls = config.tls_cert_path.clone().zip(config.tls_key_path.clone());

    let state = AppState::new(
        config,
        Arc::new(backends.sessions),
        Arc::new(backends.users),
        Arc::new(backends.snippets),
    )?;
    let _cleanup = spawn_session_cleanup(state.sessions.clone(), cleanup_interval);

    let app = with_timeouts(snippetbox_router(state), REQUEST_TIMEOUT, REQUEST_BODY_TIMEOUT);

    match tls {
        Some((cert, key)) => serve_https(addr, app, &cert, &key).await?,
        None => serve_http(addr, app).await?,
    }
    Ok(())
}
