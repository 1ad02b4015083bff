//! DropifyHub install backend.
//!
//! Serves the Shopify install handshake and the push API. Configuration is
//! read from the environment (and `.env`); see [`EnvSettings`].

use std::sync::Arc;

use shopify_install::auth::oauth::HandshakeManager;
use shopify_install::server::{router, AppState};
use shopify_install::store::MemoryCredentialStore;
use shopify_install::{EnvSettings, LogFormat};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    let settings = EnvSettings::from_env().expect("Failed to load configuration");

    // Defaults to info level for our crate if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "shopify_install=info,tower_http=info".into());

    let is_json = settings.log_format == LogFormat::Json;
    let json_layer = is_json.then(|| tracing_subscriber::fmt::layer().json().flatten_event(true));
    let text_layer = (!is_json).then(tracing_subscriber::fmt::layer);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(json_layer)
        .with(text_layer)
        .init();

    tracing::info!(
        host = settings.install.host().host_name(),
        scopes = %settings.install.scopes(),
        api_version = %settings.install.api_version(),
        embedded = settings.install.is_embedded(),
        "configuration loaded"
    );

    let addr = settings.bind_addr;
    let manager = HandshakeManager::new(settings.install, Arc::new(MemoryCredentialStore::new()))
        .expect("Failed to build token exchange client");
    let state = AppState::with_options(manager, settings.push_api_key, None)
        .expect("Failed to build Admin API client");
    let app = router(state);

    tracing::info!("listening on http://{}", addr);

    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .expect("Failed to bind to address");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Wait for shutdown signal (Ctrl+C or SIGTERM).
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => {},
        () = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}
