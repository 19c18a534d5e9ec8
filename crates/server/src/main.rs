mod auth;
mod config;
mod cookies;
mod http;
mod nonce;
mod session;
mod spam;
mod state;
mod tokens;
mod visitor;

use anyhow::Context;
use dotenvy::dotenv;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::sync::broadcast;
use tracing::info;
use tracing_subscriber::EnvFilter;

use config::Settings;
use domain::{DefaultHooks, EditHooks};
use http::router::build_router;
use nonce::NonceGuard;
use session::SessionKeys;
use spam::NoSpamCheck;
use state::{AppState, EditPolicy};
use storage::Db;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = Settings::new().context("Failed to load configuration")?;

    let db = Db::new(&settings.database.url).await?;

    let (tx_events, _rx_events) = broadcast::channel(100);

    let hooks: Arc<dyn EditHooks> = Arc::new(DefaultHooks);
    let policy = EditPolicy::resolve(
        hooks.as_ref(),
        settings.editing.comment_time,
        settings.editing.allow_delete,
        settings.editing.security_key_min,
        settings.server.cookie_path.clone(),
        settings.server.trust_proxy,
    );
    info!(
        "Comments stay editable for {} minute(s), deletion {}",
        policy.window.minutes(),
        if policy.allow_delete { "allowed" } else { "disabled" }
    );

    let state = AppState {
        db,
        hooks,
        spam: Arc::new(NoSpamCheck),
        nonces: NonceGuard::new(
            &settings.security.nonce_secret,
            settings.security.nonce_lifetime_secs,
        ),
        sessions: SessionKeys::new(&settings.security.session_secret),
        policy,
        moderation: Arc::new(settings.moderation.clone()),
        tx_events,
    };

    let app = build_router(state, &settings.server.cors_origins);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    info!("Server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to address: {}", addr))?;

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to install Ctrl+C handler: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut sig) => {
                sig.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install signal handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, shutting down gracefully...");
        },
        _ = terminate => {
            info!("Received SIGTERM, shutting down gracefully...");
        },
    }
}
