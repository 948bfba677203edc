//! Newsletter Portal
//!
//! Web server for editors: generate a newsletter on the backend, edit it,
//! ask for AI feedback, commit it to GitHub and send it through Mailchimp.

use newsletter_portal::{app::build_router, config::Config, state::AppState};
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::{info, warn};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    // Load configuration
    let config = Config::from_env();
    info!("Configuration loaded: {:?}", config);
    log_missing_features(&config);

    let app_state = Arc::new(AppState::new(config)?);
    let addr: SocketAddr = app_state
        .config
        .server_addr()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid server address: {}", e))?;

    let app = build_router(Arc::clone(&app_state));

    info!("🚀 Portal running on http://{}", addr);
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let listener = tokio::net::TcpListener::bind(&addr).await?;

    // Setup graceful shutdown
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server shutdown complete");
    Ok(())
}

fn log_missing_features(config: &Config) {
    if !config.login_required() {
        warn!("EDITOR_PASSWORD is not set; login is disabled and the portal is open to anyone who can reach it");
    }
    if config.mock_mode {
        warn!("MOCK_MODE is on; generate, review and send return canned results");
    }
    if config.backend.is_none() {
        warn!("BACKEND_URL is not set; generation and newsletter listing are unavailable");
    }
    if config.mailchimp.is_none() {
        warn!("Mailchimp is not configured; sending is unavailable");
    }
    if config.anthropic.is_none() {
        warn!("ANTHROPIC_API_KEY is not set; AI review is unavailable");
    }
    if config.github.is_none() {
        warn!("GitHub is not configured; saving is unavailable");
    }
}

/// Handle graceful shutdown signals (Ctrl+C, SIGTERM)
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install signal handler")
            .recv()
            .await;
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
