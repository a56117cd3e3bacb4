//! Projectbot service binary.
//!
//! Standalone HTTP service for GitHub pull request webhooks.

use anyhow::{Context, Result};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use projectbot::{config::Config, server};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(
            EnvFilter::from_default_env()
                .add_directive("projectbot=info".parse()?)
                .add_directive("tower_http=info".parse()?),
        )
        .init();

    info!("Starting projectbot service...");

    // Load configuration
    let config = Config::default();

    if config.github_token.is_empty() {
        warn!("No GITHUB_TOKEN configured - board API calls will be unauthenticated");
    }
    if config.webhook_secret.is_empty() {
        warn!("No WEBHOOK_SECRET configured - webhook signatures will not be verified");
    }

    info!(
        owner = %config.board.owner,
        repo = %config.board.repo,
        project = %config.board.project_name,
        "Tracking project board"
    );

    let port = config.port;
    let state = server::AppState::new(config).context("Failed to create GitHub client")?;
    let app = server::build_router(state);

    // Bind and serve
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr)
        .await
        .context("Failed to bind to address")?;

    info!(port, "Projectbot listening");

    axum::serve(listener, app).await.context("Server error")?;

    Ok(())
}
