//! Bakery order website
//!
//! Serves the pages and takes cake orders.

use anyhow::{Context, Result};
use order_service::{create_router, AppState, Config};
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "order_service=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting bakery order service");

    let config = Config::from_env().context("Failed to load configuration")?;
    info!("Database: {}", config.database_path.display());
    info!("Templates directory: {}", config.templates_dir.display());

    let state = AppState::new(&config).context("Failed to initialize application state")?;

    state
        .storage
        .initialize()
        .await
        .context("Failed to initialize order store")?;

    let app = create_router(state);

    let listener = TcpListener::bind(&config.server_address())
        .await
        .with_context(|| format!("Failed to bind to {}", config.server_address()))?;

    info!("Order service running on http://{}", config.server_address());

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    info!("Order service stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for Ctrl+C: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Received Ctrl+C, shutting down");
}
