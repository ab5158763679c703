// Spoolstock - Web Server
// Vendor REST API with Axum

use anyhow::{Context, Result};
use tracing::{info, warn};

use spoolstock::api::{self, AppState};
use spoolstock::{telemetry, Config};

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!(error = %e, "failed to listen for ctrl-c");
        std::future::pending::<()>().await;
    }
    info!("shutting down");
}

#[tokio::main]
async fn main() -> Result<()> {
    let config = Config::from_env().context("Failed to read configuration")?;
    telemetry::init_tracing(&config.log_level, config.log_format);

    // Open store
    let store = config.open_store().context("Failed to open vendor store")?;
    info!(db_type = config.db_type.as_str(), "vendor store ready");

    // Build router
    let state = AppState::new(store, config.db_type);
    let app = api::router(state).layer(api::cors_layer(&config.cors_origins));

    // Start server
    let addr = config.bind_addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind to {}", addr))?;

    info!(%addr, version = spoolstock::VERSION, "server running");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    Ok(())
}
