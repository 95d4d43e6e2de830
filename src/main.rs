use anyhow::Context;
use std::sync::Arc;

use modular_api::{app, config, logging, messaging::LogEventPublisher};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env if present so cargo run picks up DATABASE_URL, JWT_SECRET, etc.
    let _ = dotenvy::dotenv();

    let config = config::config();
    logging::init(&config.logging);
    config.validate().context("invalid configuration")?;

    tracing::info!("Starting Modular API in {:?} mode", config.environment);

    let stores = app::Stores::from_config(&config.database)
        .await
        .context("failed to initialise storage")?;
    let database = stores.database.clone();
    let events = Arc::new(LogEventPublisher::from_config(&config.messaging));

    let router = app::build_app(config, stores, events);

    let bind_addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = tokio::net::TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("failed to bind {}", bind_addr))?;

    tracing::info!("Modular API listening on http://{}", bind_addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    if let Some(database) = database {
        database.close().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for shutdown signal");
        return;
    }
    tracing::info!("Shutdown signal received");
}
