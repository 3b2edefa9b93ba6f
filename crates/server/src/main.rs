mod api;
mod bootstrap;
mod cart;
mod health;

use std::future::IntoFuture;
use std::time::Duration;

use anyhow::{Context, Result};
use storefront_core::config::{AppConfig, LoadOptions};
use tokio::sync::oneshot;
use tracing::{info, warn};

fn init_logging(config: &AppConfig) {
    use storefront_core::config::LogFormat::*;
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);

    match config.logging.format {
        Compact => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).compact().init();
        }
        Pretty => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).pretty().init();
        }
        Json => {
            tracing_subscriber::fmt().with_target(false).with_max_level(log_level).json().init();
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    run().await
}

async fn run() -> Result<()> {
    let config = AppConfig::load(LoadOptions::default())?;
    init_logging(&config);

    let app = bootstrap::bootstrap_with_config(config).await?;
    let address = format!("{}:{}", app.config.server.bind_address, app.config.server.port);
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .with_context(|| format!("failed to bind `{address}`"))?;

    info!(
        event_name = "system.server.started",
        correlation_id = "bootstrap",
        bind_address = %address,
        "storefront-server started"
    );

    let (stop_tx, stop_rx) = oneshot::channel::<()>();
    let server = tokio::spawn(
        axum::serve(listener, app.router())
            .with_graceful_shutdown(async move {
                let _ = stop_rx.await;
            })
            .into_future(),
    );

    tokio::signal::ctrl_c().await?;
    info!(
        event_name = "system.server.stopping",
        correlation_id = "shutdown",
        "storefront-server stopping"
    );
    let _ = stop_tx.send(());

    let grace = Duration::from_secs(app.config.server.graceful_shutdown_secs);
    match tokio::time::timeout(grace, server).await {
        Ok(joined) => joined.context("server task panicked")??,
        Err(_) => warn!(
            event_name = "system.server.shutdown_timeout",
            correlation_id = "shutdown",
            grace_secs = grace.as_secs(),
            "in-flight requests did not drain before the grace period"
        ),
    }

    Ok(())
}
