//! Forexa API Server
//!
//! Main entry point for the Forexa conversion service.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use forexa_api::{AppState, create_router};
use forexa_core::currency::{CurrencyConverter, RateResolver};
use forexa_core::stress::StressRunner;
use forexa_shared::AppConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "forexa=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Create rate resolver
    let resolver =
        RateResolver::from_config(&config.rates).context("Failed to build rate resolver")?;
    info!(
        source = resolver.source_name(),
        cache_ttl_secs = config.rates.cache_ttl_secs,
        timeout_ms = config.rates.timeout_ms,
        "Rate resolver configured"
    );

    // Create application state
    let converter = Arc::new(CurrencyConverter::new(Arc::new(resolver)));
    let stress = StressRunner::from_config(converter.clone(), &config.stress)?;
    let shutdown = CancellationToken::new();
    let state = AppState::new(converter, stress, shutdown.clone());

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            tokio::signal::ctrl_c().await.ok();
            info!("Shutdown signal received");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
