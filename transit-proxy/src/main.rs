use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use transit_proxy::config::ProxyConfig;
use transit_proxy::proxy::TransitProxy;
use transit_proxy::upstream::TransitClient;
use transit_proxy::web::{AppState, create_router};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = ProxyConfig::from_env()?;

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    if config.json_logs {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer())
            .init();
    }

    let upstream = Arc::new(TransitClient::new(config.upstream.clone())?);
    let proxy = TransitProxy::new(
        upstream,
        config.directory.clone(),
        &config.cache,
        config.batch.clone(),
    );
    let app = create_router(AppState::new(proxy));

    let listener = tokio::net::TcpListener::bind(config.bind).await?;
    info!(
        addr = %config.bind,
        upstream = %config.upstream.base_url,
        arrival_ttl_secs = config.cache.arrival_ttl.as_secs(),
        directory_ttl_secs = config.directory.ttl.as_secs(),
        "transit proxy listening"
    );
    info!("endpoints: GET /health, GET /api/arrivals?code=, POST /api/arrivals/batch, GET /api/stops/:code");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutdown complete");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
}
