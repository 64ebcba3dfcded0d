use std::process::ExitCode;

use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use station_server::cache::DiskCache;
use station_server::config::ServerConfig;
use station_server::feed::FeedSource;
use station_server::network::Network;
use station_server::web::{AppState, create_router};

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = match ServerConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    // Build the network before serving; every request reads it.
    let pipeline = config.pipeline.clone();
    let feed_path = config.feed_path.clone();
    let cache = config.cache.clone().map(DiskCache::new);
    info!(feed = %feed_path.display(), "loading feed");

    let loaded = tokio::task::spawn_blocking(move || {
        let source = FeedSource::open(&feed_path)?;
        Network::load(&source, &pipeline, cache.as_ref())
    })
    .await;

    let network = match loaded {
        Ok(Ok(network)) => network,
        Ok(Err(e)) => {
            error!("failed to load network: {e}");
            return ExitCode::FAILURE;
        }
        Err(e) => {
            error!("network loader panicked: {e}");
            return ExitCode::FAILURE;
        }
    };

    let state = AppState::new(network, config.route.clone());
    let app = create_router(state);

    let listener = match tokio::net::TcpListener::bind(config.bind_addr).await {
        Ok(listener) => listener,
        Err(e) => {
            error!("failed to bind {}: {e}", config.bind_addr);
            return ExitCode::FAILURE;
        }
    };

    info!(addr = %config.bind_addr, "station server listening");
    info!("  GET /health");
    info!("  GET /api/stations");
    info!("  GET /api/edges");
    info!("  GET /api/hubs?k=");
    info!("  GET /api/route?src=&dst=&lambda=&top_k=");

    if let Err(e) = axum::serve(listener, app).await {
        error!("server error: {e}");
        return ExitCode::FAILURE;
    }
    ExitCode::SUCCESS
}
