use std::sync::Arc;

use anyhow::Result;
use tracing::info;
use tracing_subscriber::EnvFilter;

use nabemap_api::{build_router, AppState};
use nabemap_common::AppConfig;
use nabemap_resolver::NeighborhoodResolver;

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("nabemap=info".parse()?))
        .init();

    let config = AppConfig::from_env()?;

    // Load eagerly: without boundaries every lookup would be wrong, so refuse to start.
    let resolver = NeighborhoodResolver::from_config(&config.file);
    let set = resolver.neighborhoods().await?;
    info!(count = set.len(), "Neighborhood dataset ready");

    let state = Arc::new(AppState { resolver });
    let app = build_router(state, &config.file.server.allowed_origins);

    let addr = config.bind_addr();
    info!("Nabemap API starting on {addr}");

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
