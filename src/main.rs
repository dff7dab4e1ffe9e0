use std::net::SocketAddr;
use std::sync::Arc;

use tracing::info;

use saferoute::api::{AppState, router};
use saferoute::config::ServiceConfig;
use saferoute::logging::init_logging;
use saferoute::{OsrmClient, RoutePlanner, SafetyMap};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = ServiceConfig::from_env();
    init_logging(&config.logging);

    // 1. Safety data
    let zones = match &config.zones_path {
        Some(path) => SafetyMap::from_path(path)?,
        None => SafetyMap::visakhapatnam(),
    };
    info!(zones = zones.zones().len(), "safety catalog ready");

    // 2. Routing engine
    let engine = OsrmClient::new(&config.osrm_url, config.routing_timeout)?;
    let planner = RoutePlanner::new(engine, Arc::new(zones))
        .with_call_timeout(config.routing_timeout);

    let app = router(Arc::new(AppState { planner }));

    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(addr = %addr, osrm = %config.osrm_url, "API server listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
