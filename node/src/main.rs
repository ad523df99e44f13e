// Copyright (c) 2025 Varshith Gudur. Licensed under AGPLv3.
use std::sync::Arc;

use graffiti_node::config::LocalNodeConfig;
use graffiti_node::server::build_router;
use graffiti_node::store::MemoryFeedStore;
use graffiti_node::telemetry::init_telemetry;
use tokio::net::TcpListener;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_telemetry();

    let cfg = LocalNodeConfig::from_env()?;
    tracing::info!("Initializing local storage node with config: {:?}", cfg);

    let store = Arc::new(MemoryFeedStore::new());
    let app = build_router(store, cfg.auth_token.clone());

    tracing::info!("Listening on {}", cfg.bind_addr);
    let listener = TcpListener::bind(cfg.bind_addr).await?;
    axum::serve(listener, app).await?;
    Ok(())
}
