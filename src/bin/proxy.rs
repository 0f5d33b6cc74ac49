//! procflow credential proxy
//!
//! Forwards document reads and writes to the hosted store so the store's
//! write key stays on the server. See [`procflow::proxy`] for configuration
//! and endpoints.

use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use procflow::proxy::{router, AppState, ProxyConfig};

#[tokio::main]
async fn main() {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "procflow_proxy=info,procflow=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = ProxyConfig::from_env();
    tracing::info!("Upstream: {}", config.upstream);
    if let Some(bin) = &config.pinned_bin {
        tracing::info!("Serving only document {}", bin);
    }

    let state = match AppState::new(&config) {
        Ok(state) => state,
        Err(e) => {
            tracing::error!("Failed to create upstream client: {}", e);
            std::process::exit(1);
        }
    };
    if !state.accepts_clients() {
        tracing::warn!("No client key configured - all document requests will be refused");
    }

    let app = router(state);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Starting proxy on {}", addr);

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(e) => {
            tracing::error!("Failed to bind {}: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
