//! API Gateway Library
//!
//! This crate provides the HTTP REST API for bookkeeping and the course
//! catalogue, translating requests to gRPC calls on the backing services.

pub mod clients;
pub mod config;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;
pub mod state;

use std::net::SocketAddr;
use std::sync::Arc;

use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::clients::{CourseClient, LedgerClient};
use crate::config::GatewayConfig;
use crate::middleware::Cache;
use crate::routes::create_router;
use crate::state::AppState;

/// Run the gateway as an embedded component (for combined binary).
pub async fn run_embedded(
    host: &str,
    port: u16,
    ledger_port: u16,
    course_port: u16,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = GatewayConfig::from_env();
    config.ledger_service.endpoint = format!("http://{}:{}", loopback(host), ledger_port);
    config.course_service.endpoint = format!("http://{}:{}", loopback(host), course_port);

    run_server_with_config(host, port, config).await
}

/// Services bound to the wildcard address are reached over loopback.
fn loopback(host: &str) -> &str {
    if host == "0.0.0.0" {
        "127.0.0.1"
    } else {
        host
    }
}

/// Run the HTTP server with the given configuration.
async fn run_server_with_config(
    host: &str,
    port: u16,
    config: GatewayConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    if config.jwt.secret.is_empty() {
        warn!("JWT secret is empty; every authenticated request will be rejected");
    }

    // Create gRPC clients
    let ledger = Arc::new(LedgerClient::connect(&config.ledger_service).await?);
    let courses = Arc::new(CourseClient::connect(&config.course_service).await?);

    // Create cache
    let cache = Arc::new(Cache::connect(&config.cache).await?);

    // Create app state
    let state = AppState::new(ledger, courses, cache, config);

    // Build router
    let app = create_router(state).layer(TraceLayer::new_for_http());

    // Build address
    let addr: SocketAddr = format!("{}:{}", host, port).parse()?;
    info!("Gateway listening on {}", addr);

    // Run server
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_wildcard_host_dials_loopback() {
        assert_eq!(loopback("0.0.0.0"), "127.0.0.1");
        assert_eq!(loopback("10.0.0.5"), "10.0.0.5");
    }
}
