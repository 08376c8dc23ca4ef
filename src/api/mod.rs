//! HTTP ingress for device alerts
//!
//! Edge nodes POST anomaly results here; every accepted body is handed to the
//! coordinator without waiting for the downstream analysis.
//!
//! ## Architecture
//!
//! - **Axum** web framework with Tower middleware
//! - **Actor handles** for the coordinator and (optionally) storage
//!
//! ## Endpoints
//!
//! - `POST /alert` - Device event ingress
//! - `GET /api/v1/health` - Health check
//! - `GET /api/v1/stats` - Region registry statistics
//! - `GET /api/v1/regions/{region}` - Worker statistics for one region
//! - `GET /api/v1/regions/{region}/updates` - Latest stored summaries of a region

#[cfg(feature = "api")]
pub mod error;
#[cfg(feature = "api")]
pub mod routes;
#[cfg(feature = "api")]
pub mod state;
#[cfg(feature = "api")]
pub mod types;

#[cfg(feature = "api")]
pub use error::{ApiError, ApiResult};
#[cfg(feature = "api")]
pub use state::ApiState;
#[cfg(feature = "api")]
pub use types::{
    HealthResponse, IngestResponse, RegionResponse, StatsResponse, UpdatesResponse,
};

#[cfg(feature = "api")]
use axum::{
    Router,
    routing::{get, post},
};
use std::net::SocketAddr;
#[cfg(feature = "api")]
use tracing::info;

use crate::config::IngressConfig;

/// API server configuration
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// Bind address (e.g., "0.0.0.0:8080")
    pub bind_addr: SocketAddr,

    /// Enable permissive CORS
    pub enable_cors: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        IngressConfig::default().into()
    }
}

impl From<IngressConfig> for ApiConfig {
    fn from(config: IngressConfig) -> Self {
        Self {
            bind_addr: config.bind,
            enable_cors: config.cors,
        }
    }
}

/// Build the router with all routes
#[cfg(feature = "api")]
pub fn router(state: ApiState) -> Router {
    use tower_http::trace::TraceLayer;

    Router::new()
        .route("/alert", post(routes::ingest::receive_alert))
        .route("/api/v1/health", get(routes::health::health_check))
        .route("/api/v1/stats", get(routes::stats::get_stats))
        .route("/api/v1/regions/:region", get(routes::regions::get_region))
        .route(
            "/api/v1/regions/:region/updates",
            get(routes::regions::get_region_updates),
        )
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}

/// Spawn the API server
///
/// This starts an Axum HTTP server in a background task.
/// Returns the server's local address.
#[cfg(feature = "api")]
pub async fn spawn_api_server(config: ApiConfig, state: ApiState) -> anyhow::Result<SocketAddr> {
    use tower_http::cors::{Any, CorsLayer};

    info!("starting API server on {}", config.bind_addr);

    let mut app = router(state);

    if config.enable_cors {
        let cors = CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
        app = app.layer(cors);
    }

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    let addr = listener.local_addr()?;

    info!("API server listening on {}", addr);

    tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app).await {
            tracing::error!("API server error: {}", e);
        }
    });

    Ok(addr)
}
