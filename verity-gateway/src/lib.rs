//! Verity Gateway
//!
//! HTTP front for the verdict aggregator. Accepts one claim per request
//! and returns the aggregated verdict with its evidence.

pub mod handlers;

use std::sync::Arc;

use axum::http::HeaderValue;
use tokio::net::TcpListener;
use tower_http::cors::{AllowHeaders, AllowMethods, AllowOrigin, CorsLayer};
use tracing::info;

use handlers::{create_router, AppState};
use verity_runtime::{ServerConfig, VerdictAggregator};

/// Gateway error
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    #[error("Configuration error: {0}")]
    Config(#[from] verity_runtime::ConfigError),

    #[error("Invalid CORS origin '{0}'")]
    Origin(String),

    #[error("Failed to bind server: {0}")]
    Bind(#[from] std::io::Error),

    #[error("Server error: {0}")]
    Server(String),
}

/// CORS policy for browser clients on the listed origins
///
/// Credentials are allowed, so methods and headers mirror the preflight
/// request instead of using a wildcard.
pub fn cors_layer(allowed_origins: &[String]) -> Result<CorsLayer, GatewayError> {
    let origins = allowed_origins
        .iter()
        .map(|origin| {
            // A wildcard cannot be combined with credentials
            if origin.trim() == "*" {
                return Err(GatewayError::Origin(origin.clone()));
            }
            HeaderValue::from_str(origin.trim_end_matches('/'))
                .map_err(|_| GatewayError::Origin(origin.clone()))
        })
        .collect::<Result<Vec<_>, _>>()?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(AllowMethods::mirror_request())
        .allow_headers(AllowHeaders::mirror_request())
        .allow_credentials(true))
}

/// Serve the gateway until the process is stopped
pub async fn start_server(server: &ServerConfig, aggregator: VerdictAggregator) -> Result<(), GatewayError> {
    let addr = server.bind_addr()?;
    let cors = cors_layer(&server.allowed_origins)?;

    info!("Classifier: {}", aggregator.classifier_name());
    info!("Allowed origins: {:?}", server.allowed_origins);
    let app = create_router(AppState::new(Arc::new(aggregator)), cors);

    let listener = TcpListener::bind(addr).await?;
    info!("Gateway listening on {}", listener.local_addr()?);

    axum::serve(listener, app)
        .await
        .map_err(|e| GatewayError::Server(e.to_string()))
}
