//! webcalc - a web calculator
//!
//! Serves a calculator page whose input state machine runs server-side,
//! plus the arithmetic endpoint each calculator session evaluates against.

mod api;
mod arith;
mod config;
mod display;
mod endpoint;
mod runtime;
mod state_machine;

use api::{create_router, AppState};
use config::Config;
use endpoint::HttpEndpoint;
use runtime::SessionManager;
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::{
    compression::CompressionLayer,
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "webcalc=info,tower_http=debug".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .json()
                .with_current_span(false)
                .with_span_list(false),
        )
        .init();

    let config = Config::from_env();

    // Sessions reach the arithmetic endpoint over HTTP, by default this server
    let endpoint = HttpEndpoint::new(&config.api_url, config.request_timeout)?;
    tracing::info!(
        api_url = %endpoint.base_url(),
        error_reset_ms = config.error_reset_delay.as_millis(),
        status_ms = config.status_duration.as_millis(),
        "Arithmetic endpoint configured"
    );

    let sessions = SessionManager::new(Arc::new(endpoint), config.session_settings());
    let state = AppState::new(Arc::new(sessions));

    // Create router
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let compression = CompressionLayer::new()
        .gzip(true)
        .br(true)
        .deflate(true)
        .zstd(true);

    let app = create_router(state)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(compression);

    // Start server
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    tracing::info!("Calculator server listening on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
