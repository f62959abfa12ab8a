//! # Slotbook API
//!
//! The API crate provides the web server for the Slotbook booking service.
//! Providers publish their bookable time slots per date, customers book them
//! online and providers get notified.
//!
//! ## Architecture
//!
//! This crate follows a layered architecture:
//!
//! - **Routes**: Define API endpoints and URL structure
//! - **Handlers**: Turn requests into calls on the availability service
//! - **Middleware**: Provider credentials and error-to-HTTP mapping
//! - **Config**: Handle environment and application configuration
//!
//! Business rules live in `slotbook-core`; storage is whatever
//! `MarketStore` the service was built with.

/// Configuration module for API settings
pub mod config;
/// Request handlers
pub mod handlers;
/// Middleware for authentication and error handling
pub mod middleware;
/// Route definitions and API endpoint structure
pub mod routes;

use std::sync::Arc;
use std::time::Duration;

use axum::http::{header, HeaderName, HeaderValue, Method};
use axum::Router;
use eyre::Result;
use slotbook_core::service::AvailabilityService;
use tokio::net::TcpListener;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Shared application state that is accessible to all request handlers
pub struct ApiState {
    pub service: AvailabilityService,
}

/// All routes with state attached and no outer layers.
pub fn app(state: Arc<ApiState>) -> Router {
    Router::new()
        // Health check endpoints
        .merge(routes::health::routes())
        // Provider registration and credentials
        .merge(routes::provider::routes())
        // Slot generation and availability documents
        .merge(routes::availability::routes())
        // Customer bookings and provider notifications
        .merge(routes::booking::routes())
        .with_state(state)
}

/// [`app`] wrapped in request tracing, the request timeout and CORS.
pub fn build_router(state: Arc<ApiState>, config: &config::ApiConfig) -> Router {
    let app = app(state).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(TimeoutLayer::new(Duration::from_secs(config.request_timeout))),
    );

    // Apply CORS configuration if origins are specified
    match &config.cors_origins {
        Some(origins) => app.layer(cors_layer(origins)),
        None => app,
    }
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            header::ACCEPT,
            HeaderName::from_static(middleware::auth::PROVIDER_KEY_HEADER),
        ])
        .allow_origin(allowed)
        .allow_credentials(true)
}

/// Installs the global `fmt` subscriber at `level`.
pub fn init_tracing(level: Level) -> Result<()> {
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

/// Serves the API on `config.server_addr()` until the process is stopped.
///
/// # Example
///
/// ```rust,no_run
/// # use std::sync::Arc;
/// # use slotbook_api::{config::ApiConfig, start_server, ApiState};
/// # use slotbook_core::{service::{AvailabilityService, DEFAULT_STORE_TIMEOUT}, store::ChangeFeed};
/// # use slotbook_db::InMemoryStore;
/// # async fn run() -> eyre::Result<()> {
/// let config = ApiConfig::from_env()?;
/// let store = Arc::new(InMemoryStore::new(ChangeFeed::default()));
/// let service = AvailabilityService::new(store, DEFAULT_STORE_TIMEOUT);
/// start_server(config, Arc::new(ApiState { service })).await?;
/// # Ok(())
/// # }
/// ```
pub async fn start_server(config: config::ApiConfig, state: Arc<ApiState>) -> Result<()> {
    let app = build_router(state, &config);

    // Start the HTTP server
    let addr = config.server_addr();
    let listener = TcpListener::bind(&addr).await?;
    info!("Server listening on http://{}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
