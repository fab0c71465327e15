//! Application entry point and server initialization
//!
//! This module contains the main function that:
//! - Loads environment configuration
//! - Opens the store and starts the expiry sweep
//! - Starts the HTTP server with graceful shutdown support

use std::sync::Arc;

use tokio::net::TcpListener;
use tokio::signal;
use tower_http::trace::TraceLayer;

use snaplink::analytics::{Geolocator, IpApiGeolocator, NullGeolocator};
use snaplink::config::Config;
use snaplink::route::create_app;
use snaplink::state::AppState;
use snaplink::store::Store;
use snaplink::sweeper::spawn_expiry_sweep;

#[tokio::main]
async fn main() {
    let config = Config::from_env().expect("Invalid configuration");

    tracing_subscriber::fmt()
        .with_env_filter(config.log_filter.as_str())
        .init();

    let store = Store::open(&config.database_url)
        .expect("Failed to initialize database")
        .with_quota(config.storage_quota_bytes);

    let geolocator: Arc<dyn Geolocator> = match &config.geolocation_url {
        Some(url) => Arc::new(IpApiGeolocator::new(url.as_str()).expect("Failed to build HTTP client")),
        None => Arc::new(NullGeolocator),
    };

    let state = AppState::new(store.clone(), geolocator, &config.base_url);

    // Sweeps once immediately, then on every interval
    spawn_expiry_sweep(store, config.sweep_interval);

    let app = create_app(state).layer(TraceLayer::new_for_http());

    let listener = TcpListener::bind(config.server_address())
        .await
        .expect("Failed to bind address");

    tracing::info!(port = config.port, database = %config.database_url, "🚀 Server running at {}", config.base_url);

    // The server will continue running until it receives SIGTERM or SIGINT
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Server error");
}

/// Handles graceful shutdown signals
///
/// Returns on SIGINT (Ctrl+C) or, on Unix, SIGTERM so in-flight requests
/// and database transactions can finish.
async fn shutdown_signal() {
    let ctrl_c = async {
        signal::ctrl_c()
            .await
            .expect("Failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        signal::unix::signal(signal::unix::SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("🛑 Shutdown signal received, stopping server.");
}
