//! Route definitions for the URL shortener API
//!
//! This module configures all HTTP routes and maps them to their respective handlers.

use axum::routing::{get, post};
use axum::Router;

use crate::handler::{
    create_short_url, create_short_urls, list_urls, redirect_url, statistics, sweep_expired,
    url_analytics,
};
use crate::state::AppState;

/// Creates and configures the Axum application router with all routes
///
/// # Route Definitions
///
/// - `GET /{shortcode}` - Redirects to the original URL
/// - `GET /api/urls` - Lists URLs with search and pagination
/// - `POST /api/urls` - Creates one short URL
/// - `POST /api/urls/batch` - Creates up to five short URLs
/// - `GET /api/urls/{shortcode}/analytics` - Click history of one URL
/// - `GET /api/stats` - Aggregate counts
/// - `POST /api/sweep` - Removes expired URLs now
///
/// # Example Usage
///
/// ```no_run
/// # use std::sync::Arc;
/// # use snaplink::analytics::NullGeolocator;
/// # use snaplink::route::create_app;
/// # use snaplink::state::AppState;
/// # use snaplink::store::Store;
/// let store = Store::open("data.db").unwrap();
/// let state = AppState::new(store, Arc::new(NullGeolocator), "http://localhost:8080");
/// let app = create_app(state);
/// // axum::serve(listener, app).await.unwrap();
/// ```
pub fn create_app(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/urls", get(list_urls).post(create_short_url))
        .route("/urls/batch", post(create_short_urls))
        .route("/urls/{shortcode}/analytics", get(url_analytics))
        .route("/stats", get(statistics))
        .route("/sweep", post(sweep_expired));

    Router::new()
        // Public redirect endpoint
        .route("/{shortcode}", get(redirect_url))
        // Mount API routes under /api
        .nest("/api", api_routes)
        // Inject the application state into all handlers
        .with_state(state)
}
