//! HTTP request handlers for the URL shortener API
//!
//! This module maps HTTP requests onto the services:
//! - Shortening one URL, or up to five at once
//! - Redirecting short URLs to their original destinations
//! - Listing, searching and summarising stored URLs
//! - Reading the click history of one URL

use std::net::IpAddr;

use axum::{
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Redirect, Response},
    Json,
};
use serde_json::json;

use crate::error::{AppError, Result};
use crate::model::{BatchRequest, ListParams, ShortenRequest, Visit};
use crate::resolver::RedirectState;
use crate::state::AppState;

/// Creates a new short URL
///
/// # Request Body
///
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "validity": 30,          // Optional, minutes
///   "shortcode": "mylink"    // Optional
/// }
/// ```
///
/// # Response
///
/// - **201 Created** - The stored record
/// - **400 Bad Request** - A field failed validation (`field` names it)
pub async fn create_short_url(
    State(state): State<AppState>,
    Json(payload): Json<ShortenRequest>,
) -> Result<impl IntoResponse> {
    let record = state.service.shorten(&payload)?;
    Ok((StatusCode::CREATED, Json(record)))
}

/// Creates up to five short URLs in one submission
///
/// Every entry is validated before anything is saved. On failure the
/// response lists the per-field errors of each invalid entry.
pub async fn create_short_urls(
    State(state): State<AppState>,
    Json(payload): Json<BatchRequest>,
) -> Result<impl IntoResponse> {
    let records = state.service.shorten_batch(&payload.urls)?;
    Ok((StatusCode::CREATED, Json(json!({ "data": records }))))
}

/// Redirects a short URL to its original destination
///
/// # Response
///
/// - **307 Temporary Redirect** - Redirects to the original URL
/// - **404 Not Found** - Short URL does not exist
/// - **410 Gone** - Short URL has expired
/// - **500 Internal Server Error** - Storage could not be read
///
/// Uses 307 so every visit reaches the server and is counted.
pub async fn redirect_url(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let visit = visit_from_headers(&headers);

    match state.resolver.resolve(&shortcode, &visit).await {
        RedirectState::Redirecting(url) => Redirect::temporary(&url).into_response(),
        RedirectState::NotFound => (
            StatusCode::NOT_FOUND,
            Json(json!({
                "error": "The requested URL was not found",
                "code": "not_found"
            })),
        )
            .into_response(),
        RedirectState::Expired => (
            StatusCode::GONE,
            Json(json!({
                "error": "This URL has expired",
                "code": "expired"
            })),
        )
            .into_response(),
        RedirectState::Error(message) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({
                "error": message,
                "code": "internal"
            })),
        )
            .into_response(),
        // resolve never hands back a non-terminal state
        RedirectState::Loading => StatusCode::INTERNAL_SERVER_ERROR.into_response(),
    }
}

/// Lists URLs with search, status filter and pagination
///
/// # Query Parameters
///
/// - `q` (optional) - Case-insensitive match on original URL or shortcode
/// - `status` (optional) - `all`, `active` or `expired` (default: `all`)
/// - `page` (optional) - Page number, starts from 1 (default: 1)
/// - `limit` (optional) - Items per page, max 100 (default: 10)
///
/// # Example Request
///
/// `GET /api/urls?q=example&status=active&page=2&limit=20`
pub async fn list_urls(
    State(state): State<AppState>,
    Query(params): Query<ListParams>,
) -> impl IntoResponse {
    Json(state.service.list_urls(&params))
}

/// Returns a URL record with its click history
pub async fn url_analytics(
    Path(shortcode): Path<String>,
    State(state): State<AppState>,
) -> Result<impl IntoResponse> {
    let analytics = state
        .service
        .url_analytics(&shortcode)
        .ok_or(AppError::NotFound)?;
    Ok(Json(analytics))
}

/// Returns total, active and expired counts plus total clicks
pub async fn statistics(State(state): State<AppState>) -> impl IntoResponse {
    Json(state.service.statistics())
}

/// Runs the expiry sweep immediately
pub async fn sweep_expired(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let removed = state.service.sweep_expired()?;
    Ok(Json(json!({ "removed": removed })))
}

/// Extracts the referrer and the proxied client address
fn visit_from_headers(headers: &HeaderMap) -> Visit {
    let referrer = headers
        .get(header::REFERER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);

    let client_ip = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .or_else(|| headers.get("x-real-ip").and_then(|v| v.to_str().ok()))
        .and_then(|v| v.trim().parse::<IpAddr>().ok());

    Visit {
        referrer,
        client_ip,
    }
}
