//! Data models for the URL shortener application
//!
//! This module defines all the data structures used throughout the application,
//! including request/response models and the stored URL and click records.
//! Stored records serialize in camelCase so the persisted blobs keep the
//! `originalUrl` / `expiresAt` layout.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default validity period in minutes when none is supplied
pub const DEFAULT_VALIDITY_MINUTES: u64 = 30;

/// Maximum number of URLs accepted in one submission
pub const MAX_URLS_PER_REQUEST: usize = 5;

/// Placeholder for any location field the lookup could not provide
pub const UNKNOWN: &str = "Unknown";

/// Represents a shortened URL stored in the `shortened_urls` blob
///
/// Records are immutable after creation apart from the click counter.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UrlRecord {
    /// Timestamp-derived identifier, unique per insert
    pub id: String,

    /// The original long URL that was shortened
    pub original_url: String,

    /// The 3-20 character alphanumeric code addressing this record
    pub shortcode: String,

    /// Validity period in minutes
    pub validity: u64,

    /// The complete shortened URL (e.g., "http://localhost:8080/abc123")
    pub short_url: String,

    /// Timestamp when this URL record was created
    pub created_at: DateTime<Utc>,

    /// `created_at` plus the validity period
    pub expires_at: DateTime<Utc>,

    /// Number of recorded visits
    /// Defaults to 0 if not present during deserialization
    #[serde(default)]
    pub clicks: u64,
}

impl UrlRecord {
    /// A record is active while its expiry is strictly in the future
    pub fn is_active_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

/// A validated URL ready to be stamped and stored
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUrl {
    pub original_url: String,
    pub shortcode: String,
    pub validity: u64,
    pub short_url: String,
}

/// City/region/country triple from the geolocation lookup
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct LocationDetails {
    pub city: String,
    pub region: String,
    pub country: String,
}

impl LocationDetails {
    pub fn unknown() -> Self {
        Self {
            city: UNKNOWN.to_string(),
            region: UNKNOWN.to_string(),
            country: UNKNOWN.to_string(),
        }
    }

    /// Human-readable "city, country"
    pub fn display(&self) -> String {
        format!("{}, {}", self.city, self.country)
    }
}

impl Default for LocationDetails {
    fn default() -> Self {
        Self::unknown()
    }
}

/// One observed visit against a shortcode
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ClickRecord {
    /// ISO-8601 time of the visit
    pub timestamp: String,

    /// `direct`, a known platform tag, the referrer hostname, or `unknown`
    pub source: String,

    /// "city, country"
    pub location: String,

    #[serde(default)]
    pub location_details: LocationDetails,
}

/// Request payload for shortening one URL
///
/// # Example
/// ```json
/// {
///   "url": "https://example.com/very/long/url",
///   "validity": 45,
///   "shortcode": "mylink"
/// }
/// ```
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ShortenRequest {
    /// The original URL to be shortened
    #[serde(default)]
    pub url: String,

    /// Minutes until expiry; a number or numeric string, blank means 30
    #[serde(default)]
    pub validity: Option<serde_json::Value>,

    /// Optional custom shortcode; a random 8-character code is generated otherwise
    #[serde(default)]
    pub shortcode: Option<String>,
}

/// Request payload for shortening up to five URLs at once
#[derive(Deserialize, Debug, Clone)]
pub struct BatchRequest {
    pub urls: Vec<ShortenRequest>,
}

/// Status filter for listing URLs
#[derive(Deserialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum StatusFilter {
    #[default]
    All,
    Active,
    Expired,
}

/// Query parameters for listing URLs with search and pagination
///
/// # Example
/// Query string: `?q=example&status=active&page=2&limit=20`
#[derive(Deserialize, Debug, Clone, Default)]
pub struct ListParams {
    /// Case-insensitive match against original URL or shortcode
    pub q: Option<String>,

    #[serde(default)]
    pub status: StatusFilter,

    /// Page number for pagination (starts from 1)
    /// Defaults to 1 if not provided
    pub page: Option<usize>,

    /// Number of items per page
    /// Defaults to 10 if not provided, maximum is 100
    pub limit: Option<usize>,
}

/// One page of listed URLs
#[derive(Serialize, Debug, Clone)]
pub struct UrlPage {
    pub page: usize,
    pub limit: usize,
    pub total: usize,
    pub data: Vec<UrlRecord>,
}

/// Aggregate counts across all stored URLs
#[derive(Serialize, Debug, Clone, Copy, Default, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total: usize,
    pub active: usize,
    pub expired: usize,
    pub total_clicks: u64,
}

/// A URL record together with its click history
#[derive(Serialize, Debug, Clone)]
pub struct UrlAnalytics {
    pub url: UrlRecord,
    pub clicks: Vec<ClickRecord>,
}

/// What is known about a visitor at redirect time
#[derive(Debug, Clone, Default)]
pub struct Visit {
    /// Value of the `Referer` header, if any
    pub referrer: Option<String>,

    /// Client address forwarded by a proxy, if any
    pub client_ip: Option<std::net::IpAddr>,
}
