//! Click analytics collection
//!
//! Builds a [`ClickRecord`] for each redirect from the referrer and a
//! best-effort geolocation lookup. Nothing in here can fail a redirect:
//! lookup problems degrade to `Unknown`.

use std::net::IpAddr;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{SecondsFormat, Utc};
use serde::Deserialize;
use url::Url;

use crate::model::{ClickRecord, LocationDetails, Visit, UNKNOWN};

/// Platforms recognised by a hostname substring match, checked in order
const KNOWN_SOURCES: &[&str] = &["google", "facebook", "twitter", "linkedin"];

/// Source of coarse visitor locations
#[async_trait]
pub trait Geolocator: Send + Sync + 'static {
    /// Looks up the location of `ip`, or of the caller when `None`
    async fn locate(&self, ip: Option<IpAddr>) -> Result<LocationDetails, String>;
}

/// Always reports an unknown location; used when lookups are disabled
#[derive(Debug, Clone, Copy, Default)]
pub struct NullGeolocator;

#[async_trait]
impl Geolocator for NullGeolocator {
    async fn locate(&self, _ip: Option<IpAddr>) -> Result<LocationDetails, String> {
        Ok(LocationDetails::unknown())
    }
}

#[derive(Deserialize)]
struct IpApiResponse {
    city: Option<String>,
    region: Option<String>,
    country_name: Option<String>,
}

/// Queries an ipapi.co-compatible endpoint
#[derive(Debug, Clone)]
pub struct IpApiGeolocator {
    client: reqwest::Client,
    base_url: String,
}

impl IpApiGeolocator {
    pub fn new(base_url: impl Into<String>) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(3))
            .build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, ip: Option<IpAddr>) -> String {
        match ip {
            Some(ip) => format!("{}/{}/json/", self.base_url, ip),
            None => format!("{}/json/", self.base_url),
        }
    }
}

#[async_trait]
impl Geolocator for IpApiGeolocator {
    async fn locate(&self, ip: Option<IpAddr>) -> Result<LocationDetails, String> {
        let body: IpApiResponse = self
            .client
            .get(self.endpoint(ip))
            .send()
            .await
            .and_then(|r| r.error_for_status())
            .map_err(|e| e.to_string())?
            .json()
            .await
            .map_err(|e| e.to_string())?;

        let or_unknown = |v: Option<String>| v.filter(|s| !s.is_empty()).unwrap_or_else(|| UNKNOWN.to_string());
        Ok(LocationDetails {
            city: or_unknown(body.city),
            region: or_unknown(body.region),
            country: or_unknown(body.country_name),
        })
    }
}

/// Derives the traffic source label from a referrer
pub fn classify_source(referrer: Option<&str>) -> String {
    let referrer = match referrer {
        Some(r) if !r.is_empty() => r,
        _ => return "direct".to_string(),
    };

    let hostname = match Url::parse(referrer) {
        Ok(url) => url.host_str().unwrap_or_default().to_string(),
        Err(_) => return "unknown".to_string(),
    };

    KNOWN_SOURCES
        .iter()
        .find(|tag| hostname.contains(*tag))
        .map(|tag| tag.to_string())
        .unwrap_or(hostname)
}

/// Produces click records for redirects
#[derive(Clone)]
pub struct AnalyticsCollector {
    geolocator: Arc<dyn Geolocator>,
}

impl AnalyticsCollector {
    pub fn new(geolocator: Arc<dyn Geolocator>) -> Self {
        Self { geolocator }
    }

    /// Builds the click record for one visit; never fails
    pub async fn track_click(&self, shortcode: &str, visit: &Visit) -> ClickRecord {
        tracing::info!(shortcode, "Tracking click");

        let lookup = async {
            self.geolocator
                .locate(visit.client_ip)
                .await
                .unwrap_or_else(|e| {
                    tracing::error!(shortcode, error = %e, "Failed to get geolocation");
                    LocationDetails::unknown()
                })
        };
        let source = async { classify_source(visit.referrer.as_deref()) };
        let (location, source) = tokio::join!(lookup, source);

        ClickRecord {
            timestamp: Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            source,
            location: location.display(),
            location_details: location,
        }
    }
}
