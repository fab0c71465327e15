//! Redirect resolution
//!
//! Turns a shortcode into a terminal [`RedirectState`]. A resolution is
//! one-shot: nothing is cached between calls.

use chrono::Utc;
use url::Url;

use crate::analytics::AnalyticsCollector;
use crate::model::Visit;
use crate::store::Store;

/// Progress of a single redirect
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum RedirectState {
    /// Not yet resolved
    #[default]
    Loading,
    NotFound,
    Expired,
    /// Unexpected failure, with its message
    Error(String),
    /// Resolved; carries the destination URL
    Redirecting(String),
}

#[derive(Clone)]
pub struct RedirectResolver {
    store: Store,
    collector: AnalyticsCollector,
}

impl RedirectResolver {
    pub fn new(store: Store, collector: AnalyticsCollector) -> Self {
        Self { store, collector }
    }

    /// Looks up the shortcode, records the click and yields the destination
    ///
    /// Expired and unknown codes record nothing. A failure to record the
    /// click is logged and does not stop the redirect. The destination is
    /// the serialized form of the stored URL, so it is always a valid
    /// `Location` header value.
    pub async fn resolve(&self, shortcode: &str, visit: &Visit) -> RedirectState {
        tracing::info!(shortcode, "Processing redirect");

        let record = match self.store.try_get_url_by_shortcode(shortcode) {
            Ok(Some(record)) => record,
            Ok(None) => {
                tracing::warn!(shortcode, "Shortcode not found");
                return RedirectState::NotFound;
            }
            Err(e) => {
                tracing::error!(shortcode, error = %e, "Redirect error");
                return RedirectState::Error(e.to_string());
            }
        };

        if !record.is_active_at(Utc::now()) {
            tracing::warn!(shortcode, "URL expired");
            return RedirectState::Expired;
        }

        let destination = match Url::parse(&record.original_url) {
            Ok(url) => String::from(url),
            Err(e) => {
                tracing::error!(shortcode, error = %e, "Stored URL is unusable");
                return RedirectState::Error(format!("Stored URL is unusable: {}", e));
            }
        };

        let click = self.collector.track_click(shortcode, visit).await;
        if let Err(e) = self.store.record_click(shortcode, click) {
            tracing::error!(shortcode, error = %e, "Failed to record click");
        }

        tracing::info!(shortcode, url = %destination, "Redirecting to original URL");
        RedirectState::Redirecting(destination)
    }
}
