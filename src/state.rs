//! Application state shared across all request handlers

use std::sync::Arc;

use crate::analytics::{AnalyticsCollector, Geolocator};
use crate::generator::{CodeSource, RandomCodeSource};
use crate::resolver::RedirectResolver;
use crate::service::UrlService;
use crate::store::Store;

/// Services wired around one [`Store`], built once at startup
///
/// Cloning is cheap: every clone shares the same database handle.
#[derive(Clone)]
pub struct AppState {
    pub store: Store,
    pub service: UrlService,
    pub resolver: RedirectResolver,
}

impl AppState {
    pub fn new(store: Store, geolocator: Arc<dyn Geolocator>, base_url: &str) -> Self {
        Self::with_code_source(store, geolocator, Arc::new(RandomCodeSource), base_url)
    }

    pub fn with_code_source(
        store: Store,
        geolocator: Arc<dyn Geolocator>,
        codes: Arc<dyn CodeSource>,
        base_url: &str,
    ) -> Self {
        let service = UrlService::new(store.clone(), codes, base_url);
        let resolver = RedirectResolver::new(store.clone(), AnalyticsCollector::new(geolocator));
        Self {
            store,
            service,
            resolver,
        }
    }
}
