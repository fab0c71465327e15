//! URL shortening service
//!
//! Composes validation, shortcode generation and the store to turn
//! submissions into saved records, and exposes the read views over them.

use std::collections::HashSet;
use std::sync::Arc;

use chrono::Utc;

use crate::error::{BatchError, EntryErrors, ShortenError, StoreError};
use crate::generator::{generate_shortcode, CodeSource};
use crate::model::{
    ListParams, NewUrl, ShortenRequest, Statistics, StatusFilter, UrlAnalytics, UrlPage, UrlRecord,
    MAX_URLS_PER_REQUEST,
};
use crate::store::Store;
use crate::validator::{validate_shortcode, validate_url, validate_validity};

/// A submission that passed validation, before a code is generated
struct Checked {
    original_url: String,
    validity: u64,
    shortcode: Option<String>,
}

#[derive(Clone)]
pub struct UrlService {
    store: Store,
    codes: Arc<dyn CodeSource>,
    base_url: String,
}

impl UrlService {
    pub fn new(store: Store, codes: Arc<dyn CodeSource>, base_url: impl Into<String>) -> Self {
        Self {
            store,
            codes,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    /// Absolute short link for a shortcode
    pub fn short_url(&self, shortcode: &str) -> String {
        format!("{}/{}", self.base_url, shortcode)
    }

    /// Validates one submission and saves it
    ///
    /// The first failing check wins: URL, then validity, then shortcode.
    pub fn shorten(&self, request: &ShortenRequest) -> Result<UrlRecord, ShortenError> {
        let mut existing = self.store.shortcode_set();
        let checked = check(request, &existing)?;
        let record = self.save(checked, &mut existing)?;
        tracing::info!(shortcode = %record.shortcode, "URL shortened successfully");
        Ok(record)
    }

    /// Validates every submission, then saves them all in order
    ///
    /// Custom shortcodes must also be distinct within the batch. Nothing is
    /// saved unless every entry is valid.
    pub fn shorten_batch(&self, requests: &[ShortenRequest]) -> Result<Vec<UrlRecord>, BatchError> {
        tracing::info!(count = requests.len(), "Submitting URLs for shortening");

        if requests.is_empty() || requests.len() > MAX_URLS_PER_REQUEST {
            return Err(BatchError::Size {
                got: requests.len(),
                max: MAX_URLS_PER_REQUEST,
            });
        }

        let mut existing = self.store.shortcode_set();
        let mut claimed = existing.clone();
        let mut checked = Vec::with_capacity(requests.len());
        let mut errors = Vec::new();

        for (index, request) in requests.iter().enumerate() {
            let entry = check_all(index, request, &claimed);
            if let Some(code) = request.shortcode.as_deref().filter(|c| !c.is_empty()) {
                claimed.insert(code.to_string());
            }
            match entry {
                Ok(c) => checked.push(c),
                Err(e) => errors.push(e),
            }
        }

        if !errors.is_empty() {
            tracing::warn!(invalid = errors.len(), "Batch rejected");
            return Err(BatchError::Invalid(errors));
        }

        // generated codes must avoid custom codes claimed later in the batch
        existing.extend(claimed);
        let mut saved = Vec::with_capacity(checked.len());
        for (index, c) in checked.into_iter().enumerate() {
            let record = self
                .save(c, &mut existing)
                .map_err(|source| BatchError::Failed { index, source })?;
            saved.push(record);
        }

        tracing::info!(count = saved.len(), "Batch shortened successfully");
        Ok(saved)
    }

    /// Runs the expiry sweep once
    pub fn sweep_expired(&self) -> Result<usize, StoreError> {
        self.store.remove_expired_urls()
    }

    /// Searches, filters by status and paginates the stored URLs
    pub fn list_urls(&self, params: &ListParams) -> UrlPage {
        let page = params.page.unwrap_or(1).max(1);
        let limit = params.limit.unwrap_or(10).clamp(1, 100);
        // page comes straight from the query string
        let offset = (page - 1).saturating_mul(limit);
        let now = Utc::now();
        let term = params.q.as_deref().map(str::to_lowercase).filter(|t| !t.is_empty());

        let matching: Vec<UrlRecord> = self
            .store
            .get_urls()
            .into_iter()
            .filter(|u| match &term {
                Some(t) => {
                    u.original_url.to_lowercase().contains(t.as_str())
                        || u.shortcode.to_lowercase().contains(t.as_str())
                }
                None => true,
            })
            .filter(|u| match params.status {
                StatusFilter::All => true,
                StatusFilter::Active => u.is_active_at(now),
                StatusFilter::Expired => !u.is_active_at(now),
            })
            .collect();

        let total = matching.len();
        let data = matching.into_iter().skip(offset).take(limit).collect();
        UrlPage {
            page,
            limit,
            total,
            data,
        }
    }

    /// Counts of stored, active and expired URLs and their clicks
    pub fn statistics(&self) -> Statistics {
        let now = Utc::now();
        let urls = self.store.get_urls();
        let active = urls.iter().filter(|u| u.is_active_at(now)).count();
        Statistics {
            total: urls.len(),
            active,
            expired: urls.len() - active,
            total_clicks: urls.iter().map(|u| u.clicks).sum(),
        }
    }

    /// A stored URL and its click history
    pub fn url_analytics(&self, shortcode: &str) -> Option<UrlAnalytics> {
        let url = self.store.get_url_by_shortcode(shortcode)?;
        let clicks = self.store.get_url_analytics(shortcode);
        Some(UrlAnalytics { url, clicks })
    }

    fn save(&self, checked: Checked, existing: &mut HashSet<String>) -> Result<UrlRecord, ShortenError> {
        let shortcode = match checked.shortcode {
            Some(code) => code,
            None => generate_shortcode(existing, self.codes.as_ref())?,
        };
        existing.insert(shortcode.clone());

        let record = self.store.save_url(NewUrl {
            original_url: checked.original_url,
            short_url: self.short_url(&shortcode),
            shortcode,
            validity: checked.validity,
        })?;
        Ok(record)
    }
}

fn check(request: &ShortenRequest, existing: &HashSet<String>) -> Result<Checked, ShortenError> {
    validate_url(&request.url)?;
    let validity = validate_validity(request.validity.as_ref())?;
    let shortcode = request.shortcode.clone().filter(|c| !c.is_empty());
    if let Some(code) = &shortcode {
        validate_shortcode(code, existing)?;
    }
    Ok(Checked {
        original_url: request.url.clone(),
        validity,
        shortcode,
    })
}

/// Runs every check and collects one error per field
fn check_all(index: usize, request: &ShortenRequest, existing: &HashSet<String>) -> Result<Checked, EntryErrors> {
    let mut errors = EntryErrors::new(index);

    if let Err(e) = validate_url(&request.url) {
        errors.push(&e);
    }
    let validity = validate_validity(request.validity.as_ref()).unwrap_or_else(|e| {
        errors.push(&e);
        0
    });
    let shortcode = request.shortcode.clone().filter(|c| !c.is_empty());
    if let Some(code) = &shortcode {
        if let Err(e) = validate_shortcode(code, existing) {
            errors.push(&e);
        }
    }

    if errors.is_empty() {
        Ok(Checked {
            original_url: request.url.clone(),
            validity,
            shortcode,
        })
    } else {
        Err(errors)
    }
}
