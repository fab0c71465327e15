//! Persistent store for URL records and click records
//!
//! Two logical tables live as whole JSON blobs under [`URLS_KEY`] and
//! [`ANALYTICS_KEY`]. Every read deserializes the full blob and every write
//! replaces it. Each blob is size-bounded by an optional quota.
//!
//! Reads come in two flavours: the `try_*` methods report missing data and
//! unreadable data differently, while the plain getters log failures and
//! fall back to empty values.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use redb::{Database, ReadableDatabase, ReadableTable, Table};
use serde::{de::DeserializeOwned, Serialize};

use crate::database::{init_db, ANALYTICS_KEY, TABLE_STORAGE, URLS_KEY};
use crate::error::StoreError;
use crate::model::{ClickRecord, NewUrl, UrlRecord};

/// Click history keyed by shortcode
pub type AnalyticsMap = HashMap<String, Vec<ClickRecord>>;

/// Outcome of [`Store::record_click`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ClickRecorded {
    /// Whether a URL record with that shortcode existed and had its counter bumped
    pub counted: bool,
}

/// Handle to the persistence medium, shared by every service
///
/// Cheap to clone; clones share the same database.
#[derive(Clone)]
pub struct Store {
    db: Arc<Database>,
    quota: Option<usize>,
}

impl Store {
    pub fn new(db: Database) -> Self {
        Self {
            db: Arc::new(db),
            quota: None,
        }
    }

    /// Opens (or creates) the database file and wraps it
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        Ok(Self::new(init_db(path)?))
    }

    /// Limits the serialized size of each blob, in bytes
    pub fn with_quota(mut self, limit: Option<usize>) -> Self {
        self.quota = limit;
        self
    }

    /// All URL records in insertion order; unreadable data yields an empty list
    pub fn get_urls(&self) -> Vec<UrlRecord> {
        self.try_get_urls().unwrap_or_else(|e| {
            tracing::error!("Failed to retrieve URLs from storage: {}", e);
            Vec::new()
        })
    }

    /// All URL records in insertion order, or why they could not be read
    pub fn try_get_urls(&self) -> Result<Vec<UrlRecord>, StoreError> {
        let raw = self.read_blob(URLS_KEY)?;
        decode(URLS_KEY, raw)
    }

    /// Stamps and appends a new record, returning it as stored
    pub fn save_url(&self, new: NewUrl) -> Result<UrlRecord, StoreError> {
        self.save_url_at(new, Utc::now())
    }

    /// [`Store::save_url`] with an explicit creation time
    ///
    /// The uniqueness check and the append run in one write transaction, so
    /// two inserts of the same shortcode cannot both succeed.
    pub fn save_url_at(&self, new: NewUrl, now: DateTime<Utc>) -> Result<UrlRecord, StoreError> {
        let write_txn = self.db.begin_write()?;
        let record = {
            let mut table = write_txn.open_table(TABLE_STORAGE)?;
            let mut urls: Vec<UrlRecord> = decode_lenient(URLS_KEY, blob(&table, URLS_KEY)?);

            if urls.iter().any(|u| u.shortcode == new.shortcode) {
                return Err(StoreError::ShortcodeConflict(new.shortcode));
            }

            let record = UrlRecord {
                id: next_id(&urls, now),
                original_url: new.original_url,
                shortcode: new.shortcode,
                validity: new.validity,
                short_url: new.short_url,
                created_at: now,
                expires_at: expiry_for(now, new.validity),
                clicks: 0,
            };
            urls.push(record.clone());

            let json = self.encode(URLS_KEY, &urls)?;
            table.insert(URLS_KEY, json.as_str())?;
            record
        };
        write_txn.commit()?;

        tracing::info!(shortcode = %record.shortcode, "URL saved to storage");
        Ok(record)
    }

    /// First record with the given shortcode
    pub fn get_url_by_shortcode(&self, shortcode: &str) -> Option<UrlRecord> {
        self.get_urls().into_iter().find(|u| u.shortcode == shortcode)
    }

    /// Like [`Store::get_url_by_shortcode`], but read failures are reported
    pub fn try_get_url_by_shortcode(&self, shortcode: &str) -> Result<Option<UrlRecord>, StoreError> {
        Ok(self
            .try_get_urls()?
            .into_iter()
            .find(|u| u.shortcode == shortcode))
    }

    /// Shortcodes of every stored record, in insertion order
    pub fn get_all_shortcodes(&self) -> Vec<String> {
        self.get_urls().into_iter().map(|u| u.shortcode).collect()
    }

    /// The live uniqueness set
    pub fn shortcode_set(&self) -> HashSet<String> {
        self.get_all_shortcodes().into_iter().collect()
    }

    /// Appends a click and bumps the owning record's counter
    ///
    /// The two updates are separate transactions. If the second fails the
    /// click is kept but not counted. A click for an unknown shortcode is
    /// still appended to the history.
    pub fn record_click(&self, shortcode: &str, click: ClickRecord) -> Result<ClickRecorded, StoreError> {
        let write_txn = self.db.begin_write()?;
        {
            let mut table = write_txn.open_table(TABLE_STORAGE)?;
            let mut analytics: AnalyticsMap =
                decode_lenient(ANALYTICS_KEY, blob(&table, ANALYTICS_KEY)?);
            analytics.entry(shortcode.to_string()).or_default().push(click);

            let json = self.encode(ANALYTICS_KEY, &analytics)?;
            table.insert(ANALYTICS_KEY, json.as_str())?;
        }
        write_txn.commit()?;

        let write_txn = self.db.begin_write()?;
        let counted = {
            let mut table = write_txn.open_table(TABLE_STORAGE)?;
            let mut urls: Vec<UrlRecord> = decode_lenient(URLS_KEY, blob(&table, URLS_KEY)?);
            match urls.iter_mut().find(|u| u.shortcode == shortcode) {
                Some(url) => {
                    url.clicks += 1;
                    let json = self.encode(URLS_KEY, &urls)?;
                    table.insert(URLS_KEY, json.as_str())?;
                    true
                }
                None => false,
            }
        };
        write_txn.commit()?;

        tracing::info!(shortcode, counted, "Click recorded");
        Ok(ClickRecorded { counted })
    }

    /// Click history of every shortcode; unreadable data yields an empty map
    pub fn get_analytics(&self) -> AnalyticsMap {
        self.try_get_analytics().unwrap_or_else(|e| {
            tracing::error!("Failed to retrieve analytics: {}", e);
            AnalyticsMap::new()
        })
    }

    pub fn try_get_analytics(&self) -> Result<AnalyticsMap, StoreError> {
        let raw = self.read_blob(ANALYTICS_KEY)?;
        decode(ANALYTICS_KEY, raw)
    }

    /// Clicks for one shortcode, oldest first
    pub fn get_url_analytics(&self, shortcode: &str) -> Vec<ClickRecord> {
        self.get_analytics().remove(shortcode).unwrap_or_default()
    }

    /// Drops every record whose expiry is not in the future
    ///
    /// Click history of removed shortcodes is retained. Returns how many
    /// records were removed.
    pub fn remove_expired_urls(&self) -> Result<usize, StoreError> {
        self.remove_expired_urls_at(Utc::now())
    }

    pub fn remove_expired_urls_at(&self, now: DateTime<Utc>) -> Result<usize, StoreError> {
        let write_txn = self.db.begin_write()?;
        let removed = {
            let mut table = write_txn.open_table(TABLE_STORAGE)?;
            let urls: Vec<UrlRecord> = decode_lenient(URLS_KEY, blob(&table, URLS_KEY)?);
            let before = urls.len();
            let active: Vec<UrlRecord> = urls.into_iter().filter(|u| u.is_active_at(now)).collect();

            let json = self.encode(URLS_KEY, &active)?;
            table.insert(URLS_KEY, json.as_str())?;
            before - active.len()
        };
        write_txn.commit()?;

        tracing::info!(removed, "Expired URLs removed");
        Ok(removed)
    }

    fn read_blob(&self, key: &str) -> Result<Option<String>, StoreError> {
        let read_txn = self.db.begin_read()?;
        let table = read_txn.open_table(TABLE_STORAGE)?;
        let value = table.get(key)?.map(|guard| guard.value().to_string());
        Ok(value)
    }

    fn encode<T: Serialize>(&self, key: &'static str, value: &T) -> Result<String, StoreError> {
        let json = serde_json::to_string(value)?;
        if let Some(limit) = self.quota {
            if json.len() > limit {
                return Err(StoreError::QuotaExceeded {
                    key,
                    size: json.len(),
                    limit,
                });
            }
        }
        Ok(json)
    }
}

fn blob(table: &Table<'_, &'static str, &'static str>, key: &str) -> Result<Option<String>, StoreError> {
    Ok(table.get(key)?.map(|guard| guard.value().to_string()))
}

fn decode<T: DeserializeOwned + Default>(key: &'static str, raw: Option<String>) -> Result<T, StoreError> {
    match raw {
        None => Ok(T::default()),
        Some(json) => serde_json::from_str(&json).map_err(|source| StoreError::Corrupt { key, source }),
    }
}

/// Damaged blobs are replaced on the next write rather than blocking it
fn decode_lenient<T: DeserializeOwned + Default>(key: &'static str, raw: Option<String>) -> T {
    decode(key, raw).unwrap_or_else(|e| {
        tracing::error!("Discarding unreadable data: {}", e);
        T::default()
    })
}

/// Microsecond timestamp, bumped past any id already in use
fn next_id(urls: &[UrlRecord], now: DateTime<Utc>) -> String {
    let mut candidate = now.timestamp_micros();
    while urls.iter().any(|u| u.id == candidate.to_string()) {
        candidate += 1;
    }
    candidate.to_string()
}

/// Latest representable expiry: 9999-12-31T23:59:59Z
fn latest_expiry() -> DateTime<Utc> {
    DateTime::<Utc>::from_timestamp(253_402_300_799, 0).unwrap_or(DateTime::<Utc>::MAX_UTC)
}

/// `now + validity minutes`, clamped so huge validities stay serializable
fn expiry_for(now: DateTime<Utc>, validity: u64) -> DateTime<Utc> {
    i64::try_from(validity)
        .ok()
        .and_then(Duration::try_minutes)
        .and_then(|d| now.checked_add_signed(d))
        .filter(|t| *t <= latest_expiry())
        .unwrap_or_else(latest_expiry)
}
