//! Tests for the persistent store
//!
//! Each test uses a throwaway redb file.

use chrono::{Duration, Utc};
use tempfile::NamedTempFile;

use snaplink::database::{init_db, ANALYTICS_KEY, TABLE_STORAGE, URLS_KEY};
use snaplink::error::StoreError;
use snaplink::model::{ClickRecord, LocationDetails, NewUrl};
use snaplink::store::Store;

fn setup_store() -> (Store, NamedTempFile) {
    let temp_db = NamedTempFile::new().expect("Failed to create temp file");
    let store = Store::open(temp_db.path()).expect("Failed to initialize test database");
    (store, temp_db)
}

fn new_url(shortcode: &str, validity: u64) -> NewUrl {
    NewUrl {
        original_url: "https://example.com".to_string(),
        shortcode: shortcode.to_string(),
        validity,
        short_url: format!("http://localhost:8080/{}", shortcode),
    }
}

fn direct_click() -> ClickRecord {
    ClickRecord {
        timestamp: Utc::now().to_rfc3339(),
        source: "direct".to_string(),
        location: "Unknown, Unknown".to_string(),
        location_details: LocationDetails::unknown(),
    }
}

/// Opens a database, writes a raw blob, and hands back a store over it
fn store_with_raw(key: &str, value: &str) -> (Store, NamedTempFile) {
    let temp_db = NamedTempFile::new().unwrap();
    let db = init_db(temp_db.path()).unwrap();
    let write_txn = db.begin_write().unwrap();
    {
        let mut table = write_txn.open_table(TABLE_STORAGE).unwrap();
        table.insert(key, value).unwrap();
    }
    write_txn.commit().unwrap();
    (Store::new(db), temp_db)
}

#[test]
fn test_empty_store() {
    let (store, _temp_db) = setup_store();

    assert!(store.get_urls().is_empty());
    assert!(store.get_all_shortcodes().is_empty());
    assert!(store.get_url_by_shortcode("abc123").is_none());
    assert!(store.get_url_analytics("abc123").is_empty());
    assert!(store.try_get_urls().unwrap().is_empty());
}

#[test]
fn test_save_url_round_trip() {
    let (store, _temp_db) = setup_store();

    let saved = store.save_url(new_url("abc123", 30)).unwrap();
    let fetched = store.get_url_by_shortcode("abc123").unwrap();

    assert_eq!(saved, fetched);
    assert_eq!(fetched.clicks, 0);
    assert_eq!(fetched.original_url, "https://example.com");
    assert_eq!(fetched.validity, 30);
    assert_eq!(fetched.expires_at - fetched.created_at, Duration::minutes(30));
    assert!(!fetched.id.is_empty());
}

#[test]
fn test_save_url_keeps_insertion_order_and_unique_ids() {
    let (store, _temp_db) = setup_store();
    let now = Utc::now();

    // same instant for every insert still yields distinct ids
    for code in ["first", "second", "third"] {
        store.save_url_at(new_url(code, 30), now).unwrap();
    }

    let urls = store.get_urls();
    let codes: Vec<&str> = urls.iter().map(|u| u.shortcode.as_str()).collect();
    assert_eq!(codes, ["first", "second", "third"]);
    assert_eq!(store.get_all_shortcodes(), ["first", "second", "third"]);

    let mut ids: Vec<&str> = urls.iter().map(|u| u.id.as_str()).collect();
    ids.dedup();
    assert_eq!(ids.len(), 3);
}

#[test]
fn test_save_url_rejects_duplicate_shortcode() {
    let (store, _temp_db) = setup_store();

    store.save_url(new_url("abc123", 30)).unwrap();
    let err = store.save_url(new_url("abc123", 60)).unwrap_err();

    assert!(matches!(err, StoreError::ShortcodeConflict(code) if code == "abc123"));
    assert_eq!(store.get_urls().len(), 1);
    assert!(store.shortcode_set().contains("abc123"));
}

#[test]
fn test_save_url_quota_exceeded_propagates() {
    let (store, _temp_db) = setup_store();
    let store = store.with_quota(Some(64));

    let err = store.save_url(new_url("abc123", 30)).unwrap_err();

    assert!(matches!(err, StoreError::QuotaExceeded { key, .. } if key == URLS_KEY));
    assert!(store.get_urls().is_empty());
}

#[test]
fn test_huge_validity_clamps_expiry() {
    let (store, _temp_db) = setup_store();

    store.save_url(new_url("forever", u64::MAX)).unwrap();
    let fetched = store.get_url_by_shortcode("forever").unwrap();

    assert_eq!(fetched.expires_at.to_rfc3339(), "9999-12-31T23:59:59+00:00");
}

#[test]
fn test_record_click_counts_and_appends() {
    let (store, _temp_db) = setup_store();
    store.save_url(new_url("abc123", 30)).unwrap();

    let outcome = store.record_click("abc123", direct_click()).unwrap();

    assert!(outcome.counted);
    assert_eq!(store.get_url_by_shortcode("abc123").unwrap().clicks, 1);
    let clicks = store.get_url_analytics("abc123");
    assert_eq!(clicks.len(), 1);
    assert_eq!(clicks[0].source, "direct");
    assert_eq!(clicks[0].location, "Unknown, Unknown");

    store.record_click("abc123", direct_click()).unwrap();
    assert_eq!(store.get_url_by_shortcode("abc123").unwrap().clicks, 2);
    assert_eq!(store.get_url_analytics("abc123").len(), 2);
}

#[test]
fn test_record_click_unknown_shortcode_keeps_orphan() {
    let (store, _temp_db) = setup_store();
    store.save_url(new_url("abc123", 30)).unwrap();
    let before = store.get_urls();

    let outcome = store.record_click("ghost", direct_click()).unwrap();

    assert!(!outcome.counted);
    assert_eq!(store.get_urls(), before);
    assert_eq!(store.get_url_analytics("ghost").len(), 1);
}

#[test]
fn test_record_click_partial_failure_keeps_click() {
    let (store, _temp_db) = setup_store();
    let mut url = new_url("abc123", 30);
    url.original_url = format!("https://example.com/{}", "x".repeat(400));
    store.save_url(url).unwrap();

    // room for the click history but not for rewriting the URL table
    let urls_len = serde_json::to_string(&store.get_urls()).unwrap().len();
    let store = store.with_quota(Some(urls_len - 1));

    let err = store.record_click("abc123", direct_click()).unwrap_err();

    assert!(matches!(err, StoreError::QuotaExceeded { key, .. } if key == URLS_KEY));
    assert_eq!(store.get_url_analytics("abc123").len(), 1);
    assert_eq!(store.get_url_by_shortcode("abc123").unwrap().clicks, 0);
}

#[test]
fn test_remove_expired_urls() {
    let (store, _temp_db) = setup_store();
    let now = Utc::now();
    store.save_url_at(new_url("old", 30), now - Duration::hours(2)).unwrap();
    store.save_url_at(new_url("fresh", 30), now).unwrap();
    store.record_click("old", direct_click()).unwrap();

    assert_eq!(store.remove_expired_urls().unwrap(), 1);
    assert_eq!(store.get_all_shortcodes(), ["fresh"]);

    // idempotent
    assert_eq!(store.remove_expired_urls().unwrap(), 0);
    assert_eq!(store.get_all_shortcodes(), ["fresh"]);

    // click history outlives its URL record
    assert_eq!(store.get_url_analytics("old").len(), 1);
}

#[test]
fn test_remove_expired_boundary_is_exclusive() {
    let (store, _temp_db) = setup_store();
    let created = Utc::now() - Duration::hours(1);
    let record = store.save_url_at(new_url("edge", 30), created).unwrap();

    assert_eq!(store.remove_expired_urls_at(record.expires_at - Duration::seconds(1)).unwrap(), 0);
    assert_eq!(store.remove_expired_urls_at(record.expires_at).unwrap(), 1);
}

#[test]
fn test_corrupt_urls_blob() {
    let (store, _temp_db) = store_with_raw(URLS_KEY, "{not json");

    assert!(store.get_urls().is_empty());
    assert!(store.get_url_by_shortcode("abc123").is_none());
    assert!(matches!(
        store.try_get_urls(),
        Err(StoreError::Corrupt { key, .. }) if key == URLS_KEY
    ));
    assert!(matches!(
        store.try_get_url_by_shortcode("abc123"),
        Err(StoreError::Corrupt { .. })
    ));

    // the next write replaces the damaged blob
    store.save_url(new_url("abc123", 30)).unwrap();
    assert_eq!(store.try_get_urls().unwrap().len(), 1);
}

#[test]
fn test_corrupt_analytics_blob() {
    let (store, _temp_db) = store_with_raw(ANALYTICS_KEY, "[1, 2");

    assert!(store.get_analytics().is_empty());
    assert!(store.get_url_analytics("abc123").is_empty());
    assert!(matches!(
        store.try_get_analytics(),
        Err(StoreError::Corrupt { key, .. }) if key == ANALYTICS_KEY
    ));
}

#[test]
fn test_blob_layout() {
    let (store, _temp_db) = setup_store();
    store.save_url(new_url("abc123", 30)).unwrap();
    let json = serde_json::to_value(store.get_urls()).unwrap();

    let record = &json[0];
    assert_eq!(record["originalUrl"], "https://example.com");
    assert_eq!(record["shortcode"], "abc123");
    assert_eq!(record["shortUrl"], "http://localhost:8080/abc123");
    assert!(record["createdAt"].is_string());
    assert!(record["expiresAt"].is_string());
    assert_eq!(record["clicks"], 0);
}
