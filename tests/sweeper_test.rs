//! Tests for the background expiry sweep

use std::time::Duration;

use chrono::{Duration as ChronoDuration, Utc};
use tempfile::NamedTempFile;

use snaplink::model::{ClickRecord, LocationDetails, NewUrl};
use snaplink::store::Store;
use snaplink::sweeper::spawn_expiry_sweep;

fn new_url(shortcode: &str) -> NewUrl {
    NewUrl {
        original_url: "https://example.com".to_string(),
        shortcode: shortcode.to_string(),
        validity: 30,
        short_url: format!("http://localhost:8080/{}", shortcode),
    }
}

#[tokio::test]
async fn test_sweep_runs_at_startup() {
    let temp_db = NamedTempFile::new().unwrap();
    let store = Store::open(temp_db.path()).unwrap();
    let now = Utc::now();
    store.save_url_at(new_url("stale1"), now - ChronoDuration::hours(1)).unwrap();
    store.save_url_at(new_url("fresh1"), now).unwrap();
    store
        .record_click(
            "stale1",
            ClickRecord {
                timestamp: now.to_rfc3339(),
                source: "direct".to_string(),
                location: "Unknown, Unknown".to_string(),
                location_details: LocationDetails::unknown(),
            },
        )
        .unwrap();

    // long period: only the immediate first tick can fire
    let handle = spawn_expiry_sweep(store.clone(), Duration::from_secs(3600));

    let mut swept = false;
    for _ in 0..50 {
        if store.get_all_shortcodes() == ["fresh1"] {
            swept = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    handle.abort();

    assert!(swept, "expired record was not removed");
    assert_eq!(store.get_url_analytics("stale1").len(), 1);
}
