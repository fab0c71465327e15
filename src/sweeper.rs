//! Periodic expiry sweep

use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{interval, MissedTickBehavior};

use crate::store::Store;

/// Removes expired URL records now and then every `period`
///
/// The task runs until the runtime shuts down. Failures are logged and the
/// next tick tries again.
pub fn spawn_expiry_sweep(store: Store, period: Duration) -> JoinHandle<()> {
    tokio::spawn(async move {
        let mut ticker = interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // the first tick completes immediately
            ticker.tick().await;
            if let Err(e) = store.remove_expired_urls() {
                tracing::error!("Failed to remove expired URLs: {}", e);
            }
        }
    })
}
