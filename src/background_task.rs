use chrono::Utc;
use tokio::time::{interval, Duration};

use crate::limiter::rate_limiter::InMemoryRateLimitStore;

/// Periodically drops rate-limit entries whose window has closed.
pub async fn start_purge_task(store: InMemoryRateLimitStore, every: Duration) {
    let mut interval = interval(every);

    loop {
        interval.tick().await;

        let purged = store.purge_expired(Utc::now());
        if purged > 0 {
            tracing::info!("Purged {} expired rate-limit entries ({} remaining)", purged, store.len());
        }
    }
}
