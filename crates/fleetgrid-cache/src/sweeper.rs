//! Periodic sweep loop shared by every expiring cache.

use std::time::Duration;

use tokio::sync::watch;
use tracing::{debug, info};

/// Call `sweep` every `interval` until the shutdown signal fires.
///
/// `sweep` returns the number of evicted entries.
pub async fn run_sweeper<F>(
    name: &str,
    interval: Duration,
    mut shutdown: watch::Receiver<bool>,
    sweep: F,
) where
    F: Fn() -> usize,
{
    info!(cache = name, interval_secs = interval.as_secs(), "cache sweeper started");

    loop {
        tokio::select! {
            _ = tokio::time::sleep(interval) => {
                let evicted = sweep();
                if evicted > 0 {
                    debug!(cache = name, evicted, "expired cache entries swept");
                }
            }
            _ = shutdown.changed() => {
                info!(cache = name, "cache sweeper shutting down");
                break;
            }
        }
    }
}
