use super::EphemeralStore;
use log::{debug, info};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_util::sync::CancellationToken;

/// How long entries live and how many may exist at once.
///
/// The default is unbounded on both axes: entries stay until they are
/// explicitly deleted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct RetentionPolicy {
    pub ttl: Option<Duration>,
    pub max_entries: Option<usize>,
}

impl RetentionPolicy {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    pub fn with_max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    pub fn is_unbounded(&self) -> bool {
        self.ttl.is_none() && self.max_entries.is_none()
    }

    pub fn is_expired(&self, created_at: Instant, now: Instant) -> bool {
        match self.ttl {
            Some(ttl) => now.saturating_duration_since(created_at) >= ttl,
            None => false,
        }
    }
}

/// Periodically purge expired entries until `shutdown` is cancelled.
pub fn spawn_expiry_sweeper<T>(
    store: EphemeralStore<T>,
    interval: Duration,
    shutdown: CancellationToken,
) -> JoinHandle<()>
where
    T: Clone + Send + Sync + 'static,
{
    tokio::spawn(async move {
        info!("Starting expiry sweeper (every {:?})", interval);

        loop {
            if shutdown.is_cancelled() {
                break;
            }

            let purged = store.purge_expired().await;
            debug!("Sweep completed, {} entries purged", purged);

            // Sleep until the next sweep, but wake on shutdown
            tokio::select! {
                _ = sleep(interval) => {}
                _ = shutdown.cancelled() => {
                    break;
                }
            }
        }

        info!("Expiry sweeper stopped gracefully");
    })
}
