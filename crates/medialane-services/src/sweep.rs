use medialane_cache::CacheStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant};
use tokio_util::sync::CancellationToken;

/// Recurring background eviction.
pub struct EvictionSweeper;

impl EvictionSweeper {
    /// Start the background sweep, running [`CacheStore::evict`] every
    /// `period` until `cancel` fires. The first sweep runs one period after
    /// start. A zero period disables the sweep.
    ///
    /// Returns a JoinHandle for graceful shutdown.
    pub fn start(
        cache: Arc<CacheStore>,
        period: Duration,
        cancel: CancellationToken,
    ) -> JoinHandle<()> {
        tokio::spawn(async move {
            if period.is_zero() {
                tracing::info!("Eviction sweep disabled");
                return;
            }

            let mut sweep_interval = interval_at(Instant::now() + period, period);
            tracing::info!(period_secs = period.as_secs(), "Eviction sweep started");

            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        tracing::info!("Eviction sweep stopped");
                        break;
                    }
                    _ = sweep_interval.tick() => {
                        tracing::debug!("Starting scheduled eviction sweep");
                        let removed = cache.evict().await;
                        tracing::info!(removed, "Scheduled eviction sweep completed");
                    }
                }
            }
        })
    }
}
