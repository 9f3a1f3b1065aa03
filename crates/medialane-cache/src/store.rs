use bytes::Bytes;
use chrono::{DateTime, Utc};
use lru::LruCache;
use medialane_core::{CacheConfig, ResolverConfig};
use medialane_storage::{DurableRecord, DurableTier, StorageError, TierUsage};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;

use crate::classifier::MediaLikeClassifier;
use crate::clock::{Clock, SystemClock};
use crate::eviction::{EvictionPolicy, EvictionTier};

#[derive(Debug, Clone)]
struct VolatileEntry {
    payload: Bytes,
    last_touched: Option<DateTime<Utc>>,
}

/// Result of [`CacheStore::set`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SetOutcome {
    /// Written to both tiers.
    Stored,
    /// The durable write was dropped; the volatile tier still holds the value.
    VolatileOnly,
    /// Not a media-like reference; nothing was written.
    Ignored,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct CacheStats {
    pub volatile_entries: usize,
    pub volatile_capacity: usize,
    pub durable: TierUsage,
}

/// Two-tier cache of resolved media payloads.
///
/// Owns both tiers; all mutation goes through `set`, `evict`, `remove` and
/// `clear`. Construct one per process (or per test) and share it by `Arc`.
pub struct CacheStore {
    volatile: Mutex<LruCache<String, VolatileEntry>>,
    durable: Arc<dyn DurableTier>,
    classifier: MediaLikeClassifier,
    policy: EvictionPolicy,
    clock: Arc<dyn Clock>,
}

impl CacheStore {
    pub fn new(
        durable: Arc<dyn DurableTier>,
        classifier: MediaLikeClassifier,
        volatile_capacity: usize,
    ) -> Self {
        let capacity = NonZeroUsize::new(volatile_capacity).unwrap_or(NonZeroUsize::MIN);
        tracing::debug!(
            volatile_capacity = capacity.get(),
            durable_backend = %durable.backend_type(),
            "Creating new CacheStore"
        );
        Self {
            volatile: Mutex::new(LruCache::new(capacity)),
            durable,
            classifier,
            policy: EvictionPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn from_config(
        cache: &CacheConfig,
        resolver: &ResolverConfig,
        durable: Arc<dyn DurableTier>,
    ) -> Self {
        Self::new(
            durable,
            MediaLikeClassifier::from_config(cache, resolver),
            cache.volatile_capacity,
        )
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn with_policy(mut self, policy: EvictionPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn classifier(&self) -> &MediaLikeClassifier {
        &self.classifier
    }

    /// Read a payload: volatile tier first, then the durable tier. A durable
    /// hit is promoted into the volatile tier before returning.
    #[tracing::instrument(skip(self), fields(cache.key = %key))]
    pub async fn get(&self, key: &str) -> Option<Bytes> {
        if let Some(entry) = self.volatile.lock().await.get(key) {
            tracing::debug!("Volatile cache hit");
            return Some(entry.payload.clone());
        }

        match self.durable.get(key).await {
            Ok(Some(record)) => {
                tracing::debug!(last_touched = ?record.last_touched, "Durable cache hit, promoting");
                let payload = record.payload.clone();
                self.volatile.lock().await.put(
                    key.to_string(),
                    VolatileEntry {
                        payload: record.payload,
                        last_touched: record.last_touched,
                    },
                );
                Some(payload)
            }
            Ok(None) => {
                tracing::debug!("Cache miss");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "Durable tier read failed, treating as miss");
                None
            }
        }
    }

    /// Volatile-tier membership. Does not consult or promote from the durable tier.
    pub async fn has(&self, key: &str) -> bool {
        self.volatile.lock().await.contains(key)
    }

    /// Write a payload to both tiers.
    ///
    /// Non media-like keys are ignored. A durable write that exceeds the quota
    /// runs [`evict`](Self::evict) and is retried once; if it still fails the
    /// durable write is dropped along with any older durable copy of the key.
    /// The volatile write always happens. Writing an existing key replaces its
    /// payload and refreshes `last_touched`, which never moves backwards in
    /// either tier.
    #[tracing::instrument(skip(self, payload), fields(cache.key = %key, size_bytes = payload.len()))]
    pub async fn set(&self, key: &str, payload: Bytes) -> SetOutcome {
        if !self.classifier.is_media_like(key) {
            tracing::debug!("Not a media-like reference, skipping cache write");
            return SetOutcome::Ignored;
        }

        let cached = self.volatile.lock().await.peek(key).map(|e| e.last_touched);
        let previous = match cached {
            Some(touched) => touched,
            None => self.durable_last_touched(key).await,
        };
        let now = self.clock.now();
        let touched = previous.map_or(now, |p| p.max(now));

        let record = DurableRecord::new(key, payload.clone(), touched);
        let outcome = match self.durable.put(record.clone()).await {
            Ok(()) => SetOutcome::Stored,
            Err(StorageError::QuotaExceeded { needed, available }) => {
                tracing::info!(needed, available, "Durable tier quota exceeded, evicting");
                self.evict().await;
                match self.durable.put(record).await {
                    Ok(()) => SetOutcome::Stored,
                    Err(e) => {
                        tracing::warn!(error = %e, "Durable write dropped after eviction");
                        self.drop_durable_copy(key).await;
                        SetOutcome::VolatileOnly
                    }
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "Durable write failed");
                self.drop_durable_copy(key).await;
                SetOutcome::VolatileOnly
            }
        };

        // After eviction, which may have dropped an older copy of this key.
        self.volatile.lock().await.put(
            key.to_string(),
            VolatileEntry {
                payload,
                last_touched: Some(touched),
            },
        );

        outcome
    }

    async fn durable_last_touched(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.durable.meta(key).await {
            Ok(meta) => meta.and_then(|m| m.last_touched),
            Err(e) => {
                tracing::debug!(error = %e, "Durable metadata lookup failed");
                None
            }
        }
    }

    /// The durable tier must never hold a value older than the volatile one.
    async fn drop_durable_copy(&self, key: &str) {
        if let Err(e) = self.durable.remove(key).await {
            tracing::warn!(error = %e, "Failed to drop stale durable entry");
        }
    }

    /// Free durable space using the tiered staleness policy. Every removed
    /// durable entry is also removed from the volatile tier. Returns the
    /// number of durable entries removed.
    #[tracing::instrument(skip(self))]
    pub async fn evict(&self) -> usize {
        let entries = match self.durable.entries().await {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(error = %e, "Failed to list durable entries for eviction");
                return 0;
            }
        };

        let plan = self.policy.plan(&entries, self.clock.now());
        if plan.tier == EvictionTier::Nothing {
            tracing::debug!("Durable tier empty, nothing to evict");
            return 0;
        }

        let mut removed = 0;
        for key in &plan.keys {
            match self.durable.remove(key).await {
                Ok(true) => removed += 1,
                Ok(false) => {}
                Err(e) => {
                    tracing::warn!(error = %e, cache.key = %key, "Failed to evict durable entry");
                    continue;
                }
            }
            self.volatile.lock().await.pop(key.as_str());
        }

        tracing::info!(
            tier = ?plan.tier,
            removed,
            remaining = entries.len() - removed,
            "Evicted durable cache entries"
        );
        removed
    }

    /// Remove a key from both tiers. Returns whether either tier held it.
    pub async fn remove(&self, key: &str) -> bool {
        let volatile = self.volatile.lock().await.pop(key).is_some();
        let durable = match self.durable.remove(key).await {
            Ok(existed) => existed,
            Err(e) => {
                tracing::warn!(error = %e, cache.key = %key, "Failed to remove durable entry");
                false
            }
        };
        volatile || durable
    }

    /// Empty both tiers. Returns the number of durable entries removed.
    pub async fn clear(&self) -> usize {
        self.volatile.lock().await.clear();
        match self.durable.clear().await {
            Ok(count) => {
                tracing::info!(cleared = count, "Cleared cache");
                count
            }
            Err(e) => {
                tracing::warn!(error = %e, "Failed to clear durable tier");
                0
            }
        }
    }

    pub async fn stats(&self) -> CacheStats {
        let (volatile_entries, volatile_capacity) = {
            let volatile = self.volatile.lock().await;
            (volatile.len(), volatile.cap().get())
        };
        let durable = match self.durable.usage().await {
            Ok(usage) => usage,
            Err(e) => {
                tracing::warn!(error = %e, "Failed to read durable usage");
                TierUsage {
                    entries: 0,
                    used_bytes: 0,
                    quota_bytes: 0,
                }
            }
        };
        CacheStats {
            volatile_entries,
            volatile_capacity,
            durable,
        }
    }
}
