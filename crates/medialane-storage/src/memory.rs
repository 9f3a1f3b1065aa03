use crate::traits::{
    check_quota, DurableRecord, DurableTier, EntryMeta, StorageError, StorageResult, TierUsage,
};
use crate::DurableBackend;
use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Quota-bounded in-memory durable tier.
///
/// Charges `key.len() + payload.len()` bytes per record. Lives as long as the
/// value does, so it stands in for persistent storage in tests and one-shot
/// tools.
pub struct MemoryDurableTier {
    records: RwLock<HashMap<String, DurableRecord>>,
    quota_bytes: u64,
}

impl MemoryDurableTier {
    pub fn new(quota_bytes: u64) -> Self {
        Self {
            records: RwLock::new(HashMap::new()),
            quota_bytes,
        }
    }
}

#[async_trait]
impl DurableTier for MemoryDurableTier {
    async fn get(&self, key: &str) -> StorageResult<Option<DurableRecord>> {
        Ok(self.records.read().await.get(key).cloned())
    }

    async fn put(&self, record: DurableRecord) -> StorageResult<()> {
        if record.key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }

        let mut records = self.records.write().await;
        let used: u64 = records.values().map(DurableRecord::charged_bytes).sum();
        let existing = records
            .get(&record.key)
            .map(DurableRecord::charged_bytes)
            .unwrap_or(0);
        check_quota(used, existing, record.charged_bytes(), self.quota_bytes)?;

        tracing::debug!(
            key = %record.key,
            size_bytes = record.charged_bytes(),
            "Memory durable tier write"
        );
        records.insert(record.key.clone(), record);
        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        Ok(self.records.write().await.remove(key).is_some())
    }

    async fn meta(&self, key: &str) -> StorageResult<Option<EntryMeta>> {
        Ok(self.records.read().await.get(key).map(|r| EntryMeta {
            key: r.key.clone(),
            last_touched: r.last_touched,
            size_bytes: r.charged_bytes(),
        }))
    }

    async fn entries(&self) -> StorageResult<Vec<EntryMeta>> {
        Ok(self
            .records
            .read()
            .await
            .values()
            .map(|r| EntryMeta {
                key: r.key.clone(),
                last_touched: r.last_touched,
                size_bytes: r.charged_bytes(),
            })
            .collect())
    }

    async fn usage(&self) -> StorageResult<TierUsage> {
        let records = self.records.read().await;
        Ok(TierUsage {
            entries: records.len(),
            used_bytes: records.values().map(DurableRecord::charged_bytes).sum(),
            quota_bytes: self.quota_bytes,
        })
    }

    async fn clear(&self) -> StorageResult<usize> {
        let mut records = self.records.write().await;
        let count = records.len();
        records.clear();
        Ok(count)
    }

    fn backend_type(&self) -> DurableBackend {
        DurableBackend::Memory
    }
}
