use crate::keys::{record_file_name, RECORD_EXTENSION};
use crate::traits::{
    check_quota, DurableRecord, DurableTier, EntryMeta, StorageError, StorageResult, TierUsage,
};
use crate::DurableBackend;
use async_trait::async_trait;
use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::sync::RwLock;

/// On-disk record format.
#[derive(Debug, Serialize, Deserialize)]
struct StoredRecord {
    key: String,
    /// Base64 payload
    payload: String,
    #[serde(default)]
    last_touched: Option<DateTime<Utc>>,
}

/// Suffix of in-progress writes.
const TMP_EXTENSION: &str = "tmp";

#[derive(Debug, Clone)]
struct IndexEntry {
    file_name: String,
    size_bytes: u64,
    last_touched: Option<DateTime<Utc>>,
}

/// Filesystem durable tier
///
/// One JSON record per key under `base_path`, charged at its size on disk.
/// The index of keys, sizes and timestamps is rebuilt from the directory at
/// startup so usage survives restarts.
pub struct FileDurableTier {
    base_path: PathBuf,
    quota_bytes: u64,
    index: RwLock<HashMap<String, IndexEntry>>,
}

impl FileDurableTier {
    /// Create a new FileDurableTier instance
    ///
    /// # Arguments
    /// * `base_path` - Directory holding the records (e.g., "/var/cache/medialane")
    /// * `quota_bytes` - Total bytes the records may occupy
    pub async fn new(base_path: impl Into<PathBuf>, quota_bytes: u64) -> StorageResult<Self> {
        let base_path = base_path.into();

        fs::create_dir_all(&base_path).await.map_err(|e| {
            StorageError::ConfigError(format!(
                "Failed to create cache directory {}: {}",
                base_path.display(),
                e
            ))
        })?;

        let index = Self::load_index(&base_path).await?;
        tracing::info!(
            path = %base_path.display(),
            entries = index.len(),
            quota_bytes,
            "Opened file durable tier"
        );

        Ok(FileDurableTier {
            base_path,
            quota_bytes,
            index: RwLock::new(index),
        })
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    /// Scan the cache directory. Unreadable or malformed records are deleted.
    async fn load_index(base_path: &Path) -> StorageResult<HashMap<String, IndexEntry>> {
        let mut index = HashMap::new();
        let mut dir = fs::read_dir(base_path).await?;

        while let Some(entry) = dir.next_entry().await? {
            let path = entry.path();
            match path.extension().and_then(|e| e.to_str()) {
                Some(RECORD_EXTENSION) => {}
                Some(TMP_EXTENSION) => {
                    tracing::debug!(path = %path.display(), "Removing interrupted cache write");
                    if let Err(e) = fs::remove_file(&path).await {
                        tracing::warn!(error = %e, path = %path.display(), "Failed to delete cache record");
                    }
                    continue;
                }
                _ => continue,
            }

            let parsed = match fs::read(&path).await {
                Ok(raw) => serde_json::from_slice::<StoredRecord>(&raw)
                    .map(|record| (record, raw.len() as u64))
                    .map_err(StorageError::from),
                Err(e) => Err(StorageError::from(e)),
            };

            match parsed {
                Ok((record, size_bytes)) => {
                    let file_name = entry.file_name().to_string_lossy().into_owned();
                    index.insert(
                        record.key,
                        IndexEntry {
                            file_name,
                            size_bytes,
                            last_touched: record.last_touched,
                        },
                    );
                }
                Err(e) => {
                    tracing::warn!(
                        error = %e,
                        path = %path.display(),
                        "Discarding unreadable cache record"
                    );
                    if let Err(e) = fs::remove_file(&path).await {
                        tracing::warn!(error = %e, path = %path.display(), "Failed to delete cache record");
                    }
                }
            }
        }

        Ok(index)
    }

    fn record_path(&self, file_name: &str) -> PathBuf {
        self.base_path.join(file_name)
    }

    async fn write_atomically(tmp_path: &Path, path: &Path, data: &[u8]) -> std::io::Result<()> {
        let mut file = fs::File::create(tmp_path).await?;
        file.write_all(data).await?;
        file.sync_all().await?;
        drop(file);
        fs::rename(tmp_path, path).await
    }
}

/// A full disk is reported as a quota failure so the caller evicts and retries.
fn map_write_error(err: std::io::Error, needed: u64) -> StorageError {
    if err.kind() == std::io::ErrorKind::StorageFull {
        StorageError::QuotaExceeded {
            needed,
            available: 0,
        }
    } else {
        StorageError::IoError(err)
    }
}

#[async_trait]
impl DurableTier for FileDurableTier {
    async fn get(&self, key: &str) -> StorageResult<Option<DurableRecord>> {
        let Some(entry) = self.index.read().await.get(key).cloned() else {
            return Ok(None);
        };

        let path = self.record_path(&entry.file_name);
        let raw = match fs::read(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                // Deleted behind our back.
                self.index.write().await.remove(key);
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let stored: StoredRecord = serde_json::from_slice(&raw)?;
        let payload = STANDARD
            .decode(stored.payload.as_bytes())
            .map_err(|e| StorageError::Serialization(format!("Invalid payload encoding: {}", e)))?;

        Ok(Some(DurableRecord {
            key: stored.key,
            payload: Bytes::from(payload),
            last_touched: stored.last_touched,
        }))
    }

    async fn put(&self, record: DurableRecord) -> StorageResult<()> {
        if record.key.is_empty() {
            return Err(StorageError::InvalidKey("empty key".to_string()));
        }

        let stored = StoredRecord {
            key: record.key.clone(),
            payload: STANDARD.encode(&record.payload),
            last_touched: record.last_touched,
        };
        let data = serde_json::to_vec(&stored)?;
        let size = data.len() as u64;

        // Hold the write lock across the quota check and the write so two
        // writers cannot both pass the check.
        let mut index = self.index.write().await;
        let used: u64 = index.values().map(|e| e.size_bytes).sum();
        let existing = index.get(&record.key).map(|e| e.size_bytes).unwrap_or(0);
        check_quota(used, existing, size, self.quota_bytes)?;

        let file_name = record_file_name(&record.key);
        let path = self.record_path(&file_name);
        let tmp_path = self.record_path(&format!("{}.{}", file_name, TMP_EXTENSION));
        let start = std::time::Instant::now();

        if let Err(e) = Self::write_atomically(&tmp_path, &path, &data).await {
            if let Err(cleanup) = fs::remove_file(&tmp_path).await {
                if cleanup.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %cleanup, path = %tmp_path.display(), "Failed to delete partial write");
                }
            }
            return Err(map_write_error(e, size));
        }

        index.insert(
            record.key.clone(),
            IndexEntry {
                file_name,
                size_bytes: size,
                last_touched: record.last_touched,
            },
        );

        tracing::debug!(
            key = %record.key,
            path = %path.display(),
            size_bytes = size,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "File durable tier write"
        );

        Ok(())
    }

    async fn remove(&self, key: &str) -> StorageResult<bool> {
        let Some(entry) = self.index.write().await.remove(key) else {
            return Ok(false);
        };

        match fs::remove_file(self.record_path(&entry.file_name)).await {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(true),
            Err(e) => Err(e.into()),
        }
    }

    async fn meta(&self, key: &str) -> StorageResult<Option<EntryMeta>> {
        Ok(self.index.read().await.get(key).map(|e| EntryMeta {
            key: key.to_string(),
            last_touched: e.last_touched,
            size_bytes: e.size_bytes,
        }))
    }

    async fn entries(&self) -> StorageResult<Vec<EntryMeta>> {
        Ok(self
            .index
            .read()
            .await
            .iter()
            .map(|(key, e)| EntryMeta {
                key: key.clone(),
                last_touched: e.last_touched,
                size_bytes: e.size_bytes,
            })
            .collect())
    }

    async fn usage(&self) -> StorageResult<TierUsage> {
        let index = self.index.read().await;
        Ok(TierUsage {
            entries: index.len(),
            used_bytes: index.values().map(|e| e.size_bytes).sum(),
            quota_bytes: self.quota_bytes,
        })
    }

    async fn clear(&self) -> StorageResult<usize> {
        let mut index = self.index.write().await;
        let count = index.len();
        for (key, entry) in index.drain() {
            if let Err(e) = fs::remove_file(self.record_path(&entry.file_name)).await {
                if e.kind() != std::io::ErrorKind::NotFound {
                    tracing::warn!(error = %e, key = %key, "Failed to delete cache record");
                }
            }
        }
        Ok(count)
    }

    fn backend_type(&self) -> DurableBackend {
        DurableBackend::File
    }
}

#[cfg(all(test, feature = "durable-file"))]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn record(key: &str, payload: &'static [u8]) -> DurableRecord {
        DurableRecord::new(key, Bytes::from_static(payload), Utc::now())
    }

    #[tokio::test]
    async fn test_file_tier_put_get() {
        let dir = tempdir().unwrap();
        let tier = FileDurableTier::new(dir.path(), 1024 * 1024).await.unwrap();

        tier.put(record("/uploads/forum/a.png", b"png bytes")).await.unwrap();

        let got = tier.get("/uploads/forum/a.png").await.unwrap().unwrap();
        assert_eq!(got.payload, Bytes::from_static(b"png bytes"));
        assert!(got.last_touched.is_some());
        assert!(tier.get("missing.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_tier_survives_reopen() {
        let dir = tempdir().unwrap();
        {
            let tier = FileDurableTier::new(dir.path(), 1024 * 1024).await.unwrap();
            tier.put(record("a.png", b"one")).await.unwrap();
            tier.put(record("b.png", b"two")).await.unwrap();
        }

        let reopened = FileDurableTier::new(dir.path(), 1024 * 1024).await.unwrap();
        let usage = reopened.usage().await.unwrap();
        assert_eq!(usage.entries, 2);
        assert!(usage.used_bytes > 0);
        assert_eq!(
            reopened.get("b.png").await.unwrap().unwrap().payload,
            Bytes::from_static(b"two")
        );
    }

    #[tokio::test]
    async fn test_file_tier_quota_exceeded() {
        let dir = tempdir().unwrap();
        let tier = FileDurableTier::new(dir.path(), 120).await.unwrap();

        tier.put(record("a.png", b"small")).await.unwrap();
        let err = tier
            .put(record("b.png", b"a payload that will not fit in the remaining quota"))
            .await
            .unwrap_err();
        assert!(err.is_quota_exceeded());
        assert!(tier.get("b.png").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_tier_legacy_record_without_timestamp() {
        let dir = tempdir().unwrap();
        let legacy = serde_json::json!({ "key": "old.png", "payload": STANDARD.encode(b"x") });
        std::fs::write(
            dir.path().join(record_file_name("old.png")),
            serde_json::to_vec(&legacy).unwrap(),
        )
        .unwrap();

        let tier = FileDurableTier::new(dir.path(), 1024).await.unwrap();
        let entries = tier.entries().await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].key, "old.png");
        assert!(entries[0].last_touched.is_none());
    }

    #[tokio::test]
    async fn test_file_tier_discards_corrupt_records() {
        let dir = tempdir().unwrap();
        let corrupt = dir.path().join(format!("{}.json", "f".repeat(64)));
        std::fs::write(&corrupt, b"{not json").unwrap();

        let tier = FileDurableTier::new(dir.path(), 1024).await.unwrap();
        assert_eq!(tier.usage().await.unwrap().entries, 0);
        assert!(!corrupt.exists());
    }

    #[tokio::test]
    async fn test_file_tier_removes_interrupted_writes_on_open() {
        let dir = tempdir().unwrap();
        let stray = dir.path().join(format!("{}.tmp", record_file_name("a.png")));
        std::fs::write(&stray, b"{\"key\":").unwrap();

        let tier = FileDurableTier::new(dir.path(), 1024).await.unwrap();
        assert_eq!(tier.usage().await.unwrap().entries, 0);
        assert!(!stray.exists());
    }

    #[tokio::test]
    async fn test_file_tier_failed_write_leaves_no_partial_file() {
        let dir = tempdir().unwrap();
        let tier = FileDurableTier::new(dir.path(), 1024).await.unwrap();

        // A non-empty directory where the record belongs makes the rename fail.
        let blocker = dir.path().join(record_file_name("a.png"));
        std::fs::create_dir(&blocker).unwrap();
        std::fs::write(blocker.join("occupied"), b"x").unwrap();

        let err = tier.put(record("a.png", b"1")).await.unwrap_err();
        assert!(!err.is_quota_exceeded());
        assert!(!dir
            .path()
            .join(format!("{}.tmp", record_file_name("a.png")))
            .exists());
        assert!(tier.get("a.png").await.unwrap().is_none());
    }

    #[test]
    fn test_full_disk_maps_to_quota_exceeded() {
        let err = map_write_error(std::io::Error::from(std::io::ErrorKind::StorageFull), 42);
        assert!(matches!(
            err,
            StorageError::QuotaExceeded {
                needed: 42,
                available: 0
            }
        ));
        let err = map_write_error(std::io::Error::from(std::io::ErrorKind::PermissionDenied), 42);
        assert!(matches!(err, StorageError::IoError(_)));
    }

    #[tokio::test]
    async fn test_file_tier_remove_and_clear() {
        let dir = tempdir().unwrap();
        let tier = FileDurableTier::new(dir.path(), 1024 * 1024).await.unwrap();
        tier.put(record("a.png", b"1")).await.unwrap();
        tier.put(record("b.png", b"2")).await.unwrap();

        assert!(tier.remove("a.png").await.unwrap());
        assert!(!tier.remove("a.png").await.unwrap());
        assert_eq!(tier.clear().await.unwrap(), 1);
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
