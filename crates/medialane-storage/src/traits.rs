//! Durable tier abstraction trait
//!
//! This module defines the DurableTier trait that all durable cache backends
//! must implement, along with the record and error types they share.

use crate::DurableBackend;
use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use thiserror::Error;

/// Durable tier operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Quota exceeded: record needs {needed} bytes, {available} bytes available")]
    QuotaExceeded { needed: u64, available: u64 },

    #[error("Invalid cache key: {0}")]
    InvalidKey(String),

    #[error("Record serialization failed: {0}")]
    Serialization(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl StorageError {
    pub fn is_quota_exceeded(&self) -> bool {
        matches!(self, StorageError::QuotaExceeded { .. })
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(err: serde_json::Error) -> Self {
        StorageError::Serialization(err.to_string())
    }
}

/// Result type for durable tier operations
pub type StorageResult<T> = Result<T, StorageError>;

/// A durable cache record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DurableRecord {
    pub key: String,
    pub payload: Bytes,
    /// `None` for records written before timestamps were tracked.
    pub last_touched: Option<DateTime<Utc>>,
}

impl DurableRecord {
    pub fn new(key: impl Into<String>, payload: Bytes, last_touched: DateTime<Utc>) -> Self {
        Self {
            key: key.into(),
            payload,
            last_touched: Some(last_touched),
        }
    }

    /// Bytes charged against the quota by the memory backend.
    pub fn charged_bytes(&self) -> u64 {
        (self.key.len() + self.payload.len()) as u64
    }
}

/// Record metadata used by eviction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryMeta {
    pub key: String,
    pub last_touched: Option<DateTime<Utc>>,
    pub size_bytes: u64,
}

/// Occupancy of a durable tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct TierUsage {
    pub entries: usize,
    pub used_bytes: u64,
    pub quota_bytes: u64,
}

/// Durable tier abstraction trait
///
/// Backends must be safe to share across tasks. Only the cache store writes
/// through this trait; nothing else mutates a tier directly.
#[async_trait]
pub trait DurableTier: Send + Sync {
    /// Read a record. `Ok(None)` when the key is absent.
    async fn get(&self, key: &str) -> StorageResult<Option<DurableRecord>>;

    /// Insert or replace a record.
    ///
    /// Fails with `QuotaExceeded` (leaving the tier unchanged) when the
    /// record does not fit in the remaining quota.
    async fn put(&self, record: DurableRecord) -> StorageResult<()>;

    /// Remove a record. Returns whether it existed.
    async fn remove(&self, key: &str) -> StorageResult<bool>;

    /// Metadata for one record, without reading its payload.
    async fn meta(&self, key: &str) -> StorageResult<Option<EntryMeta>>;

    /// Metadata for every record, in no particular order.
    async fn entries(&self) -> StorageResult<Vec<EntryMeta>>;

    /// Current occupancy.
    async fn usage(&self) -> StorageResult<TierUsage>;

    /// Remove every record. Returns how many were removed.
    async fn clear(&self) -> StorageResult<usize>;

    /// Get the backend type
    fn backend_type(&self) -> DurableBackend;
}

/// Shared quota arithmetic: fail when replacing `existing` bytes with
/// `needed` bytes would push `used` past `quota`.
pub(crate) fn check_quota(used: u64, existing: u64, needed: u64, quota: u64) -> StorageResult<()> {
    let available = quota.saturating_sub(used.saturating_sub(existing));
    if needed > available {
        return Err(StorageError::QuotaExceeded { needed, available });
    }
    Ok(())
}
