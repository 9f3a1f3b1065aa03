#[cfg(feature = "durable-file")]
use crate::FileDurableTier;
#[cfg(feature = "durable-memory")]
use crate::MemoryDurableTier;
use crate::{DurableBackend, DurableTier, StorageError, StorageResult};
use medialane_core::CacheConfig;
use std::sync::Arc;

/// Create a durable tier based on configuration
pub async fn create_durable_tier(config: &CacheConfig) -> StorageResult<Arc<dyn DurableTier>> {
    match config.durable_backend {
        #[cfg(feature = "durable-memory")]
        DurableBackend::Memory => Ok(Arc::new(MemoryDurableTier::new(config.durable_quota_bytes))),

        #[cfg(not(feature = "durable-memory"))]
        DurableBackend::Memory => Err(StorageError::ConfigError(
            "Memory durable tier not available (durable-memory feature not enabled)".to_string(),
        )),

        #[cfg(feature = "durable-file")]
        DurableBackend::File => {
            let base_path = config.cache_dir.clone().ok_or_else(|| {
                StorageError::ConfigError("MEDIALANE_CACHE_DIR not configured".to_string())
            })?;

            let tier = FileDurableTier::new(base_path, config.durable_quota_bytes).await?;
            Ok(Arc::new(tier))
        }

        #[cfg(not(feature = "durable-file"))]
        DurableBackend::File => Err(StorageError::ConfigError(
            "File durable tier not available (durable-file feature not enabled)".to_string(),
        )),
    }
}

#[cfg(all(test, feature = "durable-file", feature = "durable-memory"))]
mod tests {
    use super::*;

    #[tokio::test]
    async fn creates_configured_backend() {
        let memory = create_durable_tier(&CacheConfig::default()).await.unwrap();
        assert_eq!(memory.backend_type(), DurableBackend::Memory);

        let dir = tempfile::tempdir().unwrap();
        let config = CacheConfig {
            durable_backend: DurableBackend::File,
            cache_dir: Some(dir.path().to_path_buf()),
            ..CacheConfig::default()
        };
        let file = create_durable_tier(&config).await.unwrap();
        assert_eq!(file.backend_type(), DurableBackend::File);
    }

    #[tokio::test]
    async fn file_backend_requires_dir() {
        let config = CacheConfig {
            durable_backend: DurableBackend::File,
            ..CacheConfig::default()
        };
        assert!(matches!(
            create_durable_tier(&config).await,
            Err(StorageError::ConfigError(_))
        ));
    }
}
