//! Configuration module
//!
//! This module provides the configuration for path resolution, the two-tier
//! cache and the loader, read from the process environment (and `.env`).

use std::collections::HashMap;
use std::env;
use std::path::{Path, PathBuf};

use anyhow::Context;

use crate::models::Environment;
use crate::storage_types::DurableBackend;

// Common constants
const PROXY_PREFIX: &str = "/api/object-storage";
const UPLOAD_ROOT: &str = "uploads";
const OBJECT_STORAGE_HOSTS: &str = "object-storage.host";
const DURABLE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
const VOLATILE_CAPACITY: usize = 1024;
const MEDIA_EXTENSIONS: &str = "jpg,jpeg,png,gif,webp,svg,avif,bmp,ico,mp4,webm,pdf";
const SWEEP_INTERVAL_SECS: u64 = 3600;
const PROXY_BASE_URL: &str = "http://localhost:3000";
const PREFETCH_CONCURRENCY: usize = 4;

/// Path resolution settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResolverConfig {
    pub environment: Environment,
    /// Prefix of the canonical proxy form, e.g. `/api/object-storage`
    pub proxy_prefix: String,
    /// Environment-dependent upload-root segment, e.g. `uploads`
    pub upload_root: String,
    /// Hosts whose absolute URLs are object-storage URLs (lower-case, no port)
    pub object_storage_hosts: Vec<String>,
}

impl Default for ResolverConfig {
    fn default() -> Self {
        Self {
            environment: Environment::Development,
            proxy_prefix: PROXY_PREFIX.to_string(),
            upload_root: UPLOAD_ROOT.to_string(),
            object_storage_hosts: split_list(OBJECT_STORAGE_HOSTS),
        }
    }
}

impl ResolverConfig {
    pub fn with_environment(mut self, environment: Environment) -> Self {
        self.environment = environment;
        self
    }
}

/// Two-tier cache settings
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CacheConfig {
    pub durable_backend: DurableBackend,
    /// Directory for the file-backed durable tier
    pub cache_dir: Option<PathBuf>,
    pub durable_quota_bytes: u64,
    /// Entry bound of the in-process tier
    pub volatile_capacity: usize,
    /// Extensions (lower-case, no dot) considered media-like
    pub media_extensions: Vec<String>,
    /// Seconds between background eviction sweeps. 0 = disabled.
    pub sweep_interval_secs: u64,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            durable_backend: DurableBackend::Memory,
            cache_dir: None,
            durable_quota_bytes: DURABLE_QUOTA_BYTES,
            volatile_capacity: VOLATILE_CAPACITY,
            media_extensions: split_list(MEDIA_EXTENSIONS),
            sweep_interval_secs: SWEEP_INTERVAL_SECS,
        }
    }
}

/// Full Medialane configuration
#[derive(Clone, Debug)]
pub struct MedialaneConfig {
    pub resolver: ResolverConfig,
    pub cache: CacheConfig,
    /// Base URL the HTTP loader prefixes to site-relative paths
    pub proxy_base_url: String,
    pub prefetch_concurrency: usize,
    /// JSON file mapping filenames to historical paths tried during a cascade
    pub historical_overrides_path: Option<PathBuf>,
}

impl Default for MedialaneConfig {
    fn default() -> Self {
        Self {
            resolver: ResolverConfig::default(),
            cache: CacheConfig::default(),
            proxy_base_url: PROXY_BASE_URL.to_string(),
            prefetch_concurrency: PREFETCH_CONCURRENCY,
            historical_overrides_path: None,
        }
    }
}

/// Application configuration.
#[derive(Clone, Debug, Default)]
pub struct Config(pub Box<MedialaneConfig>);

impl Config {
    fn inner(&self) -> &MedialaneConfig {
        &self.0
    }

    pub fn from_env() -> Result<Self, anyhow::Error> {
        dotenvy::dotenv().ok();
        let config = MedialaneConfig::from_lookup(|key| env::var(key).ok())?;
        Ok(Config(Box::new(config)))
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        self.inner().validate()
    }

    pub fn is_production(&self) -> bool {
        self.inner().resolver.environment.is_production()
    }

    // Convenience getters for common fields
    pub fn environment(&self) -> Environment {
        self.inner().resolver.environment
    }

    pub fn resolver(&self) -> &ResolverConfig {
        &self.inner().resolver
    }

    pub fn cache(&self) -> &CacheConfig {
        &self.inner().cache
    }

    pub fn proxy_base_url(&self) -> &str {
        &self.inner().proxy_base_url
    }

    pub fn prefetch_concurrency(&self) -> usize {
        self.inner().prefetch_concurrency
    }

    pub fn historical_overrides_path(&self) -> Option<&Path> {
        self.inner().historical_overrides_path.as_deref()
    }

    /// Load the historical override table, or an empty one when unset.
    pub fn historical_overrides(&self) -> Result<HashMap<String, Vec<String>>, anyhow::Error> {
        match self.historical_overrides_path() {
            Some(path) => load_historical_overrides(path),
            None => Ok(HashMap::new()),
        }
    }
}

impl MedialaneConfig {
    /// Build the configuration from a key lookup (the process environment in
    /// production, a map in tests).
    pub fn from_lookup<F>(lookup: F) -> Result<Self, anyhow::Error>
    where
        F: Fn(&str) -> Option<String>,
    {
        let environment = lookup("MEDIALANE_ENVIRONMENT")
            .or_else(|| lookup("ENVIRONMENT"))
            .or_else(|| lookup("APP_ENV"))
            .map(|s| s.parse::<Environment>())
            .transpose()?
            .unwrap_or_default();

        let resolver = ResolverConfig {
            environment,
            proxy_prefix: lookup("MEDIALANE_PROXY_PREFIX")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| PROXY_PREFIX.to_string()),
            upload_root: lookup("MEDIALANE_UPLOAD_ROOT")
                .map(|s| s.trim().trim_matches('/').to_string())
                .unwrap_or_else(|| UPLOAD_ROOT.to_string()),
            object_storage_hosts: split_list(
                &lookup("MEDIALANE_OBJECT_STORAGE_HOSTS")
                    .unwrap_or_else(|| OBJECT_STORAGE_HOSTS.to_string()),
            ),
        };

        let durable_backend = lookup("MEDIALANE_DURABLE_BACKEND")
            .map(|s| s.parse::<DurableBackend>())
            .transpose()?
            .unwrap_or_default();

        let cache = CacheConfig {
            durable_backend,
            cache_dir: lookup("MEDIALANE_CACHE_DIR").map(PathBuf::from),
            durable_quota_bytes: lookup("MEDIALANE_DURABLE_QUOTA_BYTES")
                .map(|s| s.trim().parse())
                .transpose()
                .context("MEDIALANE_DURABLE_QUOTA_BYTES must be a valid number")?
                .unwrap_or(DURABLE_QUOTA_BYTES),
            volatile_capacity: lookup("MEDIALANE_VOLATILE_CAPACITY")
                .map(|s| s.trim().parse())
                .transpose()
                .context("MEDIALANE_VOLATILE_CAPACITY must be a valid number")?
                .unwrap_or(VOLATILE_CAPACITY),
            media_extensions: split_list(
                &lookup("MEDIALANE_MEDIA_EXTENSIONS").unwrap_or_else(|| MEDIA_EXTENSIONS.to_string()),
            )
            .into_iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect(),
            sweep_interval_secs: lookup("MEDIALANE_SWEEP_INTERVAL_SECS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(SWEEP_INTERVAL_SECS),
        };

        Ok(MedialaneConfig {
            resolver,
            cache,
            proxy_base_url: lookup("MEDIALANE_PROXY_BASE_URL")
                .map(|s| s.trim().trim_end_matches('/').to_string())
                .unwrap_or_else(|| PROXY_BASE_URL.to_string()),
            prefetch_concurrency: lookup("MEDIALANE_PREFETCH_CONCURRENCY")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(PREFETCH_CONCURRENCY),
            historical_overrides_path: lookup("MEDIALANE_HISTORICAL_OVERRIDES").map(PathBuf::from),
        })
    }

    pub fn validate(&self) -> Result<(), anyhow::Error> {
        if !self.resolver.proxy_prefix.starts_with('/') {
            return Err(anyhow::anyhow!(
                "MEDIALANE_PROXY_PREFIX must start with '/' (got {})",
                self.resolver.proxy_prefix
            ));
        }

        if self.resolver.upload_root.is_empty() || self.resolver.upload_root.contains('/') {
            return Err(anyhow::anyhow!(
                "MEDIALANE_UPLOAD_ROOT must be a single path segment"
            ));
        }

        if self.cache.durable_backend == DurableBackend::File && self.cache.cache_dir.is_none() {
            return Err(anyhow::anyhow!(
                "MEDIALANE_DURABLE_BACKEND=file requires MEDIALANE_CACHE_DIR to be set"
            ));
        }

        if self.cache.durable_quota_bytes == 0 {
            return Err(anyhow::anyhow!(
                "MEDIALANE_DURABLE_QUOTA_BYTES must be greater than zero"
            ));
        }

        if self.cache.volatile_capacity == 0 {
            return Err(anyhow::anyhow!(
                "MEDIALANE_VOLATILE_CAPACITY must be greater than zero"
            ));
        }

        if self.prefetch_concurrency == 0 {
            return Err(anyhow::anyhow!(
                "MEDIALANE_PREFETCH_CONCURRENCY must be greater than zero"
            ));
        }

        Ok(())
    }
}

fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(|s| s.trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

fn load_historical_overrides(path: &Path) -> Result<HashMap<String, Vec<String>>, anyhow::Error> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read historical overrides {}", path.display()))?;
    let table: HashMap<String, Vec<String>> = serde_json::from_str(&raw)
        .with_context(|| format!("Invalid historical overrides JSON in {}", path.display()))?;
    tracing::debug!(path = %path.display(), entries = table.len(), "Loaded historical overrides");
    Ok(table)
}
