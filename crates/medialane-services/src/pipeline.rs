//! Resolve, cache and load facade.

use anyhow::{Context, Result};
use bytes::Bytes;
use medialane_cache::CacheStore;
use medialane_cascade::{
    CandidateGenerator, CascadeOutcome, FallbackCascadeEngine, LoadFailureEvent, Loader,
    RenderContext,
};
use medialane_core::{Config, MediaCategory};
use medialane_resolver::PathResolver;
use medialane_storage::create_durable_tier;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::sweep::EvictionSweeper;

/// Result of [`MediaPipeline::fetch`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FetchOutcome {
    /// Served from the cache under the resolved path.
    Cached { path: String, payload: Bytes },
    /// The resolved path loaded on the first try and was cached.
    Loaded { path: String, payload: Bytes },
    /// The resolved path failed; this is how the cascade ended.
    Fallback(CascadeOutcome),
}

impl FetchOutcome {
    /// The source the renderer should assign, if any.
    pub fn source(&self) -> Option<String> {
        match self {
            FetchOutcome::Cached { path, .. } | FetchOutcome::Loaded { path, .. } => {
                Some(path.clone())
            }
            FetchOutcome::Fallback(outcome) => outcome.source(),
        }
    }

    pub fn payload(&self) -> Option<&Bytes> {
        match self {
            FetchOutcome::Cached { payload, .. }
            | FetchOutcome::Loaded { payload, .. }
            | FetchOutcome::Fallback(CascadeOutcome::Recovered { payload, .. }) => Some(payload),
            FetchOutcome::Fallback(_) => None,
        }
    }
}

/// What a renderer talks to.
///
/// Owns no global state: the cache is passed in and may be shared with a
/// [`Prefetcher`](crate::Prefetcher) and an
/// [`EvictionSweeper`](crate::EvictionSweeper).
#[derive(Clone)]
pub struct MediaPipeline {
    resolver: PathResolver,
    cache: Arc<CacheStore>,
    engine: FallbackCascadeEngine,
    loader: Arc<dyn Loader>,
    sweep_interval: Duration,
}

impl MediaPipeline {
    pub fn new(
        resolver: PathResolver,
        cache: Arc<CacheStore>,
        engine: FallbackCascadeEngine,
        loader: Arc<dyn Loader>,
    ) -> Self {
        Self {
            resolver,
            cache,
            engine,
            loader,
            sweep_interval: Duration::ZERO,
        }
    }

    /// Period of the background sweep started by
    /// [`start_sweeper`](Self::start_sweeper). Zero disables it.
    pub fn with_sweep_interval(mut self, period: Duration) -> Self {
        self.sweep_interval = period;
        self
    }

    /// Wire a pipeline from configuration: the configured durable tier,
    /// historical overrides and resolver environment.
    pub async fn from_config(config: &Config, loader: Arc<dyn Loader>) -> Result<Self> {
        let durable = create_durable_tier(config.cache())
            .await
            .context("Failed to create durable cache tier")?;
        let cache = Arc::new(CacheStore::from_config(
            config.cache(),
            config.resolver(),
            durable,
        ));
        let resolver = PathResolver::new(config.resolver().clone());
        let overrides = config
            .historical_overrides()
            .context("Failed to load historical overrides")?;
        let engine = FallbackCascadeEngine::new(
            CandidateGenerator::new(resolver.clone()).with_overrides(overrides),
        );

        tracing::info!(
            environment = %config.environment(),
            durable_backend = %config.cache().durable_backend,
            "Media pipeline ready"
        );
        Ok(Self::new(resolver, cache, engine, loader).with_sweep_interval(Duration::from_secs(
            config.cache().sweep_interval_secs,
        )))
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    pub fn cache(&self) -> &Arc<CacheStore> {
        &self.cache
    }

    pub fn engine(&self) -> &FallbackCascadeEngine {
        &self.engine
    }

    pub fn loader(&self) -> &Arc<dyn Loader> {
        &self.loader
    }

    pub fn sweep_interval(&self) -> Duration {
        self.sweep_interval
    }

    /// Start the background eviction sweep over this pipeline's cache.
    pub fn start_sweeper(&self, cancel: CancellationToken) -> JoinHandle<()> {
        EvictionSweeper::start(self.cache.clone(), self.sweep_interval, cancel)
    }

    pub fn resolve(&self, reference: &str, category_hint: Option<MediaCategory>) -> String {
        self.resolver.resolve(reference, category_hint)
    }

    /// Resolve `reference`, serve it from the cache when possible, otherwise
    /// load it. Only a first-try load is written to the cache; a failed load
    /// hands over to the fallback cascade.
    #[tracing::instrument(skip(self, fallback, cancel))]
    pub async fn fetch(
        &self,
        reference: &str,
        category_hint: Option<MediaCategory>,
        fallback: Option<String>,
        context: RenderContext,
        cancel: &CancellationToken,
    ) -> FetchOutcome {
        let path = self.resolver.resolve(reference, category_hint);

        if let Some(payload) = self.cache.get(&path).await {
            return FetchOutcome::Cached { path, payload };
        }

        let first = tokio::select! {
            biased;
            _ = cancel.cancelled() => return FetchOutcome::Fallback(CascadeOutcome::Abandoned),
            result = self.loader.load(&path) => result,
        };

        match first {
            Ok(payload) => {
                self.cache.set(&path, payload.clone()).await;
                FetchOutcome::Loaded { path, payload }
            }
            Err(e) => {
                tracing::debug!(path = %path, error = %e, "Resolved path failed, starting cascade");
                let event = LoadFailureEvent {
                    reference: path,
                    category_hint,
                    fallback,
                    context,
                };
                let outcome = self
                    .engine
                    .on_load_failure(&event, self.loader.as_ref(), cancel)
                    .await;
                FetchOutcome::Fallback(outcome)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use medialane_cache::MediaLikeClassifier;
    use medialane_cascade::LoadError;
    use medialane_core::ResolverConfig;
    use medialane_storage::MemoryDurableTier;
    use std::collections::HashMap;
    use std::sync::Mutex;

    struct MapLoader {
        files: HashMap<String, Bytes>,
        calls: Mutex<usize>,
    }

    impl MapLoader {
        fn new(files: &[(&str, &'static [u8])]) -> Self {
            Self {
                files: files
                    .iter()
                    .map(|(k, v)| (k.to_string(), Bytes::from_static(v)))
                    .collect(),
                calls: Mutex::new(0),
            }
        }

        fn calls(&self) -> usize {
            *self.calls.lock().unwrap()
        }
    }

    #[async_trait]
    impl Loader for MapLoader {
        async fn load(&self, path: &str) -> Result<Bytes, LoadError> {
            *self.calls.lock().unwrap() += 1;
            self.files
                .get(path)
                .cloned()
                .ok_or_else(|| LoadError::NotFound(path.to_string()))
        }
    }

    fn pipeline(loader: Arc<MapLoader>) -> MediaPipeline {
        let resolver = PathResolver::new(ResolverConfig::default());
        let cache = Arc::new(CacheStore::new(
            Arc::new(MemoryDurableTier::new(1024 * 1024)),
            MediaLikeClassifier::default(),
            16,
        ));
        let engine = FallbackCascadeEngine::new(CandidateGenerator::new(resolver.clone()));
        MediaPipeline::new(resolver, cache, engine, loader)
    }

    #[tokio::test]
    async fn test_first_try_success_is_cached() {
        let loader = Arc::new(MapLoader::new(&[(
            "/uploads/forum/post.png",
            &b"post"[..],
        )]));
        let pipeline = pipeline(loader.clone());
        let cancel = CancellationToken::new();

        let first = pipeline
            .fetch("forum/post.png", None, None, RenderContext::Default, &cancel)
            .await;
        assert_eq!(
            first,
            FetchOutcome::Loaded {
                path: "/uploads/forum/post.png".into(),
                payload: Bytes::from_static(b"post"),
            }
        );

        let second = pipeline
            .fetch("forum/post.png", None, None, RenderContext::Default, &cancel)
            .await;
        assert!(matches!(second, FetchOutcome::Cached { .. }));
        assert_eq!(loader.calls(), 1);
    }

    #[tokio::test]
    async fn test_recovered_path_is_not_cached() {
        let loader = Arc::new(MapLoader::new(&[("/forum/post.png", &b"legacy"[..])]));
        let pipeline = pipeline(loader);
        let cancel = CancellationToken::new();

        let outcome = pipeline
            .fetch("forum/post.png", None, None, RenderContext::Default, &cancel)
            .await;
        assert_eq!(outcome.source().as_deref(), Some("/forum/post.png"));
        assert_eq!(outcome.payload(), Some(&Bytes::from_static(b"legacy")));

        assert!(!pipeline.cache().has("/uploads/forum/post.png").await);
        assert!(!pipeline.cache().has("/forum/post.png").await);
    }

    #[tokio::test]
    async fn test_cancelled_fetch_is_abandoned() {
        let loader = Arc::new(MapLoader::new(&[]));
        let pipeline = pipeline(loader.clone());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let outcome = pipeline
            .fetch("forum/post.png", None, None, RenderContext::Default, &cancel)
            .await;
        assert_eq!(outcome, FetchOutcome::Fallback(CascadeOutcome::Abandoned));
        assert_eq!(loader.calls(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_config_built_pipeline_sweeps_on_interval() {
        let mut config = Config::default();
        config.0.cache.sweep_interval_secs = 60;
        let pipeline = MediaPipeline::from_config(&config, Arc::new(MapLoader::new(&[])))
            .await
            .unwrap();
        assert_eq!(pipeline.sweep_interval(), Duration::from_secs(60));

        pipeline
            .cache()
            .set("/uploads/forum/post.png", Bytes::from_static(b"post"))
            .await;
        let cancel = CancellationToken::new();
        let handle = pipeline.start_sweeper(cancel.clone());

        tokio::time::sleep(Duration::from_secs(30)).await;
        assert_eq!(pipeline.cache().stats().await.durable.entries, 1);

        tokio::time::sleep(Duration::from_secs(31)).await;
        assert_eq!(pipeline.cache().stats().await.durable.entries, 0);

        cancel.cancel();
        handle.await.unwrap();
    }
}
