use futures::stream::{self, StreamExt};
use medialane_cache::{CacheStore, SetOutcome};
use medialane_cascade::Loader;
use medialane_resolver::PathResolver;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct PrefetchReport {
    pub requested: usize,
    /// Already cached, duplicated in the batch, or not media-like.
    pub skipped: usize,
    pub stored: usize,
    pub failed: usize,
}

/// Warms the cache for references that are about to be rendered.
///
/// Failures are counted, never retried: a reference that fails here goes
/// through the fallback cascade when it is actually rendered.
#[derive(Clone)]
pub struct Prefetcher {
    resolver: PathResolver,
    cache: Arc<CacheStore>,
    loader: Arc<dyn Loader>,
    concurrency: usize,
}

impl Prefetcher {
    pub fn new(
        resolver: PathResolver,
        cache: Arc<CacheStore>,
        loader: Arc<dyn Loader>,
        concurrency: usize,
    ) -> Self {
        Self {
            resolver,
            cache,
            loader,
            concurrency: concurrency.max(1),
        }
    }

    #[tracing::instrument(skip_all, fields(requested = references.len()))]
    pub async fn prefetch<S: AsRef<str>>(&self, references: &[S]) -> PrefetchReport {
        let mut report = PrefetchReport {
            requested: references.len(),
            ..PrefetchReport::default()
        };

        let mut seen = HashSet::new();
        let mut pending = Vec::new();
        for reference in references {
            let path = self.resolver.resolve(reference.as_ref(), None);
            if !seen.insert(path.clone())
                || !self.cache.classifier().is_media_like(&path)
                || self.cache.has(&path).await
            {
                report.skipped += 1;
                continue;
            }
            pending.push(path);
        }

        let outcomes: Vec<Option<SetOutcome>> = stream::iter(pending)
            .map(|path| {
                let loader = self.loader.clone();
                let cache = self.cache.clone();
                async move {
                    match loader.load(&path).await {
                        Ok(payload) => Some(cache.set(&path, payload).await),
                        Err(e) => {
                            tracing::debug!(path = %path, error = %e, "Prefetch failed");
                            None
                        }
                    }
                }
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        for outcome in outcomes {
            match outcome {
                Some(SetOutcome::Stored) | Some(SetOutcome::VolatileOnly) => report.stored += 1,
                Some(SetOutcome::Ignored) => report.skipped += 1,
                None => report.failed += 1,
            }
        }

        tracing::info!(
            skipped = report.skipped,
            stored = report.stored,
            failed = report.failed,
            "Prefetch completed"
        );
        report
    }
}
