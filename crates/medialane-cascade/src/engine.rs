use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::candidates::CandidateGenerator;
use crate::event::LoadFailureEvent;
use crate::loader::Loader;
use crate::state::Cascade;
use crate::synthetic::SyntheticDefault;

/// How a cascade ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CascadeOutcome {
    /// Attempt `attempt` (zero-based) loaded.
    Recovered {
        path: String,
        attempt: usize,
        payload: Bytes,
    },
    /// Every candidate and the fallback failed; render the glyph.
    Substituted(SyntheticDefault),
    /// Cancelled before finishing. Nothing should be rendered.
    Abandoned,
}

impl CascadeOutcome {
    /// The source the renderer should assign, if any.
    pub fn source(&self) -> Option<String> {
        match self {
            CascadeOutcome::Recovered { path, .. } => Some(path.clone()),
            CascadeOutcome::Substituted(glyph) => Some(glyph.data_uri()),
            CascadeOutcome::Abandoned => None,
        }
    }

    pub fn is_recovered(&self) -> bool {
        matches!(self, CascadeOutcome::Recovered { .. })
    }
}

/// Drives a [`Cascade`] against a [`Loader`].
///
/// Attempts run strictly one after another. The engine never writes to the
/// cache; a path that only loaded after a failure is not a canonical value.
#[derive(Debug, Clone)]
pub struct FallbackCascadeEngine {
    generator: CandidateGenerator,
}

impl FallbackCascadeEngine {
    pub fn new(generator: CandidateGenerator) -> Self {
        Self { generator }
    }

    pub fn generator(&self) -> &CandidateGenerator {
        &self.generator
    }

    /// The cascade `event` would run, without running it.
    pub fn plan(&self, event: &LoadFailureEvent) -> Cascade {
        Cascade::new(
            &event.reference,
            self.generator.candidates(event),
            event.fallback.clone(),
        )
    }

    /// Run the cascade for `event`.
    ///
    /// When `cancel` fires the in-flight attempt is dropped and the cascade
    /// ends with [`CascadeOutcome::Abandoned`]; no error is raised.
    #[tracing::instrument(skip_all, fields(reference = %event.reference))]
    pub async fn on_load_failure<L>(
        &self,
        event: &LoadFailureEvent,
        loader: &L,
        cancel: &CancellationToken,
    ) -> CascadeOutcome
    where
        L: Loader + ?Sized,
    {
        let category = self.generator.category_for(event);
        let mut cascade = self.plan(event);

        while let Some(candidate) = cascade.next_candidate().map(str::to_owned) {
            let attempt = cascade.attempts() - 1;
            let fallback = cascade.is_fallback(attempt);

            let result = tokio::select! {
                biased;
                _ = cancel.cancelled() => {
                    tracing::debug!(attempt, "Cascade cancelled, discarding in-flight attempt");
                    return CascadeOutcome::Abandoned;
                }
                result = loader.load(&candidate) => result,
            };

            match result {
                Ok(payload) => {
                    cascade.record_success();
                    tracing::info!(
                        category = %category,
                        path = %candidate,
                        attempt,
                        fallback,
                        "Recovered media load"
                    );
                    return CascadeOutcome::Recovered {
                        path: candidate,
                        attempt,
                        payload,
                    };
                }
                Err(e) => {
                    tracing::debug!(path = %candidate, attempt, error = %e, "Candidate failed");
                    cascade.record_failure();
                }
            }
        }

        tracing::warn!(
            category = %category,
            attempts = cascade.attempts(),
            "Fallback cascade exhausted, substituting synthesized default"
        );
        CascadeOutcome::Substituted(SyntheticDefault::for_category(category))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::RenderContext;
    use crate::loader::LoadError;
    use async_trait::async_trait;
    use medialane_core::{Environment, MediaCategory, ResolverConfig};
    use medialane_resolver::PathResolver;
    use std::collections::HashSet;
    use std::sync::Mutex;

    /// Succeeds only for `ok` paths and records every call.
    struct ScriptedLoader {
        ok: HashSet<String>,
        calls: Mutex<Vec<String>>,
    }

    impl ScriptedLoader {
        fn new(ok: &[&str]) -> Self {
            Self {
                ok: ok.iter().map(|s| s.to_string()).collect(),
                calls: Mutex::new(Vec::new()),
            }
        }

        fn calls(&self) -> Vec<String> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl Loader for ScriptedLoader {
        async fn load(&self, path: &str) -> Result<Bytes, LoadError> {
            self.calls.lock().unwrap().push(path.to_string());
            if self.ok.contains(path) {
                Ok(Bytes::from(format!("bytes of {}", path)))
            } else {
                Err(LoadError::NotFound(path.to_string()))
            }
        }
    }

    /// Never finishes a load.
    struct HangingLoader;

    #[async_trait]
    impl Loader for HangingLoader {
        async fn load(&self, _path: &str) -> Result<Bytes, LoadError> {
            std::future::pending().await
        }
    }

    fn engine() -> FallbackCascadeEngine {
        FallbackCascadeEngine::new(CandidateGenerator::new(PathResolver::new(
            ResolverConfig::default().with_environment(Environment::Development),
        )))
    }

    #[tokio::test]
    async fn test_calendar_recovers_on_fourth_candidate() {
        let loader = ScriptedLoader::new(&["/uploads/foo.png"]);
        let event = LoadFailureEvent::new("/uploads/calendar/foo.png");

        let outcome = engine()
            .on_load_failure(&event, &loader, &CancellationToken::new())
            .await;

        match outcome {
            CascadeOutcome::Recovered { path, attempt, .. } => {
                assert_eq!(path, "/uploads/foo.png");
                assert_eq!(attempt, 3);
            }
            other => panic!("expected recovery, got {:?}", other),
        }
        assert_eq!(
            loader.calls(),
            vec![
                "/api/object-storage/CALENDAR/calendar/foo.png",
                "/calendar/foo.png",
                "/media/foo.png",
                "/uploads/foo.png",
            ]
        );
    }

    #[tokio::test]
    async fn test_exhaustion_substitutes_glyph_within_bound() {
        let loader = ScriptedLoader::new(&[]);
        let event = LoadFailureEvent::new("/uploads/calendar/foo.png").with_fallback("/img/fallback.png");
        let engine = engine();
        let planned = engine.generator().candidates(&event).len();

        let outcome = engine
            .on_load_failure(&event, &loader, &CancellationToken::new())
            .await;

        assert_eq!(
            outcome,
            CascadeOutcome::Substituted(SyntheticDefault::for_category(MediaCategory::Calendar))
        );
        let calls = loader.calls();
        assert_eq!(calls.len(), planned + 1);
        assert_eq!(calls.last().map(String::as_str), Some("/img/fallback.png"));

        let unique: HashSet<&String> = calls.iter().collect();
        assert_eq!(unique.len(), calls.len());
        assert!(!calls.contains(&"/uploads/calendar/foo.png".to_string()));
        assert!(outcome.source().unwrap().starts_with("data:image/svg+xml,"));
    }

    #[tokio::test]
    async fn test_caller_fallback_can_recover() {
        let loader = ScriptedLoader::new(&["/img/fallback.png"]);
        let event = LoadFailureEvent::new("thread-1.png")
            .with_category(MediaCategory::Forum)
            .with_fallback("/img/fallback.png");

        let outcome = engine()
            .on_load_failure(&event, &loader, &CancellationToken::new())
            .await;
        assert_eq!(outcome.source().as_deref(), Some("/img/fallback.png"));
    }

    #[tokio::test]
    async fn test_cascade_stops_at_first_successful_candidate() {
        let loader = ScriptedLoader::new(&["/uploads/vendors/logo.png"]);
        let event = LoadFailureEvent::new("/vendors/logo.png").with_context(RenderContext::Default);

        let outcome = engine()
            .on_load_failure(&event, &loader, &CancellationToken::new())
            .await;
        assert!(outcome.is_recovered());
        let calls = loader.calls();
        assert_eq!(calls.len(), 2);
        assert_eq!(calls.last().map(String::as_str), Some("/uploads/vendors/logo.png"));
    }

    #[tokio::test]
    async fn test_cancellation_abandons_quietly() {
        let cancel = CancellationToken::new();
        let event = LoadFailureEvent::new("/uploads/calendar/foo.png");
        let engine = engine();

        let handle = {
            let cancel = cancel.clone();
            tokio::spawn(async move {
                engine
                    .on_load_failure(&event, &HangingLoader, &cancel)
                    .await
            })
        };
        cancel.cancel();

        assert_eq!(handle.await.unwrap(), CascadeOutcome::Abandoned);
    }

    #[tokio::test]
    async fn test_already_cancelled_makes_no_attempts() {
        let cancel = CancellationToken::new();
        cancel.cancel();
        let loader = ScriptedLoader::new(&["/uploads/foo.png"]);
        let event = LoadFailureEvent::new("/uploads/calendar/foo.png");

        let outcome = engine().on_load_failure(&event, &loader, &cancel).await;
        assert_eq!(outcome, CascadeOutcome::Abandoned);
        assert!(loader.calls().is_empty());
    }
}
