//! Medialane Services Layer
//!
//! Orchestration over the resolver, the two-tier cache and the fallback
//! cascade: the [`MediaPipeline`] facade used by renderers, the
//! [`Prefetcher`], the background [`EvictionSweeper`] and the reqwest-backed
//! [`HttpLoader`]. Binaries depend on this crate alone.

pub mod http_loader;
pub mod pipeline;
pub mod prefetch;
pub mod sweep;

pub use http_loader::HttpLoader;
pub use pipeline::{FetchOutcome, MediaPipeline};
pub use prefetch::{PrefetchReport, Prefetcher};
pub use sweep::EvictionSweeper;

pub use medialane_cache::{CacheStats, CacheStore, SetOutcome};
pub use medialane_cascade::{
    CandidateGenerator, CascadeOutcome, FallbackCascadeEngine, LoadError, LoadFailureEvent,
    Loader, RenderContext, SyntheticDefault,
};
pub use medialane_resolver::{PathResolver, Resolution};
pub use medialane_storage::{create_durable_tier, DurableTier};
