//! Fallback cascade for media that failed to load.
//!
//! When a resolved path fails to load, [`FallbackCascadeEngine`] builds an
//! ordered, category-specific list of alternative paths
//! ([`CandidateGenerator`]) and tries them one at a time through a
//! [`Loader`] until one loads, the list (plus an optional caller fallback) is
//! exhausted, or the caller cancels. Exhaustion yields a [`SyntheticDefault`]
//! glyph that renders without any further I/O.
//!
//! The sequencing itself lives in the pure [`Cascade`] state machine so it can
//! be tested without a loader.

pub mod candidates;
pub mod engine;
pub mod event;
pub mod loader;
pub mod state;
pub mod synthetic;

pub use candidates::{cache_bust_token, CandidateGenerator};
pub use engine::{CascadeOutcome, FallbackCascadeEngine};
pub use event::{LoadFailureEvent, RenderContext};
pub use loader::{LoadError, Loader};
pub use state::{Cascade, CascadeState};
pub use synthetic::SyntheticDefault;
