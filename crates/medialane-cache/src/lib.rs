//! Two-tier media payload cache.
//!
//! [`CacheStore`] pairs a bounded in-process (volatile) tier with a durable
//! tier from `medialane-storage`. Reads fall through to the durable tier and
//! promote hits; writes go to both tiers, and a durable write that runs out of
//! quota triggers [`EvictionPolicy`] once before being retried.

pub mod classifier;
pub mod clock;
pub mod eviction;
pub mod store;

pub use classifier::MediaLikeClassifier;
pub use clock::{Clock, ManualClock, SystemClock};
pub use eviction::{EvictionPlan, EvictionPolicy, EvictionTier};
pub use store::{CacheStats, CacheStore, SetOutcome};
