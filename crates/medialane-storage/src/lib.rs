//! Medialane Storage Library
//!
//! This crate provides the durable cache tier: the `DurableTier` trait and its
//! in-memory and file-backed implementations.
//!
//! # Record layout
//!
//! A durable record is `{key, payload, last_touched}`. Backends are bounded by
//! a byte quota; a write that would exceed it fails with
//! [`StorageError::QuotaExceeded`] and leaves the tier unchanged. Records
//! written before timestamps were tracked load with `last_touched = None`.
//!
//! The file backend names record files after the SHA-256 of the key (see the
//! `keys` module), so arbitrary keys never escape the cache directory.

pub mod factory;
#[cfg(feature = "durable-file")]
pub mod file;
pub(crate) mod keys;
#[cfg(feature = "durable-memory")]
pub mod memory;
pub mod traits;

// Re-export commonly used types
pub use factory::create_durable_tier;
#[cfg(feature = "durable-file")]
pub use file::FileDurableTier;
pub use medialane_core::DurableBackend;
#[cfg(feature = "durable-memory")]
pub use memory::MemoryDurableTier;
pub use traits::{DurableRecord, DurableTier, EntryMeta, StorageError, StorageResult, TierUsage};
