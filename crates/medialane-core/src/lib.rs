//! Medialane Core Library
//!
//! This crate provides the domain types, error types and configuration shared by
//! every Medialane component: media references, categories, the runtime
//! environment and the durable cache backend selection.

pub mod config;
pub mod error;
pub mod models;
pub mod storage_types;

// Re-export commonly used types
pub use config::{CacheConfig, Config, ResolverConfig};
pub use error::{AppError, ErrorMetadata, LogLevel};
pub use models::{Environment, MediaCategory, ReferenceParts};
pub use storage_types::DurableBackend;
