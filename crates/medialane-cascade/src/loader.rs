//! Resource loading seam.

use async_trait::async_trait;
use bytes::Bytes;
use thiserror::Error;

/// A single failed load attempt.
#[derive(Debug, Error)]
pub enum LoadError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("HTTP {status} loading {path}")]
    Http { status: u16, path: String },

    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Could not decode payload: {0}")]
    Decode(String),
}

/// Loads the payload behind a resolved path.
///
/// Implementations signal failure through `Err`; the cascade never retries
/// the same path itself, so a loader should not retry either.
#[async_trait]
pub trait Loader: Send + Sync {
    async fn load(&self, path: &str) -> Result<Bytes, LoadError>;
}
