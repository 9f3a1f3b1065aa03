//! HTTP loader.
//!
//! Fetches resolved paths from the platform (object-storage proxy, upload
//! roots, static assets). Site-relative paths are prefixed with the proxy base
//! URL; absolute URLs are fetched as given.

use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use medialane_cascade::{LoadError, Loader};
use medialane_core::models::reference::{is_absolute_url, ReferenceParts};
use medialane_core::Config;
use medialane_resolver::object_storage::encode_path_segments;
use reqwest::{Client, StatusCode};
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Clone, Debug)]
pub struct HttpLoader {
    client: Client,
    base_url: String,
}

impl HttpLoader {
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(config.proxy_base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Absolute URL for `path`.
    pub fn url_for(&self, path: &str) -> String {
        if is_absolute_url(path) {
            return if path.starts_with("//") {
                format!("https:{}", path)
            } else {
                path.to_string()
            };
        }
        let parts = ReferenceParts::split(path);
        let relative = encode_path_segments(parts.path.trim_start_matches('/'));
        format!("{}/{}{}", self.base_url, relative, parts.suffix)
    }
}

#[async_trait]
impl Loader for HttpLoader {
    #[tracing::instrument(skip(self), fields(http.url = tracing::field::Empty))]
    async fn load(&self, path: &str) -> Result<Bytes, LoadError> {
        let url = self.url_for(path);
        tracing::Span::current().record("http.url", url.as_str());

        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| LoadError::Transport(e.to_string()))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Err(LoadError::NotFound(path.to_string()));
        }
        if !status.is_success() {
            return Err(LoadError::Http {
                status: status.as_u16(),
                path: path.to_string(),
            });
        }

        let payload = response
            .bytes()
            .await
            .map_err(|e| LoadError::Decode(e.to_string()))?;
        tracing::debug!(size_bytes = payload.len(), "Loaded media");
        Ok(payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn relative_paths_are_joined_and_encoded() {
        let loader = HttpLoader::new("http://localhost:3000/").unwrap();
        assert_eq!(
            loader.url_for("/uploads/forum/my photo.png?v=2"),
            "http://localhost:3000/uploads/forum/my%20photo.png?v=2"
        );
        assert_eq!(
            loader.url_for("/api/object-storage/CALENDAR/calendar/a%20b.png"),
            "http://localhost:3000/api/object-storage/CALENDAR/calendar/a%20b.png"
        );
    }

    #[test]
    fn absolute_urls_are_kept() {
        let loader = HttpLoader::new("http://localhost:3000").unwrap();
        assert_eq!(
            loader.url_for("https://object-storage.host/BANNER/x.png"),
            "https://object-storage.host/BANNER/x.png"
        );
        assert_eq!(
            loader.url_for("//cdn.example.com/x.png"),
            "https://cdn.example.com/x.png"
        );
    }
}
