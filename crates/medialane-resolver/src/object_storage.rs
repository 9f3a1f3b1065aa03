//! Object-storage URL helpers.
//!
//! External object-storage URLs look like `https://{host}/{BUCKET}/{key...}`.
//! The proxy serves the same objects under `{proxy_prefix}/{BUCKET}/{key...}`.

use std::borrow::Cow;
use url::Url;

/// An absolute URL on a recognized object-storage host.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObjectStorageUrl {
    pub host: String,
    pub bucket: String,
    /// Percent-encoded object key, without a leading slash.
    pub key: String,
}

impl ObjectStorageUrl {
    /// Parse `url` if its host is one of `hosts` (lower-case, no port) and it
    /// names at least a bucket and a key. Protocol-relative URLs are read as
    /// https.
    pub fn parse(url: &str, hosts: &[String]) -> Option<Self> {
        let parsed = match url.strip_prefix("//") {
            Some(rest) => Url::parse(&format!("https://{}", rest)),
            None => Url::parse(url),
        }
        .ok()?;

        let host = parsed.host_str()?.to_lowercase();
        if !hosts.iter().any(|h| h == &host) {
            return None;
        }

        let mut segments = parsed.path_segments()?.skip_while(|s| s.is_empty());
        let bucket = segments.next()?.to_string();
        let key = segments.collect::<Vec<_>>().join("/");
        if bucket.is_empty() || key.trim_matches('/').is_empty() {
            return None;
        }
        Some(ObjectStorageUrl { host, bucket, key })
    }

    /// Key with percent-escapes decoded; falls back to the raw key when the
    /// escapes are not valid UTF-8.
    pub fn decoded_key(&self) -> Cow<'_, str> {
        urlencoding::decode(&self.key).unwrap_or(Cow::Borrowed(self.key.as_str()))
    }

    pub fn to_proxy_path(&self, proxy_prefix: &str) -> String {
        ProxyPath {
            bucket: &self.bucket,
            key: &self.key,
        }
        .render(proxy_prefix)
    }
}

/// A path in canonical proxy form.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProxyPath<'a> {
    pub bucket: &'a str,
    pub key: &'a str,
}

impl<'a> ProxyPath<'a> {
    /// Parse a path (no query string) in proxy form.
    pub fn parse(path: &'a str, proxy_prefix: &str) -> Option<Self> {
        let rest = path.strip_prefix(proxy_prefix)?.strip_prefix('/')?;
        let (bucket, key) = rest.split_once('/')?;
        if bucket.is_empty() || key.is_empty() {
            return None;
        }
        Some(ProxyPath { bucket, key })
    }

    pub fn render(&self, proxy_prefix: &str) -> String {
        format!(
            "{}/{}/{}",
            proxy_prefix.trim_end_matches('/'),
            self.bucket,
            self.key.trim_start_matches('/')
        )
    }
}

/// Whether `path` is in canonical proxy form.
pub fn is_proxy_path(path: &str, proxy_prefix: &str) -> bool {
    path.strip_prefix(proxy_prefix)
        .is_some_and(|rest| rest.starts_with('/') && rest.len() > 1)
}

/// Percent-encode each segment of a site-relative path, leaving the
/// separators alone. Segments that are already encoded are decoded first so
/// encoding never doubles up.
pub fn encode_path_segments(path: &str) -> String {
    path.split('/')
        .map(|segment| {
            let decoded = urlencoding::decode(segment).unwrap_or(Cow::Borrowed(segment));
            urlencoding::encode(&decoded).into_owned()
        })
        .collect::<Vec<_>>()
        .join("/")
}
