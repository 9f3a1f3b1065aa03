//! Media-like reference classification.
//!
//! Only media-like references are cached: those with a media file extension,
//! or whose path sits under one of the media path markers (the proxy prefix,
//! the upload root, `/media/`, `/images/`).

use medialane_core::models::reference::{extension, is_inline, ReferenceParts};
use medialane_core::{CacheConfig, ResolverConfig};
use std::collections::HashSet;

#[derive(Debug, Clone)]
pub struct MediaLikeClassifier {
    extensions: HashSet<String>,
    path_markers: Vec<String>,
}

impl MediaLikeClassifier {
    pub fn new<E, M>(extensions: E, path_markers: M) -> Self
    where
        E: IntoIterator,
        E::Item: Into<String>,
        M: IntoIterator,
        M::Item: Into<String>,
    {
        Self {
            extensions: extensions
                .into_iter()
                .map(|e| {
                    let e: String = e.into();
                    e.trim_start_matches('.').to_lowercase()
                })
                .collect(),
            path_markers: path_markers.into_iter().map(Into::into).collect(),
        }
    }

    pub fn from_config(cache: &CacheConfig, resolver: &ResolverConfig) -> Self {
        Self::new(
            cache.media_extensions.iter().cloned(),
            [
                format!("{}/", resolver.proxy_prefix.trim_end_matches('/')),
                format!("/{}/", resolver.upload_root),
                "/media/".to_string(),
                "/images/".to_string(),
            ],
        )
    }

    pub fn is_media_like(&self, reference: &str) -> bool {
        let reference = reference.trim();
        if reference.is_empty() || is_inline(reference) {
            return false;
        }
        let parts = ReferenceParts::split(reference);
        if extension(parts.file_name()).is_some_and(|ext| self.extensions.contains(&ext)) {
            return true;
        }
        self.path_markers.iter().any(|m| parts.path.contains(m.as_str()))
    }
}

impl Default for MediaLikeClassifier {
    fn default() -> Self {
        Self::from_config(&CacheConfig::default(), &ResolverConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_match() {
        let classifier = MediaLikeClassifier::default();
        assert!(classifier.is_media_like("x.png"));
        assert!(classifier.is_media_like("/static/Photo.JPG?v=1"));
        assert!(!classifier.is_media_like("/static/app.js"));
    }

    #[test]
    fn path_marker_match() {
        let classifier = MediaLikeClassifier::default();
        assert!(classifier.is_media_like("/api/object-storage/CALENDAR/calendar/blob"));
        assert!(classifier.is_media_like("/uploads/forum/raw"));
        assert!(!classifier.is_media_like("/api/users/7"));
    }

    #[test]
    fn inline_and_empty_are_never_media_like() {
        let classifier = MediaLikeClassifier::default();
        assert!(!classifier.is_media_like(""));
        assert!(!classifier.is_media_like("data:image/png;base64,AAAA"));
    }

    #[test]
    fn custom_extensions_are_normalized() {
        let classifier = MediaLikeClassifier::new([".HEIC"], Vec::<String>::new());
        assert!(classifier.is_media_like("IMG_1.heic"));
        assert!(!classifier.is_media_like("/uploads/a.png"));
    }
}
