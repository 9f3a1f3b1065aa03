//! Category-specific alternative paths for a failed load.
//!
//! Lists are fixed per category and never reordered by history, so the same
//! failure always produces the same list. Each list is deduplicated (first
//! occurrence wins) and never contains the failing reference.

use medialane_core::models::reference::{is_inline, ReferenceParts};
use medialane_core::MediaCategory;
use medialane_resolver::object_storage::ProxyPath;
use medialane_resolver::routing::category_for_bucket;
use medialane_resolver::{detect_category, route, PathResolver};
use sha2::{Digest, Sha256};
use std::collections::{HashMap, HashSet};

use crate::event::{LoadFailureEvent, RenderContext};

/// Deterministic cache-busting token for `file_name`: the first 8 hex
/// characters of its SHA-256.
pub fn cache_bust_token(file_name: &str) -> String {
    let digest = Sha256::digest(file_name.as_bytes());
    hex::encode(&digest[..4])
}

#[derive(Debug, Clone)]
pub struct CandidateGenerator {
    resolver: PathResolver,
    /// Known historical locations, keyed by filename.
    overrides: HashMap<String, Vec<String>>,
}

impl CandidateGenerator {
    pub fn new(resolver: PathResolver) -> Self {
        Self {
            resolver,
            overrides: HashMap::new(),
        }
    }

    pub fn with_overrides(mut self, overrides: HashMap<String, Vec<String>>) -> Self {
        self.overrides = overrides;
        self
    }

    pub fn resolver(&self) -> &PathResolver {
        &self.resolver
    }

    /// Category the cascade for `event` runs under: the hint, else the bucket
    /// of a proxy path, else heuristic detection.
    pub fn category_for(&self, event: &LoadFailureEvent) -> MediaCategory {
        if let Some(hint) = event.category_hint.filter(|c| *c != MediaCategory::Generic) {
            return hint;
        }
        let parts = ReferenceParts::split(event.reference.trim());
        ProxyPath::parse(parts.path, &self.resolver.config().proxy_prefix)
            .and_then(|p| category_for_bucket(p.bucket))
            .unwrap_or_else(|| detect_category(&event.reference).category)
    }

    /// Ordered alternatives for `event`, excluding the caller fallback.
    pub fn candidates(&self, event: &LoadFailureEvent) -> Vec<String> {
        let category = self.category_for(event);
        let reference = event.reference.trim();

        let file_name = if is_inline(reference) {
            ""
        } else {
            ReferenceParts::split(reference).file_name()
        };

        let list = if file_name.is_empty() {
            vec![self.resolver.default_asset(category)]
        } else {
            self.category_list(category, file_name, event.context)
        };

        let mut seen: HashSet<&str> = HashSet::from([reference]);
        let mut out = Vec::with_capacity(list.len());
        for candidate in &list {
            if seen.insert(candidate.as_str()) {
                out.push(candidate.clone());
            }
        }

        tracing::debug!(
            reference,
            category = %category,
            candidates = out.len(),
            "Generated fallback candidates"
        );
        out
    }

    fn category_list(
        &self,
        category: MediaCategory,
        file: &str,
        context: RenderContext,
    ) -> Vec<String> {
        let resolver = &self.resolver;
        let root = &resolver.config().upload_root;
        let dir = route(category).dir;
        let proxy = resolver.proxy_path(category, file);

        match category {
            MediaCategory::Attachment => vec![
                format!("/api/{}/{}", dir, file),
                format!("/{}/{}/{}", root, dir, file),
                proxy,
            ],
            MediaCategory::Calendar => vec![
                proxy,
                format!("/{}/{}", dir, file),
                format!("/media/{}", file),
                format!("/{}/{}", root, file),
                resolver.default_asset(category),
            ],
            MediaCategory::Vendor if context == RenderContext::DetailPage => {
                let token = cache_bust_token(file);
                let legacy = format!("/{}/{}/{}", root, dir, file);
                let mut list = vec![
                    format!("{}?v={}", proxy, token),
                    proxy,
                    format!("{}?v={}", legacy, token),
                    legacy,
                ];
                list.extend(self.historical(file));
                list
            }
            MediaCategory::Vendor => {
                let mut list = vec![
                    proxy,
                    format!("/{}/{}/{}", root, dir, file),
                    format!("/{}/{}", dir, file),
                ];
                list.extend(self.historical(file));
                list.push(resolver.default_asset(category));
                list
            }
            MediaCategory::Banner => {
                let environment = resolver.environment();
                vec![
                    resolver.shape(category, file, environment),
                    resolver.shape(category, file, environment.other()),
                    proxy,
                    resolver.default_asset(category),
                ]
            }
            MediaCategory::RealEstate => vec![
                proxy,
                format!("/{}/{}/{}", root, dir, file),
                format!("/{}/{}", dir, file),
                resolver.default_asset(category),
            ],
            MediaCategory::Forum | MediaCategory::Community | MediaCategory::Content => vec![
                format!("/{}/{}/{}", root, dir, file),
                format!("/{}/{}", dir, file),
                proxy,
                format!("/{}/{}", root, file),
            ],
            MediaCategory::Icon => vec![
                format!("/{}/{}", dir, file),
                format!("/images/{}/{}", dir, file),
                format!("/{}/{}/{}", root, dir, file),
            ],
            MediaCategory::Generic => vec![
                format!("/{}/{}", root, file),
                format!("/media/{}", file),
                format!("/images/{}", file),
            ],
        }
    }

    fn historical(&self, file: &str) -> Vec<String> {
        self.overrides.get(file).cloned().unwrap_or_default()
    }
}
