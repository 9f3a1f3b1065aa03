//! Reference to retrieval-path resolution.

use medialane_core::models::reference::{is_absolute_url, is_inline, ReferenceParts};
use medialane_core::{Environment, MediaCategory, ResolverConfig};

use crate::detect::{detect_category, Detection};
use crate::object_storage::{is_proxy_path, ObjectStorageUrl, ProxyPath};
use crate::routing::{category_for_bucket, category_for_dir, route, Routing, DEFAULT_PLACEHOLDER};

/// Which rule produced a resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionKind {
    /// Empty reference replaced by the category default asset.
    Default,
    /// Already in canonical proxy form.
    Canonical,
    /// External or inline reference returned as-is.
    PassThrough,
    /// Object-storage URL rewritten into proxy form.
    ProxyRewrite,
    /// Bare filename placed under its category directory.
    BareFilename,
    /// Path with a category directory reshaped for the environment.
    Normalized,
    /// Nothing recognizable; returned as-is.
    Unchanged,
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Resolution {
    pub path: String,
    pub category: MediaCategory,
    /// The category was a generic fallback rather than a detected match.
    pub ambiguous: bool,
    pub kind: ResolutionKind,
}

/// Maps media references onto canonical retrieval paths.
///
/// The environment is fixed at construction. `resolve` performs no I/O and is
/// deterministic; resolving its own output returns that output unchanged.
#[derive(Debug, Clone)]
pub struct PathResolver {
    config: ResolverConfig,
}

impl PathResolver {
    pub fn new(config: ResolverConfig) -> Self {
        Self { config }
    }

    pub fn environment(&self) -> Environment {
        self.config.environment
    }

    pub fn config(&self) -> &ResolverConfig {
        &self.config
    }

    /// Resolve `reference` to its retrieval path.
    pub fn resolve(&self, reference: &str, category_hint: Option<MediaCategory>) -> String {
        self.resolve_detailed(reference, category_hint).path
    }

    /// Resolve `reference`, reporting the category and rule used.
    pub fn resolve_detailed(
        &self,
        reference: &str,
        category_hint: Option<MediaCategory>,
    ) -> Resolution {
        // A generic hint carries no routing information.
        let hint = category_hint.filter(|c| *c != MediaCategory::Generic);
        let trimmed = reference.trim();

        if trimmed.is_empty() {
            let category = hint.unwrap_or(MediaCategory::Generic);
            return Resolution {
                path: self.default_asset(category),
                category,
                ambiguous: hint.is_none(),
                kind: ResolutionKind::Default,
            };
        }

        if is_inline(trimmed) {
            return self.unresolved(trimmed, hint, ResolutionKind::PassThrough);
        }

        let parts = ReferenceParts::split(trimmed);

        if is_proxy_path(parts.path, &self.config.proxy_prefix) {
            let category = hint.or_else(|| {
                ProxyPath::parse(parts.path, &self.config.proxy_prefix)
                    .and_then(|p| category_for_bucket(p.bucket))
            });
            return Resolution {
                path: trimmed.to_string(),
                category: category.unwrap_or(MediaCategory::Generic),
                ambiguous: category.is_none(),
                kind: ResolutionKind::Canonical,
            };
        }

        if is_absolute_url(trimmed) {
            return self.resolve_absolute(trimmed, parts.suffix, hint);
        }

        let path = parts.path.trim_start_matches("./");
        let relative = ReferenceParts {
            path,
            suffix: parts.suffix,
        };

        // Served by an API route other than the proxy.
        if path.starts_with("/api/") {
            return self.unresolved(trimmed, hint, ResolutionKind::Unchanged);
        }

        if !relative.has_separator() {
            let detection = match hint {
                Some(category) => Detection {
                    category,
                    ambiguous: false,
                },
                None => detect_category(path),
            };
            if detection.ambiguous {
                tracing::debug!(
                    reference = trimmed,
                    "Resolution ambiguous, placing under the upload root"
                );
            }
            return Resolution {
                path: format!(
                    "{}{}",
                    self.shape(detection.category, path, self.config.environment),
                    parts.suffix
                ),
                category: detection.category,
                ambiguous: detection.ambiguous,
                kind: ResolutionKind::BareFilename,
            };
        }

        match self.locate_category_dir(&relative, hint) {
            Some((dir_category, rest)) if !rest.is_empty() => {
                let category = hint.unwrap_or(dir_category);
                Resolution {
                    path: format!(
                        "{}{}",
                        self.shape(category, &rest, self.config.environment),
                        parts.suffix
                    ),
                    category,
                    ambiguous: false,
                    kind: ResolutionKind::Normalized,
                }
            }
            _ => self.unresolved(trimmed, hint, ResolutionKind::Unchanged),
        }
    }

    /// The path shape `category` takes for `rest` (the part below the
    /// category directory) in `environment`.
    pub fn shape(&self, category: MediaCategory, rest: &str, environment: Environment) -> String {
        let route = route(category);
        let rest = rest.trim_start_matches('/');
        let root = &self.config.upload_root;
        match route.routing {
            _ if route.routing.uses_proxy(environment) => self.proxy_path(category, rest),
            Routing::Generic => format!("/{}/{}", root, rest),
            Routing::StaticRoot => format!("/{}/{}", route.dir, rest),
            Routing::SplitByEnvironment if environment.is_production() => {
                format!("/{}/{}", route.dir, rest)
            }
            _ => format!("/{}/{}/{}", root, route.dir, rest),
        }
    }

    /// Canonical proxy path for `rest` in `category`.
    pub fn proxy_path(&self, category: MediaCategory, rest: &str) -> String {
        let route = route(category);
        let rest = rest.trim_start_matches('/');
        let key = if route.dir.is_empty() {
            rest.to_string()
        } else {
            format!("{}/{}", route.dir, rest)
        };
        ProxyPath {
            bucket: route.bucket,
            key: &key,
        }
        .render(&self.config.proxy_prefix)
    }

    /// Resolved default asset for `category`.
    pub fn default_asset(&self, category: MediaCategory) -> String {
        match route(category).default_asset {
            Some(file) => self.shape(category, file, self.config.environment),
            None => DEFAULT_PLACEHOLDER.to_string(),
        }
    }

    fn resolve_absolute(
        &self,
        url: &str,
        suffix: &str,
        hint: Option<MediaCategory>,
    ) -> Resolution {
        let Some(object) = ObjectStorageUrl::parse(url, &self.config.object_storage_hosts) else {
            return self.unresolved(url, hint, ResolutionKind::PassThrough);
        };

        let category = hint
            .or_else(|| category_for_bucket(&object.bucket))
            .or_else(|| {
                let detection = detect_category(&object.decoded_key());
                (!detection.ambiguous).then_some(detection.category)
            });

        match category {
            Some(category) if route(category).routing.uses_proxy(self.config.environment) => {
                let path = format!("{}{}", object.to_proxy_path(&self.config.proxy_prefix), suffix);
                tracing::debug!(
                    reference = url,
                    path = %path,
                    category = %category,
                    "Rewrote object-storage URL into proxy form"
                );
                Resolution {
                    path,
                    category,
                    ambiguous: false,
                    kind: ResolutionKind::ProxyRewrite,
                }
            }
            _ => self.unresolved(url, category, ResolutionKind::PassThrough),
        }
    }

    /// Find the category directory segment, preferring the hinted category's.
    /// Returns the directory's category and everything below it.
    fn locate_category_dir(
        &self,
        parts: &ReferenceParts<'_>,
        hint: Option<MediaCategory>,
    ) -> Option<(MediaCategory, String)> {
        let segments: Vec<&str> = parts.segments().collect();
        let dirs = segments.len().saturating_sub(1);

        let hinted = hint.and_then(|category| {
            let route = route(category);
            segments[..dirs]
                .iter()
                .position(|s| route.owns_dir(s))
                .map(|idx| (category, idx))
        });

        let (category, idx) = hinted.or_else(|| {
            segments[..dirs].iter().enumerate().find_map(|(idx, s)| {
                category_for_dir(s).map(|category| (category, idx))
            })
        })?;

        Some((category, segments[idx + 1..].join("/")))
    }

    fn unresolved(
        &self,
        reference: &str,
        category: Option<MediaCategory>,
        kind: ResolutionKind,
    ) -> Resolution {
        let detection = match category {
            Some(category) => Detection {
                category,
                ambiguous: false,
            },
            None if kind == ResolutionKind::PassThrough => Detection {
                category: MediaCategory::Generic,
                ambiguous: true,
            },
            None => detect_category(reference),
        };
        Resolution {
            path: reference.to_string(),
            category: detection.category,
            ambiguous: detection.ambiguous,
            kind,
        }
    }
}

impl Default for PathResolver {
    fn default() -> Self {
        Self::new(ResolverConfig::default())
    }
}
