//! Per-category storage layout.
//!
//! Every category has a canonical directory, the legacy directory names it
//! has been stored under, its object-storage bucket, a routing rule deciding
//! which path shape it takes in each environment, and an optional default
//! asset used when a reference is empty.

use medialane_core::{Environment, MediaCategory};

/// Placeholder for categories without a dedicated default asset.
pub const DEFAULT_PLACEHOLDER: &str = "/images/placeholder.png";

/// Which path shape a category resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Routing {
    /// Proxy form in every environment.
    AlwaysProxy,
    /// `/{upload_root}/{dir}/...` in every environment.
    UploadRoot,
    /// `/{upload_root}/{dir}/...` in development, `/{dir}/...` in production.
    SplitByEnvironment,
    /// `/{upload_root}/{dir}/...` in development, proxy form in production.
    ProxyInProduction,
    /// `/{dir}/...` in every environment.
    StaticRoot,
    /// `/{upload_root}/...` with no category directory.
    Generic,
}

impl Routing {
    pub fn uses_proxy(self, environment: Environment) -> bool {
        match self {
            Routing::AlwaysProxy => true,
            Routing::ProxyInProduction => environment.is_production(),
            _ => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRoute {
    pub category: MediaCategory,
    /// Canonical directory segment; empty for the generic category.
    pub dir: &'static str,
    /// Historical directory names normalized onto `dir`.
    pub aliases: &'static [&'static str],
    pub bucket: &'static str,
    pub routing: Routing,
    pub default_asset: Option<&'static str>,
}

impl CategoryRoute {
    /// Whether `segment` names this category's directory, case-insensitively.
    pub fn owns_dir(&self, segment: &str) -> bool {
        !self.dir.is_empty()
            && (segment.eq_ignore_ascii_case(self.dir)
                || self.aliases.iter().any(|a| segment.eq_ignore_ascii_case(a)))
    }
}

static ROUTES: [CategoryRoute; 10] = [
    CategoryRoute {
        category: MediaCategory::Calendar,
        dir: "calendar",
        aliases: &["events"],
        bucket: "CALENDAR",
        routing: Routing::AlwaysProxy,
        default_asset: Some("default-event.png"),
    },
    CategoryRoute {
        category: MediaCategory::Banner,
        dir: "banner-slides",
        aliases: &["banners"],
        bucket: "BANNER",
        routing: Routing::SplitByEnvironment,
        default_asset: Some("default-banner.png"),
    },
    CategoryRoute {
        category: MediaCategory::Forum,
        dir: "forum",
        aliases: &["forums"],
        bucket: "FORUM",
        routing: Routing::UploadRoot,
        default_asset: None,
    },
    CategoryRoute {
        category: MediaCategory::Vendor,
        dir: "vendors",
        aliases: &["vendor", "marketplace"],
        bucket: "VENDOR",
        routing: Routing::ProxyInProduction,
        default_asset: Some("default-vendor.png"),
    },
    CategoryRoute {
        category: MediaCategory::Community,
        dir: "community",
        aliases: &["communities"],
        bucket: "COMMUNITY",
        routing: Routing::UploadRoot,
        default_asset: None,
    },
    CategoryRoute {
        category: MediaCategory::RealEstate,
        dir: "properties",
        aliases: &["real-estate", "listings"],
        bucket: "REAL_ESTATE",
        routing: Routing::ProxyInProduction,
        default_asset: Some("default-property.png"),
    },
    CategoryRoute {
        category: MediaCategory::Icon,
        dir: "icons",
        aliases: &[],
        bucket: "ICONS",
        routing: Routing::StaticRoot,
        default_asset: None,
    },
    CategoryRoute {
        category: MediaCategory::Attachment,
        dir: "attachments",
        aliases: &["files"],
        bucket: "ATTACHMENTS",
        routing: Routing::UploadRoot,
        default_asset: None,
    },
    CategoryRoute {
        category: MediaCategory::Content,
        dir: "content",
        aliases: &["articles"],
        bucket: "CONTENT",
        routing: Routing::UploadRoot,
        default_asset: None,
    },
    CategoryRoute {
        category: MediaCategory::Generic,
        dir: "",
        aliases: &[],
        bucket: "MEDIA",
        routing: Routing::Generic,
        default_asset: None,
    },
];

/// Layout for a category.
pub fn route(category: MediaCategory) -> &'static CategoryRoute {
    ROUTES
        .iter()
        .find(|r| r.category == category)
        .unwrap_or(&ROUTES[ROUTES.len() - 1])
}

/// All layouts, in category order.
pub fn routes() -> &'static [CategoryRoute] {
    &ROUTES
}

/// Category whose directory (or alias) is `segment`.
pub fn category_for_dir(segment: &str) -> Option<MediaCategory> {
    ROUTES.iter().find(|r| r.owns_dir(segment)).map(|r| r.category)
}

/// Category whose bucket is `bucket`, case-insensitively.
pub fn category_for_bucket(bucket: &str) -> Option<MediaCategory> {
    ROUTES
        .iter()
        .find(|r| r.bucket.eq_ignore_ascii_case(bucket))
        .map(|r| r.category)
}
