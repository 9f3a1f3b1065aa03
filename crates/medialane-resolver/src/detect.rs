//! Heuristic category detection.
//!
//! Detection walks [`CATEGORY_RULES`] in order and returns the first match.
//! Directory rules come first, then filename prefixes, then extensions. The
//! heuristic is best-effort: a vendor file named `media-logo.png` outside a
//! vendor directory is classified as calendar media.

use medialane_core::models::reference::{extension, ReferenceParts};
use medialane_core::MediaCategory;

/// A predicate over a split reference.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pattern {
    /// Some directory segment (not the filename) equals this name.
    DirSegment(&'static str),
    /// The filename starts with this prefix.
    FilePrefix(&'static str),
    /// The filename extension is one of these.
    Extension(&'static [&'static str]),
}

impl Pattern {
    pub fn matches(&self, parts: &ReferenceParts<'_>) -> bool {
        let file_name = parts.file_name();
        match self {
            Pattern::DirSegment(name) => {
                let segments: Vec<&str> = parts.segments().collect();
                let dirs = segments.len().saturating_sub(1);
                segments[..dirs].iter().any(|s| s.eq_ignore_ascii_case(name))
            }
            Pattern::FilePrefix(prefix) => file_name
                .get(..prefix.len())
                .is_some_and(|head| head.eq_ignore_ascii_case(prefix)),
            Pattern::Extension(list) => {
                extension(file_name).is_some_and(|ext| list.iter().any(|e| *e == ext))
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CategoryRule {
    pub pattern: Pattern,
    pub category: MediaCategory,
}

const fn rule(pattern: Pattern, category: MediaCategory) -> CategoryRule {
    CategoryRule { pattern, category }
}

/// Ordered detection table. First match wins.
pub static CATEGORY_RULES: &[CategoryRule] = &[
    rule(Pattern::DirSegment("calendar"), MediaCategory::Calendar),
    rule(Pattern::DirSegment("events"), MediaCategory::Calendar),
    rule(Pattern::DirSegment("banner-slides"), MediaCategory::Banner),
    rule(Pattern::DirSegment("banners"), MediaCategory::Banner),
    rule(Pattern::DirSegment("forum"), MediaCategory::Forum),
    rule(Pattern::DirSegment("forums"), MediaCategory::Forum),
    rule(Pattern::DirSegment("vendors"), MediaCategory::Vendor),
    rule(Pattern::DirSegment("vendor"), MediaCategory::Vendor),
    rule(Pattern::DirSegment("marketplace"), MediaCategory::Vendor),
    rule(Pattern::DirSegment("community"), MediaCategory::Community),
    rule(Pattern::DirSegment("communities"), MediaCategory::Community),
    rule(Pattern::DirSegment("properties"), MediaCategory::RealEstate),
    rule(Pattern::DirSegment("real-estate"), MediaCategory::RealEstate),
    rule(Pattern::DirSegment("listings"), MediaCategory::RealEstate),
    rule(Pattern::DirSegment("icons"), MediaCategory::Icon),
    rule(Pattern::DirSegment("attachments"), MediaCategory::Attachment),
    rule(Pattern::DirSegment("files"), MediaCategory::Attachment),
    rule(Pattern::DirSegment("content"), MediaCategory::Content),
    rule(Pattern::DirSegment("articles"), MediaCategory::Content),
    rule(Pattern::FilePrefix("banner-"), MediaCategory::Banner),
    rule(Pattern::FilePrefix("forum-"), MediaCategory::Forum),
    rule(Pattern::FilePrefix("vendor-"), MediaCategory::Vendor),
    rule(Pattern::FilePrefix("shop-"), MediaCategory::Vendor),
    rule(Pattern::FilePrefix("community-"), MediaCategory::Community),
    rule(Pattern::FilePrefix("property-"), MediaCategory::RealEstate),
    rule(Pattern::FilePrefix("listing-"), MediaCategory::RealEstate),
    rule(Pattern::FilePrefix("icon-"), MediaCategory::Icon),
    rule(Pattern::FilePrefix("attachment-"), MediaCategory::Attachment),
    rule(Pattern::FilePrefix("file-"), MediaCategory::Attachment),
    rule(Pattern::FilePrefix("content-"), MediaCategory::Content),
    rule(Pattern::FilePrefix("article-"), MediaCategory::Content),
    rule(Pattern::FilePrefix("media-"), MediaCategory::Calendar),
    rule(Pattern::FilePrefix("event-"), MediaCategory::Calendar),
    rule(Pattern::Extension(&["svg", "ico"]), MediaCategory::Icon),
    rule(
        Pattern::Extension(&["pdf", "doc", "docx", "zip", "txt"]),
        MediaCategory::Attachment,
    ),
];

/// Result of category detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Detection {
    pub category: MediaCategory,
    /// No rule matched; `category` is the generic fallback.
    pub ambiguous: bool,
}

/// Detect the category of a reference from its directory segments and
/// filename. Query strings and fragments are ignored.
pub fn detect_category(reference: &str) -> Detection {
    let parts = ReferenceParts::split(reference.trim());
    match CATEGORY_RULES.iter().find(|r| r.pattern.matches(&parts)) {
        Some(rule) => Detection {
            category: rule.category,
            ambiguous: false,
        },
        None => {
            tracing::debug!(reference, "Category could not be inferred, using generic");
            Detection {
                category: MediaCategory::Generic,
                ambiguous: true,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::routing::routes;

    fn category(reference: &str) -> MediaCategory {
        detect_category(reference).category
    }

    #[test]
    fn filename_prefixes() {
        assert_eq!(category("media-123.png"), MediaCategory::Calendar);
        assert_eq!(category("banner-home.jpg"), MediaCategory::Banner);
        assert_eq!(category("Shop-42.webp"), MediaCategory::Vendor);
        assert_eq!(category("listing-9.png"), MediaCategory::RealEstate);
    }

    #[test]
    fn directories_beat_prefixes() {
        assert_eq!(category("/uploads/forum/media-1.png"), MediaCategory::Forum);
        assert_eq!(category("vendors/media-logo.png"), MediaCategory::Vendor);
    }

    #[test]
    fn filename_segment_is_not_a_directory() {
        // "icons" is the file name here, not a directory.
        assert_eq!(category("/static/icons"), MediaCategory::Generic);
    }

    #[test]
    fn best_effort_misclassification_is_kept() {
        assert_eq!(category("media-vendor-logo.png"), MediaCategory::Calendar);
    }

    #[test]
    fn extensions_are_last() {
        assert_eq!(category("logo.svg"), MediaCategory::Icon);
        assert_eq!(category("minutes.PDF"), MediaCategory::Attachment);
        assert_eq!(category("banner-x.svg"), MediaCategory::Banner);
    }

    #[test]
    fn query_is_ignored() {
        assert_eq!(category("photo.png?name=media-1.png"), MediaCategory::Generic);
    }

    #[test]
    fn unknown_is_ambiguous_generic() {
        let detection = detect_category("photo.png");
        assert_eq!(detection.category, MediaCategory::Generic);
        assert!(detection.ambiguous);
    }

    #[test]
    fn table_covers_every_routed_directory() {
        for r in routes() {
            for dir in std::iter::once(&r.dir).chain(r.aliases.iter()) {
                if dir.is_empty() {
                    continue;
                }
                let found = CATEGORY_RULES
                    .iter()
                    .find(|rule| rule.pattern == Pattern::DirSegment(*dir))
                    .map(|rule| rule.category);
                assert_eq!(found, Some(r.category), "missing rule for {}", dir);
            }
        }
    }
}
