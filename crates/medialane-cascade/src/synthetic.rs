use medialane_core::MediaCategory;

/// Dependency-free placeholder rendered when every candidate failed.
///
/// The glyph is a generic "missing picture" pictogram with a short label for
/// the category. It needs no network access and no stored asset.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyntheticDefault {
    pub category: MediaCategory,
}

impl SyntheticDefault {
    pub fn for_category(category: MediaCategory) -> Self {
        Self { category }
    }

    pub fn label(&self) -> &'static str {
        match self.category {
            MediaCategory::Calendar => "Event image",
            MediaCategory::Banner => "Banner",
            MediaCategory::Forum => "Forum image",
            MediaCategory::Vendor => "Vendor image",
            MediaCategory::Community => "Community image",
            MediaCategory::RealEstate => "Property image",
            MediaCategory::Icon => "Icon",
            MediaCategory::Attachment => "Attachment",
            MediaCategory::Content => "Article image",
            MediaCategory::Generic => "Image unavailable",
        }
    }

    /// SVG markup.
    pub fn svg(&self) -> String {
        let label = self.label();
        format!(
            concat!(
                r##"<svg xmlns="http://www.w3.org/2000/svg" width="200" height="200" "##,
                r##"viewBox="0 0 200 200" role="img" aria-label="{label}">"##,
                r##"<rect width="200" height="200" fill="#e5e7eb"/>"##,
                r##"<circle cx="130" cy="70" r="14" fill="#9ca3af"/>"##,
                r##"<path d="M40 140l40-50 30 36 20-24 30 38z" fill="#9ca3af"/>"##,
                r##"<text x="100" y="175" font-family="sans-serif" font-size="14" "##,
                r##"text-anchor="middle" fill="#6b7280">{label}</text></svg>"##
            ),
            label = label
        )
    }

    /// `data:image/svg+xml,...` URI, usable anywhere an image path is.
    pub fn data_uri(&self) -> String {
        format!("data:image/svg+xml,{}", urlencoding::encode(&self.svg()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn svg_carries_category_label() {
        let glyph = SyntheticDefault::for_category(MediaCategory::Calendar);
        let svg = glyph.svg();
        assert!(svg.starts_with("<svg"));
        assert!(svg.ends_with("</svg>"));
        assert!(svg.contains(">Event image</text>"));
    }

    #[test]
    fn data_uri_is_fully_escaped() {
        let uri = SyntheticDefault::for_category(MediaCategory::Generic).data_uri();
        assert!(uri.starts_with("data:image/svg+xml,%3Csvg"));
        assert!(!uri.contains('<'));
        assert!(!uri.contains('#'));
        assert!(!uri.contains(' '));
    }

    #[test]
    fn every_category_has_a_label() {
        for category in MediaCategory::ALL {
            assert!(!SyntheticDefault::for_category(category).label().is_empty());
        }
    }
}
