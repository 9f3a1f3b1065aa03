//! Textual helpers for media references.
//!
//! A media reference is any string naming a media asset: a bare filename, a
//! relative path with or without an upload prefix, an absolute object-storage
//! URL, or an already-canonical proxy path. These helpers only split and
//! inspect the text; they never allocate a new canonical form.

/// A reference split into its path and its trailing query/fragment suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReferenceParts<'a> {
    pub path: &'a str,
    /// Everything from the first `?` or `#` on, including the delimiter.
    pub suffix: &'a str,
}

impl<'a> ReferenceParts<'a> {
    pub fn split(reference: &'a str) -> Self {
        match reference.find(['?', '#']) {
            Some(idx) => ReferenceParts {
                path: &reference[..idx],
                suffix: &reference[idx..],
            },
            None => ReferenceParts {
                path: reference,
                suffix: "",
            },
        }
    }

    /// The last non-empty path segment.
    pub fn file_name(&self) -> &'a str {
        self.path
            .rsplit('/')
            .find(|segment| !segment.is_empty())
            .unwrap_or_default()
    }

    /// Non-empty path segments, in order.
    pub fn segments(&self) -> impl Iterator<Item = &'a str> {
        self.path.split('/').filter(|segment| !segment.is_empty())
    }

    pub fn has_separator(&self) -> bool {
        self.path.contains('/')
    }
}

/// `scheme://...` references (http, https, protocol-relative `//host`).
pub fn is_absolute_url(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("http://") || lower.starts_with("https://") || lower.starts_with("//")
}

/// Inline payloads that never resolve to a storage path.
pub fn is_inline(reference: &str) -> bool {
    let lower = reference.trim_start().to_ascii_lowercase();
    lower.starts_with("data:") || lower.starts_with("blob:")
}

/// Lower-cased extension of the file name, if any.
pub fn extension(file_name: &str) -> Option<String> {
    let (stem, ext) = file_name.rsplit_once('.')?;
    if stem.is_empty() || ext.is_empty() {
        return None;
    }
    Some(ext.to_ascii_lowercase())
}
