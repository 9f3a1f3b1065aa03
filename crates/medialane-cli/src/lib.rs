use bytes::Bytes;
use serde::Serialize;

/// Truncate a string to max_len characters, appending "..." if truncated.
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// JSON view of a cached payload.
#[derive(Debug, Serialize, PartialEq, Eq)]
pub struct PayloadView {
    pub size_bytes: usize,
    /// Lossy UTF-8 preview of the first bytes.
    pub preview: String,
}

impl PayloadView {
    pub fn new(payload: &Bytes, preview_len: usize) -> Self {
        Self {
            size_bytes: payload.len(),
            preview: truncate_string(&String::from_utf8_lossy(payload), preview_len),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_string_short() {
        assert_eq!(truncate_string("hello", 10), "hello");
        assert_eq!(truncate_string("", 5), "");
    }

    #[test]
    fn truncate_string_long() {
        assert_eq!(truncate_string("hello world", 8), "hello...");
        assert_eq!(truncate_string("abc", 2), "...");
    }

    #[test]
    fn truncate_string_counts_chars_not_bytes() {
        assert_eq!(truncate_string("ééééé", 5), "ééééé");
        assert_eq!(truncate_string("éééééé", 5), "éé...");
    }

    #[test]
    fn payload_view_previews_text() {
        let view = PayloadView::new(&Bytes::from_static(b"<svg>...</svg>"), 8);
        assert_eq!(view.size_bytes, 14);
        assert_eq!(view.preview, "<svg>...");
    }
}

/// Initialize tracing for CLI binaries. Logs go to stderr so stdout stays
/// valid JSON.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}
