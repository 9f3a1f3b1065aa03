use medialane_core::MediaCategory;

/// Where the failing media was being rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RenderContext {
    #[default]
    Default,
    /// A detail page for a single item. Vendor media gets cache-busted
    /// candidates here.
    DetailPage,
}

/// A failed load reported by the rendering layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadFailureEvent {
    /// The reference that failed to load.
    pub reference: String,
    pub category_hint: Option<MediaCategory>,
    /// Caller-supplied last resort, tried once after every candidate failed.
    pub fallback: Option<String>,
    pub context: RenderContext,
}

impl LoadFailureEvent {
    pub fn new(reference: impl Into<String>) -> Self {
        Self {
            reference: reference.into(),
            category_hint: None,
            fallback: None,
            context: RenderContext::Default,
        }
    }

    pub fn with_category(mut self, category: MediaCategory) -> Self {
        self.category_hint = Some(category);
        self
    }

    pub fn with_fallback(mut self, fallback: impl Into<String>) -> Self {
        self.fallback = Some(fallback.into());
        self
    }

    pub fn with_context(mut self, context: RenderContext) -> Self {
        self.context = context;
        self
    }
}
