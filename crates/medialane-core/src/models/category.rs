use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;

/// Media category
///
/// Selects which canonicalization and fallback rules apply to a reference.
/// Usually inferred heuristically from the reference itself; the inference is
/// best-effort and a caller-supplied hint always wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaCategory {
    Calendar,
    Banner,
    Forum,
    Vendor,
    Community,
    RealEstate,
    Icon,
    Attachment,
    Content,
    #[default]
    Generic,
}

impl MediaCategory {
    pub const ALL: [MediaCategory; 10] = [
        MediaCategory::Calendar,
        MediaCategory::Banner,
        MediaCategory::Forum,
        MediaCategory::Vendor,
        MediaCategory::Community,
        MediaCategory::RealEstate,
        MediaCategory::Icon,
        MediaCategory::Attachment,
        MediaCategory::Content,
        MediaCategory::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            MediaCategory::Calendar => "calendar",
            MediaCategory::Banner => "banner",
            MediaCategory::Forum => "forum",
            MediaCategory::Vendor => "vendor",
            MediaCategory::Community => "community",
            MediaCategory::RealEstate => "real_estate",
            MediaCategory::Icon => "icon",
            MediaCategory::Attachment => "attachment",
            MediaCategory::Content => "content",
            MediaCategory::Generic => "generic",
        }
    }
}

impl FromStr for MediaCategory {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('-', "_");
        MediaCategory::ALL
            .into_iter()
            .find(|c| c.as_str() == normalized)
            .or(match normalized.as_str() {
                "event" | "events" => Some(MediaCategory::Calendar),
                "realestate" | "property" => Some(MediaCategory::RealEstate),
                _ => None,
            })
            .ok_or_else(|| anyhow::anyhow!("Invalid media category: {}", s))
    }
}

impl Display for MediaCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}
