use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A single syndicated item as handed over by the feed fetcher.
/// Immutable once constructed; `published` is absent when the feed
/// carried no parseable publication date.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub link: String,
    pub source: String,
    pub published: Option<DateTime<Utc>>,
}

impl NewsItem {
    /// Lowercased haystack for keyword matching: title plus source label.
    /// The source label participates so e.g. "BBC Sport" items classify as
    /// sports even when the headline itself carries no sports term.
    pub fn search_text(&self) -> String {
        format!("{} {}", self.title, self.source).to_lowercase()
    }
}

/// Topical channel an item is routed to. Exactly one per item, assigned
/// once by the classifier and never changed afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Category {
    Breaking,
    Macro,
    Sports,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Breaking => "BREAKING",
            Category::Macro => "MACRO",
            Category::Sports => "SPORTS",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
