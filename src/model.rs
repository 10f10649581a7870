use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Subsection heading → accumulated body text, in document order.
pub type Subsections = IndexMap<String, String>;

/// Section label → its subsections.
pub type Sections = IndexMap<String, Subsections>;

/// One guideline as written to the sink.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GuidelineRecord {
    pub name: String,
    pub url: String,
    pub content: Sections,
}

impl GuidelineRecord {
    pub fn new(name: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            url: url.into(),
            content: Sections::new(),
        }
    }

    /// True when no section produced any subsection text.
    pub fn is_empty(&self) -> bool {
        self.content.values().all(|s| s.is_empty())
    }
}

/// An anchor's trimmed text and absolute `href`.
///
/// Used both for table-of-contents entries and for section tabs.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Link {
    pub text: String,
    pub url: String,
}

#[cfg(test)]
impl Link {
    pub fn new(text: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            url: url.into(),
        }
    }
}
