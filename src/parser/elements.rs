use serde::{Deserialize, Serialize};

use crate::config::CrawlConfig;

/// Serializable view of one DOM element, as returned by the page script.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ElementSnapshot {
    /// Lowercase tag name (`h2`, `p`, `li`).
    pub tag: String,
    pub text: String,
    /// `tag.class1.class2` for each ancestor, nearest first, up to `<html>`.
    #[serde(default)]
    pub ancestors: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(String),
    Paragraph(String),
    ListItem(String),
    Skipped(SkipReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    Empty,
    /// Sits inside a second copy of the base content container.
    NestedContent,
    /// Ancestor chain hits a boilerplate marker.
    Denylisted,
    UnknownTag,
}

#[derive(Debug, Clone)]
pub struct ClassifyRules {
    pub content_class: String,
    pub denylist: Vec<String>,
}

impl ClassifyRules {
    pub fn from_config(config: &CrawlConfig) -> Self {
        Self {
            content_class: config.content_class.clone(),
            denylist: config.denylist.clone(),
        }
    }
}

impl Default for ClassifyRules {
    fn default() -> Self {
        Self::from_config(&CrawlConfig::default())
    }
}

pub fn classify_element(el: &ElementSnapshot, rules: &ClassifyRules) -> Block {
    let text = el.text.trim();
    if text.is_empty() {
        return Block::Skipped(SkipReason::Empty);
    }
    if content_depth(&el.ancestors, &rules.content_class) >= 2 {
        return Block::Skipped(SkipReason::NestedContent);
    }
    if is_denylisted(&el.ancestors, &rules.denylist) {
        return Block::Skipped(SkipReason::Denylisted);
    }

    match el.tag.to_ascii_lowercase().as_str() {
        "h2" => Block::Heading(text.to_string()),
        "p" => Block::Paragraph(text.to_string()),
        "li" => Block::ListItem(text.to_string()),
        _ => Block::Skipped(SkipReason::UnknownTag),
    }
}

/// How many `div` ancestors carry the base content class.
fn content_depth(ancestors: &[String], class: &str) -> usize {
    ancestors
        .iter()
        .filter(|entry| {
            let mut parts = entry.split('.');
            parts.next() == Some("div") && parts.any(|c| c == class)
        })
        .count()
}

fn is_denylisted(ancestors: &[String], denylist: &[String]) -> bool {
    ancestors
        .iter()
        .any(|entry| denylist.iter().any(|d| entry.contains(d.as_str())))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn el(tag: &str, text: &str, ancestors: &[&str]) -> ElementSnapshot {
        ElementSnapshot {
            tag: tag.to_string(),
            text: text.to_string(),
            ancestors: ancestors.iter().map(|a| a.to_string()).collect(),
        }
    }

    #[test]
    fn kinds() {
        let rules = ClassifyRules::default();
        let chain = ["div.content", "body", "html"];
        assert_eq!(
            classify_element(&el("h2", " Overview ", &chain), &rules),
            Block::Heading("Overview".into())
        );
        assert_eq!(
            classify_element(&el("p", "Text", &chain), &rules),
            Block::Paragraph("Text".into())
        );
        assert_eq!(
            classify_element(&el("LI", "Item", &chain), &rules),
            Block::ListItem("Item".into())
        );
        assert_eq!(
            classify_element(&el("span", "Other", &chain), &rules),
            Block::Skipped(SkipReason::UnknownTag)
        );
    }

    #[test]
    fn blank_text_is_skipped() {
        let rules = ClassifyRules::default();
        assert_eq!(
            classify_element(&el("p", " \n\t", &["div.content"]), &rules),
            Block::Skipped(SkipReason::Empty)
        );
    }

    #[test]
    fn nested_content_container() {
        let rules = ClassifyRules::default();
        let chain = ["ul", "div.content", "div.cmp-text", "div.content", "body", "html"];
        assert_eq!(
            classify_element(&el("li", "Repeated", &chain), &rules),
            Block::Skipped(SkipReason::NestedContent)
        );
    }

    #[test]
    fn content_class_must_match_whole_class() {
        let rules = ClassifyRules::default();
        let chain = ["div.content-wrapper", "div.content", "body"];
        assert_eq!(
            classify_element(&el("p", "Kept", &chain), &rules),
            Block::Paragraph("Kept".into())
        );
    }

    #[test]
    fn denylisted_ancestors() {
        let rules = ClassifyRules::default();
        for marker in ["div.references", "div.acces-list-container", "nav.tableofcontents.sticky"] {
            let chain = ["ol", marker, "div.content", "body"];
            assert_eq!(
                classify_element(&el("li", "Citation", &chain), &rules),
                Block::Skipped(SkipReason::Denylisted),
                "marker {marker}"
            );
        }
    }
}
