//! In-memory browser for unit tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::time::Duration;

use crate::browser::BrowserSession;
use crate::config::CrawlConfig;
use crate::error::{Result, ScrapeError};
use crate::model::Link;
use crate::parser::elements::ElementSnapshot;

pub fn fast_config() -> CrawlConfig {
    CrawlConfig {
        toc_root_url: "https://site/diseases-conditions/index".to_string(),
        content_pattern: r"^https://site/diseases-conditions/".to_string(),
        ..CrawlConfig::default()
    }
    .with_short_delay(Duration::ZERO)
}

/// Elements of a simple page, all directly inside `div.content`.
pub fn page(elements: &[(&str, &str)]) -> Vec<ElementSnapshot> {
    elements
        .iter()
        .map(|(tag, text)| ElementSnapshot {
            tag: tag.to_string(),
            text: text.to_string(),
            ancestors: vec!["div.content".into(), "main".into(), "body".into(), "html".into()],
        })
        .collect()
}

#[derive(Default)]
pub struct FakeBrowser {
    links: HashMap<String, Vec<Link>>,
    pages: HashMap<String, Vec<ElementSnapshot>>,
    /// Remaining navigation failures per URL.
    failures: RefCell<HashMap<String, usize>>,
    current: RefCell<String>,
    visited: RefCell<Vec<String>>,
}

impl FakeBrowser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Anchors returned while `url` is loaded (TOC entries or section tabs).
    pub fn with_tabs(mut self, url: &str, links: Vec<Link>) -> Self {
        self.links.insert(url.to_string(), links);
        self
    }

    pub fn with_toc(self, url: &str, links: Vec<Link>) -> Self {
        self.with_tabs(url, links)
    }

    pub fn with_page(mut self, url: &str, elements: Vec<ElementSnapshot>) -> Self {
        self.pages.insert(url.to_string(), elements);
        self
    }

    pub fn failing(self, url: &str, times: usize) -> Self {
        self.failures.borrow_mut().insert(url.to_string(), times);
        self
    }

    pub fn visited(&self) -> Vec<String> {
        self.visited.borrow().clone()
    }

    pub fn visits_to(&self, url: &str) -> usize {
        self.visited.borrow().iter().filter(|u| *u == url).count()
    }
}

impl BrowserSession for FakeBrowser {
    async fn goto(&self, url: &str) -> Result<()> {
        self.visited.borrow_mut().push(url.to_string());
        if let Some(left) = self.failures.borrow_mut().get_mut(url) {
            if *left > 0 {
                *left -= 1;
                return Err(ScrapeError::Browser(format!("navigation to {url} failed")));
            }
        }
        *self.current.borrow_mut() = url.to_string();
        Ok(())
    }

    async fn evaluate_json(&self, _script: &str) -> Result<serde_json::Value> {
        Ok(serde_json::Value::Null)
    }

    async fn close(self) -> Result<()> {
        Ok(())
    }

    async fn selector_exists(&self, _selector: &str) -> Result<bool> {
        let current = self.current.borrow();
        Ok(self.links.get(current.as_str()).is_some_and(|l| !l.is_empty()))
    }

    async fn query_links(&self, _selector: &str) -> Result<Vec<Link>> {
        let current = self.current.borrow();
        Ok(self.links.get(current.as_str()).cloned().unwrap_or_default())
    }

    async fn snapshot_elements(
        &self,
        _roots: &[String],
        _selector: &str,
    ) -> Result<Option<Vec<ElementSnapshot>>> {
        let current = self.current.borrow();
        Ok(self.pages.get(current.as_str()).cloned())
    }
}
