use std::collections::HashSet;

use tracing::{debug, info};

use crate::browser::BrowserSession;
use crate::config::CrawlConfig;
use crate::error::Result;
use crate::model::{GuidelineRecord, Link, Subsections};
use crate::parser::{self, elements::ClassifyRules};
use crate::toc;

/// Pulls the wanted sections of one guideline out of the browser.
pub struct SectionExtractor<'a, S> {
    session: &'a S,
    config: &'a CrawlConfig,
    rules: ClassifyRules,
}

impl<'a, S: BrowserSession> SectionExtractor<'a, S> {
    pub fn new(session: &'a S, config: &'a CrawlConfig) -> Self {
        Self {
            session,
            config,
            rules: ClassifyRules::from_config(config),
        }
    }

    /// Load the guideline, visit each matching section tab and classify it.
    ///
    /// No retries here; an empty record is returned as-is for the caller to judge.
    pub async fn extract_guideline(&self, name: &str, url: &str) -> Result<GuidelineRecord> {
        self.load(url).await?;

        let mut record = GuidelineRecord::new(name, url);
        for tab in self.discover_sections().await? {
            let subsections = self.classify(&tab.url).await?;
            debug!(
                guideline = name,
                section = %tab.text,
                subsections = subsections.len(),
                "section extracted"
            );
            record.content.insert(tab.text, subsections);
        }
        Ok(record)
    }

    /// Section tabs on the current page whose label passes the filter, labels normalized.
    pub async fn discover_sections(&self) -> Result<Vec<Link>> {
        let selector = self.config.selectors.section_tabs_joined();
        let tabs = self.session.query_links(&selector).await?;
        Ok(filter_tabs(tabs, &self.config.section_filter))
    }

    /// Heading → body map for one section page.
    pub async fn classify(&self, page_url: &str) -> Result<Subsections> {
        self.load(page_url).await?;

        let selectors = &self.config.selectors;
        match self
            .session
            .snapshot_elements(&selectors.content_roots, &selectors.elements)
            .await?
        {
            Some(elements) => Ok(parser::classify_elements(&elements, &self.rules)),
            None => {
                info!(url = page_url, "no content container on page");
                Ok(Subsections::new())
            }
        }
    }

    async fn load(&self, url: &str) -> Result<()> {
        self.session.goto(url).await?;
        tokio::time::sleep(self.config.short_delay).await;
        Ok(())
    }
}

/// Normalize labels, keep those matching `filter`, drop repeats (the same tab
/// usually shows up in both navigation widgets).
fn filter_tabs(tabs: Vec<Link>, filter: &[String]) -> Vec<Link> {
    let mut seen = HashSet::new();
    tabs.into_iter()
        .map(|tab| Link {
            text: toc::normalize_label(&tab.text),
            url: tab.url,
        })
        .filter(|tab| toc::matches_section(&tab.text, filter))
        .filter(|tab| seen.insert(tab.text.clone()))
        .collect()
}
