use std::path::PathBuf;
use std::time::Duration;

pub const TOC_ROOT_URL: &str = "https://www.mayoclinic.org/diseases-conditions/index";
pub const CONTENT_PATTERN: &str = r"https://www\.mayoclinic\.org/diseases-conditions/";
pub const SUBTYPE_PATTERNS: &[&str] = &[r"/symptoms-causes/", r"/diagnosis-treatment/"];
pub const SECTION_FILTER: &[&str] = &["Symptoms", "Diagnosis"];

const SHORT_DELAY_SECS: u64 = 10;
const COOLDOWN_FACTOR: u32 = 30;
const MAX_ATTEMPTS: u32 = 5;

const RECORDS_PATH: &str = "data/guidelines.jsonl";
const LEDGER_PATH: &str = "data/guidelines.txt";

/// CSS selectors the crawl relies on. All of them are site-specific.
#[derive(Debug, Clone)]
pub struct Selectors {
    /// Anchor of one entry in a letter's result list.
    pub toc_item: String,
    /// Persistent side navigation and tab widget, queried together.
    pub section_tabs: Vec<String>,
    /// Base content container candidates, in priority order.
    pub content_roots: Vec<String>,
    /// Element kinds the classification pass walks.
    pub elements: String,
}

impl Default for Selectors {
    fn default() -> Self {
        Self {
            toc_item: "div.cmp-result-name a.cmp-button".to_string(),
            section_tabs: vec![
                "#et_genericNavigation_persistentSideNav a".to_string(),
                "div.cmp-tab-navigation a".to_string(),
            ],
            content_roots: vec![
                "div.content".to_string(),
                "div.cmp-column--grid section".to_string(),
            ],
            elements: "li, h2, p".to_string(),
        }
    }
}

impl Selectors {
    pub fn section_tabs_joined(&self) -> String {
        self.section_tabs.join(", ")
    }
}

/// Everything a crawl run needs, built once and handed to the crawler.
#[derive(Debug, Clone)]
pub struct CrawlConfig {
    pub toc_root_url: String,
    pub headless: bool,
    pub verbose: bool,
    /// Pause before each navigation and after each page load.
    pub short_delay: Duration,
    /// Pause after a failed extraction attempt.
    pub cooldown: Duration,
    pub max_attempts: u32,
    /// Case-sensitive substrings a section tab label must contain.
    pub section_filter: Vec<String>,
    /// Regex a guideline URL must match to count as disease content.
    pub content_pattern: String,
    /// A guideline URL must also match one of these.
    pub subtype_patterns: Vec<String>,
    /// Class of the base container; a second occurrence up the chain marks a nested copy.
    pub content_class: String,
    /// Ancestor-chain substrings that mark boilerplate.
    pub denylist: Vec<String>,
    pub selectors: Selectors,
    pub records_path: PathBuf,
    pub ledger_path: PathBuf,
}

impl Default for CrawlConfig {
    fn default() -> Self {
        let short_delay = Duration::from_secs(SHORT_DELAY_SECS);
        Self {
            toc_root_url: TOC_ROOT_URL.to_string(),
            headless: true,
            verbose: true,
            short_delay,
            cooldown: short_delay * COOLDOWN_FACTOR,
            max_attempts: MAX_ATTEMPTS,
            section_filter: SECTION_FILTER.iter().map(|s| s.to_string()).collect(),
            content_pattern: CONTENT_PATTERN.to_string(),
            subtype_patterns: SUBTYPE_PATTERNS.iter().map(|s| s.to_string()).collect(),
            content_class: "content".to_string(),
            denylist: vec![
                "references".to_string(),
                "acces-list-container".to_string(),
                "tableofcontents".to_string(),
            ],
            selectors: Selectors::default(),
            records_path: PathBuf::from(RECORDS_PATH),
            ledger_path: PathBuf::from(LEDGER_PATH),
        }
    }
}

impl CrawlConfig {
    /// Derive the cooldown from a short delay using the fixed 30x ratio.
    pub fn with_short_delay(mut self, delay: Duration) -> Self {
        self.short_delay = delay;
        self.cooldown = delay * COOLDOWN_FACTOR;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cooldown_is_thirty_short_delays() {
        let config = CrawlConfig::default();
        assert_eq!(config.short_delay, Duration::from_secs(10));
        assert_eq!(config.cooldown, Duration::from_secs(300));

        let config = config.with_short_delay(Duration::from_secs(2));
        assert_eq!(config.cooldown, Duration::from_secs(60));
    }

    #[test]
    fn tab_selectors_are_alternatives() {
        let selectors = Selectors::default();
        let joined = selectors.section_tabs_joined();
        assert_eq!(joined.matches(", ").count(), 1);
        assert!(joined.starts_with(&selectors.section_tabs[0]));
    }
}
