use std::collections::HashSet;

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{error, info, warn};

use crate::browser::BrowserSession;
use crate::config::CrawlConfig;
use crate::error::{Result, ScrapeError};
use crate::extractor::SectionExtractor;
use crate::model::{GuidelineRecord, Link};
use crate::sink::JsonlSink;
use crate::toc::{self, UrlFilter, UrlVerdict};

/// Counters reported after a crawl.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CrawlStats {
    pub letters: usize,
    pub empty_letters: usize,
    pub entries: usize,
    pub duplicates: usize,
    pub filtered: usize,
    pub saved: usize,
    pub dropped: usize,
}

/// Walks the alphabetical index and saves every accepted guideline.
pub struct Crawler<S> {
    session: S,
    config: CrawlConfig,
    filter: UrlFilter,
    sink: JsonlSink,
    visited: HashSet<String>,
    stats: CrawlStats,
}

impl Crawler<()> {
    /// Compile the URL filters and open the sink without a browser, so a bad
    /// configuration fails before Chrome is launched.
    pub fn prepare(config: CrawlConfig) -> Result<Self> {
        let filter = UrlFilter::from_config(&config)?;
        let sink = JsonlSink::open(&config.records_path, &config.ledger_path)?;
        Ok(Self {
            session: (),
            config,
            filter,
            sink,
            visited: HashSet::new(),
            stats: CrawlStats::default(),
        })
    }

    pub fn config(&self) -> &CrawlConfig {
        &self.config
    }

    pub fn with_session<S: BrowserSession>(self, session: S) -> Crawler<S> {
        Crawler {
            session,
            config: self.config,
            filter: self.filter,
            sink: self.sink,
            visited: self.visited,
            stats: self.stats,
        }
    }
}

impl<S: BrowserSession> Crawler<S> {
    #[cfg(test)]
    fn new(session: S, config: CrawlConfig) -> Result<Self> {
        Ok(Crawler::prepare(config)?.with_session(session))
    }

    /// Crawl `A..=Z`. Returns `false` when an error escaped a letter and the
    /// remaining letters were abandoned.
    pub async fn run(&mut self) -> bool {
        let pb = if self.config.verbose {
            ProgressBar::new(26)
        } else {
            ProgressBar::hidden()
        };
        if let Ok(style) = ProgressStyle::default_bar()
            .template("[{elapsed_precise}] {bar:40} {pos}/{len} letters {msg}")
        {
            pb.set_style(style.progress_chars("=> "));
        }

        for letter in toc::letters() {
            pb.set_message(letter.to_string());
            if let Err(e) = self.crawl_letter(letter).await {
                pb.abandon();
                error!(%letter, error = %e, "crawl aborted");
                return false;
            }
            pb.inc(1);
        }

        pb.finish_and_clear();
        info!(
            "Crawled {} letters: {} saved, {} dropped, {} duplicates, {} filtered",
            self.stats.letters,
            self.stats.saved,
            self.stats.dropped,
            self.stats.duplicates,
            self.stats.filtered
        );
        true
    }

    async fn crawl_letter(&mut self, letter: char) -> Result<()> {
        let url = toc::letter_url(&self.config.toc_root_url, letter);
        self.session.goto(&url).await?;
        tokio::time::sleep(self.config.short_delay).await;
        self.stats.letters += 1;

        let selector = self.config.selectors.toc_item.clone();
        if !self.session.selector_exists(&selector).await? {
            info!(%letter, "no guidelines for letter");
            self.stats.empty_letters += 1;
            return Ok(());
        }

        let entries = self.session.query_links(&selector).await?;
        info!(%letter, entries = entries.len(), "table of contents loaded");
        for entry in entries {
            self.process_entry(entry).await?;
        }
        Ok(())
    }

    /// Skips never fail; only a sink error propagates.
    async fn process_entry(&mut self, entry: Link) -> Result<()> {
        self.stats.entries += 1;
        let Link { text: name, url } = entry;

        if self.visited.contains(&name) {
            info!(guideline = %name, "already saved, skipping");
            self.stats.duplicates += 1;
            return Ok(());
        }
        match self.filter.check(&url) {
            UrlVerdict::Accept => {}
            UrlVerdict::OutsideContent => {
                info!(guideline = %name, %url, "not a disease page, skipping");
                self.stats.filtered += 1;
                return Ok(());
            }
            UrlVerdict::WrongSubtype => {
                info!(guideline = %name, %url, "unexpected page type, skipping");
                self.stats.filtered += 1;
                return Ok(());
            }
        }

        match self.extract_with_retry(&name, &url).await {
            Some(record) => {
                self.sink.save(&record)?;
                info!(guideline = %name, sections = record.content.len(), "saved");
                self.visited.insert(name);
                self.stats.saved += 1;
            }
            None => {
                error!(
                    guideline = %name,
                    attempts = self.config.max_attempts,
                    "giving up on guideline"
                );
                self.stats.dropped += 1;
            }
        }
        Ok(())
    }

    /// Up to `max_attempts` tries, cooling down between them. `None` once exhausted.
    async fn extract_with_retry(&self, name: &str, url: &str) -> Option<GuidelineRecord> {
        let max = self.config.max_attempts;
        for attempt in 1..=max {
            tokio::time::sleep(self.config.short_delay).await;
            match self.try_extract(name, url).await {
                Ok(record) => return Some(record),
                Err(e) => {
                    warn!(
                        guideline = %name,
                        error = %e,
                        "attempt {}/{} failed",
                        attempt,
                        max
                    );
                    if attempt < max {
                        warn!("cooling down for {:.0}s", self.config.cooldown.as_secs_f64());
                        tokio::time::sleep(self.config.cooldown).await;
                    }
                }
            }
        }
        None
    }

    async fn try_extract(&self, name: &str, url: &str) -> Result<GuidelineRecord> {
        let extractor = SectionExtractor::new(&self.session, &self.config);
        let record = extractor.extract_guideline(name, url).await?;
        if record.is_empty() {
            return Err(ScrapeError::EmptyContent {
                name: name.to_string(),
            });
        }
        Ok(record)
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.stats
    }

    /// Hand the browser back so the caller can release it.
    pub fn into_session(self) -> S {
        self.session
    }
}

#[cfg(test)]
impl<S> Crawler<S> {
    fn is_visited(&self, name: &str) -> bool {
        self.visited.contains(name)
    }

    fn session(&self) -> &S {
        &self.session
    }
}
