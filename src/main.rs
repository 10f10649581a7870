mod browser;
mod config;
mod crawler;
mod error;
mod extractor;
mod model;
mod parser;
mod sink;
#[cfg(test)]
mod testing;
mod toc;

use std::path::PathBuf;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use browser::{BrowserSession, ChromeSession, LaunchOptions};
use config::CrawlConfig;
use crawler::Crawler;
use extractor::SectionExtractor;

#[derive(Parser)]
#[command(
    name = "guideline_scraper",
    about = "Medical guideline scraper driven by headless Chrome"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Walk the A-Z index and append every guideline to the output file
    Crawl(CrawlArgs),
    /// Extract a single guideline and print it as JSON
    Extract {
        /// Display name stored in the record
        name: String,
        /// Guideline page URL
        url: String,
        #[command(flatten)]
        browser: BrowserArgs,
    },
    /// Count saved records and ledger entries
    Stats {
        #[arg(long, default_value = "data/guidelines.jsonl")]
        output: PathBuf,
        #[arg(long, default_value = "data/guidelines.txt")]
        ledger: PathBuf,
    },
}

#[derive(Args)]
struct BrowserArgs {
    /// Show the browser window
    #[arg(long)]
    headful: bool,
    /// Only log warnings and errors
    #[arg(short, long)]
    quiet: bool,
    /// Pause before each navigation and after each page load
    #[arg(long, default_value = "10")]
    short_delay_secs: u64,
}

#[derive(Args)]
struct CrawlArgs {
    #[command(flatten)]
    browser: BrowserArgs,
    /// Index page; `?letter=X` is appended per letter
    #[arg(long, default_value = config::TOC_ROOT_URL)]
    toc_url: String,
    /// Pause after a failed attempt (default: 30x the short delay)
    #[arg(long)]
    cooldown_secs: Option<u64>,
    /// Extraction attempts per guideline
    #[arg(long, default_value = "5")]
    max_attempts: u32,
    /// Section tab filter, repeatable (case-sensitive substring)
    #[arg(long = "section", default_values = ["Symptoms", "Diagnosis"])]
    sections: Vec<String>,
    #[arg(long, default_value = "data/guidelines.jsonl")]
    output: PathBuf,
    #[arg(long, default_value = "data/guidelines.txt")]
    ledger: PathBuf,
}

impl BrowserArgs {
    fn apply(&self, config: CrawlConfig) -> CrawlConfig {
        CrawlConfig {
            headless: !self.headful,
            verbose: !self.quiet,
            ..config
        }
        .with_short_delay(Duration::from_secs(self.short_delay_secs))
    }
}

impl CrawlArgs {
    fn into_config(self) -> CrawlConfig {
        let mut config = self.browser.apply(CrawlConfig::default());
        if let Some(secs) = self.cooldown_secs {
            config.cooldown = Duration::from_secs(secs);
        }
        CrawlConfig {
            toc_root_url: self.toc_url,
            max_attempts: self.max_attempts.max(1),
            section_filter: self.sections,
            records_path: self.output,
            ledger_path: self.ledger,
            ..config
        }
    }
}

fn init_tracing(quiet: bool) {
    let default = if quiet { "warn" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| default.into()),
        )
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let t0 = Instant::now();
    let cli = Cli::parse();

    let quiet = match &cli.command {
        Commands::Crawl(args) => args.browser.quiet,
        Commands::Extract { browser, .. } => browser.quiet,
        Commands::Stats { .. } => false,
    };
    init_tracing(quiet);

    let result = match cli.command {
        Commands::Crawl(args) => crawl(args.into_config()).await,
        Commands::Extract { name, url, browser } => {
            let config = browser.apply(CrawlConfig::default());
            extract_one(&config, &name, &url).await
        }
        Commands::Stats { output, ledger } => {
            let s = sink::get_stats(&output, &ledger)?;
            println!("Records:     {}", s.records);
            println!("Malformed:   {}", s.malformed);
            println!("Sections:    {}", s.sections);
            println!("Subsections: {}", s.subsections);
            println!("Ledger:      {}", s.ledger);
            if s.ledger != s.records {
                println!("\nLedger and records disagree by {}", s.ledger.abs_diff(s.records));
            }
            Ok(())
        }
    };

    let elapsed = t0.elapsed();
    if elapsed.as_secs() >= 1 {
        println!("\nDone in {}", format_duration(elapsed));
    }

    result
}

async fn launch(config: &CrawlConfig) -> anyhow::Result<ChromeSession> {
    let options = LaunchOptions {
        headless: config.headless,
        ..LaunchOptions::default()
    };
    ChromeSession::launch(&options)
        .await
        .context("Failed to launch Chrome")
}

async fn crawl(config: CrawlConfig) -> anyhow::Result<()> {
    let crawler = Crawler::prepare(config)?;
    let session = launch(crawler.config()).await?;
    let mut crawler = crawler.with_session(session);

    let ok = crawler.run().await;
    let s = crawler.stats().clone();
    println!(
        "Letters: {} ({} empty) | entries: {} | saved: {} | dropped: {}",
        s.letters, s.empty_letters, s.entries, s.saved, s.dropped
    );
    println!("Duplicates: {} | filtered: {}", s.duplicates, s.filtered);

    crawler
        .into_session()
        .close()
        .await
        .context("Failed to close browser")?;

    if !ok {
        anyhow::bail!("crawl aborted after {} letters", s.letters);
    }
    Ok(())
}

async fn extract_one(config: &CrawlConfig, name: &str, url: &str) -> anyhow::Result<()> {
    let session = launch(config).await?;
    let record = SectionExtractor::new(&session, config)
        .extract_guideline(name, url)
        .await;
    session.close().await.context("Failed to close browser")?;

    let record = record.with_context(|| format!("Failed to extract {}", url))?;
    println!("{}", serde_json::to_string_pretty(&record)?);
    Ok(())
}

fn format_duration(d: Duration) -> String {
    let secs = d.as_secs();
    if secs < 60 {
        format!("{:.1}s", d.as_secs_f64())
    } else if secs < 3600 {
        format!("{}m {}s", secs / 60, secs % 60)
    } else {
        format!("{}h {}m {}s", secs / 3600, (secs % 3600) / 60, secs % 60)
    }
}
