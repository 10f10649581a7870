//! Browser automation behind a small capability trait.
//!
//! Crawl logic only ever navigates and evaluates scripts that return plain
//! JSON; everything DOM-shaped stays inside the page. [`ChromeSession`] is the
//! real implementation, tests substitute an in-memory one.

use std::time::Duration;

use chromiumoxide::browser::{Browser, BrowserConfig};
use chromiumoxide::cdp::browser_protocol::page::AddScriptToEvaluateOnNewDocumentParams;
use chromiumoxide::cdp::js_protocol::runtime::EvaluateParams;
use chromiumoxide::handler::viewport::Viewport;
use chromiumoxide::Page;
use futures::StreamExt;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

use crate::error::{Result, ScrapeError};
use crate::model::Link;
use crate::parser::elements::ElementSnapshot;

const USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

const STEALTH_JS: &str = r#"
    Object.defineProperty(navigator, 'webdriver', { get: () => undefined });
    Object.defineProperty(navigator, 'plugins', { get: () => [1, 2, 3, 4, 5] });
    Object.defineProperty(navigator, 'languages', { get: () => ['en-US', 'en'] });
    window.chrome = { runtime: {} };
"#;

/// One browser tab the crawl drives.
#[allow(async_fn_in_trait)]
pub trait BrowserSession {
    async fn goto(&self, url: &str) -> Result<()>;

    /// Evaluate a side-effect-free expression in the page and return its JSON value.
    async fn evaluate_json(&self, script: &str) -> Result<serde_json::Value>;

    async fn close(self) -> Result<()>;

    async fn evaluate<T: DeserializeOwned>(&self, script: &str) -> Result<T> {
        let value = self.evaluate_json(script).await?;
        serde_json::from_value(value).map_err(|e| ScrapeError::Evaluate(e.to_string()))
    }

    async fn selector_exists(&self, selector: &str) -> Result<bool> {
        self.evaluate(&exists_script(selector)).await
    }

    /// Text and absolute href of every anchor matching `selector`.
    async fn query_links(&self, selector: &str) -> Result<Vec<Link>> {
        self.evaluate(&links_script(selector)).await
    }

    /// Snapshots of `selector` matches inside the first existing root, or
    /// `None` when no root matches.
    async fn snapshot_elements(
        &self,
        roots: &[String],
        selector: &str,
    ) -> Result<Option<Vec<ElementSnapshot>>> {
        let found: Snapshot = self.evaluate(&snapshot_script(roots, selector)).await?;
        Ok(found.found.then_some(found.elements))
    }
}

#[derive(Deserialize)]
struct Snapshot {
    found: bool,
    #[serde(default)]
    elements: Vec<ElementSnapshot>,
}

/// Quote a Rust string as a JS string literal.
fn js_str(s: &str) -> String {
    serde_json::Value::String(s.to_string()).to_string()
}

fn exists_script(selector: &str) -> String {
    format!("document.querySelector({}) !== null", js_str(selector))
}

fn links_script(selector: &str) -> String {
    format!(
        "Array.from(document.querySelectorAll({})).map(a => ({{ text: (a.textContent || '').trim(), url: a.href || '' }}))",
        js_str(selector)
    )
}

fn snapshot_script(roots: &[String], selector: &str) -> String {
    let roots = serde_json::Value::from(roots.to_vec()).to_string();
    format!(
        r#"(() => {{
    let base = null;
    for (const sel of {roots}) {{
        base = document.querySelector(sel);
        if (base) break;
    }}
    if (!base) return {{ found: false, elements: [] }};
    const chain = (el) => {{
        const out = [];
        for (let node = el.parentElement; node; node = node.parentElement) {{
            const cls = typeof node.className === 'string'
                ? node.className.trim().split(/\s+/).filter(Boolean)
                : [];
            out.push([node.tagName.toLowerCase(), ...cls].join('.'));
        }}
        return out;
    }};
    const elements = Array.from(base.querySelectorAll({selector})).map(el => ({{
        tag: el.tagName.toLowerCase(),
        text: el.textContent || '',
        ancestors: chain(el),
    }}));
    return {{ found: true, elements }};
}})()"#,
        roots = roots,
        selector = js_str(selector),
    )
}

/// Launch options for [`ChromeSession`].
#[derive(Debug, Clone)]
pub struct LaunchOptions {
    pub headless: bool,
    pub width: u32,
    pub height: u32,
}

impl Default for LaunchOptions {
    fn default() -> Self {
        Self {
            headless: true,
            width: 1920,
            height: 1080,
        }
    }
}

/// A single Chrome tab with stealth tweaks applied before any navigation.
pub struct ChromeSession {
    browser: Browser,
    page: Page,
    handler: JoinHandle<()>,
}

impl ChromeSession {
    pub async fn launch(options: &LaunchOptions) -> Result<Self> {
        let window = format!("--window-size={},{}", options.width, options.height);
        let agent = format!("--user-agent={}", USER_AGENT);
        let args = [
            "--disable-blink-features=AutomationControlled",
            "--disable-infobars",
            "--disable-dev-shm-usage",
            "--no-sandbox",
            "--disable-extensions",
            "--disable-popup-blocking",
            "--no-first-run",
            window.as_str(),
            agent.as_str(),
        ];

        let mut builder = BrowserConfig::builder()
            .viewport(Some(Viewport {
                width: options.width,
                height: options.height,
                device_scale_factor: Some(1.0),
                ..Default::default()
            }))
            .args(args);
        if !options.headless {
            builder = builder.with_head();
        }
        let config = builder.build().map_err(ScrapeError::Browser)?;

        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to launch browser: {e}")))?;

        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if let Err(e) = event {
                    debug!("browser handler event error: {}", e);
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to open page: {e}")))?;

        if let Err(e) = page
            .execute(AddScriptToEvaluateOnNewDocumentParams::new(STEALTH_JS))
            .await
        {
            warn!("stealth script not installed: {}", e);
        }

        debug!(headless = options.headless, "browser launched");
        Ok(Self {
            browser,
            page,
            handler,
        })
    }
}

impl BrowserSession for ChromeSession {
    async fn goto(&self, url: &str) -> Result<()> {
        self.page
            .goto(url)
            .await
            .map_err(|e| ScrapeError::Browser(format!("navigation to {url} failed: {e}")))?;
        Ok(())
    }

    async fn evaluate_json(&self, script: &str) -> Result<serde_json::Value> {
        let params = EvaluateParams::builder()
            .expression(script)
            .return_by_value(true)
            .await_promise(true)
            .build()
            .map_err(ScrapeError::Browser)?;

        let result = self
            .page
            .evaluate_expression(params)
            .await
            .map_err(|e| ScrapeError::Browser(format!("evaluate failed: {e}")))?;

        // `null`/`undefined` come back without a value.
        Ok(result.value().cloned().unwrap_or(serde_json::Value::Null))
    }

    async fn close(mut self) -> Result<()> {
        self.browser
            .close()
            .await
            .map_err(|e| ScrapeError::Browser(format!("failed to close browser: {e}")))?;
        // Give Chrome a moment to exit before reaping it.
        tokio::time::timeout(Duration::from_secs(5), self.browser.wait())
            .await
            .ok();
        self.handler.abort();
        Ok(())
    }
}
