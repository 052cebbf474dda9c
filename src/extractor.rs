//! Reads profile metrics from a rendered TikTok profile page.

use crate::config::{Config, random_settle_duration};
use crate::error::ExtractionError;
use crate::models::ScrapedProfile;
use crate::normalize::username_from_url;
use crate::progress::{Checkpoint, Progress};
use headless_chrome::{Browser, LaunchOptions, Tab};
use scraper::{Html, Selector};
use std::ffi::OsStr;
use std::sync::Arc;
use std::time::Instant;
use url::Url;

/// Something that can turn a profile URL into the scraped fields.
///
/// `ChromeExtractor` is the only production implementation.
pub(crate) trait ProfileExtractor {
    fn extract(
        &self,
        url: &str,
        progress: &mut dyn Progress,
    ) -> Result<ScrapedProfile, ExtractionError>;
}

/// CSS selectors for the three fields read from the page.
#[derive(Debug, Clone)]
pub(crate) struct ProfileSelectors {
    pub name: String,
    pub followers: String,
    pub likes: String,
}

impl ProfileSelectors {
    pub(crate) fn from_config(config: &Config) -> Self {
        Self {
            name: config.name_selector.clone(),
            followers: config.followers_selector.clone(),
            likes: config.likes_selector.clone(),
        }
    }
}

/// Display-name, follower and like text read from a page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct PageFields {
    pub name: String,
    pub followers: String,
    pub likes: String,
}

/// Collapses runs of whitespace and trims the ends.
fn clean_text<'a>(fragments: impl Iterator<Item = &'a str>) -> String {
    fragments
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

fn select_text(document: &Html, selector: &str) -> Result<String, ExtractionError> {
    let not_found = || ExtractionError::ElementNotFound {
        selector: selector.to_string(),
    };
    let parsed = Selector::parse(selector).map_err(|_| not_found())?;
    let element = document.select(&parsed).next().ok_or_else(not_found)?;
    Ok(clean_text(element.text()))
}

/// Parses the three profile fields out of page HTML.
///
/// The first selector that matches nothing aborts the parse.
pub(crate) fn parse_profile_page(
    html: &str,
    selectors: &ProfileSelectors,
) -> Result<PageFields, ExtractionError> {
    let document = Html::parse_document(html);
    Ok(PageFields {
        name: select_text(&document, &selectors.name)?,
        followers: select_text(&document, &selectors.followers)?,
        likes: select_text(&document, &selectors.likes)?,
    })
}

fn session_failure(context: &str, e: impl std::fmt::Display) -> ExtractionError {
    ExtractionError::SessionFailure(format!("{}: {}", context, e))
}

/// One browser process with one open tab.
///
/// Dropping the session closes the tab and kills the browser, so every exit
/// path out of an extraction releases it.
struct BrowserSession {
    tab: Arc<Tab>,
    // Kept alive for the tab; its own Drop terminates the process.
    _browser: Browser,
}

impl BrowserSession {
    fn launch(config: &Config) -> Result<Self, ExtractionError> {
        let mut args: Vec<&OsStr> = vec![
            OsStr::new("--disable-blink-features=AutomationControlled"),
            OsStr::new("--no-first-run"),
            OsStr::new("--no-default-browser-check"),
            OsStr::new("--disable-notifications"),
        ];
        if !config.sandbox {
            args.push(OsStr::new("--disable-setuid-sandbox"));
        }

        let options = LaunchOptions {
            headless: config.headless,
            sandbox: config.sandbox,
            window_size: Some(config.window_size),
            path: config.chrome_path.clone(),
            args,
            ..Default::default()
        };

        let browser =
            Browser::new(options).map_err(|e| session_failure("Failed to start browser", e))?;
        let tab = browser
            .new_tab()
            .map_err(|e| session_failure("Failed to create tab", e))?;

        if let Some(user_agent) = &config.user_agent {
            tab.set_user_agent(user_agent, None, None)
                .map_err(|e| session_failure("Failed to set user agent", e))?;
        }
        if let Some(timeout) = config.element_timeout {
            tab.set_default_timeout(timeout);
        }

        Ok(Self {
            tab,
            _browser: browser,
        })
    }

    fn open(&self, url: &str) -> Result<(), ExtractionError> {
        self.tab
            .navigate_to(url)
            .map_err(|e| session_failure("Failed to navigate", e))?;
        self.tab
            .wait_until_navigated()
            .map_err(|e| session_failure("Navigation did not complete", e))?;
        Ok(())
    }

    /// Blocks until `selector` matches an element or the driver gives up.
    fn wait_for(&self, selector: &str) -> Result<(), ExtractionError> {
        self.tab.wait_for_element(selector).map_err(|e| {
            tracing::debug!(target: "extract_task", "Wait for '{}' failed: {}", selector, e);
            ExtractionError::ElementNotFound {
                selector: selector.to_string(),
            }
        })?;
        Ok(())
    }

    fn content(&self) -> Result<String, ExtractionError> {
        self.tab
            .get_content()
            .map_err(|e| session_failure("Failed to read page content", e))
    }
}

impl Drop for BrowserSession {
    fn drop(&mut self) {
        if let Err(e) = self.tab.close(false) {
            tracing::debug!(target: "extract_task", "Tab close failed during teardown: {}", e);
        }
        tracing::debug!(target: "extract_task", "Browser session released.");
    }
}

/// Extracts profiles by driving a fresh headless Chrome per call.
pub(crate) struct ChromeExtractor {
    config: Config,
    selectors: ProfileSelectors,
}

impl ChromeExtractor {
    pub(crate) fn new(config: Config) -> Self {
        let selectors = ProfileSelectors::from_config(&config);
        Self { config, selectors }
    }

    fn read_page(
        &self,
        session: &BrowserSession,
        url: &str,
        progress: &mut dyn Progress,
    ) -> Result<PageFields, ExtractionError> {
        session.open(url)?;
        session.wait_for(&self.selectors.name)?;
        progress.checkpoint(Checkpoint::PageLoaded);
        tracing::debug!(target: "extract_task", "Page loaded: {}", url);

        let settle = random_settle_duration(&self.config);
        if !settle.is_zero() {
            std::thread::sleep(settle);
        }

        let html = session.content()?;
        parse_profile_page(&html, &self.selectors)
    }
}

impl ProfileExtractor for ChromeExtractor {
    fn extract(
        &self,
        url: &str,
        progress: &mut dyn Progress,
    ) -> Result<ScrapedProfile, ExtractionError> {
        let start_time = Instant::now();
        tracing::info!(target: "extract_task", "Starting extraction for: {}", url);

        Url::parse(url).map_err(|e| ExtractionError::MalformedUrl(format!("{}: {}", url, e)))?;
        let username = username_from_url(url)
            .ok_or_else(|| ExtractionError::MalformedUrl(format!("no @handle in {}", url)))?;

        let session = BrowserSession::launch(&self.config)?;
        progress.checkpoint(Checkpoint::SessionReady);

        let fields = self.read_page(&session, url, progress);
        drop(session);
        let fields = fields?;
        progress.checkpoint(Checkpoint::DataRead);

        tracing::info!(
            target: "extract_task",
            "Extraction for {} finished in {:.2?}: name='{}', followers={}, likes={}",
            url,
            start_time.elapsed(),
            fields.name,
            fields.followers,
            fields.likes
        );

        Ok(ScrapedProfile {
            name: fields.name,
            username,
            followers: fields.followers,
            likes: fields.likes,
        })
    }
}
