//! Defines the configuration settings for the tiktok-scout application.

use crate::error::{AppError, Result};
use crate::export::ExportFormat;
use anyhow::Context;
use clap::Args;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Options shared by every subcommand. Each can also come from the environment.
#[derive(Args, Debug, Default, Clone)]
pub(crate) struct AppArgs {
    /// Path to configuration file (TOML format)
    #[arg(long, global = true, env = "TIKTOK_SCOUT_CONFIG")]
    pub config_file: Option<String>,

    /// Show the browser window instead of running headless
    #[arg(long, global = true, env = "TIKTOK_SCOUT_HEADED")]
    pub headed: bool,

    /// Path to the Chrome/Chromium executable
    #[arg(long, global = true, env = "TIKTOK_SCOUT_CHROME_PATH")]
    pub chrome_path: Option<PathBuf>,

    /// User agent string for the browser
    #[arg(long, global = true, env = "TIKTOK_SCOUT_USER_AGENT")]
    pub user_agent: Option<String>,

    /// Seconds to wait for profile elements (browser default when unset)
    #[arg(long, global = true, env = "TIKTOK_SCOUT_ELEMENT_TIMEOUT")]
    pub element_timeout: Option<u64>,

    /// Minimum pause after navigation before reading the page (seconds)
    #[arg(long, global = true, env = "TIKTOK_SCOUT_MIN_SETTLE")]
    pub min_settle: Option<f32>,

    /// Maximum pause after navigation before reading the page (seconds)
    #[arg(long, global = true, env = "TIKTOK_SCOUT_MAX_SETTLE")]
    pub max_settle: Option<f32>,

    /// Export format used when the file extension does not decide it
    #[arg(long, global = true, value_enum, env = "TIKTOK_SCOUT_FORMAT")]
    pub format: Option<ExportFormat>,
}

/// TOML Configuration file structure
#[derive(Deserialize, Debug, Default)]
struct ConfigFile {
    browser: Option<BrowserConfig>,
    scraping: Option<ScrapingConfig>,
    export: Option<ExportConfig>,
}

#[derive(Deserialize, Debug, Default)]
struct BrowserConfig {
    headless: Option<bool>,
    sandbox: Option<bool>,
    chrome_path: Option<PathBuf>,
    user_agent: Option<String>,
    window_width: Option<u32>,
    window_height: Option<u32>,
    element_timeout: Option<u64>,
}

#[derive(Deserialize, Debug, Default)]
struct ScrapingConfig {
    name_selector: Option<String>,
    followers_selector: Option<String>,
    likes_selector: Option<String>,
    min_settle: Option<f32>,
    max_settle: Option<f32>,
}

#[derive(Deserialize, Debug, Default)]
struct ExportConfig {
    format: Option<ExportFormat>,
}

/// Application configuration settings.
#[derive(Debug, Clone)]
pub(crate) struct Config {
    /// Run Chrome without a visible window.
    pub headless: bool,
    /// Keep Chrome's sandbox enabled. Containers usually need it off.
    pub sandbox: bool,
    /// Explicit browser executable; auto-detected when `None`.
    pub chrome_path: Option<PathBuf>,
    /// User agent override applied to the tab.
    pub user_agent: Option<String>,
    pub window_size: (u32, u32),
    /// Wait for profile elements; `None` keeps the driver's default.
    pub element_timeout: Option<Duration>,
    /// Minimum and maximum pause between navigation and reading (seconds).
    pub settle_delay: (f32, f32),
    /// CSS selector of the display-name header.
    pub name_selector: String,
    /// CSS selector of the follower count.
    pub followers_selector: String,
    /// CSS selector of the like count.
    pub likes_selector: String,
    /// Format used when an export path has no recognised extension.
    pub export_format: ExportFormat,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            headless: true,
            sandbox: true,
            chrome_path: None,
            user_agent: Some("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/118.0.0.0 Safari/537.36".to_string()),
            window_size: (1280, 900),
            element_timeout: None,
            settle_delay: (0.5, 1.5),
            name_selector: r#"h2[data-e2e="user-subtitle"]"#.to_string(),
            followers_selector: r#"strong[data-e2e="followers-count"]"#.to_string(),
            likes_selector: r#"strong[data-e2e="likes-count"]"#.to_string(),
            export_format: ExportFormat::Csv,
        }
    }
}

/// Load configuration from a TOML file
fn load_config_file(file_path: &str) -> anyhow::Result<ConfigFile> {
    let path = Path::new(file_path);
    if !path.exists() {
        tracing::warn!("Configuration file {} not found, using defaults", file_path);
        return Ok(ConfigFile::default());
    }

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read configuration file: {}", file_path))?;

    let config: ConfigFile = toml::from_str(&content)
        .with_context(|| format!("Failed to parse TOML configuration from {}", file_path))?;

    tracing::info!("Loaded configuration from {}", file_path);
    Ok(config)
}

fn apply_file_config(config: &mut Config, file_config: &ConfigFile) {
    if let Some(browser) = &file_config.browser {
        if let Some(headless) = browser.headless {
            config.headless = headless;
        }
        if let Some(sandbox) = browser.sandbox {
            config.sandbox = sandbox;
        }
        if let Some(path) = &browser.chrome_path {
            config.chrome_path = Some(path.clone());
        }
        if let Some(user_agent) = &browser.user_agent {
            config.user_agent = Some(user_agent.clone());
        }
        if let Some(width) = browser.window_width {
            config.window_size.0 = width;
        }
        if let Some(height) = browser.window_height {
            config.window_size.1 = height;
        }
        if let Some(timeout) = browser.element_timeout {
            config.element_timeout = Some(Duration::from_secs(timeout));
        }
    }

    if let Some(scraping) = &file_config.scraping {
        if let Some(selector) = &scraping.name_selector {
            config.name_selector = selector.clone();
        }
        if let Some(selector) = &scraping.followers_selector {
            config.followers_selector = selector.clone();
        }
        if let Some(selector) = &scraping.likes_selector {
            config.likes_selector = selector.clone();
        }
        if let Some(min_settle) = scraping.min_settle {
            config.settle_delay.0 = min_settle;
        }
        if let Some(max_settle) = scraping.max_settle {
            config.settle_delay.1 = max_settle;
        }
    }

    if let Some(export) = &file_config.export {
        if let Some(format) = export.format {
            config.export_format = format;
        }
    }
}

/// Apply command line arguments to the Config instance
fn apply_cli_args(config: &mut Config, args: &AppArgs) {
    if args.headed {
        config.headless = false;
    }

    if let Some(ref path) = args.chrome_path {
        config.chrome_path = Some(path.clone());
    }

    if let Some(ref agent) = args.user_agent {
        config.user_agent = Some(agent.clone());
    }

    if let Some(timeout) = args.element_timeout {
        config.element_timeout = Some(Duration::from_secs(timeout));
    }

    if let Some(min_settle) = args.min_settle {
        config.settle_delay.0 = min_settle;
    }

    if let Some(max_settle) = args.max_settle {
        config.settle_delay.1 = max_settle;
    }

    if let Some(format) = args.format {
        config.export_format = format;
    }
}

/// Longest pause allowed between navigation and reading (seconds).
const MAX_SETTLE_SECS: f32 = 60.0;

fn validate_config(config: &mut Config) -> Result<()> {
    if !config.settle_delay.0.is_finite() || !config.settle_delay.1.is_finite() {
        return Err(AppError::Config(format!(
            "Settle delay bounds must be finite numbers, got ({}, {})",
            config.settle_delay.0, config.settle_delay.1
        )));
    }

    for bound in [&mut config.settle_delay.0, &mut config.settle_delay.1] {
        if *bound > MAX_SETTLE_SECS {
            tracing::warn!(
                "Settle delay {} exceeded maximum ({}). Setting to {}",
                bound,
                MAX_SETTLE_SECS,
                MAX_SETTLE_SECS
            );
            *bound = MAX_SETTLE_SECS;
        }
    }

    if config.settle_delay.0 < 0.0 {
        config.settle_delay.0 = 0.0;
        tracing::warn!("Min settle delay was negative. Setting to 0.");
    }

    if config.settle_delay.0 > config.settle_delay.1 {
        config.settle_delay.1 = config.settle_delay.0;
        tracing::warn!(
            "Min settle delay was greater than max. Setting both to {}",
            config.settle_delay.0
        );
    }

    if config.element_timeout == Some(Duration::ZERO) {
        config.element_timeout = None;
        tracing::warn!("Element timeout was 0. Using the browser default.");
    }

    if config.window_size.0 == 0 || config.window_size.1 == 0 {
        config.window_size = Config::default().window_size;
        tracing::warn!(
            "Window size had a zero dimension. Setting to {:?}",
            config.window_size
        );
    }

    if config.user_agent.as_deref().is_some_and(|ua| ua.trim().is_empty()) {
        config.user_agent = None;
        tracing::warn!("User agent was empty. Using the browser's own.");
    }

    for (field, selector) in [
        ("name_selector", &config.name_selector),
        ("followers_selector", &config.followers_selector),
        ("likes_selector", &config.likes_selector),
    ] {
        if scraper::Selector::parse(selector).is_err() {
            return Err(AppError::Config(format!(
                "{} is not a valid CSS selector: {}",
                field, selector
            )));
        }
    }

    Ok(())
}

pub(crate) fn build_config(args: &AppArgs) -> Result<Config> {
    let mut config = Config::default();

    if let Some(ref file_path) = args.config_file {
        match load_config_file(file_path) {
            Ok(file_config) => apply_file_config(&mut config, &file_config),
            Err(e) => {
                tracing::error!("Failed to load configuration file: {:#}", e);
            }
        }
    } else {
        for path in ["./tiktok-scout.toml", "./config.toml"] {
            if Path::new(path).exists() {
                match load_config_file(path) {
                    Ok(file_config) => {
                        apply_file_config(&mut config, &file_config);
                        break;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load configuration from {}: {:#}", path, e);
                    }
                }
            }
        }
    }

    apply_cli_args(&mut config, args);

    validate_config(&mut config)?;

    tracing::debug!("Final configuration: {:?}", config);

    Ok(config)
}

/// Picks a pause in the configured settle range.
pub(crate) fn random_settle_duration(config: &Config) -> Duration {
    use rand::Rng;
    let (min, max) = config.settle_delay;
    if min >= max {
        return Duration::from_secs_f32(min.max(0.0));
    }
    let duration_secs = rand::thread_rng().gen_range(min..max);
    Duration::from_secs_f32(duration_secs)
}
