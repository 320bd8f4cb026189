//! Application configuration structures.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{AppError, Result};
use crate::models::SourceConfig;

/// Root application configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    /// Telegram bot credentials and request settings
    #[serde(default)]
    pub telegram: TelegramConfig,

    /// Retry policy for outbound messages
    #[serde(default)]
    pub delivery: DeliveryConfig,

    /// HTTP and scraping behavior settings
    #[serde(default)]
    pub crawler: CrawlerConfig,

    /// File locations
    #[serde(default)]
    pub paths: PathsConfig,

    /// Search result pages to scrape
    #[serde(default)]
    pub sources: Vec<SourceConfig>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = fs::read_to_string(path)?;
        Ok(toml::from_str(&content)?)
    }

    /// Load configuration, or defaults when the file does not exist.
    ///
    /// A file that exists but cannot be read or parsed is an error.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self> {
        match Self::load(&path) {
            Err(AppError::Io(e)) if e.kind() == std::io::ErrorKind::NotFound => {
                log::warn!(
                    "Config file {:?} not found. Using defaults.",
                    path.as_ref()
                );
                Ok(Self::default())
            }
            loaded => loaded,
        }
    }

    /// Validate configuration values for basic sanity.
    pub fn validate(&self) -> Result<()> {
        if self.crawler.user_agent.trim().is_empty() {
            return Err(AppError::validation("crawler.user_agent is empty"));
        }
        if self.crawler.timeout_secs == 0 {
            return Err(AppError::validation("crawler.timeout_secs must be > 0"));
        }
        if self.crawler.max_concurrent == 0 {
            return Err(AppError::validation("crawler.max_concurrent must be > 0"));
        }
        if self.telegram.timeout_secs == 0 {
            return Err(AppError::validation("telegram.timeout_secs must be > 0"));
        }
        if self.delivery.max_retries == 0 {
            return Err(AppError::validation("delivery.max_retries must be >= 1"));
        }
        for source in &self.sources {
            url::Url::parse(&source.url).map_err(|e| {
                AppError::validation(format!("source url {:?} is invalid: {e}", source.url))
            })?;
        }
        Ok(())
    }

    /// Validate the settings needed to talk to Telegram.
    pub fn validate_delivery(&self) -> Result<()> {
        self.validate()?;
        if self.telegram.bot_token.trim().is_empty() {
            return Err(AppError::validation("telegram.bot_token is empty"));
        }
        if self.telegram.chat_room.trim().is_empty() {
            return Err(AppError::validation("telegram.chat_room is empty"));
        }
        Ok(())
    }
}

/// Telegram Bot API settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TelegramConfig {
    #[serde(default)]
    pub bot_token: String,

    /// Chat id or `@channel` name
    #[serde(default)]
    pub chat_room: String,

    #[serde(default = "defaults::api_base")]
    pub api_base: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::telegram_timeout")]
    pub timeout_secs: u64,
}

impl Default for TelegramConfig {
    fn default() -> Self {
        Self {
            bot_token: String::new(),
            chat_room: String::new(),
            api_base: defaults::api_base(),
            timeout_secs: defaults::telegram_timeout(),
        }
    }
}

/// Retry policy for `send_with_retry`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryConfig {
    /// Attempts per posting (primary + degraded count as one attempt)
    #[serde(default = "defaults::max_retries")]
    pub max_retries: u32,

    /// Base of the exponential backoff, in seconds
    #[serde(default = "defaults::retry_backoff_base")]
    pub retry_backoff_base: u64,
}

impl Default for DeliveryConfig {
    fn default() -> Self {
        Self {
            max_retries: defaults::max_retries(),
            retry_backoff_base: defaults::retry_backoff_base(),
        }
    }
}

/// HTTP client and scraping behavior settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CrawlerConfig {
    /// User-Agent header for HTTP requests
    #[serde(default = "defaults::user_agent")]
    pub user_agent: String,

    /// Request timeout in seconds
    #[serde(default = "defaults::timeout")]
    pub timeout_secs: u64,

    /// Delay between page fetches in milliseconds
    #[serde(default = "defaults::request_delay")]
    pub request_delay_ms: u64,

    /// Maximum concurrent page fetches
    #[serde(default = "defaults::max_concurrent")]
    pub max_concurrent: usize,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            user_agent: defaults::user_agent(),
            timeout_secs: defaults::timeout(),
            request_delay_ms: defaults::request_delay(),
            max_concurrent: defaults::max_concurrent(),
        }
    }
}

/// File locations, relative to the working directory unless absolute.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "defaults::store_file")]
    pub store_file: PathBuf,

    #[serde(default = "defaults::failure_log")]
    pub failure_log: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            store_file: defaults::store_file(),
            failure_log: defaults::failure_log(),
        }
    }
}

mod defaults {
    use std::path::PathBuf;

    // Telegram defaults
    pub fn api_base() -> String {
        "https://api.telegram.org".into()
    }
    pub fn telegram_timeout() -> u64 {
        10
    }

    // Delivery defaults
    pub fn max_retries() -> u32 {
        3
    }
    pub fn retry_backoff_base() -> u64 {
        1
    }

    // Crawler defaults
    pub fn user_agent() -> String {
        "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) \
         Chrome/124.0 Safari/537.36"
            .into()
    }
    pub fn timeout() -> u64 {
        30
    }
    pub fn request_delay() -> u64 {
        500
    }
    pub fn max_concurrent() -> usize {
        3
    }

    // Path defaults
    pub fn store_file() -> PathBuf {
        PathBuf::from("postings.json")
    }
    pub fn failure_log() -> PathBuf {
        PathBuf::from("send_failures.log")
    }
}
