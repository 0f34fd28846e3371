use figment::{
    providers::{Env, Format, Serialized, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};

/// Application configuration loaded from multiple sources.
///
/// Configuration is loaded in priority order (lowest to highest):
/// 1. Struct defaults
/// 2. config.yaml file (if exists)
/// 3. Environment variables with RCB_ prefix (always wins)
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub votes: VotesConfig,
    #[serde(default)]
    pub publisher: PublisherConfig,
    #[serde(default)]
    pub poll: PollConfig,
    #[serde(default)]
    pub cursor: CursorConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct VotesConfig {
    /// Vote source base URL.
    #[serde(default = "default_votes_base_url")]
    pub base_url: String,

    /// Vote source API key (required — no compiled-in default).
    #[serde(default)]
    pub api_key: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PublisherConfig {
    /// Publishing endpoint base URL (required when posting is enabled).
    #[serde(default)]
    pub base_url: String,

    /// Publishing endpoint bearer token (required when posting is enabled).
    #[serde(default)]
    pub token: String,

    /// When false the bot runs dry: threads are composed and logged but
    /// never submitted, and the cursor never advances.
    #[serde(default)]
    pub posting_enabled: bool,

    /// Minimum pause between two posts of the same thread.
    #[serde(default = "default_rate_limit_delay")]
    pub rate_limit_delay_seconds: u64,

    /// First retry delay after a failed post.
    #[serde(default = "default_initial_backoff")]
    pub initial_backoff_seconds: u64,

    /// Factor applied to the retry delay after each failed attempt.
    #[serde(default = "default_backoff_multiplier")]
    pub backoff_multiplier: u32,

    /// Ceiling on any single retry delay.
    #[serde(default = "default_max_backoff")]
    pub max_backoff_seconds: u64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PollConfig {
    /// Seconds between poll cycles.
    #[serde(default = "default_poll_interval")]
    pub interval_seconds: u64,

    /// Longest date span a single range request may cover.
    #[serde(default = "default_max_range_window")]
    pub max_range_window_days: i64,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct CursorConfig {
    /// Path of the last-published watermark file.
    #[serde(default = "default_cursor_path")]
    pub path: String,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingConfig {
    /// Log level filter (debug, info, warn, error).
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_votes_base_url() -> String {
    "https://api.propublica.org/congress/v1".to_string()
}

#[allow(clippy::missing_const_for_fn)]
fn default_rate_limit_delay() -> u64 {
    5
}

#[allow(clippy::missing_const_for_fn)]
fn default_initial_backoff() -> u64 {
    2
}

#[allow(clippy::missing_const_for_fn)]
fn default_backoff_multiplier() -> u32 {
    2
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_backoff() -> u64 {
    300
}

#[allow(clippy::missing_const_for_fn)]
fn default_poll_interval() -> u64 {
    300
}

#[allow(clippy::missing_const_for_fn)]
fn default_max_range_window() -> i64 {
    30
}

fn default_cursor_path() -> String {
    "data/last_published.txt".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for VotesConfig {
    fn default() -> Self {
        Self {
            base_url: default_votes_base_url(),
            api_key: String::new(),
        }
    }
}

impl Default for PublisherConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            token: String::new(),
            posting_enabled: false,
            rate_limit_delay_seconds: default_rate_limit_delay(),
            initial_backoff_seconds: default_initial_backoff(),
            backoff_multiplier: default_backoff_multiplier(),
            max_backoff_seconds: default_max_backoff(),
        }
    }
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_seconds: default_poll_interval(),
            max_range_window_days: default_max_range_window(),
        }
    }
}

impl Default for CursorConfig {
    fn default() -> Self {
        Self {
            path: default_cursor_path(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            votes: VotesConfig::default(),
            publisher: PublisherConfig::default(),
            poll: PollConfig::default(),
            cursor: CursorConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

/// Configuration loading and validation errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] Box<figment::Error>),

    #[error("Validation error: {0}")]
    Validation(String),
}

impl From<figment::Error> for ConfigError {
    fn from(err: figment::Error) -> Self {
        Self::Figment(Box::new(err))
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// Sources are merged in priority order:
    /// 1. Struct defaults (lowest)
    /// 2. config.yaml file (if exists)
    /// 3. Environment variables with RCB_ prefix (highest)
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from("config.yaml")
    }

    /// Load configuration with a custom YAML file path.
    ///
    /// # Errors
    /// Returns an error if configuration cannot be loaded or is invalid.
    pub fn load_from(yaml_path: &str) -> Result<Self, ConfigError> {
        let config: Self = Figment::new()
            .merge(Serialized::defaults(Self::default()))
            .merge(Yaml::file(yaml_path))
            .merge(Env::prefixed("RCB_").split("__"))
            .extract()?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration values.
    ///
    /// # Errors
    /// Returns an error if any configuration value is invalid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.votes.api_key.is_empty() {
            return Err(ConfigError::Validation(
                "votes.api_key is required. Set RCB_VOTES__API_KEY environment variable or configure in config.yaml.".into(),
            ));
        }

        if self.poll.interval_seconds == 0 {
            return Err(ConfigError::Validation(
                "poll.interval_seconds cannot be 0".into(),
            ));
        }

        if self.poll.max_range_window_days <= 0 {
            return Err(ConfigError::Validation(
                "poll.max_range_window_days must be positive".into(),
            ));
        }

        if self.publisher.backoff_multiplier == 0 {
            return Err(ConfigError::Validation(
                "publisher.backoff_multiplier cannot be 0".into(),
            ));
        }

        if self.publisher.posting_enabled {
            if self.publisher.base_url.is_empty() {
                return Err(ConfigError::Validation(
                    "publisher.base_url is required when posting is enabled".into(),
                ));
            }
            if self.publisher.token.is_empty() {
                return Err(ConfigError::Validation(
                    "publisher.token is required when posting is enabled".into(),
                ));
            }
        }

        Ok(())
    }
}
