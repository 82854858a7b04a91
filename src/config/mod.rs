//! Configuration management for scrapi-probe
//!
//! Settings come from built-in defaults, an optional TOML file, environment
//! variables, and finally command-line overrides, in that order.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use url::Url;

/// Deployment the scripts were written against
pub const DEFAULT_BASE_URL: &str = "https://app-bootstrap-4.preview.emergentagent.com/api";

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Backend under test
    pub backend: BackendConfig,

    /// Run polling cadence per suite
    pub polling: PollingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

/// Backend connection settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendConfig {
    /// API root, including the `/api` prefix
    pub base_url: String,

    /// Request timeout in seconds
    pub request_timeout_secs: u64,

    /// Skip TLS certificate verification (preview deployments use self-signed certs)
    pub accept_invalid_certs: bool,

    /// User agent string
    pub user_agent: String,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            request_timeout_secs: 60,
            accept_invalid_certs: true,
            user_agent: format!("scrapi-probe/{}", env!("CARGO_PKG_VERSION")),
        }
    }
}

/// Sleep-then-check cadence for one polling loop
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollSettings {
    /// Delay before each status check, in milliseconds
    pub interval_ms: u64,

    /// Give up once this much time has been waited, in milliseconds
    pub max_wait_ms: u64,

    /// Print an in-progress line whenever the waited time is a multiple of this
    pub progress_every_ms: u64,
}

impl PollSettings {
    /// Build settings from whole seconds
    pub const fn from_secs(interval: u64, max_wait: u64, progress_every: u64) -> Self {
        Self {
            interval_ms: interval * 1000,
            max_wait_ms: max_wait * 1000,
            progress_every_ms: progress_every * 1000,
        }
    }

    #[must_use]
    pub fn interval(&self) -> Duration {
        Duration::from_millis(self.interval_ms)
    }

    #[must_use]
    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }

    fn validate(&self, name: &str) -> Result<()> {
        if self.interval_ms == 0 {
            anyhow::bail!("polling.{name}.interval_ms must be greater than 0");
        }
        if self.interval_ms > self.max_wait_ms {
            anyhow::bail!("polling.{name}.interval_ms must not exceed max_wait_ms");
        }
        Ok(())
    }
}

/// Polling cadence for each suite that waits on runs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollingConfig {
    /// Maps suite: every 10s, up to 5 minutes
    pub maps: PollSettings,

    /// Enhanced maps step of the backend suite: every 5s, up to 3 minutes
    pub enhanced_maps: PollSettings,

    /// Run-output check: every 3s, up to 2 minutes
    pub run_check: PollSettings,
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            maps: PollSettings::from_secs(10, 300, 30),
            enhanced_maps: PollSettings::from_secs(5, 180, 20),
            run_check: PollSettings::from_secs(3, 120, 15),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: String::from("info"),
            format: String::from("text"),
        }
    }
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// A variable that is set but does not parse is an error.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env()?;
        Ok(config)
    }

    /// Load configuration from a file, then let the environment override it
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;

        let mut config: Self = toml::from_str(&content)
            .with_context(|| format!("Failed to parse TOML config file: {}", path.display()))?;

        config.apply_env()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Some(base_url) = env_value("SCRAPI_BASE_URL") {
            self.backend.base_url = base_url;
        }

        if let Some(timeout) = env_parse::<u64>("SCRAPI_REQUEST_TIMEOUT")? {
            self.backend.request_timeout_secs = timeout;
        }

        if let Some(accept) = env_parse::<bool>("SCRAPI_ACCEPT_INVALID_CERTS")? {
            self.backend.accept_invalid_certs = accept;
        }

        if let Some(level) = env_value("SCRAPI_LOG_LEVEL") {
            self.logging.level = level;
        }

        if let Some(format) = env_value("SCRAPI_LOG_FORMAT") {
            self.logging.format = format;
        }

        Ok(())
    }

    /// Apply command-line overrides
    pub fn with_overrides(mut self, base_url: Option<String>, timeout_secs: Option<u64>) -> Self {
        if let Some(base_url) = base_url {
            self.backend.base_url = base_url;
        }
        if let Some(timeout) = timeout_secs {
            self.backend.request_timeout_secs = timeout;
        }
        self
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if self.backend.base_url.trim().is_empty() {
            anyhow::bail!("backend.base_url must not be empty");
        }

        let parsed = Url::parse(&self.backend.base_url)
            .with_context(|| format!("Invalid backend.base_url: {}", self.backend.base_url))?;
        if !matches!(parsed.scheme(), "http" | "https") {
            anyhow::bail!("backend.base_url must use http or https");
        }

        if self.backend.request_timeout_secs == 0 {
            anyhow::bail!("backend.request_timeout_secs must be greater than 0");
        }

        self.polling.maps.validate("maps")?;
        self.polling.enhanced_maps.validate("enhanced_maps")?;
        self.polling.run_check.validate("run_check")?;

        Ok(())
    }

    /// Get request timeout as Duration
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.backend.request_timeout_secs)
    }

    /// Base URL without a trailing slash
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.backend.base_url.trim_end_matches('/')
    }
}

/// Variable value, ignoring unset and empty variables
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

fn env_parse<T>(name: &str) -> Result<Option<T>>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    env_value(name)
        .map(|raw| {
            raw.trim()
                .parse::<T>()
                .map_err(|e| anyhow::anyhow!("Invalid {name}={raw}: {e}"))
        })
        .transpose()
}
