//! Configuration management for reportchart.
//!
//! This module provides configuration handling with:
//! - YAML file support
//! - Environment variable and CLI overrides (applied by the CLI layer)
//! - Validation and defaults

use crate::core::{ReportError, Result};
use serde::{Deserialize, Serialize};
use std::net::IpAddr;
use std::path::PathBuf;
use std::time::Duration;

/// Complete configuration for reportchart
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// HTTP server configuration
    pub server: ServerConfig,
    /// Series store configuration
    pub storage: StorageConfig,
    /// Report poller configuration
    pub poller: PollerConfig,
    /// Ignore list configuration
    pub ignore: IgnoreConfig,
    /// Logging configuration
    pub logging: LoggingConfig,
    /// Debug mode
    #[serde(skip)]
    pub debug: bool,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Bind address for the chart API
    pub bind_address: IpAddr,
    /// Port for the chart API
    pub port: u16,
    /// Directory served for every path the API does not route
    pub static_dir: PathBuf,
    /// Enable permissive CORS headers
    pub enable_cors: bool,
}

/// Series store configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Database file holding every series
    pub db_file: PathBuf,
    /// Wipe all stored series when the application starts
    pub clear_on_start: bool,
}

/// Report poller configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PollerConfig {
    /// URL of the report endpoint
    pub url: Option<String>,
    /// Time between two polls
    #[serde(with = "humantime_serde")]
    pub interval: Duration,
    /// Per-request timeout
    #[serde(with = "humantime_serde")]
    pub request_timeout: Duration,
    /// Disable to only serve already stored data
    pub enabled: bool,
}

/// Ignore list configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IgnoreConfig {
    /// JSON file holding an array of names to skip
    pub file: PathBuf,
    /// Fail startup when the file is missing
    pub required: bool,
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Log level
    pub level: LogLevel,
}

/// Log levels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig::default(),
            storage: StorageConfig::default(),
            poller: PollerConfig::default(),
            ignore: IgnoreConfig::default(),
            logging: LoggingConfig::default(),
            debug: false,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        ServerConfig {
            bind_address: IpAddr::from([0, 0, 0, 0]),
            port: 9000,
            static_dir: PathBuf::from("static"),
            enable_cors: true,
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig {
            db_file: PathBuf::from("report.db"),
            clear_on_start: false,
        }
    }
}

impl Default for PollerConfig {
    fn default() -> Self {
        PollerConfig {
            url: None,
            interval: Duration::from_secs(10),
            request_timeout: Duration::from_secs(5),
            enabled: true,
        }
    }
}

impl Default for IgnoreConfig {
    fn default() -> Self {
        IgnoreConfig {
            file: PathBuf::from("./ignore.json"),
            required: false,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: LogLevel::Info,
        }
    }
}

impl Config {
    /// Create new config with defaults
    pub fn new() -> Result<Self> {
        let config = Config::default();
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.server.port == 0 {
            return Err(ReportError::config("server port must be greater than 0"));
        }

        if self.storage.db_file.as_os_str().is_empty() {
            return Err(ReportError::config("db_file must not be empty"));
        }

        if self.poller.interval.is_zero() {
            return Err(ReportError::config("poll interval must be greater than 0"));
        }

        if self.poller.request_timeout.is_zero() {
            return Err(ReportError::config("request timeout must be greater than 0"));
        }

        if self.poller.enabled {
            let url = self.poller.url.as_deref().unwrap_or_default();
            if url.is_empty() {
                return Err(ReportError::config(
                    "a report url is required unless view-only mode is enabled",
                ));
            }
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(ReportError::config(format!(
                    "report url must use http or https, got '{}'",
                    url
                )));
            }
        }

        Ok(())
    }

    /// Effective log level, with debug mode taking precedence
    pub fn log_level(&self) -> LogLevel {
        if self.debug {
            LogLevel::Debug
        } else {
            self.logging.level
        }
    }
}

impl LogLevel {
    /// Convert to tracing filter string
    pub fn as_str(&self) -> &'static str {
        match self {
            LogLevel::Trace => "trace",
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Warn => "warn",
            LogLevel::Error => "error",
        }
    }
}

/// Configuration builder for programmatic construction
pub struct ConfigBuilder {
    config: Config,
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigBuilder {
    /// Create a new builder with defaults
    pub fn new() -> Self {
        ConfigBuilder {
            config: Config::default(),
        }
    }

    /// Load configuration from YAML string
    pub fn from_yaml(mut self, yaml: &str) -> Result<Self> {
        self.config = serde_yaml::from_str(yaml)
            .map_err(|e| ReportError::config(format!("Failed to parse YAML config: {}", e)))?;
        Ok(self)
    }

    /// Set report URL
    pub fn url(mut self, url: impl Into<String>) -> Self {
        self.config.poller.url = Some(url.into());
        self
    }

    /// Set poll interval
    pub fn interval(mut self, interval: Duration) -> Self {
        self.config.poller.interval = interval;
        self
    }

    /// Disable polling and only serve stored data
    pub fn view_only(mut self, view_only: bool) -> Self {
        self.config.poller.enabled = !view_only;
        self
    }

    /// Set database file
    pub fn db_file(mut self, path: PathBuf) -> Self {
        self.config.storage.db_file = path;
        self
    }

    /// Clear stored series on startup
    pub fn clear_on_start(mut self, clear: bool) -> Self {
        self.config.storage.clear_on_start = clear;
        self
    }

    /// Set HTTP port
    pub fn port(mut self, port: u16) -> Self {
        self.config.server.port = port;
        self
    }

    /// Set ignore list file
    pub fn ignore_file(mut self, path: PathBuf) -> Self {
        self.config.ignore.file = path;
        self
    }

    /// Set debug mode
    pub fn debug(mut self, debug: bool) -> Self {
        self.config.debug = debug;
        self
    }

    /// Build and validate the configuration
    pub fn build(self) -> Result<Config> {
        self.config.validate()?;
        Ok(self.config)
    }
}
