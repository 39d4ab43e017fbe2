//! Command-line interface for reportchart.
//!
//! Point it at a report endpoint and open the dashboard:
//! `reportchart -u http://127.0.0.1:8080/report`

use crate::core::{Config, ConfigBuilder, ReportError, Result};
use crate::Application;
use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

/// Poll a metrics report endpoint and chart every reported name over time.
#[derive(Parser, Debug)]
#[command(name = "reportchart")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// URL to fetch the report from
    #[arg(short = 'u', long, env = "REPORTCHART_URL")]
    pub url: Option<String>,

    /// Time between two polls, e.g. 10s or 1m
    #[arg(short = 'd', long, env = "REPORTCHART_INTERVAL", value_parser = humantime::parse_duration)]
    pub interval: Option<Duration>,

    /// Database file storing every series
    #[arg(short = 'f', long, env = "REPORTCHART_DB_FILE")]
    pub db_file: Option<PathBuf>,

    /// Port for the chart API and dashboard
    #[arg(short = 'p', long, env = "REPORTCHART_PORT")]
    pub port: Option<u16>,

    /// JSON file listing names to ignore
    #[arg(long, env = "REPORTCHART_IGNORE")]
    pub ignore: Option<PathBuf>,

    /// Clear previously stored series on startup
    #[arg(short = 'c', long)]
    pub clear: bool,

    /// Only serve stored data, do not poll
    #[arg(short = 'v', long)]
    pub view_only: bool,

    /// Configuration file path (default: ~/.config/reportchart/config.yaml)
    #[arg(long, env = "REPORTCHART_CONFIG")]
    pub config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(long, env = "REPORTCHART_DEBUG")]
    pub debug: bool,

    /// Validate configuration and exit
    #[arg(long)]
    pub check_config: bool,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Cli::parse()
    }

    /// Load configuration with proper precedence:
    /// 1. CLI arguments and environment variables (highest priority)
    /// 2. Config file
    /// 3. Defaults (lowest priority)
    pub async fn load_config(&self) -> Result<Config> {
        let mut builder = ConfigBuilder::new();

        if let Some(path) = self.config_path() {
            match tokio::fs::read_to_string(&path).await {
                Ok(content) => {
                    builder = builder.from_yaml(&content)?;
                },
                Err(e) => {
                    return Err(ReportError::config(format!(
                        "Failed to read config file {:?}: {}",
                        path, e
                    )));
                },
            }
        }

        self.apply_overrides(builder).build()
    }

    /// Config file to read: `--config`, or the default location when it exists.
    pub fn config_path(&self) -> Option<PathBuf> {
        match &self.config {
            Some(path) => Some(path.clone()),
            None => dirs::config_dir()
                .map(|d| d.join("reportchart").join("config.yaml"))
                .filter(|p| p.exists()),
        }
    }

    fn apply_overrides(&self, mut builder: ConfigBuilder) -> ConfigBuilder {
        if let Some(url) = &self.url {
            builder = builder.url(url.clone());
        }
        if let Some(interval) = self.interval {
            builder = builder.interval(interval);
        }
        if let Some(path) = &self.db_file {
            builder = builder.db_file(path.clone());
        }
        if let Some(port) = self.port {
            builder = builder.port(port);
        }
        if let Some(path) = &self.ignore {
            builder = builder.ignore_file(path.clone());
        }
        if self.clear {
            builder = builder.clear_on_start(true);
        }
        if self.view_only {
            builder = builder.view_only(true);
        }

        builder.debug(self.debug)
    }

    /// Initialize logging from the loaded configuration.
    ///
    /// `RUST_LOG` wins over everything else; see [`log_filter`] for the rest.
    pub fn init_logging(&self, config: &Config) -> Result<()> {
        use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

        let directive = log_filter(config, std::env::var("REPORTCHART_LOG_LEVEL").ok());
        let filter =
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&directive));

        let fmt_layer = tracing_subscriber::fmt::layer()
            .with_target(config.debug)
            .compact();

        tracing_subscriber::registry()
            .with(filter)
            .with(fmt_layer)
            .try_init()
            .map_err(|e| ReportError::config(format!("Failed to initialize logging: {}", e)))?;

        Ok(())
    }
}

/// Filter directive used when `RUST_LOG` is unset.
///
/// Debug mode comes first, then `REPORTCHART_LOG_LEVEL`, then `logging.level`.
pub fn log_filter(config: &Config, env_level: Option<String>) -> String {
    if config.debug {
        return config.log_level().as_str().to_string();
    }
    env_level
        .filter(|level| !level.trim().is_empty())
        .unwrap_or_else(|| config.log_level().as_str().to_string())
}

/// Execute the reportchart application.
pub async fn execute(cli: Cli) -> Result<()> {
    let config = cli.load_config().await?;
    cli.init_logging(&config)?;

    if let Some(path) = cli.config_path() {
        tracing::info!("Loaded configuration from: {:?}", path);
    }
    tracing::debug!("Log filter: {}", config.log_level().as_str());

    if cli.check_config {
        println!("Configuration is valid!");
        println!("  Report URL: {}", config.poller.url.as_deref().unwrap_or("-"));
        println!("  Poll interval: {:?}", config.poller.interval);
        println!("  Database: {}", config.storage.db_file.display());
        println!("  Port: {}", config.server.port);
        return Ok(());
    }

    let app = Application::new(config)?;
    app.run().await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_flags() {
        let cli = Cli::try_parse_from([
            "reportchart",
            "-u",
            "http://127.0.0.1:8080/report",
            "-d",
            "30s",
            "-f",
            "metrics.db",
            "-p",
            "9100",
            "-c",
        ])
        .unwrap();

        assert_eq!(cli.url.as_deref(), Some("http://127.0.0.1:8080/report"));
        assert_eq!(cli.interval, Some(Duration::from_secs(30)));
        assert_eq!(cli.db_file, Some(PathBuf::from("metrics.db")));
        assert_eq!(cli.port, Some(9100));
        assert!(cli.clear);
        assert!(!cli.view_only);
    }

    #[test]
    fn test_invalid_interval() {
        let result = Cli::try_parse_from(["reportchart", "-d", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_overrides_reach_config() {
        let cli = Cli::try_parse_from([
            "reportchart",
            "--url",
            "http://gateway:8080/report",
            "--interval",
            "1m",
            "--view-only",
        ])
        .unwrap();

        let config = cli.apply_overrides(ConfigBuilder::new()).build().unwrap();
        assert_eq!(config.poller.url.as_deref(), Some("http://gateway:8080/report"));
        assert_eq!(config.poller.interval, Duration::from_secs(60));
        assert!(!config.poller.enabled);
    }

    #[test]
    fn test_configured_level_reaches_filter() {
        let config = ConfigBuilder::new()
            .from_yaml("poller:\n  enabled: false\nlogging:\n  level: warn\n")
            .unwrap()
            .build()
            .unwrap();

        assert_eq!(log_filter(&config, None), "warn");
        assert_eq!(log_filter(&config, Some(String::new())), "warn");
        assert_eq!(log_filter(&config, Some("error".to_string())), "error");
    }

    #[test]
    fn test_debug_flag_wins_over_configured_level() {
        let cli = Cli::try_parse_from(["reportchart", "--view-only", "--debug"]).unwrap();
        let builder = ConfigBuilder::new()
            .from_yaml("logging:\n  level: error\n")
            .unwrap();
        let config = cli.apply_overrides(builder).build().unwrap();

        assert_eq!(log_filter(&config, Some("warn".to_string())), "debug");
    }

    #[test]
    fn test_missing_url_fails_validation() {
        let cli = Cli::try_parse_from(["reportchart"]).unwrap();
        assert!(cli.apply_overrides(ConfigBuilder::new()).build().is_err());
    }
}
