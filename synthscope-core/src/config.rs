//! Configuration loading and management
//!
//! Configuration is loaded from `~/.config/synthscope/config.toml`
//!
//! This module follows the XDG Base Directory Specification:
//! - Config: `$XDG_CONFIG_HOME/synthscope/` (~/.config/synthscope/)
//! - State/Logs: `$XDG_STATE_HOME/synthscope/` (~/.local/state/synthscope/)

use crate::error::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Largest buffer a monitor may be configured with
pub const MAX_CAPACITY: usize = 1000;

/// Returns a best-effort home directory path.
fn home_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(PathBuf::from)
        .or_else(dirs::home_dir)
        .unwrap_or_else(|| PathBuf::from("."))
}

/// Returns XDG_CONFIG_HOME or ~/.config
fn xdg_config_home() -> PathBuf {
    std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".config"))
}

/// Returns XDG_STATE_HOME or ~/.local/state
fn xdg_state_home() -> PathBuf {
    std::env::var("XDG_STATE_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| home_dir().join(".local/state"))
}

/// Main configuration struct
#[derive(Debug, Deserialize, Default, Clone)]
pub struct Config {
    /// Activity log configuration
    #[serde(default)]
    pub monitor: MonitorConfig,

    /// Backend health polling configuration
    #[serde(default)]
    pub status: StatusConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Activity log configuration
#[derive(Debug, Deserialize, Clone)]
pub struct MonitorConfig {
    /// Maximum number of records kept in the activity buffer
    #[serde(default = "default_capacity")]
    pub capacity: usize,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            capacity: default_capacity(),
        }
    }
}

fn default_capacity() -> usize {
    50
}

/// Backend health polling configuration
///
/// When `base_url` is unset the poller is never started and the monitor
/// reports the default (unknown) status.
#[derive(Debug, Deserialize, Clone)]
pub struct StatusConfig {
    /// Backend base URL; the probe hits `<base_url>/health`
    pub base_url: Option<String>,

    /// Seconds between probes
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,

    /// HTTP request timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Number of backend agents reported as operational when the
    /// backend says its agents are active
    #[serde(default = "default_agents_total")]
    pub agents_total: u32,
}

impl Default for StatusConfig {
    fn default() -> Self {
        Self {
            base_url: None,
            interval_secs: default_interval_secs(),
            timeout_secs: default_timeout_secs(),
            agents_total: default_agents_total(),
        }
    }
}

impl StatusConfig {
    /// Check if polling is configured
    pub fn is_ready(&self) -> bool {
        self.base_url.is_some()
    }

    /// Interval between probes
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    /// Per-request timeout
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

fn default_interval_secs() -> u64 {
    30
}

fn default_timeout_secs() -> u64 {
    5
}

fn default_agents_total() -> u32 {
    5
}

/// Logging configuration
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Config {
    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path();

        if !config_path.exists() {
            tracing::info!("No config file found at {:?}, using defaults", config_path);
            return Ok(Config::default());
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("failed to read config file {:?}: {}", path, e)))?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| Error::Config(format!("failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Validate configuration, returning an error message if invalid
    pub fn validate(&self) -> Result<()> {
        if self.monitor.capacity == 0 || self.monitor.capacity > MAX_CAPACITY {
            return Err(Error::Config(format!(
                "monitor.capacity must be between 1 and {}",
                MAX_CAPACITY
            )));
        }
        if self.status.interval_secs == 0 {
            return Err(Error::Config(
                "status.interval_secs must be at least 1".to_string(),
            ));
        }
        if self.status.timeout_secs == 0 {
            return Err(Error::Config(
                "status.timeout_secs must be at least 1".to_string(),
            ));
        }
        if let Some(url) = &self.status.base_url {
            if !(url.starts_with("http://") || url.starts_with("https://")) {
                return Err(Error::Config(format!(
                    "status.base_url must be an http(s) URL, got {:?}",
                    url
                )));
            }
        }
        Ok(())
    }

    /// Returns the default config file path
    ///
    /// `$XDG_CONFIG_HOME/synthscope/config.toml` (~/.config/synthscope/config.toml)
    pub fn config_path() -> PathBuf {
        xdg_config_home().join("synthscope").join("config.toml")
    }

    /// Returns the state directory path (for logs)
    ///
    /// `$XDG_STATE_HOME/synthscope/` (~/.local/state/synthscope/)
    pub fn state_dir() -> PathBuf {
        xdg_state_home().join("synthscope")
    }

    /// Returns the log file path
    ///
    /// `$XDG_STATE_HOME/synthscope/synthscope.log` (~/.local/state/synthscope/synthscope.log)
    pub fn log_path() -> PathBuf {
        Self::state_dir().join("synthscope.log")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.monitor.capacity, 50);
        assert_eq!(config.status.interval_secs, 30);
        assert_eq!(config.status.agents_total, 5);
        assert!(!config.status.is_ready());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_parse_config() {
        let toml = r#"
[monitor]
capacity = 100

[status]
base_url = "http://localhost:8000"
interval_secs = 10

[logging]
level = "debug"
"#;
        let config: Config = toml::from_str(toml).unwrap();

        assert_eq!(config.monitor.capacity, 100);
        assert_eq!(
            config.status.base_url.as_deref(),
            Some("http://localhost:8000")
        );
        assert_eq!(config.status.interval(), Duration::from_secs(10));
        assert_eq!(config.status.timeout_secs, 5);
        assert_eq!(config.logging.level, "debug");
        assert!(config.status.is_ready());
    }

    #[test]
    fn test_validation() {
        let mut config = Config::default();
        config.monitor.capacity = 0;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.monitor.capacity = MAX_CAPACITY + 1;
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.status.base_url = Some("localhost:8000".to_string());
        assert!(config.validate().is_err());

        let mut config = Config::default();
        config.status.interval_secs = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\ncapacity = 75").unwrap();

        let config = Config::load_from(file.path()).unwrap();
        assert_eq!(config.monitor.capacity, 75);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_load_from_rejects_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[monitor]\ncapacity = 0").unwrap();

        let err = Config::load_from(file.path()).unwrap_err();
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn test_paths() {
        assert!(Config::config_path().ends_with("synthscope/config.toml"));
        assert!(Config::log_path().ends_with("synthscope.log"));
    }
}
