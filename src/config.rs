//! Configuration System
//!
//! Handles loading configuration from files and environment variables.
//! Supports TOML config files and environment variable overrides.

use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::session::Session;

/// Main configuration structure
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub gateway: GatewayConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub reminder: ReminderConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Remote gateway configuration
#[derive(Debug, Clone, Deserialize)]
pub struct GatewayConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,

    #[serde(default = "default_request_timeout")]
    pub request_timeout_secs: u64,
}

fn default_base_url() -> String {
    "http://127.0.0.1:8000".to_string()
}

fn default_request_timeout() -> u64 {
    10
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            request_timeout_secs: default_request_timeout(),
        }
    }
}

/// The user being tracked and their goal
#[derive(Debug, Clone, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_user_id")]
    pub user_id: u64,

    #[serde(default = "default_daily_goal")]
    pub daily_goal_liters: f64,
}

fn default_user_id() -> u64 {
    2
}

fn default_daily_goal() -> f64 {
    7.0
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            user_id: default_user_id(),
            daily_goal_liters: default_daily_goal(),
        }
    }
}

/// Drink reminder configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ReminderConfig {
    #[serde(default = "default_reminder_enabled")]
    pub enabled: bool,

    /// How often the reminder check runs
    #[serde(default = "default_check_interval")]
    pub check_interval_secs: u64,

    /// How long without a drink before a reminder is due
    #[serde(default = "default_threshold")]
    pub threshold_secs: u64,
}

fn default_reminder_enabled() -> bool {
    true
}

fn default_check_interval() -> u64 {
    3600 // 1 hour
}

fn default_threshold() -> u64 {
    3600
}

/// Longest accepted reminder interval or threshold: one year
pub const MAX_REMINDER_SECS: u64 = 365 * 24 * 3600;

impl Default for ReminderConfig {
    fn default() -> Self {
        Self {
            enabled: default_reminder_enabled(),
            check_interval_secs: default_check_interval(),
            threshold_secs: default_threshold(),
        }
    }
}

impl ReminderConfig {
    /// Capped at [`MAX_REMINDER_SECS`]
    pub fn check_interval(&self) -> Duration {
        Duration::from_secs(self.check_interval_secs.min(MAX_REMINDER_SECS))
    }

    /// Capped at [`MAX_REMINDER_SECS`], so never negative
    pub fn threshold(&self) -> chrono::Duration {
        let secs = i64::try_from(self.threshold_secs.min(MAX_REMINDER_SECS)).unwrap_or(i64::MAX);
        chrono::Duration::try_seconds(secs).unwrap_or_else(|| chrono::Duration::days(365))
    }
}

/// Logging configuration
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,

    #[serde(default = "default_log_format")]
    pub format: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl Config {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        let config: Config = toml::from_str(&content).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            error: e.to_string(),
        })?;

        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env() -> Self {
        let mut config = Config::default();
        config.apply_env_overrides();
        config
    }

    /// Load configuration with environment variable overrides
    pub fn load_with_env(path: &Path) -> Result<Self, ConfigError> {
        let mut config = Self::load(path)?;
        config.apply_env_overrides();
        Ok(config)
    }

    /// Load from default locations or environment
    pub fn load_default() -> Self {
        let config_paths = [
            dirs::config_dir().map(|p| p.join("wellspring").join("config.toml")),
            Some(PathBuf::from("./wellspring.toml")),
        ];

        for path_opt in config_paths.iter().flatten() {
            if path_opt.exists() {
                match Self::load_with_env(path_opt) {
                    Ok(config) => {
                        tracing::info!("Loaded config from {:?}", path_opt);
                        return config;
                    }
                    Err(e) => {
                        tracing::warn!("Failed to load config from {:?}: {}", path_opt, e);
                    }
                }
            }
        }

        tracing::info!("Using default config with environment overrides");
        Self::from_env()
    }

    /// Apply environment variable overrides to an existing config
    fn apply_env_overrides(&mut self) {
        if let Ok(url) = std::env::var("WELLSPRING_GATEWAY_URL") {
            self.gateway.base_url = url;
        }

        if let Ok(user) = std::env::var("WELLSPRING_USER_ID") {
            if let Ok(id) = user.parse() {
                self.session.user_id = id;
            }
        }
        if let Ok(goal) = std::env::var("WELLSPRING_DAILY_GOAL") {
            if let Ok(g) = goal.parse() {
                self.session.daily_goal_liters = g;
            }
        }

        if let Ok(interval) = std::env::var("WELLSPRING_REMINDER_INTERVAL_SECS") {
            if let Ok(secs) = interval.parse() {
                self.reminder.check_interval_secs = secs;
            }
        }

        if let Ok(level) = std::env::var("WELLSPRING_LOG_LEVEL") {
            self.logging.level = level;
        }
        if let Ok(format) = std::env::var("WELLSPRING_LOG_FORMAT") {
            self.logging.format = format;
        }
    }

    /// Reject values the core cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.gateway.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid("gateway.base_url is empty".to_string()));
        }
        if !self.session.daily_goal_liters.is_finite() || self.session.daily_goal_liters <= 0.0 {
            return Err(ConfigError::Invalid(format!(
                "session.daily_goal_liters must be positive, got {}",
                self.session.daily_goal_liters
            )));
        }
        check_reminder_secs("reminder.check_interval_secs", self.reminder.check_interval_secs)?;
        check_reminder_secs("reminder.threshold_secs", self.reminder.threshold_secs)?;
        Ok(())
    }

    /// Session context built from `[session]`
    pub fn session(&self) -> Result<Session, ConfigError> {
        Session::new(self.session.user_id, self.session.daily_goal_liters)
            .map_err(|e| ConfigError::Invalid(e.to_string()))
    }
}

fn check_reminder_secs(field: &str, secs: u64) -> Result<(), ConfigError> {
    if secs == 0 || secs > MAX_REMINDER_SECS {
        return Err(ConfigError::Invalid(format!(
            "{field} must be between 1 and {MAX_REMINDER_SECS}, got {secs}"
        )));
    }
    Ok(())
}

/// Configuration errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path:?}: {error}")]
    Io { path: PathBuf, error: String },

    #[error("Failed to parse config file {path:?}: {error}")]
    Parse { path: PathBuf, error: String },

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Generate a default config file content
pub fn generate_default_config() -> String {
    r#"# Wellspring Configuration
#
# Environment variables override these settings:
# - WELLSPRING_GATEWAY_URL
# - WELLSPRING_USER_ID
# - WELLSPRING_DAILY_GOAL
# - WELLSPRING_REMINDER_INTERVAL_SECS
# - WELLSPRING_LOG_LEVEL
# - WELLSPRING_LOG_FORMAT

[gateway]
# Base URL of the wellness API
base_url = "http://127.0.0.1:8000"

# Request timeout in seconds
request_timeout_secs = 10

[session]
# User whose logs are tracked
user_id = 2

# Daily hydration goal (liters)
daily_goal_liters = 7.0

[reminder]
# Run the periodic drink reminder
enabled = true

# How often to check (seconds)
check_interval_secs = 3600

# Time without a drink before reminding (seconds)
threshold_secs = 3600

[logging]
# Log level: trace, debug, info, warn, error
level = "info"

# Log format: pretty (for development) or json (for production)
format = "pretty"
"#
    .to_string()
}
