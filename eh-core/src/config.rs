//! Client configuration management.
//!
//! Handles loading, saving, and validating the client configuration: the
//! API origin, bearer token, request timeout, retry policy and logging
//! settings. Configuration is persisted as TOML on disk.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::constants;
use crate::error::{EhError, EhResult};
use crate::platform;

/// Top-level client configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// API connection settings.
    #[serde(default)]
    pub api: ApiConfig,

    /// Retry policy applied to every request.
    #[serde(default)]
    pub retry: RetryConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// API connection configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiConfig {
    /// Origin every relative request path is joined to.
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// Bearer token obtained out-of-band (OAuth2 is not handled here).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Request timeout in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: f64,
}

/// Retry configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetryConfig {
    /// Maximum number of retries after the first attempt.
    #[serde(default = "default_retry_total")]
    pub total: u32,

    /// Exponential backoff factor in seconds.
    #[serde(default = "default_backoff_factor")]
    pub backoff_factor: f64,

    /// Cap for a single backoff sleep in seconds.
    #[serde(default = "default_backoff_max_secs")]
    pub backoff_max_secs: f64,

    /// Response statuses that trigger a retry.
    #[serde(default = "default_status_forcelist")]
    pub status_forcelist: Vec<u16>,

    /// Methods eligible for status and read retries.
    #[serde(default = "default_allowed_methods")]
    pub allowed_methods: Vec<String>,

    /// Retry when the connection cannot be established.
    #[serde(default = "default_true")]
    pub retry_connect: bool,

    /// Retry when reading the response fails or times out.
    #[serde(default)]
    pub retry_read: bool,

    /// Sleep for the server's `Retry-After` instead of the backoff.
    #[serde(default = "default_true")]
    pub respect_retry_after: bool,
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: trace, debug, info, warn, error.
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Directory for log files. If empty, uses default location.
    #[serde(default)]
    pub directory: String,

    /// Enable JSON structured logging output.
    #[serde(default)]
    pub json_output: bool,
}

// Default value functions for serde

fn default_base_url() -> String {
    constants::DEFAULT_BASE_URL.to_string()
}

fn default_timeout_secs() -> f64 {
    constants::DEFAULT_TIMEOUT_SECS
}

fn default_retry_total() -> u32 {
    constants::retry::TOTAL
}

fn default_backoff_factor() -> f64 {
    constants::retry::BACKOFF_FACTOR
}

fn default_backoff_max_secs() -> f64 {
    constants::retry::BACKOFF_MAX_SECS
}

fn default_status_forcelist() -> Vec<u16> {
    constants::retry::STATUS_FORCELIST.to_vec()
}

fn default_allowed_methods() -> Vec<String> {
    constants::retry::ALLOWED_METHODS
        .iter()
        .map(|m| m.to_string())
        .collect()
}

fn default_true() -> bool {
    true
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            auth_token: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            total: default_retry_total(),
            backoff_factor: default_backoff_factor(),
            backoff_max_secs: default_backoff_max_secs(),
            status_forcelist: default_status_forcelist(),
            allowed_methods: default_allowed_methods(),
            retry_connect: true,
            retry_read: false,
            respect_retry_after: true,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            directory: String::new(),
            json_output: false,
        }
    }
}

impl ApiConfig {
    /// Connection settings for the default origin with the given token.
    pub fn with_token(auth_token: Option<String>) -> Self {
        Self {
            auth_token,
            ..Self::default()
        }
    }
}

impl AppConfig {
    /// Load configuration from `path`, or the defaults when it does not exist.
    pub fn load_or_default(path: &Path) -> EhResult<Self> {
        if path.exists() {
            Self::load_from_file(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Load configuration from a specific file path.
    pub fn load_from_file(path: &Path) -> EhResult<Self> {
        let contents = std::fs::read_to_string(path)?;
        let config: AppConfig = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Save configuration to a specific file path.
    pub fn save_to_file(&self, path: &Path) -> EhResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let contents = toml::to_string_pretty(self)
            .map_err(|e| EhError::Config(format!("failed to serialize config: {e}")))?;
        std::fs::write(path, contents)?;
        Ok(())
    }

    /// Get the default configuration file path.
    pub fn default_config_path() -> EhResult<PathBuf> {
        let config_dir = platform::config_dir()?;
        Ok(config_dir.join("config.toml"))
    }

    /// Get the effective log directory, using the configured path or the default.
    pub fn effective_log_dir(&self) -> EhResult<PathBuf> {
        if self.logging.directory.is_empty() {
            let data_dir = platform::data_dir()?;
            Ok(data_dir.join("logs"))
        } else {
            Ok(PathBuf::from(&self.logging.directory))
        }
    }

    /// Apply `EVERHOME_TOKEN` and `EVERHOME_BASE_URL` from the environment.
    pub fn apply_env_overrides(&mut self) {
        self.apply_overrides(
            std::env::var(constants::ENV_TOKEN).ok(),
            std::env::var(constants::ENV_BASE_URL).ok(),
        );
    }

    /// Apply explicit token and base URL overrides; empty values are ignored.
    pub fn apply_overrides(&mut self, token: Option<String>, base_url: Option<String>) {
        if let Some(token) = token.filter(|t| !t.trim().is_empty()) {
            self.api.auth_token = Some(token.trim().to_string());
        }
        if let Some(url) = base_url.filter(|u| !u.trim().is_empty()) {
            self.api.base_url = Self::sanitize_base_url(&url);
        }
    }

    /// Check whether a bearer token is configured.
    pub fn has_token(&self) -> bool {
        self.api
            .auth_token
            .as_deref()
            .is_some_and(|t| !t.is_empty())
    }

    /// Reject values the client cannot work with.
    pub fn validate(&self) -> EhResult<()> {
        if self.api.base_url.trim().is_empty() {
            return Err(EhError::MissingConfig("api.base_url".into()));
        }
        if !self.api.base_url.contains("://") {
            return Err(EhError::Config(format!(
                "api.base_url must include a scheme: {}",
                self.api.base_url
            )));
        }
        if !(self.api.timeout_secs.is_finite() && self.api.timeout_secs > 0.0) {
            return Err(EhError::Config(format!(
                "api.timeout_secs must be positive, got {}",
                self.api.timeout_secs
            )));
        }
        if !(self.retry.backoff_factor.is_finite() && self.retry.backoff_factor >= 0.0) {
            return Err(EhError::Config(format!(
                "retry.backoff_factor must not be negative, got {}",
                self.retry.backoff_factor
            )));
        }
        if !(self.retry.backoff_max_secs.is_finite() && self.retry.backoff_max_secs >= 0.0) {
            return Err(EhError::Config(format!(
                "retry.backoff_max_secs must not be negative, got {}",
                self.retry.backoff_max_secs
            )));
        }
        Ok(())
    }

    /// Sanitize and normalize a base URL.
    ///
    /// Strips whitespace and quotes, defaults the scheme to https and
    /// leaves exactly one trailing slash.
    pub fn sanitize_base_url(address: &str) -> String {
        let trimmed = address.trim().trim_matches('"').trim();
        if trimmed.is_empty() {
            return String::new();
        }

        let with_scheme = if trimmed.contains("://") {
            trimmed.to_string()
        } else {
            format!("https://{trimmed}")
        };

        format!("{}/", with_scheme.trim_end_matches('/'))
    }
}
