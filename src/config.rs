//! Configuration file support for labeldesk.
//!
//! Settings are stored as versioned JSON. Every field has a default, so a
//! partial file (or none at all) is valid. The backend URL and token can be
//! overridden from the environment.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::constants::{jobs, lease};
use crate::error::ConfigError;
use crate::keybindings::KeyBindings;

/// Current configuration file format version.
/// Increment this when making breaking changes to the config format.
pub const CONFIG_VERSION: u32 = 1;

/// Environment variable overriding `api.base_url`.
pub const ENV_API_URL: &str = "LABELDESK_API_URL";
/// Environment variable holding the bearer token.
pub const ENV_TOKEN: &str = "LABELDESK_TOKEN";

/// Log level setting for the application.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    /// Show only errors
    Error,
    /// Show errors and warnings
    Warn,
    /// Show errors, warnings, and info messages
    #[default]
    Info,
    /// Show debug-level logging
    Debug,
    /// Show all log messages including trace
    Trace,
}

impl LogLevel {
    /// Convert to log crate's LevelFilter.
    pub fn to_level_filter(&self) -> log::LevelFilter {
        match self {
            LogLevel::Error => log::LevelFilter::Error,
            LogLevel::Warn => log::LevelFilter::Warn,
            LogLevel::Info => log::LevelFilter::Info,
            LogLevel::Debug => log::LevelFilter::Debug,
            LogLevel::Trace => log::LevelFilter::Trace,
        }
    }
}

/// Backend connection section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ApiConfig {
    /// HTTP base URL of the backend
    pub base_url: String,
    /// WebSocket base URL; derived from `base_url` when absent
    pub ws_url: Option<String>,
    /// Identity sent with lock requests
    pub owner: String,
    /// Bearer token; normally supplied through the environment instead
    #[serde(skip_serializing)]
    pub token: Option<String>,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            ws_url: None,
            owner: "labeldesk".to_string(),
            token: None,
        }
    }
}

/// Edit lock section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LockConfig {
    /// Requested lease length; clamped to 30..=3600 when sent
    pub ttl_seconds: u32,
    /// Renew this long before expiry (never later than halfway)
    pub renew_lead_seconds: u32,
}

impl Default for LockConfig {
    fn default() -> Self {
        Self {
            ttl_seconds: lease::DEFAULT_TTL_SECONDS,
            renew_lead_seconds: lease::DEFAULT_RENEW_LEAD_SECONDS,
        }
    }
}

impl LockConfig {
    pub fn renew_lead(&self) -> Duration {
        Duration::from_secs(u64::from(self.renew_lead_seconds))
    }
}

/// Job monitoring section.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JobsConfig {
    /// Status poll interval when push is unavailable
    pub poll_interval_ms: u64,
    /// Try the WebSocket channel before polling
    pub prefer_push: bool,
    /// Live metrics poll interval
    pub metrics_interval_ms: u64,
    /// Rows requested from the live metrics tail
    pub metrics_rows: u32,
}

impl Default for JobsConfig {
    fn default() -> Self {
        Self {
            poll_interval_ms: jobs::POLL_INTERVAL_MS,
            prefer_push: true,
            metrics_interval_ms: jobs::METRICS_INTERVAL_MS,
            metrics_rows: jobs::METRICS_ROWS,
        }
    }
}

impl JobsConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    pub fn metrics_interval(&self) -> Duration {
        Duration::from_millis(self.metrics_interval_ms)
    }
}

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EditorConfig {
    /// Version of the configuration file format
    pub version: u32,
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub lock: LockConfig,
    #[serde(default)]
    pub jobs: JobsConfig,
    #[serde(default)]
    pub keybindings: KeyBindings,
    /// Log verbosity level
    #[serde(default)]
    pub log_level: LogLevel,
}

impl Default for EditorConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl EditorConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self {
            version: CONFIG_VERSION,
            api: ApiConfig::default(),
            lock: LockConfig::default(),
            jobs: JobsConfig::default(),
            keybindings: KeyBindings::default(),
            log_level: LogLevel::default(),
        }
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    /// Deserialize configuration from JSON.
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;

        if config.version != CONFIG_VERSION {
            return Err(ConfigError::UnsupportedVersion {
                file_version: config.version,
                supported_version: CONFIG_VERSION,
            });
        }
        config.validate()?;

        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Invalid {
                key: "api.base_url",
                message: "must not be empty".to_string(),
            });
        }
        if self.jobs.poll_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                key: "jobs.poll_interval_ms",
                message: "must be positive".to_string(),
            });
        }
        Ok(())
    }

    /// Apply environment overrides through `lookup` (normally `std::env::var`).
    pub fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(url) = lookup(ENV_API_URL).filter(|u| !u.trim().is_empty()) {
            log::debug!("Using {} from environment", ENV_API_URL);
            self.api.base_url = url;
        }
        if let Some(token) = lookup(ENV_TOKEN).filter(|t| !t.trim().is_empty()) {
            self.api.token = Some(token);
        }
    }

    /// Build the backend session described by this configuration.
    pub fn session(&self) -> labeldesk_api::Session {
        let mut session = labeldesk_api::Session::new(&self.api.base_url, &self.api.owner);
        if let Some(ws_url) = &self.api.ws_url {
            session = session.with_ws_url(ws_url);
        }
        if let Some(token) = &self.api.token {
            session = session.with_token(token);
        }
        session
    }

    /// Get the default filename for the config file.
    pub fn default_filename() -> &'static str {
        "labeldesk.json"
    }

    /// Get the default config file path.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn default_path() -> Option<std::path::PathBuf> {
        if let Some(config_dir) = dirs::config_dir() {
            Some(config_dir.join("labeldesk").join(Self::default_filename()))
        } else {
            dirs::home_dir().map(|home_dir| {
                home_dir
                    .join(".config")
                    .join("labeldesk")
                    .join(Self::default_filename())
            })
        }
    }

    /// Load configuration from `path`.
    pub fn load(path: &std::path::Path) -> Result<Self, ConfigError> {
        let json = std::fs::read_to_string(path)?;
        let config = Self::from_json(&json)?;
        log::info!("Loaded configuration from {:?}", path);
        Ok(config)
    }

    /// Try to load configuration from the default path.
    /// Falls back to defaults if the file doesn't exist or can't be read.
    #[cfg(not(target_arch = "wasm32"))]
    pub fn load_or_default() -> Self {
        let Some(path) = Self::default_path() else {
            return Self::new();
        };
        if !path.exists() {
            log::debug!("No config file found at {:?}", path);
            return Self::new();
        }
        match Self::load(&path) {
            Ok(config) => config,
            Err(e) => {
                log::warn!("Failed to load config file {:?}: {}", path, e);
                Self::new()
            }
        }
    }
}
