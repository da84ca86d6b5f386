/// Service configuration
///
/// Loaded from a TOML file whose path comes from the command line or the
/// `RAINALARM_CONFIG` environment variable (a `.env` file is honored).
/// Every key has a default, so a partial file only overrides what it names:
///
/// ```toml
/// [server]
/// port = 8095
///
/// [mqtt]
/// host = "localhost"
/// port = 1883
/// topic = "inf/rainAlarm"
///
/// [location]
/// uri = "/deutschland/niederkruechten/kapelle/DE3205889.html#niederschlag"
///
/// [poll]
/// interval_secs = 60
///
/// [logging]
/// level = "INFO"
/// ```

use serde::Deserialize;
use std::fmt;
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::ingest::wetter::WETTER_BASE_URL;
use crate::logging::LogLevel;

/// Environment variable naming the config file when none is given on the
/// command line.
pub const CONFIG_ENV_VAR: &str = "RAINALARM_CONFIG";

// ---------------------------------------------------------------------------
// Sections
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServerConfig {
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: 8095 }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct MqttConfig {
    pub host: String,
    pub port: u16,
    pub topic: String,
    pub client_id: String,
}

impl Default for MqttConfig {
    fn default() -> Self {
        Self {
            host: "localhost".to_string(),
            port: 1883,
            topic: "inf/rainAlarm".to_string(),
            client_id: "rainalarm".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LocationConfig {
    pub base_url: String,
    pub uri: String,
}

impl Default for LocationConfig {
    fn default() -> Self {
        Self {
            base_url: WETTER_BASE_URL.to_string(),
            uri: "/deutschland/niederkruechten/kapelle/DE3205889.html#niederschlag".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct PollConfig {
    pub interval_secs: u64,
    pub request_timeout_secs: u64,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval_secs: 60,
            request_timeout_secs: 30,
        }
    }
}

#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    pub console_timestamps: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: None,
            console_timestamps: true,
        }
    }
}

// ---------------------------------------------------------------------------
// Top level
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct ServiceConfig {
    pub server: ServerConfig,
    pub mqtt: MqttConfig,
    pub location: LocationConfig,
    pub poll: PollConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io(msg) => write!(f, "could not read config file: {}", msg),
            ConfigError::Parse(msg) => write!(f, "could not parse config file: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid configuration: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl ServiceConfig {
    /// Loads and validates a TOML config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: ServiceConfig =
            toml::from_str(text).map_err(|e| ConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.log_level().is_none() {
            return Err(ConfigError::Invalid(format!(
                "unknown logging level '{}'",
                self.logging.level
            )));
        }
        if self.poll.interval_secs == 0 {
            return Err(ConfigError::Invalid("poll.interval_secs must be positive".to_string()));
        }
        if self.location.uri.trim().is_empty() {
            return Err(ConfigError::Invalid("location.uri must not be empty".to_string()));
        }
        if self.mqtt.topic.trim().is_empty() {
            return Err(ConfigError::Invalid("mqtt.topic must not be empty".to_string()));
        }
        Ok(())
    }

    pub fn log_level(&self) -> Option<LogLevel> {
        LogLevel::from_name(&self.logging.level)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_secs(self.poll.interval_secs)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.poll.request_timeout_secs)
    }
}
