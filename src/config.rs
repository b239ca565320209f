//! Configuration for the motion window collector.

use crate::core::sampler::DEFAULT_SAMPLING_PERIOD;
use crate::core::state::StartPolicy;
use crate::core::windowing::WINDOW_CAPACITY;
use crate::session::SessionSettings;
use crate::upload::request::{RequestTemplate, DEFAULT_PLATFORM, DEFAULT_SITUATION};
use crate::upload::transport::DEFAULT_ENDPOINT;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Main configuration for the collector.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Minimum spacing between recorded samples
    #[serde(with = "millis_serde")]
    pub sampling_period: Duration,

    /// Samples per window
    pub window_capacity: usize,

    /// What `start` does with a full window that was never uploaded
    pub start_policy: StartPolicy,

    /// Collision-data endpoint (receives a PUT)
    pub endpoint: String,

    /// Situation label sent with every upload
    pub situation: String,

    /// Platform tag sent with every upload
    pub platform: String,

    /// IANA time zone for wire timestamps
    pub timezone: String,

    /// Upload request timeout
    #[serde(with = "secs_serde")]
    pub request_timeout: Duration,

    /// Path for storing collection statistics
    pub data_path: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        let data_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("motion-window-collector");

        Self {
            sampling_period: DEFAULT_SAMPLING_PERIOD,
            window_capacity: WINDOW_CAPACITY,
            start_policy: StartPolicy::default(),
            endpoint: DEFAULT_ENDPOINT.to_string(),
            situation: DEFAULT_SITUATION.to_string(),
            platform: DEFAULT_PLATFORM.to_string(),
            timezone: "UTC".to_string(),
            request_timeout: Duration::from_secs(10),
            data_path: data_dir,
        }
    }
}

impl Config {
    /// Load configuration from the default location.
    pub fn load() -> Result<Self, ConfigError> {
        let config_path = Self::config_path();

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)
                .map_err(|e| ConfigError::IoError(e.to_string()))?;
            let config: Config = serde_json::from_str(&content)
                .map_err(|e| ConfigError::ParseError(e.to_string()))?;
            Ok(config)
        } else {
            Ok(Self::default())
        }
    }

    /// Save configuration to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        let config_path = Self::config_path();

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| ConfigError::IoError(e.to_string()))?;
        }

        let content = serde_json::to_string_pretty(self)
            .map_err(|e| ConfigError::SerializeError(e.to_string()))?;

        std::fs::write(&config_path, content).map_err(|e| ConfigError::IoError(e.to_string()))?;

        Ok(())
    }

    /// Get the path to the configuration file.
    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("motion-window-collector")
            .join("config.json")
    }

    /// Path of the persisted collection statistics.
    pub fn stats_path(&self) -> PathBuf {
        self.data_path.join("stats.json")
    }

    /// Ensure all required directories exist.
    pub fn ensure_directories(&self) -> Result<(), ConfigError> {
        std::fs::create_dir_all(&self.data_path)
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Ok(())
    }

    /// Parse the configured time zone.
    pub fn timezone(&self) -> Result<Tz, ConfigError> {
        self.timezone
            .parse::<Tz>()
            .map_err(|e| ConfigError::Invalid(format!("timezone '{}': {e}", self.timezone)))
    }

    /// Reject values the session cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.window_capacity == 0 {
            return Err(ConfigError::Invalid(
                "window_capacity must be at least 1".to_string(),
            ));
        }
        if self.sampling_period.is_zero() {
            return Err(ConfigError::Invalid(
                "sampling_period must be positive".to_string(),
            ));
        }
        if self.endpoint.trim().is_empty() {
            return Err(ConfigError::Invalid("endpoint must not be empty".to_string()));
        }
        self.timezone()?;
        Ok(())
    }

    /// Validated settings for a collection session.
    pub fn session_settings(&self) -> Result<SessionSettings, ConfigError> {
        self.validate()?;
        Ok(SessionSettings {
            capacity: self.window_capacity,
            sampling_period: self.sampling_period,
            start_policy: self.start_policy,
            endpoint: self.endpoint.clone(),
            template: RequestTemplate {
                situation: self.situation.clone(),
                platform: self.platform.clone(),
                timezone: self.timezone()?,
            },
        })
    }
}

/// Configuration errors.
#[derive(Debug)]
pub enum ConfigError {
    IoError(String),
    ParseError(String),
    SerializeError(String),
    Invalid(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::IoError(e) => write!(f, "IO error: {e}"),
            ConfigError::ParseError(e) => write!(f, "Parse error: {e}"),
            ConfigError::SerializeError(e) => write!(f, "Serialize error: {e}"),
            ConfigError::Invalid(e) => write!(f, "Invalid configuration: {e}"),
        }
    }
}

impl std::error::Error for ConfigError {}

/// Serde support for Duration as whole milliseconds.
mod millis_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        (duration.as_millis() as u64).serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let millis = u64::deserialize(deserializer)?;
        Ok(Duration::from_millis(millis))
    }
}

/// Serde support for Duration as whole seconds.
mod secs_serde {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        duration.as_secs().serialize(serializer)
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        let secs = u64::deserialize(deserializer)?;
        Ok(Duration::from_secs(secs))
    }
}
