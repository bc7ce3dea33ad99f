use serde::Deserialize;
use std::time::Duration;

use crate::error::ConfigError;

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub rigs: Vec<RigConfig>,
    #[serde(default)]
    pub polling: PollingConfig,
    #[serde(default)]
    pub display: DisplayConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// One monitored host. Position in `rigs` is the rig index used everywhere else.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RigConfig {
    pub address: String,
    pub port: u16,
    #[serde(rename = "name")]
    pub display_name: String,
}

impl RigConfig {
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.address, self.port)
    }
}

/// How the client reads a response off the socket.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReadMode {
    /// One read, trusting it holds the whole response. This is what rig firmware
    /// expects, but a response split across packets is truncated.
    #[default]
    Single,
    /// Keep reading until the rig closes the connection or the timeout elapses.
    UntilClose,
}

#[derive(Debug, Clone, Deserialize)]
pub struct PollingConfig {
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
    #[serde(default = "default_tick_interval_ms")]
    pub tick_interval_ms: u64,
    /// Upper bound on rigs polled at the same time within one sweep.
    #[serde(default = "default_max_concurrent_polls")]
    pub max_concurrent_polls: usize,
    /// History capacity is samples_per_rig * number of rigs.
    #[serde(default = "default_samples_per_rig")]
    pub samples_per_rig: usize,
    #[serde(default)]
    pub read_mode: ReadMode,
}

fn default_timeout_ms() -> u64 {
    1000
}

fn default_tick_interval_ms() -> u64 {
    5000
}

fn default_max_concurrent_polls() -> usize {
    4
}

fn default_samples_per_rig() -> usize {
    60
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            timeout_ms: default_timeout_ms(),
            tick_interval_ms: default_tick_interval_ms(),
            max_concurrent_polls: default_max_concurrent_polls(),
            samples_per_rig: default_samples_per_rig(),
            read_mode: ReadMode::default(),
        }
    }
}

impl PollingConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct DisplayConfig {
    /// Total is drawn as low when total / average * 100 falls below this.
    #[serde(default = "default_low_hashrate_threshold_percent")]
    pub low_hashrate_threshold_percent: f64,
}

fn default_low_hashrate_threshold_percent() -> f64 {
    90.0
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            low_hashrate_threshold_percent: default_low_hashrate_threshold_percent(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct LoggingConfig {
    /// Log file path. Logs go to stderr when unset.
    pub file: Option<String>,
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let path = std::env::var("CONFIG_FILE").unwrap_or_else(|_| "config.toml".into());
        let s = std::fs::read_to_string(&path).map_err(|source| ConfigError::Io {
            path: path.clone(),
            source,
        })?;
        Self::load_from_str(&s)
    }

    /// Parse and validate config from a string (e.g. for tests).
    pub fn load_from_str(s: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(s)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.rigs.is_empty() {
            return Err(ConfigError::Invalid(
                "at least one [[rigs]] entry is required".to_string(),
            ));
        }
        for (i, rig) in self.rigs.iter().enumerate() {
            if rig.address.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rigs[{}].address must be non-empty",
                    i
                )));
            }
            if rig.port == 0 {
                return Err(ConfigError::Invalid(format!(
                    "rigs[{}].port must be between 1 and 65535, got {}",
                    i, rig.port
                )));
            }
            if rig.display_name.trim().is_empty() {
                return Err(ConfigError::Invalid(format!(
                    "rigs[{}].name must be non-empty",
                    i
                )));
            }
        }
        if self.polling.timeout_ms == 0 {
            return Err(ConfigError::Invalid(format!(
                "polling.timeout_ms must be > 0, got {}",
                self.polling.timeout_ms
            )));
        }
        if self.polling.tick_interval_ms == 0 {
            return Err(ConfigError::Invalid(format!(
                "polling.tick_interval_ms must be > 0, got {}",
                self.polling.tick_interval_ms
            )));
        }
        if self.polling.max_concurrent_polls == 0 {
            return Err(ConfigError::Invalid(format!(
                "polling.max_concurrent_polls must be > 0, got {}",
                self.polling.max_concurrent_polls
            )));
        }
        if self.polling.samples_per_rig == 0 {
            return Err(ConfigError::Invalid(format!(
                "polling.samples_per_rig must be > 0, got {}",
                self.polling.samples_per_rig
            )));
        }
        let threshold = self.display.low_hashrate_threshold_percent;
        if !(threshold > 0.0 && threshold <= 100.0) {
            return Err(ConfigError::Invalid(format!(
                "display.low_hashrate_threshold_percent must be in (0, 100], got {}",
                threshold
            )));
        }
        Ok(())
    }
}
