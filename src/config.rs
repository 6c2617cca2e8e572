use std::collections::HashMap;
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::trace;

/// Storage backend configuration
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(tag = "backend", rename_all = "lowercase")]
pub enum StorageConfig {
    /// Do not persist metrics at all
    #[serde(rename = "none")]
    None,

    /// Keep metrics in process memory (lost on exit)
    Memory,

    /// SQLite database file (default)
    Sqlite {
        /// Path to the SQLite database file
        #[serde(default = "crate::util::get_db_path")]
        path: PathBuf,
    },
}

impl Default for StorageConfig {
    fn default() -> Self {
        StorageConfig::Sqlite {
            path: crate::util::get_db_path(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectorConfig {
    /// Random CPU/memory readings, no host access needed
    Simulated,
    /// Real CPU/memory readings of this host
    System,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Alert {
    Console,
    Discord(Discord),
    Webhook(Webhook),
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Webhook {
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
pub struct Discord {
    pub url: String,
    pub user_id: Option<String>,
}

/// Configuration as read from disk. Every field is optional here; [`Config::resolve`]
/// checks the required ones and fills in defaults for the rest.
#[derive(Debug, Clone, serde::Deserialize)]
pub struct Config {
    /// Upper bound per metric name; a metric without an entry never alerts
    pub thresholds: Option<HashMap<String, f64>>,

    /// Seconds between collection cycles
    pub interval: Option<f64>,

    pub collectors: Option<Vec<CollectorConfig>>,

    pub alerts: Option<Vec<Alert>>,

    /// Storage configuration (optional - defaults to SQLite)
    pub storage: Option<StorageConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            thresholds: Some(HashMap::from([
                ("cpu_usage".to_string(), 80.0),
                ("memory_usage".to_string(), 75.0),
            ])),
            interval: Some(2.0),
            collectors: None,
            alerts: None,
            storage: None,
        }
    }
}

/// Validated configuration owned by the engine for its whole lifetime
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedConfig {
    pub thresholds: HashMap<String, f64>,
    pub interval: Duration,
    pub collectors: Vec<CollectorConfig>,
    pub alerts: Vec<Alert>,
    pub storage: StorageConfig,
}

impl ResolvedConfig {
    /// Check values that may have been set without going through [`Config::resolve`]
    pub fn validate(&self) -> Result<(), ConfigError> {
        if let Some((metric, value)) = self
            .thresholds
            .iter()
            .find(|(_, value)| !value.is_finite())
        {
            return Err(ConfigError::InvalidThreshold {
                metric: metric.clone(),
                value: *value,
            });
        }

        if self.interval.is_zero() {
            return Err(ConfigError::InvalidInterval(0.0));
        }

        Ok(())
    }

    pub fn threshold(&self, metric_name: &str) -> Option<f64> {
        self.thresholds.get(metric_name).copied()
    }
}

#[derive(Debug)]
pub enum ConfigError {
    /// A required key is absent
    MissingField(&'static str),

    /// Interval is zero, negative or not a finite number
    InvalidInterval(f64),

    /// Threshold is not a finite number
    InvalidThreshold { metric: String, value: f64 },

    /// Config file could not be read
    Io(std::io::Error),

    /// Config file is not valid JSON for this schema
    Parse(serde_json::Error),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::MissingField(field) => {
                write!(f, "missing required configuration key `{field}`")
            }
            ConfigError::InvalidInterval(value) => write!(
                f,
                "invalid interval {value}: must be a positive number of seconds"
            ),
            ConfigError::InvalidThreshold { metric, value } => {
                write!(f, "invalid threshold {value} for metric `{metric}`")
            }
            ConfigError::Io(err) => write!(f, "failed to read configuration file: {err}"),
            ConfigError::Parse(err) => write!(f, "invalid configuration file: {err}"),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Io(err) => Some(err),
            ConfigError::Parse(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for ConfigError {
    fn from(err: std::io::Error) -> Self {
        ConfigError::Io(err)
    }
}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err)
    }
}

impl Config {
    pub fn resolve(self) -> Result<ResolvedConfig, ConfigError> {
        let thresholds = self
            .thresholds
            .ok_or(ConfigError::MissingField("thresholds"))?;

        let interval = self.interval.ok_or(ConfigError::MissingField("interval"))?;
        if !interval.is_finite() || interval <= 0.0 {
            return Err(ConfigError::InvalidInterval(interval));
        }
        let interval = Duration::try_from_secs_f64(interval)
            .map_err(|_| ConfigError::InvalidInterval(interval))?;

        let resolved = ResolvedConfig {
            thresholds,
            interval,
            collectors: self
                .collectors
                .unwrap_or_else(|| vec![CollectorConfig::Simulated]),
            alerts: self.alerts.unwrap_or_else(|| vec![Alert::Console]),
            storage: self.storage.unwrap_or_default(),
        };
        resolved.validate()?;
        Ok(resolved)
    }
}

impl TryFrom<Config> for ResolvedConfig {
    type Error = ConfigError;

    fn try_from(config: Config) -> Result<Self, Self::Error> {
        config.resolve()
    }
}

pub fn parse_config(content: &str) -> Result<Config, ConfigError> {
    serde_json::from_str(content)
        .map_err(ConfigError::from)
        .inspect(|config| trace!("loaded config: {config:?}"))
}

pub fn read_config_file(path: impl AsRef<Path>) -> Result<Config, ConfigError> {
    let file_content = std::fs::read_to_string(path)?;
    parse_config(&file_content)
}
