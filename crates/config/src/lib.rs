use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

/// Environment variable naming the YAML configuration file
pub const CONFIG_FILE_ENV: &str = "GOVMODE_CONFIG_FILE";
/// Environment variable overriding the state file path
pub const STATE_FILE_ENV: &str = "GOVMODE_STATE_FILE";
/// Environment variable overriding the log level
pub const LOG_LEVEL_ENV: &str = "GOVMODE_LOG_LEVEL";
/// Environment variable overriding the default proposal duration
pub const DEFAULT_DURATION_ENV: &str = "GOVMODE_DEFAULT_DURATION_DAYS";
/// Environment variable pinning the host clock
pub const FIXED_TIME_ENV: &str = "GOVMODE_FIXED_TIME";

/// Errors that can occur in configuration operations
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidEnvVar(String, String),

    #[error("File not found: {0}")]
    FileNotFound(String),

    #[error("Failed to read file: {0}")]
    FileReadError(String),

    #[error("Failed to parse YAML: {0}")]
    YamlParseError(#[from] serde_yaml::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}

/// Result type for configuration operations
pub type Result<T> = std::result::Result<T, ConfigError>;

/// Configuration for a process hosting the governance engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HostConfig {
    /// Where the engine state snapshot lives
    #[serde(default = "default_state_file")]
    pub state_file: PathBuf,
    /// Log filter directive used when RUST_LOG is unset
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// Voting duration for proposals that do not name one
    #[serde(default = "default_duration_days")]
    pub default_duration_days: i64,
    /// Unix time to use instead of the wall clock
    #[serde(default)]
    pub fixed_time: Option<u64>,
}

fn default_state_file() -> PathBuf {
    PathBuf::from("govmode-state.json")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_duration_days() -> i64 {
    7
}

impl Default for HostConfig {
    fn default() -> Self {
        Self {
            state_file: default_state_file(),
            log_level: default_log_level(),
            default_duration_days: default_duration_days(),
            fixed_time: None,
        }
    }
}

impl HostConfig {
    /// Load configuration from the environment
    ///
    /// `path` (or `GOVMODE_CONFIG_FILE`) names an optional YAML file; if it
    /// does not exist the defaults are used. Individual `GOVMODE_*`
    /// variables then override single fields.
    pub fn from_env(path: Option<&Path>) -> Result<Self> {
        let config_path = path
            .map(Path::to_path_buf)
            .or_else(|| env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from));

        let mut config = match config_path {
            Some(ref p) if p.exists() => Self::from_file(p)?,
            Some(ref p) => {
                debug!(path = %p.display(), "Config file not found, using defaults");
                Self::default()
            }
            None => Self::default(),
        };

        config.apply_overrides(|key| env::var(key).ok())?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration from file
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.display().to_string()));
        }

        let contents = fs::read_to_string(path).map_err(|e| {
            ConfigError::FileReadError(format!("Failed to read {}: {}", path.display(), e))
        })?;

        let config: HostConfig = serde_yaml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Override fields from `GOVMODE_*` variables returned by `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(state_file) = lookup(STATE_FILE_ENV) {
            self.state_file = PathBuf::from(state_file);
        }

        if let Some(log_level) = lookup(LOG_LEVEL_ENV) {
            self.log_level = log_level;
        }

        if let Some(days) = lookup(DEFAULT_DURATION_ENV) {
            self.default_duration_days = days.trim().parse::<i64>().map_err(|e| {
                ConfigError::InvalidEnvVar(DEFAULT_DURATION_ENV.to_string(), e.to_string())
            })?;
        }

        if let Some(time) = lookup(FIXED_TIME_ENV) {
            let time = time.trim().parse::<u64>().map_err(|e| {
                ConfigError::InvalidEnvVar(FIXED_TIME_ENV.to_string(), e.to_string())
            })?;
            self.fixed_time = Some(time);
        }

        Ok(())
    }

    /// Check values the engine would reject later anyway
    pub fn validate(&self) -> Result<()> {
        if self.default_duration_days <= 0 {
            return Err(ConfigError::Invalid(format!(
                "default_duration_days must be positive, got {}",
                self.default_duration_days
            )));
        }

        if self.state_file.as_os_str().is_empty() {
            return Err(ConfigError::Invalid("state_file cannot be empty".to_string()));
        }

        Ok(())
    }
}
