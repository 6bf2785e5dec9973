//! Configuration management for qrun sessions.
//!
//! Supports loading configuration from:
//! 1. Configuration files (YAML)
//! 2. Environment variables (with QRUN_ prefix)
//!
//! Configuration precedence (highest to lowest):
//! 1. Environment variables
//! 2. Configuration file
//! 3. Default values

use std::path::{Path, PathBuf};
use std::time::Duration;

use qrun_mem::MemoryConfig;
use serde::{Deserialize, Serialize};

/// Widest register the dense engine is allowed to build.
pub const MAX_SUPPORTED_QUBITS: usize = 40;

/// Complete runtime configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuntimeConfig {
    /// Register limits and seeding
    #[serde(default)]
    pub memory: MemoryConfig,

    /// Checkpoint policy
    #[serde(default)]
    pub checkpoint: CheckpointConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// When and where register checkpoints are written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CheckpointConfig {
    /// Checkpoint once a register has run this many operations
    #[serde(default = "default_op_threshold")]
    pub op_threshold: usize,

    /// ... or once this many seconds have passed since the last one
    #[serde(default = "default_time_threshold")]
    pub time_threshold_secs: u64,

    /// Directory checkpoint files are written to
    #[serde(default = "default_checkpoint_dir")]
    pub directory: PathBuf,
}

/// Logging configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level: "trace", "debug", "info", "warn", "error"
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Log format: "console" or "json"
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_op_threshold() -> usize {
    1000
}

fn default_time_threshold() -> u64 {
    300 // 5 minutes
}

fn default_checkpoint_dir() -> PathBuf {
    std::env::temp_dir().join("qrun-checkpoints")
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "console".to_string()
}

impl Default for CheckpointConfig {
    fn default() -> Self {
        Self {
            op_threshold: default_op_threshold(),
            time_threshold_secs: default_time_threshold(),
            directory: default_checkpoint_dir(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl CheckpointConfig {
    pub fn time_threshold(&self) -> Duration {
        Duration::from_secs(self.time_threshold_secs)
    }
}

impl RuntimeConfig {
    /// Load configuration from a YAML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::IoError(e.to_string()))?;
        Self::from_yaml(&contents)
    }

    /// Parse and validate a YAML document.
    pub fn from_yaml(contents: &str) -> Result<Self, ConfigError> {
        let config: RuntimeConfig = serde_yaml_ng::from_str(contents)
            .map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load configuration with the following precedence:
    /// 1. Load from file if provided
    /// 2. Apply environment variable overrides
    pub fn load(config_file: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match config_file {
            Some(path) => Self::from_file(path)?,
            None => RuntimeConfig::default(),
        };
        let config = config.merge_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Merge `QRUN_*` environment variables into this configuration.
    pub fn merge_env(self) -> Result<Self, ConfigError> {
        self.merge_vars(|key| std::env::var(key).ok())
    }

    /// Merge overrides from `lookup`, which maps a variable name to its
    /// value. Absent variables leave the field unchanged; malformed
    /// numbers are an error.
    pub fn merge_vars<F>(mut self, lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Memory
        if let Some(v) = lookup("QRUN_MAX_QUBITS") {
            self.memory.max_qubits = parse_var("QRUN_MAX_QUBITS", &v)?;
        }
        if let Some(v) = lookup("QRUN_SEED") {
            self.memory.seed = Some(parse_var("QRUN_SEED", &v)?);
        }

        // Checkpoint
        if let Some(v) = lookup("QRUN_CHECKPOINT_OPS") {
            self.checkpoint.op_threshold = parse_var("QRUN_CHECKPOINT_OPS", &v)?;
        }
        if let Some(v) = lookup("QRUN_CHECKPOINT_SECS") {
            self.checkpoint.time_threshold_secs = parse_var("QRUN_CHECKPOINT_SECS", &v)?;
        }
        if let Some(v) = lookup("QRUN_CHECKPOINT_DIR") {
            self.checkpoint.directory = PathBuf::from(v);
        }

        // Logging
        if let Some(v) = lookup("QRUN_LOG_LEVEL") {
            self.logging.level = v;
        }
        if let Some(v) = lookup("QRUN_LOG_FORMAT") {
            self.logging.format = v;
        }

        Ok(self)
    }

    /// Validate configuration values.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.memory.max_qubits == 0 || self.memory.max_qubits > MAX_SUPPORTED_QUBITS {
            return Err(ConfigError::ValidationError(format!(
                "max_qubits must be between 1 and {MAX_SUPPORTED_QUBITS}, got {}",
                self.memory.max_qubits
            )));
        }

        if self.checkpoint.op_threshold == 0 {
            return Err(ConfigError::ValidationError(
                "checkpoint op_threshold must be greater than 0".to_string(),
            ));
        }

        match self.logging.level.as_str() {
            "trace" | "debug" | "info" | "warn" | "error" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log level: {other}"
                )));
            }
        }

        match self.logging.format.as_str() {
            "console" | "json" => {}
            other => {
                return Err(ConfigError::ValidationError(format!(
                    "Invalid log format: {other}"
                )));
            }
        }

        Ok(())
    }
}

fn parse_var<T: std::str::FromStr>(key: &str, value: &str) -> Result<T, ConfigError> {
    value
        .trim()
        .parse()
        .map_err(|_| ConfigError::ValidationError(format!("{key}: cannot parse {value:?}")))
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(String),

    #[error("Parse error: {0}")]
    ParseError(String),

    #[error("Validation error: {0}")]
    ValidationError(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vars(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let pairs: Vec<(String, String)> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| {
            pairs
                .iter()
                .find(|(k, _)| k == key)
                .map(|(_, v)| v.clone())
        }
    }

    #[test]
    fn test_default_config() {
        let config = RuntimeConfig::default();
        assert_eq!(config.memory.max_qubits, 30);
        assert_eq!(config.memory.seed, None);
        assert_eq!(config.checkpoint.op_threshold, 1000);
        assert_eq!(config.checkpoint.time_threshold(), Duration::from_secs(300));
        assert!(config.checkpoint.directory.ends_with("qrun-checkpoints"));
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_yaml_keeps_defaults() {
        let config = RuntimeConfig::from_yaml(
            "memory:\n  seed: 42\ncheckpoint:\n  op_threshold: 3\n",
        )
        .unwrap();
        assert_eq!(config.memory.seed, Some(42));
        assert_eq!(config.memory.max_qubits, 30);
        assert_eq!(config.checkpoint.op_threshold, 3);
        assert_eq!(config.checkpoint.time_threshold_secs, 300);
        assert_eq!(config.logging.format, "console");
    }

    #[test]
    fn test_env_overrides_file() {
        let config = RuntimeConfig::from_yaml("logging:\n  level: warn\n")
            .unwrap()
            .merge_vars(vars(&[
                ("QRUN_LOG_LEVEL", "debug"),
                ("QRUN_MAX_QUBITS", "12"),
                ("QRUN_CHECKPOINT_DIR", "/var/qrun"),
            ]))
            .unwrap();
        assert_eq!(config.logging.level, "debug");
        assert_eq!(config.memory.max_qubits, 12);
        assert_eq!(config.checkpoint.directory, PathBuf::from("/var/qrun"));
    }

    #[test]
    fn test_malformed_env_number() {
        let err = RuntimeConfig::default()
            .merge_vars(vars(&[("QRUN_SEED", "forty-two")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::ValidationError(_)));
    }

    #[test]
    fn test_validate_rejects() {
        let mut config = RuntimeConfig::default();
        config.logging.level = "loud".to_string();
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.logging.format = "xml".to_string();
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.memory.max_qubits = 0;
        assert!(config.validate().is_err());

        let mut config = RuntimeConfig::default();
        config.checkpoint.op_threshold = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_invalid_yaml() {
        assert!(matches!(
            RuntimeConfig::from_yaml("memory: [1, 2"),
            Err(ConfigError::ParseError(_))
        ));
    }
}
