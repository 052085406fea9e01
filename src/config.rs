use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::capture::DEFAULT_CAPTURE_DELAY_SECONDS;
use crate::counters::DEFAULT_PROGRESS_TARGET;
use crate::gate::DEFAULT_MOVEMENT_THRESHOLD;
use crate::store::DEFAULT_MODEL_KEY;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Tunables for the live pipeline and the offline tooling.
///
/// Every field has a default, so a TOML file only needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    /// Neighbors that vote on live classifications.
    pub k: usize,
    /// Neighbors used by offline evaluation.
    pub eval_k: usize,
    pub movement_threshold: f64,
    pub debounce_interval_ms: u64,
    pub capture_delay_seconds: u32,
    pub model_key: String,
    /// Captures per phase shown as 100% progress.
    pub progress_target: u32,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            k: 5,
            eval_k: 3,
            movement_threshold: DEFAULT_MOVEMENT_THRESHOLD,
            debounce_interval_ms: 500,
            capture_delay_seconds: DEFAULT_CAPTURE_DELAY_SECONDS,
            model_key: DEFAULT_MODEL_KEY.to_string(),
            progress_target: DEFAULT_PROGRESS_TARGET,
        }
    }
}

impl PipelineConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), ConfigError> {
        let path = path.as_ref();
        let content = toml::to_string_pretty(self)?;
        fs::write(path, content).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.k == 0 {
            return Err(ConfigError::Invalid("k must be at least 1".into()));
        }
        if self.eval_k == 0 {
            return Err(ConfigError::Invalid("eval_k must be at least 1".into()));
        }
        if !self.movement_threshold.is_finite() || self.movement_threshold < 0.0 {
            return Err(ConfigError::Invalid(
                "movement_threshold must be a finite, non-negative number".into(),
            ));
        }
        if self.capture_delay_seconds == 0 {
            return Err(ConfigError::Invalid(
                "capture_delay_seconds must be at least 1".into(),
            ));
        }
        if self.model_key.is_empty() {
            return Err(ConfigError::Invalid("model_key must not be empty".into()));
        }
        Ok(())
    }

    pub fn debounce_interval(&self) -> Duration {
        Duration::from_millis(self.debounce_interval_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = PipelineConfig::default();
        assert_eq!(config.k, 5);
        assert_eq!(config.eval_k, 3);
        assert_eq!(config.movement_threshold, 0.05);
        assert_eq!(config.debounce_interval(), Duration::from_millis(500));
        assert_eq!(config.capture_delay_seconds, 5);
        assert_eq!(config.model_key, "free_kick_model");
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = PipelineConfig::from_toml_str("k = 7\ndebounce_interval_ms = 250\n").unwrap();
        assert_eq!(config.k, 7);
        assert_eq!(config.debounce_interval_ms, 250);
        assert_eq!(config.eval_k, 3);
        assert_eq!(config.capture_delay_seconds, 5);
    }

    #[test]
    fn test_invalid_values_rejected() {
        assert!(matches!(
            PipelineConfig::from_toml_str("k = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("movement_threshold = -0.1"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("capture_delay_seconds = 0"),
            Err(ConfigError::Invalid(_))
        ));
        assert!(matches!(
            PipelineConfig::from_toml_str("k = \"five\""),
            Err(ConfigError::Parse(_))
        ));
    }

    #[test]
    fn test_toml_round_trip() {
        let config = PipelineConfig {
            k: 9,
            model_key: "penalty_model".into(),
            ..PipelineConfig::default()
        };
        let text = toml::to_string_pretty(&config).unwrap();
        assert_eq!(PipelineConfig::from_toml_str(&text).unwrap(), config);
    }
}
