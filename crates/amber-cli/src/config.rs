use std::path::{Path, PathBuf};
use std::time::Duration;

use amber_sim::SimulationConfig;
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum ConfigFileError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {path}: {source}")]
    Json {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("police response bounds are inverted: {min_ms}ms > {max_ms}ms")]
    InvertedBounds { min_ms: u64, max_ms: u64 },
}

/// Top-level demo configuration. Every section and field is optional.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AmberConfig {
    pub simulation: SimulationConfig,
    pub police: PoliceConfig,
}

/// Behaviour of the simulated traffic police operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoliceConfig {
    /// RNG seed for response delays, for reproducible runs.
    pub seed: u64,
    /// How often the console looks for pending requests.
    pub check_interval_ms: u64,
    pub min_response_ms: u64,
    pub max_response_ms: u64,
}

impl Default for PoliceConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            check_interval_ms: 3000,
            min_response_ms: 1500,
            max_response_ms: 4000,
        }
    }
}

impl PoliceConfig {
    pub fn check_interval(&self) -> Duration {
        Duration::from_millis(self.check_interval_ms)
    }
}

impl AmberConfig {
    pub fn load(path: &Path) -> Result<Self, ConfigFileError> {
        let json = std::fs::read_to_string(path).map_err(|source| ConfigFileError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: AmberConfig =
            serde_json::from_str(&json).map_err(|source| ConfigFileError::Json {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigFileError> {
        let police = &self.police;
        if police.min_response_ms > police.max_response_ms {
            return Err(ConfigFileError::InvertedBounds {
                min_ms: police.min_response_ms,
                max_ms: police.max_response_ms,
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_default() {
        let config: AmberConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, AmberConfig::default());
        assert_eq!(config.simulation.tick_period_ms, 500);
        assert_eq!(config.police.check_interval(), Duration::from_secs(3));
    }

    #[test]
    fn test_partial_sections() {
        let config: AmberConfig = serde_json::from_str(
            r#"{ "simulation": { "poll_interval_ms": 250 }, "police": { "seed": 7 } }"#,
        )
        .unwrap();
        assert_eq!(config.simulation.poll_interval_ms, 250);
        assert_eq!(config.simulation.tick_period_ms, 500);
        assert_eq!(config.police.seed, 7);
        assert_eq!(config.police.max_response_ms, 4000);
    }

    #[test]
    fn test_inverted_bounds_rejected() {
        let config = AmberConfig {
            police: PoliceConfig {
                min_response_ms: 5000,
                max_response_ms: 10,
                ..Default::default()
            },
            ..Default::default()
        };
        assert!(matches!(
            config.validate(),
            Err(ConfigFileError::InvertedBounds { .. })
        ));
    }

    #[test]
    fn test_missing_file() {
        let err = AmberConfig::load(Path::new("/nonexistent/amber.json")).unwrap_err();
        assert!(matches!(err, ConfigFileError::Io { .. }));
    }
}
